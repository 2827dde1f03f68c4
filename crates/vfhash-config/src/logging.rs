//! Structured logging utilities for vfhash components.
//!
//! Provides consistent logging with component prefixes and structured fields.
//!
//! # Usage
//!
//! ```ignore
//! use vfhash_config::log_worker_info;
//!
//! log_worker_info!("Hash ready", path = "platform:/a.rpf");
//! ```

/// Component identifiers for log filtering
pub struct Component;

impl Component {
    pub const WORKER: &'static str = "WORKER";
    pub const SERVICE: &'static str = "SERVICE";
    pub const DEVICE: &'static str = "DEVICE";
    pub const CLI: &'static str = "CLI";
}

// === WORKER logging macros ===

#[macro_export]
macro_rules! log_worker_warn {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(component = $crate::logging::Component::WORKER, $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_worker_info {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info!(component = $crate::logging::Component::WORKER, $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_worker_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = $crate::logging::Component::WORKER, $($key = $value,)* $msg)
    };
}

// === SERVICE logging macros ===

#[macro_export]
macro_rules! log_service_info {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info!(component = $crate::logging::Component::SERVICE, $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_service_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = $crate::logging::Component::SERVICE, $($key = $value,)* $msg)
    };
}

// === DEVICE logging macros ===

#[macro_export]
macro_rules! log_device_warn {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(component = $crate::logging::Component::DEVICE, $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_device_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = $crate::logging::Component::DEVICE, $($key = $value,)* $msg)
    };
}

// === CLI logging macros ===

#[macro_export]
macro_rules! log_cli_info {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info!(component = $crate::logging::Component::CLI, $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_cli_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = $crate::logging::Component::CLI, $($key = $value,)* $msg)
    };
}
