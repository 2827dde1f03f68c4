//! # vfhash-core
//!
//! Asynchronous SHA-256 hashing of files on mounted virtual volumes.
//!
//! Callers submit a whitelisted virtual path, a single background worker
//! streams the file from its storage device and records the digest, and
//! callers poll for the result. Nothing on the caller side blocks on I/O.
//!
//! ## Flow
//!
//! ```text
//! submit_fetch(path)
//!   -> PathValidator      (prefix allow-list, reject = false)
//!   -> HashStore          (path = Pending)
//!   -> FetchQueue         (push)
//!   -> WakeSignal         (notify, sticky)
//!        HashWorker       (wait, drain queue, hash in 64 KiB chunks)
//!   -> HashStore          (Ready | Missing | ReadError)
//!
//! query_hash(path) / is_ready(path) read HashStore directly.
//! ```
//!
//! ## Session lifecycle
//!
//! - session ready: start the worker, once
//! - session shutdown: drain the queue, marking drained paths `Cancelled`

mod hasher;
mod lifecycle;
mod queue;
mod service;
mod signal;
mod state;
mod store;
mod validator;
mod worker;

pub use hasher::{digest_bytes, hash_device_file, hash_on_device};
pub use lifecycle::{SessionEvent, SessionOutcome};
pub use queue::FetchQueue;
pub use service::FileHashService;
pub use signal::WakeSignal;
pub use state::{Digest, HashState};
pub use store::{HashStore, StoreStats};
pub use validator::PathValidator;

use thiserror::Error;

/// Errors from managing the hash worker
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Failed to spawn hash worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("Hash worker panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, ServiceError>;
