//! Per-path hash states.

use std::fmt;

use serde::{Serialize, Serializer};

/// SHA-256 output, kept as raw bytes with its 64-character uppercase hex form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    bytes: [u8; 32],
    hex: String,
}

impl Digest {
    /// Number of hex characters in a rendered digest
    pub const HEX_LEN: usize = 64;

    /// Render raw digest bytes, most significant nibble first.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            bytes: *bytes,
            hex: hex::encode_upper(bytes),
        }
    }

    /// Parse a rendered digest. Lower-case input is accepted and upper-cased.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex, &mut bytes).ok()?;
        Some(Self::from_bytes(&bytes))
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.bytes
    }

    pub fn as_str(&self) -> &str {
        &self.hex
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

/// What the service knows about one submitted path.
///
/// Every variant except [`HashState::Pending`] is terminal: only a new
/// submission moves a path out of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashState {
    /// Submitted, not yet computed
    Pending,
    /// Content hashed in full
    Ready(Digest),
    /// No device for the path, or the device could not open it
    Missing,
    /// The device stopped serving data after `read` of `expected` bytes
    ReadError { read: u64, expected: u64 },
    /// Dropped from the queue at session shutdown before being hashed
    Cancelled,
}

impl HashState {
    /// Query marker for a pending path
    pub const PENDING: &'static str = "";
    /// Query marker for a missing or unknown path
    pub const MISSING: &'static str = "missing";
    /// Query marker for a path whose content could not be read in full
    pub const ERROR: &'static str = "error";
    /// Query marker for a path cancelled at session shutdown
    pub const CANCELLED: &'static str = "cancelled";

    pub fn is_terminal(&self) -> bool {
        !matches!(self, HashState::Pending)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, HashState::Pending)
    }

    pub fn digest(&self) -> Option<&Digest> {
        match self {
            HashState::Ready(digest) => Some(digest),
            _ => None,
        }
    }

    /// The string a hash query reports for this state
    pub fn as_query_str(&self) -> &str {
        match self {
            HashState::Pending => Self::PENDING,
            HashState::Ready(digest) => digest.as_str(),
            HashState::Missing => Self::MISSING,
            HashState::ReadError { .. } => Self::ERROR,
            HashState::Cancelled => Self::CANCELLED,
        }
    }
}

impl fmt::Display for HashState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashState::Pending => f.write_str("pending"),
            HashState::Ready(digest) => write!(f, "{}", digest),
            HashState::Missing => f.write_str(Self::MISSING),
            HashState::ReadError { read, expected } => {
                write!(f, "error (read {} of {} bytes)", read, expected)
            }
            HashState::Cancelled => f.write_str(Self::CANCELLED),
        }
    }
}
