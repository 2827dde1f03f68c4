//! Streaming SHA-256 over a device-served file.

use std::sync::Arc;

use sha2::{Digest as _, Sha256};
use tracing::instrument;
use vfhash_device::{Device, DeviceResolver, Handle};

use crate::state::{Digest, HashState};

/// Closes a device handle when dropped, on every exit path.
struct OpenHandle<'a> {
    device: &'a dyn Device,
    handle: Handle,
}

impl Drop for OpenHandle<'_> {
    fn drop(&mut self) {
        self.device.close(self.handle);
    }
}

/// SHA-256 of an in-memory buffer, rendered like a device hash
pub fn digest_bytes(data: &[u8]) -> Digest {
    Digest::from_bytes(&Sha256::digest(data).into())
}

/// Hash the full content of `path` as served by its device.
///
/// - no device, or open fails: [`HashState::Missing`]
/// - device stops short of the reported length: [`HashState::ReadError`]
/// - otherwise: [`HashState::Ready`]
#[instrument(skip(resolver), level = "debug")]
pub fn hash_device_file(resolver: &dyn DeviceResolver, path: &str, chunk_size: usize) -> HashState {
    let Some(device) = resolver.resolve(path) else {
        vfhash_config::log_worker_debug!("No device for path", path = path);
        return HashState::Missing;
    };
    hash_on_device(&device, path, chunk_size)
}

/// Hash `path` on an already resolved device.
pub fn hash_on_device(device: &Arc<dyn Device>, path: &str, chunk_size: usize) -> HashState {
    let Some(handle) = device.open(path, true) else {
        vfhash_config::log_worker_debug!("Open failed", path = path, device = device.name());
        return HashState::Missing;
    };
    let open = OpenHandle {
        device: device.as_ref(),
        handle,
    };

    let expected = open.device.length(open.handle);
    // Never allocate more than the file needs
    let file_len = usize::try_from(expected).unwrap_or(usize::MAX);
    let mut buf = vec![0u8; chunk_size.min(file_len).max(1)];
    let mut hasher = Sha256::new();
    let mut consumed: u64 = 0;

    while consumed < expected {
        let remaining = expected - consumed;
        let want = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        let n = open.device.read(open.handle, &mut buf[..want]);
        if n <= 0 {
            vfhash_config::log_worker_warn!(
                "Short read, discarding partial hash",
                path = path,
                read = consumed,
                expected = expected
            );
            return HashState::ReadError {
                read: consumed,
                expected,
            };
        }
        // A device may not report more than it was asked for
        let n = (n as usize).min(want);
        hasher.update(&buf[..n]);
        consumed += n as u64;
    }
    drop(open);

    HashState::Ready(Digest::from_bytes(&hasher.finalize().into()))
}
