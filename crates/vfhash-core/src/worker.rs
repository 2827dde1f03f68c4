//! Background hash worker.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use vfhash_device::DeviceResolver;

use crate::hasher::hash_device_file;
use crate::queue::FetchQueue;
use crate::signal::WakeSignal;
use crate::store::HashStore;

/// Single consumer of the fetch queue.
///
/// Waits on the wake signal, then drains the queue one path at a time,
/// writing each result to the store. Per-path failures become states; only
/// closing the signal ends the loop.
pub(crate) struct HashWorker {
    pub(crate) store: Arc<HashStore>,
    pub(crate) queue: Arc<FetchQueue>,
    pub(crate) signal: Arc<WakeSignal>,
    pub(crate) resolver: Arc<dyn DeviceResolver>,
    pub(crate) chunk_size: usize,
    pub(crate) processed: Arc<AtomicU64>,
}

impl HashWorker {
    /// Start the loop on a named thread
    pub fn spawn(self, name: &str) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || self.run())
    }

    /// Run until the signal is closed
    pub fn run(self) {
        vfhash_config::log_worker_info!("Hash worker started", chunk_size = self.chunk_size);

        while self.signal.wait() {
            let drained = self.drain();
            if drained > 0 {
                vfhash_config::log_worker_debug!("Queue drained", hashed = drained);
            }
        }

        vfhash_config::log_worker_info!(
            "Hash worker stopped",
            processed = self.processed.load(Ordering::Relaxed)
        );
    }

    /// Hash everything currently queued. Stops early once the signal closes.
    pub fn drain(&self) -> u64 {
        let mut count = 0;
        while !self.signal.is_closed() {
            let Some(path) = self.queue.try_pop() else {
                break;
            };
            self.process(path);
            count += 1;
        }
        count
    }

    fn process(&self, path: String) {
        let state = hash_device_file(self.resolver.as_ref(), &path, self.chunk_size);
        vfhash_config::log_worker_debug!(
            "Hash computed",
            path = path.as_str(),
            state = state.as_query_str()
        );
        self.store.put(path, state);
        self.processed.fetch_add(1, Ordering::Relaxed);
    }
}
