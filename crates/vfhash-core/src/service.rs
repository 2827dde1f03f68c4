//! Submission and query facade over the validator, store, queue and worker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use once_cell::sync::OnceCell;
use vfhash_config::HasherConfig;
use vfhash_device::DeviceResolver;

use crate::queue::FetchQueue;
use crate::signal::WakeSignal;
use crate::state::HashState;
use crate::store::{HashStore, StoreStats};
use crate::validator::PathValidator;
use crate::worker::HashWorker;
use crate::{Result, ServiceError};

/// Poll interval used by [`FileHashService::wait_until_ready`]
const READY_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Owns the hash store, the fetch queue and the single hash worker.
///
/// Submission and queries never block on hashing: callers submit a path,
/// then poll [`FileHashService::is_ready`] / [`FileHashService::query_hash`].
pub struct FileHashService {
    validator: PathValidator,
    store: Arc<HashStore>,
    queue: Arc<FetchQueue>,
    signal: Arc<WakeSignal>,
    resolver: Arc<dyn DeviceResolver>,
    chunk_size: usize,
    thread_name: String,
    clear_on_shutdown: bool,
    processed: Arc<AtomicU64>,
    worker: OnceCell<Mutex<Option<JoinHandle<()>>>>,
    /// Submitters share it; a drain holds it exclusively so no submission
    /// lands between emptying the queue and cancelling its paths.
    intake: RwLock<()>,
}

impl FileHashService {
    pub fn new(config: &HasherConfig, resolver: Arc<dyn DeviceResolver>) -> Self {
        Self {
            validator: PathValidator::from_config(config),
            store: Arc::new(HashStore::new()),
            queue: Arc::new(FetchQueue::new()),
            signal: Arc::new(WakeSignal::new()),
            resolver,
            chunk_size: config.effective_chunk_size(),
            thread_name: config.thread_name.clone(),
            clear_on_shutdown: config.clear_on_shutdown,
            processed: Arc::new(AtomicU64::new(0)),
            worker: OnceCell::new(),
            intake: RwLock::new(()),
        }
    }

    /// Service with the default configuration
    pub fn with_resolver(resolver: Arc<dyn DeviceResolver>) -> Self {
        Self::new(&HasherConfig::default(), resolver)
    }

    /// Spawn the worker thread, at most once per service.
    ///
    /// Concurrent callers are serialized; only the call that actually spawned
    /// the thread returns `Ok(true)`.
    pub fn start_worker(&self) -> Result<bool> {
        let mut spawned = false;
        self.worker.get_or_try_init(|| {
            let worker = HashWorker {
                store: Arc::clone(&self.store),
                queue: Arc::clone(&self.queue),
                signal: Arc::clone(&self.signal),
                resolver: Arc::clone(&self.resolver),
                chunk_size: self.chunk_size,
                processed: Arc::clone(&self.processed),
            };
            let handle = worker
                .spawn(&self.thread_name)
                .map_err(ServiceError::WorkerSpawn)?;
            spawned = true;
            Ok::<_, ServiceError>(Mutex::new(Some(handle)))
        })?;

        if spawned {
            vfhash_config::log_service_info!(
                "Hash worker spawned",
                thread = self.thread_name.as_str()
            );
        }
        Ok(spawned)
    }

    pub fn is_worker_started(&self) -> bool {
        self.worker.get().is_some()
    }

    /// Accept a path for hashing.
    ///
    /// Returns `false` without side effects when the path is not whitelisted.
    /// Re-submitting a known path queues a fresh computation.
    pub fn submit_fetch(&self, path: &str) -> bool {
        if !self.validator.is_whitelisted(path) {
            vfhash_config::log_service_debug!("Rejected path", path = path);
            return false;
        }

        {
            let _intake = self.intake.read().unwrap_or_else(PoisonError::into_inner);
            self.store.put(path, HashState::Pending);
            self.queue.push(path);
        }
        self.signal.notify();
        true
    }

    /// Digest if ready, `""` while pending, `"missing"` for failed or unknown
    /// paths, `"error"` for partial reads and `"cancelled"` for work dropped
    /// at session shutdown.
    pub fn query_hash(&self, path: &str) -> String {
        self.store
            .get(path)
            .map(|state| state.as_query_str().to_string())
            .unwrap_or_else(|| HashState::MISSING.to_string())
    }

    /// Known and no longer pending
    pub fn is_ready(&self, path: &str) -> bool {
        self.store.is_ready(path)
    }

    /// Full state of a path, if it was ever submitted
    pub fn state(&self, path: &str) -> Option<HashState> {
        self.store.get(path)
    }

    /// Return and forget a finished result. Pending paths are left alone.
    pub fn take_hash(&self, path: &str) -> Option<HashState> {
        self.store.take_terminal(path)
    }

    /// Drop queued work, cancelling the paths it belonged to.
    ///
    /// A hash already being computed still completes and stores its result.
    /// Returns the number of queue entries removed.
    pub fn drain_pending(&self) -> usize {
        let intake = self.intake.write().unwrap_or_else(PoisonError::into_inner);
        let drained = self.queue.drain_all();
        let cancelled = drained
            .iter()
            .filter(|path| self.store.cancel_if_pending(path))
            .count();

        if self.clear_on_shutdown {
            self.store.clear();
        }
        drop(intake);

        vfhash_config::log_service_info!(
            "Fetch queue drained",
            drained = drained.len(),
            cancelled = cancelled,
            cleared = self.clear_on_shutdown
        );
        drained.len()
    }

    /// Poll until the path reaches a terminal state or `timeout` passes.
    ///
    /// A timeout too large to represent waits without a deadline.
    /// Convenience for tools and tests; the service itself never blocks callers.
    pub fn wait_until_ready(&self, path: &str, timeout: Duration) -> Option<HashState> {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            if let Some(state) = self.store.get(path).filter(HashState::is_terminal) {
                return Some(state);
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return None;
            }
            std::thread::sleep(READY_POLL_INTERVAL);
        }
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            queued: self.queue.len() as u64,
            ..self.store.stats()
        }
    }

    /// Paths hashed by the worker so far
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn validator(&self) -> &PathValidator {
        &self.validator
    }

    /// Stop the worker after its current item and wait for it to exit.
    ///
    /// The worker is not restarted afterwards; submissions are still recorded
    /// but stay pending.
    pub fn shutdown(&self) -> Result<()> {
        self.signal.close();

        let Some(slot) = self.worker.get() else {
            return Ok(());
        };
        let handle = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            handle.join().map_err(|_| ServiceError::WorkerPanicked)?;
            vfhash_config::log_service_info!("Hash worker joined", processed = self.processed());
        }
        Ok(())
    }
}

impl Drop for FileHashService {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::digest_bytes;
    use vfhash_device::{Device, MemoryDevice, MountTable};

    const WAIT: Duration = Duration::from_secs(5);

    fn service_with(files: &[(&str, &[u8])]) -> (Arc<MemoryDevice>, FileHashService) {
        let device = Arc::new(MemoryDevice::new());
        for (path, data) in files {
            device.insert(*path, data.to_vec());
        }
        let table = MountTable::new()
            .with("platform:/", device.clone() as Arc<dyn Device>)
            .unwrap();
        (device, FileHashService::with_resolver(Arc::new(table)))
    }

    #[test]
    fn test_rejected_path_has_no_side_effect() {
        let (_, service) = service_with(&[]);
        assert!(!service.submit_fetch("/etc/passwd"));
        assert!(service.state("/etc/passwd").is_none());
        assert_eq!(service.query_hash("/etc/passwd"), "missing");
        assert!(!service.is_ready("/etc/passwd"));
        assert_eq!(service.stats(), StoreStats::default());
    }

    #[test]
    fn test_pending_before_worker_runs() {
        let (_, service) = service_with(&[("platform:/a", b"a")]);
        assert!(service.submit_fetch("platform:/a"));
        assert!(!service.is_ready("platform:/a"));
        assert_eq!(service.query_hash("platform:/a"), "");
        assert_eq!(service.stats().queued, 1);
        assert_eq!(service.stats().pending, 1);
    }

    #[test]
    fn test_submit_then_start_hashes() {
        let (_, service) = service_with(&[("platform:/a", b"hello")]);
        // Submission before the worker exists must still be processed
        assert!(service.submit_fetch("platform:/a"));
        assert!(service.start_worker().unwrap());

        let state = service.wait_until_ready("platform:/a", WAIT).unwrap();
        assert_eq!(state, HashState::Ready(digest_bytes(b"hello")));
        assert_eq!(service.query_hash("platform:/a"), digest_bytes(b"hello").as_str());
    }

    #[test]
    fn test_start_worker_idempotent() {
        let (_, service) = service_with(&[]);
        assert!(service.start_worker().unwrap());
        assert!(!service.start_worker().unwrap());
        assert!(service.is_worker_started());
        service.shutdown().unwrap();
        // Still a no-op after shutdown
        assert!(!service.start_worker().unwrap());
    }

    #[test]
    fn test_unresolvable_becomes_missing() {
        let (_, service) = service_with(&[]);
        service.start_worker().unwrap();
        assert!(service.submit_fetch("common:/nothing/mounted"));
        assert_eq!(
            service.wait_until_ready("common:/nothing/mounted", WAIT),
            Some(HashState::Missing)
        );
        assert!(service.is_ready("common:/nothing/mounted"));
        assert_eq!(service.query_hash("common:/nothing/mounted"), "missing");
    }

    #[test]
    fn test_drain_cancels_queued_paths() {
        let (_, service) = service_with(&[("platform:/a", b"a"), ("platform:/b", b"b")]);
        service.submit_fetch("platform:/a");
        service.submit_fetch("platform:/b");

        assert_eq!(service.drain_pending(), 2);
        assert!(service.is_ready("platform:/a"));
        assert_eq!(service.query_hash("platform:/a"), "cancelled");
        assert_eq!(service.stats().cancelled, 2);
        assert_eq!(service.stats().queued, 0);
    }

    #[test]
    fn test_take_hash_evicts_terminal_only() {
        let (_, service) = service_with(&[("platform:/a", b"a")]);
        service.submit_fetch("platform:/a");
        assert!(service.take_hash("platform:/a").is_none());

        service.start_worker().unwrap();
        service.wait_until_ready("platform:/a", WAIT).unwrap();
        assert_eq!(
            service.take_hash("platform:/a"),
            Some(HashState::Ready(digest_bytes(b"a")))
        );
        assert!(service.state("platform:/a").is_none());
        assert_eq!(service.query_hash("platform:/a"), "missing");
    }

    #[test]
    fn test_oversized_chunk_config_still_hashes() {
        let device = Arc::new(MemoryDevice::new());
        device.insert("platform:/a", b"payload".to_vec());
        let table = MountTable::new()
            .with("platform:/", device as Arc<dyn Device>)
            .unwrap();
        let config = HasherConfig {
            chunk_size: usize::MAX,
            ..Default::default()
        };
        let service = FileHashService::new(&config, Arc::new(table));
        service.start_worker().unwrap();

        assert!(service.submit_fetch("platform:/a"));
        assert_eq!(
            service.wait_until_ready("platform:/a", WAIT),
            Some(HashState::Ready(digest_bytes(b"payload")))
        );
    }

    #[test]
    fn test_unbounded_wait() {
        let (_, service) = service_with(&[("platform:/a", b"a")]);
        service.start_worker().unwrap();
        service.submit_fetch("platform:/a");
        assert_eq!(
            service.wait_until_ready("platform:/a", Duration::MAX),
            Some(HashState::Ready(digest_bytes(b"a")))
        );
    }

    #[test]
    fn test_drain_never_cancels_live_submissions() {
        // No worker: every queued path stays pending until a drain cancels it
        let (_, service) = service_with(&[]);
        let service = Arc::new(service);

        let submitters: Vec<_> = (0..4)
            .map(|t| {
                let service = Arc::clone(&service);
                std::thread::spawn(move || {
                    for i in 0..500 {
                        assert!(service.submit_fetch(&format!("platform:/{}/{}", t, i)));
                    }
                })
            })
            .collect();
        for _ in 0..200 {
            service.drain_pending();
        }
        for s in submitters {
            s.join().unwrap();
        }

        // Each path was submitted once: a queued path must still be pending
        let stats = service.stats();
        assert_eq!(stats.queued, stats.pending);
        assert_eq!(stats.pending + stats.cancelled, 2000);
    }

    #[test]
    fn test_wait_times_out_without_worker() {
        let (_, service) = service_with(&[("platform:/a", b"a")]);
        service.submit_fetch("platform:/a");
        assert!(service
            .wait_until_ready("platform:/a", Duration::from_millis(20))
            .is_none());
    }
}
