//! FIFO of paths waiting to be hashed.

use crossbeam::queue::SegQueue;

/// Unbounded lock-free FIFO of virtual paths.
///
/// Pushing never blocks. The same path may be queued more than once.
#[derive(Debug, Default)]
pub struct FetchQueue {
    items: SegQueue<String>,
}

impl FetchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, path: impl Into<String>) {
        self.items.push(path.into());
    }

    pub fn try_pop(&self) -> Option<String> {
        self.items.pop()
    }

    /// Remove everything queued right now, in FIFO order.
    pub fn drain_all(&self) -> Vec<String> {
        std::iter::from_fn(|| self.items.pop()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let queue = FetchQueue::new();
        queue.push("a");
        queue.push("b");
        queue.push("a");

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.try_pop().as_deref(), Some("a"));
        assert_eq!(queue.try_pop().as_deref(), Some("b"));
        assert_eq!(queue.try_pop().as_deref(), Some("a"));
        assert!(queue.try_pop().is_none());
    }

    #[test]
    fn test_drain_all() {
        let queue = FetchQueue::new();
        for i in 0..5 {
            queue.push(format!("p{}", i));
        }
        let drained = queue.drain_all();
        assert_eq!(drained, vec!["p0", "p1", "p2", "p3", "p4"]);
        assert!(queue.is_empty());
        assert!(queue.drain_all().is_empty());
    }

    #[test]
    fn test_concurrent_producers() {
        let queue = Arc::new(FetchQueue::new());
        let producers: Vec<_> = (0..8)
            .map(|t| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..250 {
                        queue.push(format!("{}-{}", t, i));
                    }
                })
            })
            .collect();
        for p in producers {
            p.join().unwrap();
        }
        assert_eq!(queue.drain_all().len(), 2000);
    }
}
