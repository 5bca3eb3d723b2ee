//! Per-peer send queue
//!
//! Each remote peer gets one queue of URLs awaiting transmission. Membership
//! is a set (a URL queued twice sends once), the send loop blocks on a
//! condition variable, and overflow evicts an arbitrary half so a dead peer
//! cannot pin unbounded memory.

use std::collections::HashSet;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::net::Url;

/// Cap on queued URLs per peer; overflow evicts down to half
pub const PEER_QUEUE_CAP: usize = 1_000_000;

/// URLs awaiting transmission to one remote peer
pub struct PeerQueue {
    pending: Mutex<HashSet<Url>>,
    ready: Condvar,
}

impl Default for PeerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerQueue {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashSet::new()),
            ready: Condvar::new(),
        }
    }

    /// Enqueue a URL and wake the send loop.
    pub fn push(&self, url: Url) {
        self.pending.lock().insert(url);
        self.ready.notify_one();
    }

    /// Block until a URL is available, then take one (arbitrary order).
    /// Returns `None` once `alive` reports false. Trims overflow before
    /// handing anything out.
    pub fn pop_wait<F>(&self, alive: F) -> Option<Url>
    where
        F: Fn() -> bool,
    {
        let mut pending = self.pending.lock();
        while pending.is_empty() {
            if !alive() {
                return None;
            }
            // Bounded wait so a missed wakeup cannot stall shutdown.
            self.ready.wait_for(&mut pending, Duration::from_millis(500));
        }

        Self::trim(&mut pending, PEER_QUEUE_CAP);
        let url = pending.iter().next().cloned()?;
        pending.remove(&url);
        Some(url)
    }

    /// Evict down to half the cap if over it. Called from the send loop and
    /// from the reconnect back-off, where the queue keeps growing while the
    /// peer is away.
    pub fn trim_overflow(&self) -> usize {
        Self::trim(&mut self.pending.lock(), PEER_QUEUE_CAP)
    }

    fn trim(pending: &mut HashSet<Url>, cap: usize) -> usize {
        if pending.len() <= cap {
            return 0;
        }
        let excess = pending.len() - cap / 2;
        let victims: Vec<Url> = pending.iter().take(excess).cloned().collect();
        for victim in &victims {
            pending.remove(victim);
        }
        excess
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Whether a URL is currently queued.
    pub fn contains(&self, url: &Url) -> bool {
        self.pending.lock().contains(url)
    }

    /// Wake the send loop so it can observe shutdown.
    pub fn wake_all(&self) {
        self.ready.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(i: usize) -> Url {
        Url::parse(&format!("http://peer.test/{i}")).unwrap()
    }

    #[test]
    fn push_then_pop() {
        let queue = PeerQueue::new();
        queue.push(url(1));
        queue.push(url(1));
        queue.push(url(2));
        assert_eq!(queue.len(), 2);

        assert!(queue.pop_wait(|| true).is_some());
        assert!(queue.pop_wait(|| true).is_some());
        assert!(queue.is_empty());
    }

    #[test]
    fn pop_returns_none_when_not_alive() {
        let queue = PeerQueue::new();
        assert_eq!(queue.pop_wait(|| false), None);
    }

    #[test]
    fn pop_wakes_on_concurrent_push() {
        use std::sync::Arc;

        let queue = Arc::new(PeerQueue::new());
        let producer = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(50));
                queue.push(url(7));
            })
        };
        let popped = queue.pop_wait(|| true);
        assert_eq!(popped, Some(url(7)));
        producer.join().unwrap();
    }

    #[test]
    fn overflow_evicts_to_half() {
        let mut pending: HashSet<Url> = (0..110).map(url).collect();

        // Over a cap of 100: evict down to 50.
        let evicted = PeerQueue::trim(&mut pending, 100);
        assert_eq!(evicted, 60);
        assert_eq!(pending.len(), 50);

        // Under the cap nothing is touched.
        assert_eq!(PeerQueue::trim(&mut pending, 100), 0);
        assert_eq!(pending.len(), 50);
    }
}
