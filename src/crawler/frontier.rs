//! Crawl frontier: the shared set of URLs pending crawl
//!
//! Membership is order-irrelevant; the scheduler imposes its own ordering by
//! score at dequeue time. The set is soft-bounded: a garbage-collection pass
//! evicts an arbitrary subset down to half the cap whenever the cap is
//! exceeded. Dequeuers block on a condition variable until enough URLs are
//! available to sample from.

use std::collections::HashSet;
use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::net::Url;

/// Soft cap on frontier size; GC evicts down to half of this
pub const FRONTIER_SIZE_LIMIT: usize = 1_000_000;

/// Shared pending-crawl URL set
pub struct Frontier {
    urls: Mutex<HashSet<Url>>,
    added: Condvar,
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}

impl Frontier {
    pub fn new() -> Self {
        Self {
            urls: Mutex::new(HashSet::new()),
            added: Condvar::new(),
        }
    }

    /// Insert a URL and wake one waiting dequeuer. The caller is responsible
    /// for the scheduled-set check.
    pub fn insert(&self, url: Url) {
        self.urls.lock().insert(url);
        self.added.notify_one();
    }

    /// Lock the underlying set directly. The scheduler and the checkpoint
    /// engine work on the guard so they can hold the frontier lock across a
    /// multi-step critical section.
    pub fn guard(&self) -> MutexGuard<'_, HashSet<Url>> {
        self.urls.lock()
    }

    /// Re-insert a batch leftover and wake dequeuers if anything went back.
    pub fn insert_all(&self, urls: impl IntoIterator<Item = Url>) {
        let mut guard = self.urls.lock();
        let mut inserted = false;
        for url in urls {
            guard.insert(url);
            inserted = true;
        }
        drop(guard);
        if inserted {
            self.added.notify_all();
        }
    }

    /// Block until `ready(set)` holds, re-checking roughly twice a second so
    /// shutdown is observed even if a wakeup goes missing.
    pub fn wait_until<F>(&self, guard: &mut MutexGuard<'_, HashSet<Url>>, ready: F)
    where
        F: Fn(&HashSet<Url>) -> bool,
    {
        while !ready(guard) {
            self.added
                .wait_for(guard, Duration::from_millis(500));
        }
    }

    /// Wake one waiting dequeuer.
    pub fn wake_one(&self) {
        self.added.notify_one();
    }

    /// Wake every waiting dequeuer (used on shutdown).
    pub fn wake_all(&self) {
        self.added.notify_all();
    }

    pub fn len(&self) -> usize {
        self.urls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.lock().is_empty()
    }

    /// Evict an arbitrary subset down to `limit / 2` when the set exceeds
    /// `limit`. Returns the number of evicted URLs.
    pub fn evict_excess(&self, limit: usize) -> usize {
        let mut guard = self.urls.lock();
        if guard.len() <= limit {
            return 0;
        }
        let target = limit / 2;
        let excess = guard.len() - target;
        let victims: Vec<Url> = guard.iter().take(excess).cloned().collect();
        for victim in &victims {
            guard.remove(victim);
        }
        excess
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(i: usize) -> Url {
        Url::parse(&format!("http://example.com/{i}")).unwrap()
    }

    #[test]
    fn insert_deduplicates() {
        let frontier = Frontier::new();
        frontier.insert(url(1));
        frontier.insert(url(1));
        frontier.insert(url(2));
        assert_eq!(frontier.len(), 2);
    }

    #[test]
    fn evict_excess_halves_when_over_limit() {
        let frontier = Frontier::new();
        for i in 0..100 {
            frontier.insert(url(i));
        }

        assert_eq!(frontier.evict_excess(100), 0);
        assert_eq!(frontier.len(), 100);

        frontier.insert(url(100));
        let evicted = frontier.evict_excess(100);
        assert_eq!(evicted, 51);
        assert_eq!(frontier.len(), 50);
    }

    #[test]
    fn wait_until_observes_inserts_from_another_thread() {
        use std::sync::Arc;

        let frontier = Arc::new(Frontier::new());
        let producer = {
            let frontier = Arc::clone(&frontier);
            std::thread::spawn(move || {
                for i in 0..10 {
                    frontier.insert(url(i));
                }
            })
        };

        let mut guard = frontier.guard();
        frontier.wait_until(&mut guard, |set| set.len() >= 10);
        assert!(guard.len() >= 10);
        drop(guard);
        producer.join().unwrap();
    }
}
