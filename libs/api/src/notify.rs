use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

// ═══════════════════════════════════════════════════════════════
//  Notifier — deposit wakeup primitive
// ═══════════════════════════════════════════════════════════════

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

struct Inner {
    generation: Mutex<u64>,
    cond: Condvar,
}

/// Generation-counted condition variable shared between a waiting reader
/// and the pools it listens to.
///
/// A reader snapshots the generation, re-checks its pools, then waits for
/// the generation to move past the snapshot. A deposit that lands between
/// the re-check and the wait bumps the generation first, so the wait
/// returns immediately and no wakeup is ever lost.
#[derive(Clone)]
pub struct Notifier {
    id: u64,
    inner: Arc<Inner>,
}

impl Notifier {
    pub fn new() -> Notifier {
        Notifier {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            inner: Arc::new(Inner {
                generation: Mutex::new(0),
                cond: Condvar::new(),
            }),
        }
    }

    /// Stable identity for registration bookkeeping. Clones share it.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current generation; pass to [`Notifier::wait_beyond`] later.
    pub fn generation(&self) -> u64 {
        *self.inner.generation.lock()
    }

    /// Wake all waiters. Called by pools on every deposit.
    pub fn notify(&self) {
        let mut generation = self.inner.generation.lock();
        *generation = generation.wrapping_add(1);
        self.inner.cond.notify_all();
    }

    /// Block until the generation moves past `seen` or `timeout` elapses.
    /// `None` waits indefinitely. Returns true when a notification
    /// arrived, false on timeout.
    pub fn wait_beyond(&self, seen: u64, timeout: Option<Duration>) -> bool {
        let mut generation = self.inner.generation.lock();
        while *generation == seen {
            match timeout {
                None => self.inner.cond.wait(&mut generation),
                Some(dur) => {
                    if self.inner.cond.wait_for(&mut generation, dur).timed_out() {
                        return *generation != seen;
                    }
                }
            }
        }
        true
    }
}

impl Default for Notifier {
    fn default() -> Notifier {
        Notifier::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn notify_before_wait_is_not_lost() {
        let n = Notifier::new();
        let seen = n.generation();
        n.notify();
        // generation already advanced, wait must return at once
        assert!(n.wait_beyond(seen, Some(Duration::from_millis(1))));
    }

    #[test]
    fn wait_times_out_without_notify() {
        let n = Notifier::new();
        let seen = n.generation();
        let start = Instant::now();
        assert!(!n.wait_beyond(seen, Some(Duration::from_millis(20))));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn cross_thread_wakeup() {
        let n = Notifier::new();
        let seen = n.generation();
        let remote = n.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            remote.notify();
        });
        assert!(n.wait_beyond(seen, Some(Duration::from_secs(5))));
        handle.join().unwrap();
    }

    #[test]
    fn clones_share_identity_and_state() {
        let a = Notifier::new();
        let b = a.clone();
        assert_eq!(a.id(), b.id());
        let seen = a.generation();
        b.notify();
        assert_ne!(a.generation(), seen);
    }
}
