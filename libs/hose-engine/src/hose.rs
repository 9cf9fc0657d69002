use std::sync::Arc;
use std::time::Instant;

use plasma_api::{
    AwaitOutcome, Notifier, PoolError, PoolServer, PoolStore, Timeout, Tributary,
};
use plasma_slaw::{Origin, Protein, Slaw};

// ═══════════════════════════════════════════════════════════════
//  Hose
// ═══════════════════════════════════════════════════════════════

/// A single participant's connection to one pool: a read cursor plus
/// deposit access.
///
/// A fresh hose's cursor sits just past the newest protein, so the first
/// blocking read waits for the next deposit. Seek operations move the
/// cursor anywhere inside the retained window; a cursor that falls behind
/// eviction snaps forward to the oldest retained protein.
pub struct Hose {
    name: String,
    pool: Option<Arc<dyn PoolStore>>,
    index: u64,
    notifier: Notifier,
    // gang notifiers registered through attach; withdraw must unregister
    // them too, or dropping a gang leaves them in the pool forever
    attached: Vec<Notifier>,
}

impl Hose {
    /// Connect to an existing pool.
    pub fn participate(server: &dyn PoolServer, pool: &str) -> Result<Hose, PoolError> {
        Ok(Hose::from_store(server.participate(pool)?))
    }

    /// Connect, creating the pool first if needed.
    pub fn participate_creatingly(
        server: &dyn PoolServer,
        pool: &str,
        options: &Slaw,
    ) -> Result<Hose, PoolError> {
        Ok(Hose::from_store(server.participate_creatingly(pool, options)?))
    }

    pub fn from_store(pool: Arc<dyn PoolStore>) -> Hose {
        let notifier = Notifier::new();
        pool.register(&notifier);
        let index = pool.newest_index().map_or(0, |n| n + 1);
        Hose {
            name: pool.name().to_string(),
            pool: Some(pool),
            index,
            notifier,
            attached: Vec::new(),
        }
    }

    fn store(&self) -> Result<&Arc<dyn PoolStore>, PoolError> {
        self.pool.as_ref().ok_or(PoolError::Withdrawn)
    }

    pub fn is_withdrawn(&self) -> bool {
        self.pool.is_none()
    }

    /// Append a protein to the pool.
    pub fn deposit(&self, protein: Protein) -> Result<u64, PoolError> {
        self.store()?.deposit(protein)
    }

    // ── cursor movement ─────────────────────────────────────────

    pub fn current_index(&self) -> u64 {
        self.index
    }

    pub fn oldest_index(&self) -> Result<Option<u64>, PoolError> {
        Ok(self.store()?.oldest_index())
    }

    pub fn newest_index(&self) -> Result<Option<u64>, PoolError> {
        Ok(self.store()?.newest_index())
    }

    /// Move to the oldest retained protein.
    pub fn rewind(&mut self) -> Result<(), PoolError> {
        self.index = self.store()?.oldest_index().unwrap_or(0);
        Ok(())
    }

    /// Move to the newest protein, so the next read re-reads it.
    pub fn to_last(&mut self) -> Result<(), PoolError> {
        let store = self.store()?;
        self.index = store.newest_index().unwrap_or(0);
        Ok(())
    }

    /// Move just past the newest protein; only future deposits arrive.
    pub fn runout(&mut self) -> Result<(), PoolError> {
        let store = self.store()?;
        self.index = store.newest_index().map_or(0, |n| n + 1);
        Ok(())
    }

    pub fn seek_to(&mut self, index: u64) -> Result<(), PoolError> {
        self.store()?;
        self.index = index;
        Ok(())
    }

    /// Move the cursor by a signed offset, saturating at zero.
    pub fn seek_by(&mut self, offset: i64) -> Result<(), PoolError> {
        self.store()?;
        self.index = self.index.saturating_add_signed(offset);
        Ok(())
    }

    /// Fetch by absolute index without moving the cursor.
    pub fn nth(&self, index: u64) -> Result<Protein, PoolError> {
        let got = self.store()?.nth(index)?;
        Ok(self.stamp(got.protein, got.index, got.timestamp))
    }

    /// Fetch up to `count` consecutive proteins starting at `start`
    /// (`None` starts at the current cursor and advances it past what
    /// was returned). Stops early at the end of the retained window.
    pub fn fetch(&mut self, count: usize, start: Option<u64>) -> Result<Vec<Protein>, PoolError> {
        let store = self.store()?;
        let from_cursor = start.is_none();
        let mut at = start.unwrap_or(self.index);
        if let Some(oldest) = store.oldest_index() {
            at = at.max(oldest);
        }
        let mut out = Vec::new();
        while out.len() < count {
            match store.newest_index() {
                Some(newest) if at <= newest => {
                    let got = store.nth(at)?;
                    out.push(self.stamp(got.protein, got.index, got.timestamp));
                    at += 1;
                }
                _ => break,
            }
        }
        if from_cursor {
            self.index = at;
        }
        Ok(out)
    }

    /// Discard retained proteins below `index`.
    pub fn advance_oldest(&self, index: u64) -> Result<(), PoolError> {
        self.store()?.advance_oldest(index)
    }

    pub fn is_empty(&self) -> Result<bool, PoolError> {
        Ok(self.store()?.newest_index().is_none())
    }

    /// The pool's descriptive map.
    pub fn info(&self, hops: u32) -> Result<Slaw, PoolError> {
        Ok(self.store()?.info(hops))
    }

    pub fn change_options(&self, options: &Slaw) -> Result<(), PoolError> {
        self.store()?.change_options(options)
    }

    fn stamp(
        &self,
        protein: Protein,
        index: u64,
        timestamp: std::time::SystemTime,
    ) -> Protein {
        protein.with_origin(Origin {
            hose: self.name.clone(),
            index,
            timestamp,
        })
    }
}

impl Tributary for Hose {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&mut self) -> Result<Option<Protein>, PoolError> {
        let pool = self.pool.as_ref().ok_or(PoolError::Withdrawn)?;
        let Some(newest) = pool.newest_index() else {
            return Ok(None);
        };
        if let Some(oldest) = pool.oldest_index() {
            if self.index < oldest {
                tracing::debug!(
                    hose = %self.name,
                    cursor = self.index,
                    oldest,
                    "cursor fell behind eviction, snapping forward"
                );
                self.index = oldest;
            }
        }
        if self.index > newest {
            return Ok(None);
        }
        let got = pool.nth(self.index)?;
        self.index += 1;
        Ok(Some(self.stamp(got.protein, got.index, got.timestamp)))
    }

    fn next(&mut self, timeout: Timeout) -> Result<AwaitOutcome, PoolError> {
        let deadline = timeout.bound().map(|d| Instant::now() + d);
        loop {
            // snapshot before the storage check so a deposit in between
            // still wakes the wait
            let seen = self.notifier.generation();
            if let Some(p) = self.poll()? {
                return Ok(AwaitOutcome::Arrived(p));
            }
            if timeout.is_no_wait() {
                return Ok(AwaitOutcome::Nothing);
            }
            let remaining = match deadline {
                None => None,
                Some(d) => {
                    let now = Instant::now();
                    if now >= d {
                        return Ok(AwaitOutcome::TimedOut);
                    }
                    Some(d - now)
                }
            };
            self.notifier.wait_beyond(seen, remaining);
        }
    }

    fn addable(&self) -> bool {
        !self.is_withdrawn()
    }

    fn attach(&mut self, notifier: &Notifier) {
        if let Some(pool) = &self.pool {
            pool.register(notifier);
            self.attached.push(notifier.clone());
        }
    }

    fn detach(&mut self, notifier: &Notifier) {
        if let Some(pool) = &self.pool {
            pool.unregister(notifier);
        }
        self.attached.retain(|n| n.id() != notifier.id());
    }

    fn withdraw(&mut self) -> Result<(), PoolError> {
        if let Some(pool) = self.pool.take() {
            pool.unregister(&self.notifier);
            for notifier in self.attached.drain(..) {
                pool.unregister(&notifier);
            }
        }
        Ok(())
    }
}

impl Drop for Hose {
    fn drop(&mut self) {
        let _ = self.withdraw();
    }
}
