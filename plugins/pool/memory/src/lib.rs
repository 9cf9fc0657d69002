use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;

use plasma_api::{Deposited, Notifier, PoolError, PoolServer, PoolStore};
use plasma_slaw::{Protein, Slaw};

// ═══════════════════════════════════════════════════════════════
//  PoolOptions
// ═══════════════════════════════════════════════════════════════

fn default_size() -> usize {
    1024 * 1024
}

/// Creation options of an in-memory pool, taken from the options slaw
/// map. Keys use the traditional hyphenated spelling.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PoolOptions {
    /// Byte budget for retained proteins; the oldest deposits are
    /// discarded beyond it.
    #[serde(default = "default_size")]
    pub size: usize,

    /// Fail deposits with `PoolFull` instead of evicting.
    #[serde(default)]
    pub stop_when_full: bool,

    /// Reject all deposits with `PoolFrozen`.
    #[serde(default)]
    pub frozen: bool,

    /// Remove the pool from the registry once the last participant
    /// withdraws.
    #[serde(default)]
    pub auto_dispose: bool,

    /// Accepted for compatibility; a memory pool has nothing to sync.
    #[serde(default)]
    pub sync: bool,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            size: default_size(),
            stop_when_full: false,
            frozen: false,
            auto_dispose: false,
            sync: false,
        }
    }
}

impl PoolOptions {
    /// Parse from an options slaw: nil means defaults, a map is decoded
    /// field by field, anything else is an invalid configuration.
    pub fn from_slaw(options: &Slaw) -> Result<PoolOptions, PoolError> {
        if options.is_nil() {
            return Ok(PoolOptions::default());
        }
        if !options.is_map() {
            return Err(PoolError::InvalidConfiguration(
                "pool options must be a map or nil".into(),
            ));
        }
        let opts: PoolOptions = serde_json::from_value(options.to_untagged_json())
            .map_err(|e| PoolError::InvalidConfiguration(e.to_string()))?;
        if opts.size == 0 {
            return Err(PoolError::InvalidConfiguration(
                "size must be at least 1 byte".into(),
            ));
        }
        Ok(opts)
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryPool
// ═══════════════════════════════════════════════════════════════

struct Entry {
    dep: Deposited,
    cost: usize,
}

struct Ring {
    /// Index of the oldest retained protein.
    base: u64,
    used: usize,
    items: VecDeque<Entry>,
}

/// Estimated retained cost of a protein: its text-encoded length.
fn protein_cost(protein: &Protein) -> usize {
    protein.slaw().encode_text().len()
}

/// In-memory ring-buffer pool. Indices are assigned at deposit and never
/// renumber; eviction advances the retained window's oldest end.
pub struct MemoryPool {
    name: String,
    options: Mutex<PoolOptions>,
    ring: Mutex<Ring>,
    notifiers: Mutex<Vec<Notifier>>,
    /// Set on first participate; auto-dispose only fires after it.
    participated: AtomicBool,
}

impl MemoryPool {
    pub fn new(name: impl Into<String>, options: PoolOptions) -> Self {
        Self {
            name: name.into(),
            options: Mutex::new(options),
            ring: Mutex::new(Ring {
                base: 0,
                used: 0,
                items: VecDeque::new(),
            }),
            notifiers: Mutex::new(Vec::new()),
            participated: AtomicBool::new(false),
        }
    }

    fn evict_to(ring: &mut Ring, budget: usize, incoming: usize) {
        while !ring.items.is_empty() && ring.used + incoming > budget {
            if let Some(evicted) = ring.items.pop_front() {
                ring.used -= evicted.cost;
                ring.base += 1;
            }
        }
    }
}

impl PoolStore for MemoryPool {
    fn name(&self) -> &str {
        &self.name
    }

    fn deposit(&self, protein: Protein) -> Result<u64, PoolError> {
        let opts = self.options.lock().clone();
        if opts.frozen {
            return Err(PoolError::PoolFrozen(self.name.clone()));
        }
        let cost = protein_cost(&protein);
        if cost > opts.size {
            return Err(PoolError::PoolFull(self.name.clone()));
        }
        let index = {
            let mut ring = self.ring.lock();
            if ring.used + cost > opts.size {
                if opts.stop_when_full {
                    return Err(PoolError::PoolFull(self.name.clone()));
                }
                MemoryPool::evict_to(&mut ring, opts.size, cost);
            }
            let index = ring.base + ring.items.len() as u64;
            ring.used += cost;
            ring.items.push_back(Entry {
                dep: Deposited {
                    protein,
                    index,
                    timestamp: SystemTime::now(),
                },
                cost,
            });
            index
        };
        tracing::trace!(pool = %self.name, index, cost, "deposit");
        // wake waiters only after the protein is visible
        for notifier in self.notifiers.lock().iter() {
            notifier.notify();
        }
        Ok(index)
    }

    fn oldest_index(&self) -> Option<u64> {
        let ring = self.ring.lock();
        (!ring.items.is_empty()).then_some(ring.base)
    }

    fn newest_index(&self) -> Option<u64> {
        let ring = self.ring.lock();
        (!ring.items.is_empty()).then(|| ring.base + ring.items.len() as u64 - 1)
    }

    fn nth(&self, index: u64) -> Result<Deposited, PoolError> {
        let ring = self.ring.lock();
        index
            .checked_sub(ring.base)
            .and_then(|off| ring.items.get(off as usize))
            .map(|e| e.dep.clone())
            .ok_or_else(|| PoolError::NoSuchProtein {
                pool: self.name.clone(),
                index,
            })
    }

    fn advance_oldest(&self, index: u64) -> Result<(), PoolError> {
        let mut ring = self.ring.lock();
        while ring.base < index {
            match ring.items.pop_front() {
                Some(evicted) => {
                    ring.used -= evicted.cost;
                    ring.base += 1;
                }
                None => {
                    // window is empty; future deposits start at `index`
                    ring.base = index;
                    break;
                }
            }
        }
        Ok(())
    }

    fn info(&self, _hops: u32) -> Slaw {
        let opts = self.options.lock().clone();
        let ring = self.ring.lock();
        Slaw::map(vec![
            ("type", Slaw::from("memory")),
            ("terminal", Slaw::from(true)),
            ("name", Slaw::from(self.name.as_str())),
            ("size", Slaw::from(opts.size as u64)),
            ("size-used", Slaw::from(ring.used as u64)),
            ("stop-when-full", Slaw::from(opts.stop_when_full)),
            ("frozen", Slaw::from(opts.frozen)),
            ("auto-dispose", Slaw::from(opts.auto_dispose)),
            ("sync", Slaw::from(opts.sync)),
            ("index-count", Slaw::from(ring.items.len() as u64)),
        ])
    }

    fn change_options(&self, options: &Slaw) -> Result<(), PoolError> {
        if !options.is_map() {
            return Err(PoolError::InvalidConfiguration(
                "options must be a map".into(),
            ));
        }
        let mut opts = self.options.lock();
        for i in 0..options.count() as i64 {
            let pair = options.nth(i).map_err(PoolError::Slaw)?;
            let key = pair.car().map_err(PoolError::Slaw)?;
            let value = pair.cdr().map_err(PoolError::Slaw)?;
            let bad = |what: &str| {
                PoolError::InvalidConfiguration(format!("{key} must be {what}"))
            };
            match key.as_str() {
                Some("size") => {
                    let size = value.as_u64().ok_or_else(|| bad("a positive integer"))?;
                    if size == 0 {
                        return Err(bad("a positive integer"));
                    }
                    opts.size = size as usize;
                }
                Some("stop-when-full") => {
                    opts.stop_when_full = value.as_bool().ok_or_else(|| bad("a boolean"))?;
                }
                Some("frozen") => {
                    opts.frozen = value.as_bool().ok_or_else(|| bad("a boolean"))?;
                }
                Some("auto-dispose") => {
                    opts.auto_dispose = value.as_bool().ok_or_else(|| bad("a boolean"))?;
                }
                Some("sync") => {
                    opts.sync = value.as_bool().ok_or_else(|| bad("a boolean"))?;
                }
                _ => {
                    tracing::warn!(pool = %self.name, key = %key, "unknown pool option ignored");
                }
            }
        }
        // a shrunk budget takes effect at once
        let mut ring = self.ring.lock();
        MemoryPool::evict_to(&mut ring, opts.size, 0);
        Ok(())
    }

    fn register(&self, notifier: &Notifier) {
        let mut notifiers = self.notifiers.lock();
        if notifiers.iter().all(|n| n.id() != notifier.id()) {
            notifiers.push(notifier.clone());
        }
    }

    fn unregister(&self, notifier: &Notifier) {
        self.notifiers.lock().retain(|n| n.id() != notifier.id());
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryPoolServer
// ═══════════════════════════════════════════════════════════════

/// Registry of in-memory pools, keyed by name. Participation is held by
/// `Arc`: dropping every participant handle releases the pool, and
/// auto-dispose pools are reaped at the next registry operation.
#[derive(Default)]
pub struct MemoryPoolServer {
    pools: Mutex<BTreeMap<String, Arc<MemoryPool>>>,
}

fn in_use(pool: &Arc<MemoryPool>) -> bool {
    // the registry holds one reference; more means live participants
    Arc::strong_count(pool) > 1
}

impl MemoryPoolServer {
    pub fn new() -> Self {
        Self::default()
    }

    fn sweep(pools: &mut BTreeMap<String, Arc<MemoryPool>>) {
        pools.retain(|name, pool| {
            let reap = pool.options.lock().auto_dispose
                && pool.participated.load(Ordering::Relaxed)
                && !in_use(pool);
            if reap {
                tracing::debug!(pool = %name, "auto-disposing pool");
            }
            !reap
        });
    }
}

impl PoolServer for MemoryPoolServer {
    fn create(&self, name: &str, options: &Slaw) -> Result<(), PoolError> {
        let opts = PoolOptions::from_slaw(options)?;
        let mut pools = self.pools.lock();
        MemoryPoolServer::sweep(&mut pools);
        if pools.contains_key(name) {
            return Err(PoolError::PoolExists(name.to_string()));
        }
        tracing::debug!(pool = name, size = opts.size, "create pool");
        pools.insert(name.to_string(), Arc::new(MemoryPool::new(name, opts)));
        Ok(())
    }

    fn dispose(&self, name: &str) -> Result<(), PoolError> {
        let mut pools = self.pools.lock();
        MemoryPoolServer::sweep(&mut pools);
        let pool = pools
            .get(name)
            .ok_or_else(|| PoolError::NoSuchPool(name.to_string()))?;
        if in_use(pool) {
            return Err(PoolError::PoolInUse(name.to_string()));
        }
        tracing::debug!(pool = name, "dispose pool");
        pools.remove(name);
        Ok(())
    }

    fn rename(&self, old: &str, new: &str) -> Result<(), PoolError> {
        let mut pools = self.pools.lock();
        MemoryPoolServer::sweep(&mut pools);
        if !pools.contains_key(old) {
            return Err(PoolError::NoSuchPool(old.to_string()));
        }
        if pools.contains_key(new) {
            return Err(PoolError::PoolExists(new.to_string()));
        }
        let mut pool = pools.remove(old).unwrap_or_else(|| unreachable!());
        match Arc::get_mut(&mut pool) {
            Some(inner) => inner.name = new.to_string(),
            None => {
                pools.insert(old.to_string(), pool);
                return Err(PoolError::PoolInUse(old.to_string()));
            }
        }
        tracing::debug!(from = old, to = new, "rename pool");
        pools.insert(new.to_string(), pool);
        Ok(())
    }

    fn is_in_use(&self, name: &str) -> Result<bool, PoolError> {
        let mut pools = self.pools.lock();
        MemoryPoolServer::sweep(&mut pools);
        pools
            .get(name)
            .map(in_use)
            .ok_or_else(|| PoolError::NoSuchPool(name.to_string()))
    }

    fn participate(&self, name: &str) -> Result<Arc<dyn PoolStore>, PoolError> {
        let mut pools = self.pools.lock();
        MemoryPoolServer::sweep(&mut pools);
        let pool = pools
            .get(name)
            .cloned()
            .ok_or_else(|| PoolError::NoSuchPool(name.to_string()))?;
        pool.participated.store(true, Ordering::Relaxed);
        Ok(pool)
    }

    fn participate_creatingly(
        &self,
        name: &str,
        options: &Slaw,
    ) -> Result<Arc<dyn PoolStore>, PoolError> {
        match self.create(name, options) {
            Ok(()) | Err(PoolError::PoolExists(_)) => {}
            Err(e) => return Err(e),
        }
        self.participate(name)
    }

    fn list_pools(&self) -> Vec<String> {
        let mut pools = self.pools.lock();
        MemoryPoolServer::sweep(&mut pools);
        pools.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protein(n: i64) -> Protein {
        Protein::new(Slaw::list(["test"]), Slaw::map([("n", n)]))
    }

    fn small_pool(budget_in_proteins: usize) -> MemoryPool {
        let unit = protein_cost(&protein(0));
        MemoryPool::new(
            "p",
            PoolOptions {
                size: unit * budget_in_proteins,
                ..PoolOptions::default()
            },
        )
    }

    #[test]
    fn indices_grow_and_survive_eviction() {
        let pool = small_pool(3);
        for n in 0..5 {
            assert_eq!(pool.deposit(protein(n)).unwrap(), n as u64);
        }
        // 0 and 1 evicted by the byte budget
        assert_eq!(pool.oldest_index(), Some(2));
        assert_eq!(pool.newest_index(), Some(4));
        assert!(matches!(
            pool.nth(1),
            Err(PoolError::NoSuchProtein { index: 1, .. })
        ));
        let got = pool.nth(3).unwrap();
        assert_eq!(got.index, 3);
        assert_eq!(got.protein, protein(3));
    }

    #[test]
    fn empty_pool_has_no_window() {
        let pool = small_pool(3);
        assert_eq!(pool.oldest_index(), None);
        assert_eq!(pool.newest_index(), None);
        assert!(pool.nth(0).is_err());
    }

    #[test]
    fn stop_when_full_refuses_instead_of_evicting() {
        let unit = protein_cost(&protein(0));
        let pool = MemoryPool::new(
            "p",
            PoolOptions {
                size: unit * 2,
                stop_when_full: true,
                ..PoolOptions::default()
            },
        );
        pool.deposit(protein(0)).unwrap();
        pool.deposit(protein(1)).unwrap();
        assert!(matches!(
            pool.deposit(protein(2)),
            Err(PoolError::PoolFull(_))
        ));
        // nothing was evicted
        assert_eq!(pool.oldest_index(), Some(0));
    }

    #[test]
    fn frozen_pool_rejects_deposits() {
        let pool = MemoryPool::new(
            "p",
            PoolOptions {
                frozen: true,
                ..PoolOptions::default()
            },
        );
        assert!(matches!(
            pool.deposit(protein(0)),
            Err(PoolError::PoolFrozen(_))
        ));
    }

    #[test]
    fn oversize_protein_never_fits() {
        let pool = MemoryPool::new(
            "p",
            PoolOptions {
                size: 4,
                ..PoolOptions::default()
            },
        );
        assert!(matches!(
            pool.deposit(protein(0)),
            Err(PoolError::PoolFull(_))
        ));
    }

    #[test]
    fn advance_oldest_discards_below() {
        let pool = small_pool(10);
        for n in 0..5 {
            pool.deposit(protein(n)).unwrap();
        }
        pool.advance_oldest(3).unwrap();
        assert_eq!(pool.oldest_index(), Some(3));
        assert!(pool.nth(2).is_err());
        assert_eq!(pool.nth(4).unwrap().index, 4);
    }

    #[test]
    fn info_reports_the_documented_map() {
        let pool = small_pool(10);
        pool.deposit(protein(0)).unwrap();
        let info = pool.info(0);
        assert_eq!(info.find(&Slaw::from("type")).unwrap().unwrap(), "memory");
        assert_eq!(info.find(&Slaw::from("terminal")).unwrap().unwrap(), true);
        assert_eq!(info.find(&Slaw::from("index-count")).unwrap().unwrap(), 1i64);
        assert_eq!(info.find(&Slaw::from("frozen")).unwrap().unwrap(), false);
    }

    #[test]
    fn change_options_mutates_and_evicts() {
        let unit = protein_cost(&protein(0));
        let pool = small_pool(10);
        for n in 0..5 {
            pool.deposit(protein(n)).unwrap();
        }
        pool.change_options(&Slaw::map([("size", Slaw::from((unit * 2) as u64))]))
            .unwrap();
        assert_eq!(pool.oldest_index(), Some(3));

        pool.change_options(&Slaw::map([("frozen", Slaw::from(true))]))
            .unwrap();
        assert!(matches!(
            pool.deposit(protein(9)),
            Err(PoolError::PoolFrozen(_))
        ));
        // unknown keys warn but do not fail
        pool.change_options(&Slaw::map([("bogus", Slaw::from(1i64))]))
            .unwrap();
        assert!(pool
            .change_options(&Slaw::map([("size", Slaw::from(0i64))]))
            .is_err());
    }

    #[test]
    fn deposit_wakes_registered_notifiers() {
        let pool = small_pool(3);
        let notifier = Notifier::new();
        pool.register(&notifier);
        let seen = notifier.generation();
        pool.deposit(protein(1)).unwrap();
        assert_ne!(notifier.generation(), seen);

        pool.unregister(&notifier);
        let seen = notifier.generation();
        pool.deposit(protein(2)).unwrap();
        assert_eq!(notifier.generation(), seen);
    }

    #[test]
    fn server_lifecycle() {
        let server = MemoryPoolServer::new();
        server.create("a", &Slaw::nil()).unwrap();
        assert!(matches!(
            server.create("a", &Slaw::nil()),
            Err(PoolError::PoolExists(_))
        ));
        assert_eq!(server.list_pools(), vec!["a".to_string()]);
        assert!(!server.is_in_use("a").unwrap());

        let held = server.participate("a").unwrap();
        assert!(server.is_in_use("a").unwrap());
        assert!(matches!(server.dispose("a"), Err(PoolError::PoolInUse(_))));
        drop(held);
        server.dispose("a").unwrap();
        assert!(matches!(
            server.participate("a"),
            Err(PoolError::NoSuchPool(_))
        ));
    }

    #[test]
    fn rename_requires_idle_pool_and_free_target() {
        let server = MemoryPoolServer::new();
        server.create("a", &Slaw::nil()).unwrap();
        server.create("b", &Slaw::nil()).unwrap();
        assert!(matches!(
            server.rename("a", "b"),
            Err(PoolError::PoolExists(_))
        ));
        let held = server.participate("a").unwrap();
        assert!(matches!(
            server.rename("a", "c"),
            Err(PoolError::PoolInUse(_))
        ));
        drop(held);
        server.rename("a", "c").unwrap();
        assert_eq!(server.list_pools(), vec!["b".to_string(), "c".to_string()]);
        let renamed = server.participate("c").unwrap();
        assert_eq!(renamed.name(), "c");
    }

    #[test]
    fn auto_dispose_reaps_after_last_withdrawal() {
        let server = MemoryPoolServer::new();
        let opts = Slaw::map([("auto-dispose", Slaw::from(true))]);
        server.create("tmp", &opts).unwrap();
        // not yet participated; must survive sweeps
        assert_eq!(server.list_pools(), vec!["tmp".to_string()]);

        let held = server.participate("tmp").unwrap();
        assert_eq!(server.list_pools(), vec!["tmp".to_string()]);
        drop(held);
        assert!(server.list_pools().is_empty());
    }

    #[test]
    fn options_from_slaw() {
        let opts = PoolOptions::from_slaw(&Slaw::map([
            ("size", Slaw::from(4096u64)),
            ("stop-when-full", Slaw::from(true)),
        ]))
        .unwrap();
        assert_eq!(opts.size, 4096);
        assert!(opts.stop_when_full);
        assert!(!opts.frozen);
        assert_eq!(PoolOptions::from_slaw(&Slaw::nil()).unwrap().size, 1024 * 1024);
        assert!(PoolOptions::from_slaw(&Slaw::map([("size", 0i64)])).is_err());
        assert!(PoolOptions::from_slaw(&Slaw::map([("bogus", 1i64)])).is_err());
        assert!(PoolOptions::from_slaw(&Slaw::from(5i64)).is_err());
    }

    #[test]
    fn participate_creatingly_is_idempotent() {
        let server = MemoryPoolServer::new();
        let a = server.participate_creatingly("p", &Slaw::nil()).unwrap();
        let b = server.participate_creatingly("p", &Slaw::nil()).unwrap();
        a.deposit(protein(1)).unwrap();
        assert_eq!(b.newest_index(), Some(0));
    }
}
