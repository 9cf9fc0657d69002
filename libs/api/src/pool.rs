use std::sync::Arc;
use std::time::SystemTime;

use plasma_slaw::{Protein, Slaw};

use crate::error::PoolError;
use crate::notify::Notifier;

// ═══════════════════════════════════════════════════════════════
//  Pool storage contracts
// ═══════════════════════════════════════════════════════════════

/// A protein as stored: the value plus its deposit index and wall-clock
/// deposit time.
#[derive(Debug, Clone, PartialEq)]
pub struct Deposited {
    pub protein: Protein,
    pub index: u64,
    pub timestamp: SystemTime,
}

/// Backing store of one pool. Indices grow monotonically from zero and
/// never renumber; a bounded store discards from the oldest end, leaving
/// a contiguous retained window `[oldest, newest]`.
pub trait PoolStore: Send + Sync {
    fn name(&self) -> &str;

    /// Append a protein, returning its index. Wakes every registered
    /// notifier after the protein is visible.
    fn deposit(&self, protein: Protein) -> Result<u64, PoolError>;

    /// Index of the oldest retained protein, `None` when empty.
    fn oldest_index(&self) -> Option<u64>;

    /// Index of the newest retained protein, `None` when empty.
    fn newest_index(&self) -> Option<u64>;

    /// Fetch by index. Discarded or never-written indices are
    /// [`PoolError::NoSuchProtein`].
    fn nth(&self, index: u64) -> Result<Deposited, PoolError>;

    /// Discard every retained protein below `index`.
    fn advance_oldest(&self, index: u64) -> Result<(), PoolError>;

    /// Describe the pool as a slaw map. `hops` counts forwarding steps
    /// for multi-hop back ends; an in-process pool reports its own info
    /// for any value.
    fn info(&self, hops: u32) -> Slaw;

    /// Adjust the mutable subset of the pool's options.
    fn change_options(&self, options: &Slaw) -> Result<(), PoolError>;

    /// Register a notifier to be woken on deposits.
    fn register(&self, notifier: &Notifier);

    /// Drop a registration; unknown notifiers are a no-op.
    fn unregister(&self, notifier: &Notifier);
}

/// Factory and registry of pools.
pub trait PoolServer: Send + Sync {
    /// Create a pool. `options` is a slaw map (or nil for defaults).
    fn create(&self, name: &str, options: &Slaw) -> Result<(), PoolError>;

    /// Remove a pool and its contents. Refused while participants hold it.
    fn dispose(&self, name: &str) -> Result<(), PoolError>;

    /// Rename a pool. Requires the pool not be in use and the target name
    /// be free.
    fn rename(&self, old: &str, new: &str) -> Result<(), PoolError>;

    /// True while participants hold the pool.
    fn is_in_use(&self, name: &str) -> Result<bool, PoolError>;

    /// Connect to an existing pool.
    fn participate(&self, name: &str) -> Result<Arc<dyn PoolStore>, PoolError>;

    /// Connect, creating the pool first if it does not exist.
    fn participate_creatingly(
        &self,
        name: &str,
        options: &Slaw,
    ) -> Result<Arc<dyn PoolStore>, PoolError>;

    /// Names of all pools, sorted.
    fn list_pools(&self) -> Vec<String>;
}
