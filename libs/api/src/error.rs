use plasma_slaw::SlawError;

/// Error type shared by pool servers, pools, hoses and gangs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("no such pool: {0}")]
    NoSuchPool(String),

    #[error("pool already exists: {0}")]
    PoolExists(String),

    /// Disposal refused because participants are still connected.
    #[error("pool {0} is in use")]
    PoolInUse(String),

    /// The hose was withdrawn; no further operations are possible.
    #[error("hose is withdrawn")]
    Withdrawn,

    /// The requested deposit index is outside the pool's retained window.
    #[error("no protein at index {index} in pool {pool}")]
    NoSuchProtein { pool: String, index: u64 },

    /// Deposit refused: the pool is full and configured not to evict.
    #[error("pool {0} is full")]
    PoolFull(String),

    /// Deposit refused: the pool is frozen.
    #[error("pool {0} is frozen")]
    PoolFrozen(String),

    /// The member cannot join a gang (e.g. already withdrawn).
    #[error("{0} cannot be added to a gang")]
    SourceNotAddable(String),

    #[error("invalid pool configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    Slaw(#[from] SlawError),
}
