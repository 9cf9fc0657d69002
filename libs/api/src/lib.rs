//! Contracts shared by pool back ends and the hose engine: pool storage
//! and server traits, the gang-member trait, the deposit wakeup
//! primitive, and the timeout vocabulary of every blocking read.

mod error;
mod notify;
mod pool;
mod tributary;

use std::time::Duration;

use plasma_slaw::Protein;

pub use error::PoolError;
pub use notify::Notifier;
pub use pool::{Deposited, PoolServer, PoolStore};
pub use tributary::Tributary;

// ═══════════════════════════════════════════════════════════════
//  Timeout
// ═══════════════════════════════════════════════════════════════

/// How long a blocking read may wait.
///
/// The scalar form uses the classic sentinels: zero means no wait,
/// any negative value means wait forever, a positive value is a bound
/// in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Return immediately, arrived or not.
    NoWait,
    /// Wait indefinitely.
    Forever,
    /// Wait at most this long.
    In(Duration),
}

impl Timeout {
    /// Decode the scalar sentinel form.
    pub fn from_secs_f64(t: f64) -> Timeout {
        if t < 0.0 {
            Timeout::Forever
        } else if t == 0.0 {
            Timeout::NoWait
        } else {
            Timeout::In(Duration::from_secs_f64(t))
        }
    }

    pub fn is_no_wait(&self) -> bool {
        matches!(self, Timeout::NoWait)
    }

    /// Remaining budget as a duration bound: `None` means unbounded.
    pub fn bound(&self) -> Option<Duration> {
        match *self {
            Timeout::NoWait => Some(Duration::ZERO),
            Timeout::Forever => None,
            Timeout::In(d) => Some(d),
        }
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Timeout {
        if d.is_zero() {
            Timeout::NoWait
        } else {
            Timeout::In(d)
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  AwaitOutcome
// ═══════════════════════════════════════════════════════════════

/// Result of a bounded wait. Distinguishes "the clock ran out" from
/// "asked for no wait and nothing was pending", which callers need in
/// order to tell an idle source from a slow one.
#[derive(Debug, Clone, PartialEq)]
pub enum AwaitOutcome {
    /// A protein arrived within the budget.
    Arrived(Protein),
    /// The budget elapsed with nothing arriving.
    TimedOut,
    /// A no-wait read found nothing pending.
    Nothing,
}

impl AwaitOutcome {
    pub fn protein(self) -> Option<Protein> {
        match self {
            AwaitOutcome::Arrived(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_arrived(&self) -> bool {
        matches!(self, AwaitOutcome::Arrived(_))
    }
}
