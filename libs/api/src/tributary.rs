use std::time::Instant;

use plasma_slaw::Protein;

use crate::error::PoolError;
use crate::notify::Notifier;
use crate::{AwaitOutcome, Timeout};

/// A gang member: anything a gang can draw proteins from.
///
/// Storage-backed members (hoses) signal arrivals through an attached
/// [`Notifier`]. Time-cognizant members instead publish their next
/// trigger instant and produce a protein when told to fire; a gang's
/// awaiter folds those triggers into its wait deadlines, so such members
/// never need a thread of their own.
pub trait Tributary: Send {
    fn name(&self) -> &str;

    /// Fetch the next unread protein without blocking.
    fn poll(&mut self) -> Result<Option<Protein>, PoolError>;

    /// Block for the next protein, up to `timeout`.
    fn next(&mut self, timeout: Timeout) -> Result<AwaitOutcome, PoolError>;

    /// False when the member can no longer join a gang (e.g. withdrawn).
    fn addable(&self) -> bool {
        true
    }

    /// Start signalling arrivals through `notifier`.
    fn attach(&mut self, notifier: &Notifier);

    /// Stop signalling through `notifier`.
    fn detach(&mut self, notifier: &Notifier);

    /// True for members whose arrivals come from a schedule rather than
    /// deposits.
    fn time_cognizant(&self) -> bool {
        false
    }

    /// Next scheduled trigger of a time-cognizant member. `None` when the
    /// member has nothing scheduled (or is not time-cognizant).
    fn next_trigger(&self) -> Option<Instant> {
        None
    }

    /// Produce the protein of a due trigger and advance the schedule.
    /// `None` when no trigger is due yet.
    fn fire(&mut self) -> Result<Option<Protein>, PoolError> {
        Ok(None)
    }

    /// Sever the member from its source. Further reads are
    /// [`PoolError::Withdrawn`].
    fn withdraw(&mut self) -> Result<(), PoolError>;
}
