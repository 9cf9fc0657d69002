use plasma_api::{AwaitOutcome, PoolError, PoolServer, Timeout, Tributary};
use plasma_slaw::Slaw;

use crate::awaiter::Awaiter;
use crate::hose::Hose;

// ═══════════════════════════════════════════════════════════════
//  HoseGang
// ═══════════════════════════════════════════════════════════════

/// Fan-in over any number of tributaries: one blocking read serves them
/// all, returning whichever member produces first.
///
/// The gang owns its members. Adding a hose transfers it in; removal (by
/// name) hands it back for standalone use. Mixing storage-backed hoses
/// with time-cognizant sources is transparent; the gang's awaiter folds
/// scheduled triggers into its deposit waits.
#[derive(Default)]
pub struct HoseGang {
    awaiter: Awaiter,
}

impl HoseGang {
    pub fn new() -> HoseGang {
        HoseGang {
            awaiter: Awaiter::Empty,
        }
    }

    pub fn add_hose(&mut self, hose: Hose) -> Result<(), PoolError> {
        self.add_tributary(Box::new(hose))
    }

    /// Participate in a pool and add the resulting hose in one step.
    pub fn add_pool(&mut self, server: &dyn PoolServer, name: &str) -> Result<(), PoolError> {
        self.add_hose(Hose::participate(server, name)?)
    }

    /// Participate, creating the pool first if needed, and add the hose.
    pub fn add_pool_creatingly(
        &mut self,
        server: &dyn PoolServer,
        name: &str,
        options: &Slaw,
    ) -> Result<(), PoolError> {
        self.add_hose(Hose::participate_creatingly(server, name, options)?)
    }

    pub fn add_tributary(&mut self, member: Box<dyn Tributary>) -> Result<(), PoolError> {
        if !member.addable() {
            return Err(PoolError::SourceNotAddable(member.name().to_string()));
        }
        tracing::debug!(member = member.name(), "gang member added");
        self.awaiter.add(member);
        Ok(())
    }

    /// Detach and return every member with this name, in registration
    /// order; empty when no member matches. Two hoses participating in
    /// the same pool share a name, so removal clears them both.
    pub fn remove_tributary(&mut self, name: &str) -> Vec<Box<dyn Tributary>> {
        let removed = self.awaiter.remove(name);
        if !removed.is_empty() {
            tracing::debug!(member = name, count = removed.len(), "gang members removed");
        }
        removed
    }

    pub fn count(&self) -> usize {
        self.awaiter.members().len()
    }

    pub fn is_empty(&self) -> bool {
        self.awaiter.members().is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.awaiter.members().iter().map(|m| m.name()).collect()
    }

    /// Wait for the next protein from any member.
    ///
    /// `NoWait` never blocks, even when a time-cognizant member has a
    /// trigger pending; it reports `Nothing`. A bounded wait reports
    /// `TimedOut` once the budget is spent. An empty gang has nothing to
    /// wait on and reports `Nothing` immediately.
    pub fn next(&mut self, timeout: Timeout) -> Result<AwaitOutcome, PoolError> {
        if self.is_empty() {
            return Ok(AwaitOutcome::Nothing);
        }
        self.awaiter.await_next(timeout)
    }

    /// Withdraw every member and clear the awaiter slot. The gang stays
    /// usable; the next member added picks a fresh strategy.
    pub fn withdraw_all(&mut self) -> Result<(), PoolError> {
        let result = self.awaiter.withdraw_all();
        self.awaiter = Awaiter::Empty;
        result
    }
}
