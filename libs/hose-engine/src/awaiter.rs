use std::time::Instant;

use plasma_api::{AwaitOutcome, Notifier, PoolError, Timeout, Tributary};
use plasma_slaw::Protein;

// ═══════════════════════════════════════════════════════════════
//  Awaiter — gang wait strategies
// ═══════════════════════════════════════════════════════════════

/// How a gang waits, chosen by what it contains.
///
/// The state only ever moves forward: an empty gang picks its first
/// strategy from its first member, and once any time-cognizant member has
/// joined the gang stays time-aware, even if every timer is later
/// removed. That keeps the wait logic's behavior stable across membership
/// churn instead of flapping between strategies.
pub(crate) enum Awaiter {
    Empty,
    Basic(Basic),
    TimeAware(TimeAware),
}

impl Default for Awaiter {
    fn default() -> Awaiter {
        Awaiter::Empty
    }
}

impl Awaiter {
    pub(crate) fn add(&mut self, member: Box<dyn Tributary>) {
        let state = std::mem::replace(self, Awaiter::Empty);
        *self = match state {
            Awaiter::Empty => {
                let notifier = Notifier::new();
                if member.time_cognizant() {
                    let mut t = TimeAware::new(notifier);
                    t.add(member);
                    Awaiter::TimeAware(t)
                } else {
                    let mut b = Basic::new(notifier);
                    b.add(member);
                    Awaiter::Basic(b)
                }
            }
            Awaiter::Basic(mut b) => {
                if member.time_cognizant() {
                    tracing::debug!(member = member.name(), "gang upgrades to time-aware");
                    let mut t = TimeAware::absorb(b);
                    t.add(member);
                    Awaiter::TimeAware(t)
                } else {
                    b.add(member);
                    Awaiter::Basic(b)
                }
            }
            Awaiter::TimeAware(mut t) => {
                t.add(member);
                Awaiter::TimeAware(t)
            }
        };
    }

    pub(crate) fn remove(&mut self, name: &str) -> Vec<Box<dyn Tributary>> {
        match self {
            Awaiter::Empty => Vec::new(),
            Awaiter::Basic(b) => b.remove(name),
            Awaiter::TimeAware(t) => t.remove(name),
        }
    }

    pub(crate) fn members(&self) -> &[Box<dyn Tributary>] {
        match self {
            Awaiter::Empty => &[],
            Awaiter::Basic(b) => &b.members,
            Awaiter::TimeAware(t) => &t.members,
        }
    }

    /// Detach and withdraw every member, leaving the strategy in place.
    pub(crate) fn withdraw_all(&mut self) -> Result<(), PoolError> {
        let (notifier, members) = match self {
            Awaiter::Empty => return Ok(()),
            Awaiter::Basic(b) => (&b.notifier, &mut b.members),
            Awaiter::TimeAware(t) => (&t.notifier, &mut t.members),
        };
        let mut first_err = None;
        for mut member in members.drain(..) {
            member.detach(notifier);
            if let Err(e) = member.withdraw() {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    pub(crate) fn await_next(&mut self, timeout: Timeout) -> Result<AwaitOutcome, PoolError> {
        match self {
            Awaiter::Empty => Ok(AwaitOutcome::Nothing),
            Awaiter::Basic(b) => b.await_next(timeout),
            Awaiter::TimeAware(t) => t.await_next(timeout),
        }
    }
}

/// Round-robin poll over `members`, starting after the last member that
/// produced something so a busy member cannot starve the rest. `storage_only`
/// skips time-cognizant members, whose arrivals go through their triggers.
fn poll_round(
    members: &mut [Box<dyn Tributary>],
    cursor: &mut usize,
    storage_only: bool,
) -> Result<Option<Protein>, PoolError> {
    let n = members.len();
    for k in 0..n {
        let i = (*cursor + k) % n;
        if storage_only && members[i].time_cognizant() {
            continue;
        }
        if let Some(p) = members[i].poll()? {
            *cursor = (i + 1) % n;
            return Ok(Some(p));
        }
    }
    Ok(None)
}

// ═══════════════════════════════════════════════════════════════
//  Basic — storage members only
// ═══════════════════════════════════════════════════════════════

pub(crate) struct Basic {
    notifier: Notifier,
    members: Vec<Box<dyn Tributary>>,
    cursor: usize,
}

impl Basic {
    fn new(notifier: Notifier) -> Basic {
        Basic {
            notifier,
            members: Vec::new(),
            cursor: 0,
        }
    }

    fn add(&mut self, mut member: Box<dyn Tributary>) {
        member.attach(&self.notifier);
        self.members.push(member);
    }

    /// Remove every member with this name. Duplicate names are legal
    /// (two hoses on the same pool), so one call clears them all.
    fn remove(&mut self, name: &str) -> Vec<Box<dyn Tributary>> {
        let mut removed = Vec::new();
        let mut i = 0;
        while i < self.members.len() {
            if self.members[i].name() == name {
                let mut member = self.members.remove(i);
                member.detach(&self.notifier);
                if self.cursor > i {
                    self.cursor -= 1;
                }
                removed.push(member);
            } else {
                i += 1;
            }
        }
        removed
    }

    fn await_next(&mut self, timeout: Timeout) -> Result<AwaitOutcome, PoolError> {
        let deadline = timeout.bound().map(|d| Instant::now() + d);
        loop {
            // snapshot before polling so a deposit landing in between
            // still ends the wait
            let seen = self.notifier.generation();
            if let Some(p) = poll_round(&mut self.members, &mut self.cursor, false)? {
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
}

// ═══════════════════════════════════════════════════════════════
//  TimeAware — storage members merged with scheduled triggers
// ═══════════════════════════════════════════════════════════════

pub(crate) struct TimeAware {
    notifier: Notifier,
    members: Vec<Box<dyn Tributary>>,
    cursor: usize,
}

impl TimeAware {
    fn new(notifier: Notifier) -> TimeAware {
        TimeAware {
            notifier,
            members: Vec::new(),
            cursor: 0,
        }
    }

    fn absorb(basic: Basic) -> TimeAware {
        TimeAware {
            notifier: basic.notifier,
            members: basic.members,
            cursor: basic.cursor,
        }
    }

    fn add(&mut self, mut member: Box<dyn Tributary>) {
        member.attach(&self.notifier);
        self.members.push(member);
    }

    /// Remove every member with this name. Duplicate names are legal
    /// (two hoses on the same pool), so one call clears them all.
    fn remove(&mut self, name: &str) -> Vec<Box<dyn Tributary>> {
        let mut removed = Vec::new();
        let mut i = 0;
        while i < self.members.len() {
            if self.members[i].name() == name {
                let mut member = self.members.remove(i);
                member.detach(&self.notifier);
                if self.cursor > i {
                    self.cursor -= 1;
                }
                removed.push(member);
            } else {
                i += 1;
            }
        }
        removed
    }

    /// Earliest scheduled trigger; ties go to the member registered
    /// first, so equal-period timers drain in a stable order.
    fn earliest_trigger(&self) -> Option<(usize, Instant)> {
        let mut best: Option<(usize, Instant)> = None;
        for (i, member) in self.members.iter().enumerate() {
            if let Some(t) = member.next_trigger() {
                if best.is_none_or(|(_, bt)| t < bt) {
                    best = Some((i, t));
                }
            }
        }
        best
    }

    /// One pass of the merged wait:
    ///
    /// 1. zero-wait poll of storage members;
    /// 2. fire the earliest due trigger;
    /// 3. a no-wait call stops here, pending triggers notwithstanding;
    /// 4. otherwise block for a deposit, bounded by both the earliest
    ///    trigger and the remaining budget, and go around again.
    ///
    /// The budget is recomputed from the wall clock on every pass, so
    /// trigger fires and spurious wakeups never extend the total wait.
    fn await_next(&mut self, timeout: Timeout) -> Result<AwaitOutcome, PoolError> {
        let deadline = timeout.bound().map(|d| Instant::now() + d);
        loop {
            let seen = self.notifier.generation();
            if let Some(p) = poll_round(&mut self.members, &mut self.cursor, true)? {
                return Ok(AwaitOutcome::Arrived(p));
            }
            if let Some((i, trigger)) = self.earliest_trigger() {
                if trigger <= Instant::now() {
                    if let Some(p) = self.members[i].fire()? {
                        return Ok(AwaitOutcome::Arrived(p));
                    }
                    // schedule advanced without a protein; re-evaluate
                    continue;
                }
            }
            if timeout.is_no_wait() {
                return Ok(AwaitOutcome::Nothing);
            }
            let now = Instant::now();
            let remaining = match deadline {
                None => None,
                Some(d) => {
                    if now >= d {
                        return Ok(AwaitOutcome::TimedOut);
                    }
                    Some(d - now)
                }
            };
            let until_trigger = self
                .earliest_trigger()
                .map(|(_, t)| t.saturating_duration_since(now));
            let wait = match (until_trigger, remaining) {
                (Some(t), Some(r)) => Some(t.min(r)),
                (Some(t), None) => Some(t),
                (None, r) => r,
            };
            self.notifier.wait_beyond(seen, wait);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use plasma_slaw::Slaw;
    use source_timer::TimerSource;

    /// Storage-less stub that hands out a fixed queue of proteins.
    struct Scripted {
        name: &'static str,
        queue: Vec<Protein>,
    }

    impl Scripted {
        fn new(name: &'static str, values: &[i64]) -> Scripted {
            Scripted {
                name,
                queue: values
                    .iter()
                    .rev()
                    .map(|n| Protein::new(Slaw::list([name]), Slaw::map([("n", *n)])))
                    .collect(),
            }
        }
    }

    impl Tributary for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        fn poll(&mut self) -> Result<Option<Protein>, PoolError> {
            Ok(self.queue.pop())
        }

        fn next(&mut self, _timeout: Timeout) -> Result<AwaitOutcome, PoolError> {
            Ok(match self.queue.pop() {
                Some(p) => AwaitOutcome::Arrived(p),
                None => AwaitOutcome::Nothing,
            })
        }

        fn attach(&mut self, _notifier: &Notifier) {}
        fn detach(&mut self, _notifier: &Notifier) {}

        fn withdraw(&mut self) -> Result<(), PoolError> {
            self.queue.clear();
            Ok(())
        }
    }

    fn timer(name: &'static str, period_ms: u64) -> Box<TimerSource> {
        Box::new(TimerSource::repeating(
            name,
            Duration::from_millis(period_ms),
            Slaw::from(1i64),
        ))
    }

    #[test]
    fn first_member_chooses_the_strategy() {
        let mut a = Awaiter::Empty;
        a.add(Box::new(Scripted::new("s", &[])));
        assert!(matches!(a, Awaiter::Basic(_)));

        let mut a = Awaiter::Empty;
        a.add(timer("t", 50));
        assert!(matches!(a, Awaiter::TimeAware(_)));
    }

    #[test]
    fn timer_membership_upgrades_and_sticks() {
        let mut a = Awaiter::Empty;
        a.add(Box::new(Scripted::new("s", &[])));
        a.add(timer("t", 50));
        assert!(matches!(a, Awaiter::TimeAware(_)));

        // removing the timer must not downgrade
        assert_eq!(a.remove("t").len(), 1);
        assert!(matches!(a, Awaiter::TimeAware(_)));
    }

    #[test]
    fn round_robin_interleaves_busy_members() {
        let mut a = Awaiter::Empty;
        a.add(Box::new(Scripted::new("left", &[1, 2, 3])));
        a.add(Box::new(Scripted::new("right", &[4, 5, 6])));
        let mut sources = Vec::new();
        for _ in 0..6 {
            let p = a
                .await_next(Timeout::NoWait)
                .unwrap()
                .protein()
                .unwrap();
            sources.push(p.descrips().nth(0).unwrap().as_str().unwrap().to_string());
        }
        assert_eq!(sources, ["left", "right", "left", "right", "left", "right"]);
    }

    #[test]
    fn no_wait_with_pending_trigger_returns_nothing_immediately() {
        let mut a = Awaiter::Empty;
        a.add(timer("t", 60_000));
        let start = Instant::now();
        assert_eq!(a.await_next(Timeout::NoWait).unwrap(), AwaitOutcome::Nothing);
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn bounded_wait_never_overshoots_for_a_distant_trigger() {
        let mut a = Awaiter::Empty;
        a.add(timer("t", 60_000));
        let start = Instant::now();
        let outcome = a.await_next(Timeout::In(Duration::from_millis(30))).unwrap();
        assert_eq!(outcome, AwaitOutcome::TimedOut);
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(30));
        assert!(waited < Duration::from_secs(5));
    }

    #[test]
    fn bounded_wait_with_idle_storage_and_distant_trigger_times_out() {
        let mut a = Awaiter::Empty;
        a.add(Box::new(Scripted::new("quiet", &[])));
        a.add(timer("t", 60_000));
        let start = Instant::now();
        let outcome = a.await_next(Timeout::In(Duration::from_millis(30))).unwrap();
        assert_eq!(outcome, AwaitOutcome::TimedOut);
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(30));
        assert!(waited < Duration::from_secs(5));
    }

    #[test]
    fn due_trigger_beats_the_budget_clock() {
        let mut a = Awaiter::Empty;
        a.add(timer("t", 20));
        let outcome = a.await_next(Timeout::In(Duration::from_secs(10))).unwrap();
        let p = outcome.protein().unwrap();
        assert_eq!(p.hose_name(), Some("t"));
    }

    #[test]
    fn equal_triggers_drain_in_registration_order() {
        let mut a = Awaiter::Empty;
        // both due immediately after the sleep; "first" registered first
        a.add(timer("first", 10));
        a.add(timer("second", 10));
        std::thread::sleep(Duration::from_millis(30));
        let p = a.await_next(Timeout::NoWait).unwrap().protein().unwrap();
        assert_eq!(p.hose_name(), Some("first"));
        let p = a.await_next(Timeout::NoWait).unwrap().protein().unwrap();
        assert_eq!(p.hose_name(), Some("second"));
    }
}
