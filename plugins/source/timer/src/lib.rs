use std::thread;
use std::time::{Duration, Instant, SystemTime};

use plasma_api::{AwaitOutcome, Notifier, PoolError, Timeout, Tributary};
use plasma_slaw::{Origin, Protein, Slaw};

// ═══════════════════════════════════════════════════════════════
//  TimerSource
// ═══════════════════════════════════════════════════════════════

/// A time-cognizant protein source: fires on a fixed period, producing
/// each protein from a generator callback. A fire may legitimately
/// produce nothing; the schedule still advances.
///
/// The source owns no thread. Standalone reads sleep inside [`Tributary::next`];
/// inside a gang, the awaiter reads [`Tributary::next_trigger`] and calls
/// [`Tributary::fire`] when the trigger comes due, so a timer costs nothing
/// while storage members are busy.
pub struct TimerSource {
    name: String,
    period: Duration,
    next_fire: Instant,
    sequence: u64,
    generator: Box<dyn FnMut(u64) -> Option<Protein> + Send>,
    withdrawn: bool,
}

impl TimerSource {
    /// First fire lands one full period after construction. The generator
    /// receives the fire sequence number.
    pub fn new(
        name: impl Into<String>,
        period: Duration,
        generator: impl FnMut(u64) -> Option<Protein> + Send + 'static,
    ) -> TimerSource {
        TimerSource {
            name: name.into(),
            period,
            next_fire: Instant::now() + period,
            sequence: 0,
            generator: Box::new(generator),
            withdrawn: false,
        }
    }

    /// Timer that emits the same payload on every fire: descrips
    /// `[name]`, ingests `{"value": value}`.
    pub fn repeating(name: impl Into<String>, period: Duration, value: Slaw) -> TimerSource {
        let name = name.into();
        let descrips = Slaw::list([name.as_str()]);
        TimerSource::new(name, period, move |_| {
            Some(Protein::new(
                descrips.clone(),
                Slaw::map([("value", value.clone())]),
            ))
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    fn fire_one(&mut self, now: Instant) -> Option<Protein> {
        let sequence = self.sequence;
        self.sequence += 1;
        // advance from the scheduled instant; if that is already past,
        // restart from now so a stall never causes a catch-up burst
        let scheduled = self.next_fire + self.period;
        self.next_fire = if scheduled > now { scheduled } else { now + self.period };
        let produced = (self.generator)(sequence);
        tracing::trace!(
            source = %self.name,
            sequence,
            produced = produced.is_some(),
            "timer fired"
        );
        produced.map(|p| {
            p.with_origin(Origin {
                hose: self.name.clone(),
                index: sequence,
                timestamp: SystemTime::now(),
            })
        })
    }
}

impl Tributary for TimerSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&mut self) -> Result<Option<Protein>, PoolError> {
        if self.withdrawn {
            return Err(PoolError::Withdrawn);
        }
        let now = Instant::now();
        if now >= self.next_fire {
            Ok(self.fire_one(now))
        } else {
            Ok(None)
        }
    }

    fn next(&mut self, timeout: Timeout) -> Result<AwaitOutcome, PoolError> {
        if self.withdrawn {
            return Err(PoolError::Withdrawn);
        }
        let deadline = timeout.bound().map(|d| Instant::now() + d);
        loop {
            let now = Instant::now();
            if now >= self.next_fire {
                if let Some(p) = self.fire_one(now) {
                    return Ok(AwaitOutcome::Arrived(p));
                }
                // empty fire: an immediate-mode caller is not made to wait
                // for the next trigger
                if timeout.is_no_wait() {
                    return Ok(AwaitOutcome::Nothing);
                }
                continue;
            }
            let until_fire = self.next_fire - now;
            match deadline {
                _ if timeout.is_no_wait() => return Ok(AwaitOutcome::Nothing),
                None => thread::sleep(until_fire),
                Some(d) => {
                    if d <= now {
                        return Ok(AwaitOutcome::TimedOut);
                    }
                    let remaining = d - now;
                    if until_fire <= remaining {
                        thread::sleep(until_fire);
                    } else {
                        // trigger is beyond the budget; sleep it out
                        thread::sleep(remaining);
                        return Ok(AwaitOutcome::TimedOut);
                    }
                }
            }
        }
    }

    fn attach(&mut self, _notifier: &Notifier) {
        // nothing deposits here; arrivals come from the schedule
    }

    fn detach(&mut self, _notifier: &Notifier) {}

    fn addable(&self) -> bool {
        !self.withdrawn
    }

    fn time_cognizant(&self) -> bool {
        true
    }

    fn next_trigger(&self) -> Option<Instant> {
        (!self.withdrawn).then_some(self.next_fire)
    }

    fn fire(&mut self) -> Result<Option<Protein>, PoolError> {
        self.poll()
    }

    fn withdraw(&mut self) -> Result<(), PoolError> {
        self.withdrawn = true;
        Ok(())
    }
}
