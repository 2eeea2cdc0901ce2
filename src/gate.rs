use crate::error::ClientError;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(10);

/// Source of the current instant, swappable so tests don't have to sleep.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<Instant>>,
}

impl MockClock {
    pub fn new(start: Instant) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, duration: Duration) {
        *lock(&self.current) += duration;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        *lock(&self.current)
    }
}

// A panic while holding one of these locks leaves plain data behind, so a
// poisoned lock is still safe to use.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
struct GateState {
    last_request: Option<Instant>,
}

/// Enforces a minimum interval between upstream requests.
///
/// `check` never blocks and never mutates state. Only `record_success`
/// moves the window forward, so failed requests don't count against the
/// cooldown. Two callers can both pass `check` before either records.
#[derive(Debug)]
pub struct RateGate {
    cooldown: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<GateState>,
}

impl RateGate {
    pub fn new(cooldown: Duration) -> Self {
        Self::with_clock(cooldown, Arc::new(SystemClock))
    }

    pub fn with_clock(cooldown: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            cooldown,
            clock,
            state: Mutex::new(GateState { last_request: None }),
        }
    }

    pub fn check(&self) -> Result<(), ClientError> {
        let state = lock(&self.state);
        let Some(last) = state.last_request else {
            return Ok(());
        };
        let elapsed = self.clock.now().saturating_duration_since(last);
        if elapsed < self.cooldown {
            let remaining = self.cooldown - elapsed;
            debug!("Request refused, {:.1}s of cooldown left", remaining.as_secs_f64());
            return Err(ClientError::RateLimit { remaining });
        }
        Ok(())
    }

    pub fn record_success(&self) {
        lock(&self.state).last_request = Some(self.clock.now());
    }
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

/// Measures how long a request has been in flight. The measurement is
/// logged when the guard is dropped, whichever way the request ends.
#[derive(Debug)]
pub struct Stopwatch {
    label: String,
    started: Instant,
}

impl Stopwatch {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for Stopwatch {
    fn drop(&mut self) {
        debug!("{} took {}ms", self.label, self.elapsed().as_millis());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(cooldown: u64) -> (RateGate, MockClock) {
        let clock = MockClock::default();
        let gate = RateGate::with_clock(Duration::from_secs(cooldown), Arc::new(clock.clone()));
        (gate, clock)
    }

    #[test]
    fn first_call_is_always_allowed() {
        let (gate, _) = gate(10);
        assert!(gate.check().is_ok());
    }

    #[test]
    fn call_within_cooldown_reports_remaining_wait() {
        let (gate, clock) = gate(10);
        gate.record_success();
        clock.advance(Duration::from_millis(3500));

        match gate.check() {
            Err(ClientError::RateLimit { remaining }) => {
                assert_eq!(remaining, Duration::from_millis(6500))
            }
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[test]
    fn refused_check_does_not_move_the_window() {
        let (gate, clock) = gate(10);
        gate.record_success();
        clock.advance(Duration::from_secs(4));
        assert!(gate.check().is_err());
        clock.advance(Duration::from_secs(6));
        assert!(gate.check().is_ok());
    }

    #[test]
    fn remaining_wait_for_every_elapsed_time_below_cooldown() {
        for cooldown in [1, 5, 10, 30] {
            let cooldown = Duration::from_secs(cooldown);
            let mut elapsed = Duration::ZERO;
            while elapsed < cooldown {
                let clock = MockClock::default();
                let gate = RateGate::with_clock(cooldown, Arc::new(clock.clone()));
                gate.record_success();
                clock.advance(elapsed);
                match gate.check() {
                    Err(ClientError::RateLimit { remaining }) => {
                        assert_eq!(remaining, cooldown - elapsed)
                    }
                    other => panic!("expected rate limit, got {other:?}"),
                }
                elapsed += Duration::from_millis(250);
            }
        }
    }

    #[test]
    fn call_at_exactly_cooldown_is_allowed() {
        let (gate, clock) = gate(10);
        gate.record_success();
        clock.advance(Duration::from_secs(10));
        assert!(gate.check().is_ok());
    }

    #[test]
    fn check_alone_never_starts_a_cooldown() {
        let (gate, _) = gate(10);
        assert!(gate.check().is_ok());
        assert!(gate.check().is_ok());
    }

    #[test]
    fn stopwatch_measures_monotonic_time() {
        let watch = Stopwatch::start("test");
        let first = watch.elapsed();
        let second = watch.elapsed();
        assert!(second >= first);
    }
}
