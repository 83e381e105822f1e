//! Named, cancelable game timers.
//!
//! The engine never touches the OS clock or spawns threads. Deadlines are
//! stored against a monotonic [`Clock`] supplied by the host, and the host
//! drives delivery by calling the game's `tick()`, which asks the scheduler
//! which timers are due. That keeps a timer firing an ordinary event on the
//! same single-threaded entry path as player commands, so hosts (and tests)
//! fully control how the two interleave.
//!
//! Each [`TimerKind`] has at most one outstanding deadline: scheduling a
//! kind replaces any existing deadline for it, and `cancel` is idempotent.

use std::cell::Cell;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

/// Monotonic time source, as elapsed time since an arbitrary epoch.
pub trait Clock {
    /// Current time.
    fn now(&self) -> Duration;
}

/// Wall clock measured from construction.
#[derive(Debug)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    /// Create a clock whose epoch is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Manually advanced clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    /// Create a clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Set the clock to an absolute time.
    pub fn set(&self, to: Duration) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// The timers a game round uses. One outstanding deadline per kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    /// Below quorum for too long: stop the game.
    Wait,
    /// Pre-round pause elapsed: start the next round.
    NextRound,
    /// Periodic play-phase check (countdown warnings, expiry).
    TurnCheck,
    /// Periodic czar-pick check (countdown warnings, expiry).
    WinnerCheck,
}

#[derive(Clone, Copy, Debug)]
struct TimerEntry {
    due: Duration,
    period: Option<Duration>,
}

/// Deadline table for one game.
#[derive(Clone, Debug, Default)]
pub struct TimerScheduler {
    timers: FxHashMap<TimerKind, TimerEntry>,
}

impl TimerScheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a one-shot timer `delay` from `now`, replacing any existing
    /// deadline of the same kind.
    pub fn schedule_once(&mut self, kind: TimerKind, now: Duration, delay: Duration) {
        self.timers.insert(
            kind,
            TimerEntry {
                due: now + delay,
                period: None,
            },
        );
    }

    /// Schedule a periodic timer firing every `period` from `now`, replacing
    /// any existing deadline of the same kind.
    pub fn schedule_periodic(&mut self, kind: TimerKind, now: Duration, period: Duration) {
        assert!(!period.is_zero(), "periodic timer needs a non-zero period");
        self.timers.insert(
            kind,
            TimerEntry {
                due: now + period,
                period: Some(period),
            },
        );
    }

    /// Cancel a timer. Canceling an absent kind is a no-op.
    pub fn cancel(&mut self, kind: TimerKind) {
        self.timers.remove(&kind);
    }

    /// Cancel everything. Used on pause, stop and destruction paths.
    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    /// Is a deadline outstanding for `kind`?
    #[must_use]
    pub fn is_scheduled(&self, kind: TimerKind) -> bool {
        self.timers.contains_key(&kind)
    }

    /// Are any deadlines outstanding?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Pop every timer due at or before `now`, in `TimerKind` order.
    ///
    /// One-shot timers are removed; periodic timers are re-armed past `now`
    /// (a long gap between ticks fires a periodic timer once, not once per
    /// missed period).
    pub fn due(&mut self, now: Duration) -> Vec<TimerKind> {
        let mut fired: Vec<TimerKind> = self
            .timers
            .iter()
            .filter(|(_, entry)| entry.due <= now)
            .map(|(&kind, _)| kind)
            .collect();
        fired.sort_unstable();

        for &kind in &fired {
            if let Some(entry) = self.timers.get_mut(&kind) {
                match entry.period {
                    Some(period) => {
                        while entry.due <= now {
                            entry.due += period;
                        }
                    }
                    None => {
                        self.timers.remove(&kind);
                    }
                }
            }
        }
        fired
    }
}
