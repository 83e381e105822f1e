//! Timer scheduling over a host-supplied clock.

pub mod scheduler;

pub use scheduler::{Clock, ManualClock, SystemClock, TimerKind, TimerScheduler};
