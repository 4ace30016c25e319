//! Freeze-window evaluation.
//!
//! All comparisons use UTC so the verdict is identical on every CI runner.
//! Windows are inclusive on both ends and checked in declaration order; the
//! first match wins.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::config::{FreezeWindow, ProtocolConfig, TimeOfDay, Weekday};
use crate::error::{GovernanceError, GovernanceResult};

/// Source of "now" for policy decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

impl FreezeWindow {
    /// Whether `at` falls inside this window.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let today = Weekday::from(at.weekday());
        let now = TimeOfDay::new(at.hour() as u8, at.minute() as u8);
        self.day == today && self.start <= now && now <= self.end
    }
}

/// Returns the first configured window containing `at`, if any.
pub fn active_window(config: &ProtocolConfig, at: DateTime<Utc>) -> Option<&FreezeWindow> {
    config.freeze_windows().iter().find(|w| w.contains(at))
}

/// Fails with [`GovernanceError::FreezeViolation`] when `at` is inside a
/// configured freeze window.
pub fn check_freeze(config: &ProtocolConfig, at: DateTime<Utc>) -> GovernanceResult<()> {
    match active_window(config, at) {
        Some(window) => Err(GovernanceError::FreezeViolation {
            day: window.day.to_string(),
            start: window.start.to_string(),
            end: window.end.to_string(),
        }),
        None => Ok(()),
    }
}
