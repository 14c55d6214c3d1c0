//! Transient error banner.
//!
//! Every message gets a fresh generation. A scheduled clear only removes the
//! banner if it still carries the generation it was scheduled for, so a newer
//! message supersedes older timers instead of stacking with them.

use std::time::Duration;

pub const SHORT_NOTICE: Duration = Duration::from_secs(3);
pub const LONG_NOTICE: Duration = Duration::from_secs(4);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledClear {
    pub generation: Generation,
    pub after: Duration,
}

#[derive(Clone, Debug, Default)]
pub struct ErrorBanner {
    message: Option<String>,
    generation: Generation,
}

impl ErrorBanner {
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn show(&mut self, message: impl Into<String>, after: Duration) -> ScheduledClear {
        self.generation.0 += 1;
        self.message = Some(message.into());
        ScheduledClear {
            generation: self.generation,
            after,
        }
    }

    pub fn clear(&mut self) {
        self.generation.0 += 1;
        self.message = None;
    }

    /// Timer callback; returns whether the banner was actually cleared.
    pub fn expire(&mut self, generation: Generation) -> bool {
        if generation != self.generation || self.message.is_none() {
            return false;
        }
        self.message = None;
        true
    }
}
