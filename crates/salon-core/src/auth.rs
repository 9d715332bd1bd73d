//! # Authorization Cooldown
//!
//! Time math for the admin re-authentication window. After a correct
//! passphrase, destructive actions (deleting a sale) are allowed without
//! asking again until the window runs out.
//!
//! ```text
//!   authorized at T          T + window
//!        │◄──── no prompt ─────►│◄──── passphrase required ────
//! ───────┼──────────────────────┼──────────────────────────────► time
//! ```
//!
//! A stored timestamp in the future (clock moved backwards) does not count
//! as authorized.

use chrono::{DateTime, Duration, Utc};

use crate::{DEFAULT_AUTH_COOLDOWN_SECS, MAX_AUTH_COOLDOWN_SECS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    window: Duration,
}

impl Default for Cooldown {
    fn default() -> Self {
        Cooldown::from_secs(DEFAULT_AUTH_COOLDOWN_SECS)
    }
}

impl Cooldown {
    /// Negative values are treated as zero (always prompt). Values above
    /// [`MAX_AUTH_COOLDOWN_SECS`] are capped.
    pub fn from_secs(secs: i64) -> Self {
        let secs = secs.clamp(0, MAX_AUTH_COOLDOWN_SECS);
        Cooldown {
            window: Duration::try_seconds(secs).unwrap_or_else(Duration::zero),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// True while `now` is inside the window opened at `last`.
    pub fn is_active(&self, last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match last {
            Some(at) => at <= now && now - at < self.window,
            None => false,
        }
    }

    /// Time left in the window, zero when inactive.
    pub fn remaining(&self, last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
        match last {
            Some(at) if self.is_active(last, now) => self.window - (now - at),
            _ => Duration::zero(),
        }
    }
}
