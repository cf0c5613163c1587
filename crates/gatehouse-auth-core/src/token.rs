//! Opaque token generation and validity windows

use chrono::{DateTime, Duration, Timelike, Utc};
use rand::rngs::OsRng;
use rand::RngCore;

/// One-time email token validity in minutes, measured from creation
pub const EMAIL_TOKEN_VALID_MINUTES: i64 = 15;
/// Session token validity in days, sliding from last use
pub const SESSION_VALID_DAYS: i64 = 1;
/// Remember-me token validity in days, sliding from last use
pub const REMEMBER_ME_VALID_DAYS: i64 = 30;

/// Generates cryptographically random, unguessable opaque tokens.
///
/// Used for email login tokens, session tokens, and remember-me tokens
/// alike: 256 bits from the OS RNG, hex encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenGenerator;

impl TokenGenerator {
    /// Raw entropy per token in bytes
    pub const TOKEN_BYTES: usize = 32;

    /// Generate a fresh opaque token
    pub fn generate(&self) -> String {
        let mut bytes = [0u8; Self::TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

/// A sliding validity window measured in days from a token's last use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    days: i64,
}

impl ValidityWindow {
    /// Create a window of the given number of days
    pub const fn days(days: i64) -> Self {
        Self { days }
    }

    /// Number of days in the window
    pub const fn as_days(&self) -> i64 {
        self.days
    }

    /// Cutoff timestamp for a lookup at `now`.
    ///
    /// `now - days`, floored to the top of the hour: the value stays stable
    /// across repeated calls within the same hour, which keeps identical
    /// lookups cache-friendly. Flooring only ever widens the window.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let past = now - Duration::days(self.days);
        past.with_minute(0)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(past)
    }
}

/// Cutoff for one-time email tokens at `now`.
///
/// Exact, not floored: the 15-minute window is short enough that rounding
/// would change behavior noticeably.
pub fn email_token_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::minutes(EMAIL_TOKEN_VALID_MINUTES)
}
