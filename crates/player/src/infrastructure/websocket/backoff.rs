//! Reconnection backoff math.
//!
//! Runtime-agnostic: the transport driver owns the timer, this only decides
//! how long to wait and when to stop.

// Reconnection constants
pub const INITIAL_RETRY_DELAY_MS: u64 = 350;
pub const MAX_RETRY_DELAY_MS: u64 = 2_000;
pub const MAX_RETRY_ATTEMPTS: u32 = 5;
pub const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Exponential backoff state shared by reconnect logic.
///
/// The n-th retry (0-based) waits `min(MAX_RETRY_DELAY_MS, INITIAL_RETRY_DELAY_MS · 2^n)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffState {
    attempts: u32,
    delay_ms: u64,
}

impl Default for BackoffState {
    fn default() -> Self {
        Self {
            attempts: 0,
            delay_ms: INITIAL_RETRY_DELAY_MS,
        }
    }
}

impl BackoffState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= MAX_RETRY_ATTEMPTS
    }

    /// Advance to the next attempt, updating the delay for the subsequent attempt.
    ///
    /// Returns the delay to wait *before* performing this attempt.
    pub fn next_delay_and_advance(&mut self) -> Option<u64> {
        if self.is_exhausted() {
            return None;
        }

        let current_delay = self.delay_ms;
        self.attempts += 1;
        self.delay_ms =
            ((self.delay_ms as f64) * BACKOFF_MULTIPLIER).min(MAX_RETRY_DELAY_MS as f64) as u64;
        Some(current_delay)
    }
}
