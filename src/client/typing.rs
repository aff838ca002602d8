//! Receiver-side typing indicator expiry.
//!
//! Typing events are best-effort with no ordering guarantee, so the
//! receiver clears a stale indicator on its own: if no refresh arrives
//! within the window, the indicator goes dark. The gateway enforces
//! nothing here.

use std::time::{Duration, Instant};

/// How long a typing indicator stays lit without a refresh.
pub const TYPING_TTL: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone)]
pub struct TypingState {
    deadline: Option<Instant>,
    ttl: Duration,
}

impl TypingState {
    pub fn new() -> Self {
        Self::with_ttl(TYPING_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self { deadline: None, ttl }
    }

    /// A `user_typing` event arrived: push the deadline out.
    pub fn refresh(&mut self) {
        self.deadline = Some(Instant::now() + self.ttl);
    }

    /// The other party sent a message; the indicator drops immediately.
    pub fn clear(&mut self) {
        self.deadline = None;
    }

    pub fn is_active(&self) -> bool {
        matches!(self.deadline, Some(deadline) if Instant::now() < deadline)
    }
}

impl Default for TypingState {
    fn default() -> Self {
        Self::new()
    }
}
