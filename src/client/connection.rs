//! Socket connection lifecycle as an explicit state machine.
//!
//! Disconnected → Connecting → Connected → Disconnected(reason), with a
//! bounded, jittered exponential backoff between attempts and a hard
//! cap on retries. The driving code sleeps for whatever
//! [`ReconnectDecision::RetryIn`] says and calls [`connect`] again; the
//! gateway plays no part in reconnection.
//!
//! [`connect`]: ConnectionStateMachine::connect

use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected { reason: Option<String> },
    Connecting { attempt: u32 },
    Connected,
}

/// What the controller should do after a close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconnectDecision {
    RetryIn(Duration),
    GiveUp,
}

/// Bounded exponential backoff with subtractive jitter.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
    /// Fraction of the computed delay that may be shaved off at
    /// random, so a fleet of dropped clients does not reconnect in
    /// lockstep. `0.0` disables jitter.
    pub jitter: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_attempts: 8,
            jitter: 0.25,
        }
    }
}

impl BackoffPolicy {
    /// Delay before attempt number `attempt` (1-based), or `None` once
    /// the retry cap is exhausted.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        let capped = self.base.saturating_mul(factor).min(self.max_delay);
        let shave =
            capped.mul_f64(self.jitter.clamp(0.0, 1.0) * rand::thread_rng().gen_range(0.0..1.0));
        Some(capped - shave)
    }
}

pub struct ConnectionStateMachine {
    state: ConnectionState,
    policy: BackoffPolicy,
    attempt: u32,
}

impl ConnectionStateMachine {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            state: ConnectionState::Disconnected { reason: None },
            policy,
            attempt: 0,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Begins a connection attempt.
    pub fn connect(&mut self) -> &ConnectionState {
        self.attempt += 1;
        self.state = ConnectionState::Connecting {
            attempt: self.attempt,
        };
        &self.state
    }

    /// The transport opened; the attempt counter resets so the next
    /// outage starts its backoff from scratch.
    pub fn on_open(&mut self) {
        self.attempt = 0;
        self.state = ConnectionState::Connected;
    }

    /// The transport closed or the attempt failed.
    pub fn on_close(&mut self, reason: impl Into<String>) -> ReconnectDecision {
        self.state = ConnectionState::Disconnected {
            reason: Some(reason.into()),
        };
        match self.policy.delay_for(self.attempt + 1) {
            Some(delay) => ReconnectDecision::RetryIn(delay),
            None => ReconnectDecision::GiveUp,
        }
    }
}

impl Default for ConnectionStateMachine {
    fn default() -> Self {
        Self::new(BackoffPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter(max_attempts: u32) -> BackoffPolicy {
        BackoffPolicy {
            base: Duration::from_millis(100),
            max_delay: Duration::from_millis(800),
            max_attempts,
            jitter: 0.0,
        }
    }

    #[test]
    fn delays_double_then_cap() {
        let policy = no_jitter(10);
        assert_eq!(policy.delay_for(1), Some(Duration::from_millis(100)));
        assert_eq!(policy.delay_for(2), Some(Duration::from_millis(200)));
        assert_eq!(policy.delay_for(3), Some(Duration::from_millis(400)));
        assert_eq!(policy.delay_for(4), Some(Duration::from_millis(800)));
        // Capped from here on.
        assert_eq!(policy.delay_for(5), Some(Duration::from_millis(800)));
    }

    #[test]
    fn jitter_only_shrinks_the_delay() {
        let policy = BackoffPolicy {
            jitter: 0.5,
            ..no_jitter(10)
        };
        for _ in 0..50 {
            let delay = policy.delay_for(4).unwrap();
            assert!(delay <= Duration::from_millis(800));
            assert!(delay >= Duration::from_millis(400));
        }
    }

    #[test]
    fn gives_up_after_the_cap() {
        let mut machine = ConnectionStateMachine::new(no_jitter(2));

        machine.connect();
        assert!(matches!(
            machine.on_close("refused"),
            ReconnectDecision::RetryIn(_)
        ));

        machine.connect();
        assert_eq!(machine.on_close("refused"), ReconnectDecision::GiveUp);
    }

    #[test]
    fn successful_open_resets_the_attempt_counter() {
        let mut machine = ConnectionStateMachine::new(no_jitter(3));

        machine.connect();
        machine.connect();
        machine.on_open();
        assert_eq!(machine.state(), &ConnectionState::Connected);

        // A fresh outage starts over at the base delay.
        let decision = machine.on_close("dropped");
        assert_eq!(
            decision,
            ReconnectDecision::RetryIn(Duration::from_millis(100))
        );
        assert!(matches!(
            machine.connect(),
            ConnectionState::Connecting { attempt: 1 }
        ));
    }
}
