use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A single failed attempt against one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryAttempt {
    /// 1-based round number.
    pub round: u8,
    /// Provider (model) that failed.
    pub provider: String,
    /// Error message from the failed attempt.
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl RetryAttempt {
    pub fn new(round: u8, provider: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            round,
            provider: provider.into(),
            error: error.into(),
            timestamp: Utc::now(),
        }
    }
}

/// What to do after a round in which every provider failed.
#[derive(Debug, Clone)]
pub enum RetryDecision {
    Retry { next_round: u8, delay: Duration },
    Exhausted { history: Vec<RetryAttempt> },
}

/// Bounded retry budget with exponential backoff between rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total rounds allowed. Zero is treated as one.
    pub max_rounds: u8,
    pub base_ms: u64,
    pub max_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            base_ms: 1000,
            max_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_rounds: u8, base_ms: u64, max_ms: u64) -> Self {
        Self {
            max_rounds,
            base_ms,
            max_ms,
        }
    }

    /// Policy without delays, for tests and local dry runs.
    pub fn immediate(max_rounds: u8) -> Self {
        Self::new(max_rounds, 0, 0)
    }

    /// Pause after `finished_round` fails: the base delay doubles per round,
    /// plus up to a quarter of itself as jitter, never above `max_ms`.
    pub fn delay_after(&self, finished_round: u8) -> Duration {
        if finished_round == 0 {
            return Duration::ZERO;
        }
        let doubled = 2u64.saturating_pow(u32::from(finished_round - 1));
        let delay_ms = self.base_ms.saturating_mul(doubled);
        let jitter = match delay_ms / 4 {
            0 => 0,
            spread => rand::rng().random_range(0..=spread),
        };
        Duration::from_millis(delay_ms.saturating_add(jitter).min(self.max_ms))
    }
}

/// Records failures across rounds and decides whether another round is allowed.
#[derive(Debug)]
pub struct RetryLog {
    policy: RetryPolicy,
    round: u8,
    history: Vec<RetryAttempt>,
}

impl RetryLog {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            round: 1,
            history: Vec::new(),
        }
    }

    /// Current 1-based round.
    pub fn round(&self) -> u8 {
        self.round
    }

    pub fn record_failure(&mut self, provider: &str, error: &str) {
        self.history
            .push(RetryAttempt::new(self.round, provider, error));
    }

    pub fn history(&self) -> &[RetryAttempt] {
        &self.history
    }

    /// Close the current round after all providers failed.
    pub fn finish_round(&mut self) -> RetryDecision {
        if self.round >= self.policy.max_rounds.max(1) {
            return RetryDecision::Exhausted {
                history: std::mem::take(&mut self.history),
            };
        }

        let delay = self.policy.delay_after(self.round);
        self.round += 1;
        RetryDecision::Retry {
            next_round: self.round,
            delay,
        }
    }
}
