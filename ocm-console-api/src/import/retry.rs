//! Retry policy, poll state machine, injectable sleeper and cancellation
//!
//! The poll loop is modelled as `Pending -> Retrying(n) -> Resolved | Exhausted`
//! so the retry accounting can be tested without timers.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;

/// Fixed-delay retry budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first; at least 1
    pub max_attempts: u32,
    /// Wait between a failed attempt and the next one
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(20, Duration::from_millis(500))
    }
}

/// Externally visible state of a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// No attempt has settled yet
    Pending,
    /// `attempt` failed and another one is scheduled
    Retrying { attempt: u32 },
    Resolved,
    Exhausted,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollState::Resolved | PollState::Exhausted)
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

/// Retry bookkeeping driven by the poll loop
#[derive(Debug, Clone)]
pub struct RetryMachine {
    policy: RetryPolicy,
    state: PollState,
    attempts: u32,
}

impl RetryMachine {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy: RetryPolicy::new(policy.max_attempts, policy.delay),
            state: PollState::Pending,
            attempts: 0,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Attempts started so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Record the start of an attempt and return its 1-based number
    pub fn begin_attempt(&mut self) -> u32 {
        debug_assert!(!self.state.is_terminal(), "attempt started after terminal state");
        self.attempts += 1;
        self.attempts
    }

    pub fn on_success(&mut self) {
        self.state = PollState::Resolved;
    }

    pub fn on_failure(&mut self) -> RetryDecision {
        if self.attempts < self.policy.max_attempts {
            self.state = PollState::Retrying {
                attempt: self.attempts,
            };
            RetryDecision::RetryAfter(self.policy.delay)
        } else {
            self.state = PollState::Exhausted;
            RetryDecision::GiveUp
        }
    }
}

/// Scheduler used between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sending side of a cancellation token
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receiving side; cloned into every operation that should stop on cancel
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn pair() -> (CancelHandle, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, CancelToken { rx })
    }

    /// A token that is never cancelled
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    /// Wrap an existing shutdown receiver; `true` means cancelled
    pub fn from_receiver(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled. Never resolves if the handle is dropped
    /// without cancelling.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_clamps_attempts() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 20);
        assert_eq!(policy.delay, Duration::from_millis(500));
    }

    #[test]
    fn test_machine_exhausts_after_budget() {
        let mut machine = RetryMachine::new(RetryPolicy::new(3, Duration::from_millis(10)));
        assert_eq!(machine.state(), PollState::Pending);

        assert_eq!(machine.begin_attempt(), 1);
        assert_eq!(
            machine.on_failure(),
            RetryDecision::RetryAfter(Duration::from_millis(10))
        );
        assert_eq!(machine.state(), PollState::Retrying { attempt: 1 });

        machine.begin_attempt();
        assert!(matches!(machine.on_failure(), RetryDecision::RetryAfter(_)));

        assert_eq!(machine.begin_attempt(), 3);
        assert_eq!(machine.on_failure(), RetryDecision::GiveUp);
        assert_eq!(machine.state(), PollState::Exhausted);
        assert_eq!(machine.attempts(), 3);
    }

    #[test]
    fn test_machine_resolves() {
        let mut machine = RetryMachine::new(RetryPolicy::default());
        machine.begin_attempt();
        machine.on_failure();
        machine.begin_attempt();
        machine.on_success();
        assert_eq!(machine.state(), PollState::Resolved);
        assert!(machine.state().is_terminal());
        assert_eq!(machine.attempts(), 2);
    }

    #[test]
    fn test_single_attempt_budget_gives_up_immediately() {
        let mut machine = RetryMachine::new(RetryPolicy::new(1, Duration::from_secs(1)));
        machine.begin_attempt();
        assert_eq!(machine.on_failure(), RetryDecision::GiveUp);
    }

    #[tokio::test]
    async fn test_cancel_token() {
        let (handle, mut token) = CancelToken::pair();
        assert!(!token.is_cancelled());

        let other = handle.token();
        handle.cancel();
        token.cancelled().await;
        assert!(token.is_cancelled());
        assert!(other.is_cancelled());
    }

    #[tokio::test]
    async fn test_never_token_stays_pending() {
        let mut token = CancelToken::never();
        let waited =
            tokio::time::timeout(Duration::from_millis(20), token.cancelled()).await;
        assert!(waited.is_err());
        assert!(!token.is_cancelled());
    }
}
