//! Listening state machine

use std::fmt;
use thiserror::Error;

/// Identifier for one bounded recognition attempt.
/// Monotonic within a [`ListeningState`]; never reused, so events from a
/// superseded attempt can be told apart from current ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttemptId(u64);

impl AttemptId {
    /// Get the raw counter value
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Error when starting a session that is already running
#[derive(Debug, Clone, Error)]
#[error("Cannot start listening: a listening session is already active")]
pub struct AlreadyListening;

/// Listening session state.
///
/// Two flags drive the restart loop: `is_listening` (an attempt is currently
/// active) and `should_continue` (user intent: keep restarting after the
/// current attempt ends). `should_continue` becomes true only through
/// [`begin`](Self::begin) and false only through
/// [`request_stop`](Self::request_stop) /
/// [`finish_attempt`](Self::finish_attempt).
///
/// State machine:
///   IDLE -> ATTEMPTING (begin)
///   ATTEMPTING -> ATTEMPTING (begin_restart, while should_continue holds)
///   ATTEMPTING -> IDLE (request_stop, or finish_attempt by the owner)
#[derive(Debug, Default)]
pub struct ListeningState {
    should_continue: bool,
    is_listening: bool,
    attempt_seq: u64,
    current_attempt: Option<AttemptId>,
}

impl ListeningState {
    /// Create a new idle state
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an attempt is currently active
    pub fn is_listening(&self) -> bool {
        self.is_listening
    }

    /// Whether the session should restart after the current attempt ends
    pub fn should_continue(&self) -> bool {
        self.should_continue
    }

    /// The attempt whose events are currently accepted, if any
    pub fn current_attempt(&self) -> Option<AttemptId> {
        self.current_attempt
    }

    /// Whether `attempt` is the one whose events are currently accepted
    pub fn is_current(&self, attempt: AttemptId) -> bool {
        self.current_attempt == Some(attempt)
    }

    /// Transition from IDLE to ATTEMPTING and hand out the first attempt id.
    pub fn begin(&mut self) -> Result<AttemptId, AlreadyListening> {
        if self.is_listening {
            return Err(AlreadyListening);
        }
        self.should_continue = true;
        self.is_listening = true;
        Ok(self.next_attempt())
    }

    /// Advance to the next attempt after `finished` ended.
    ///
    /// Returns `None` when the session was stopped in the meantime, or when
    /// `finished` is no longer the current attempt (a newer session took
    /// over); the caller must not start another attempt in either case.
    pub fn begin_restart(&mut self, finished: AttemptId) -> Option<AttemptId> {
        if !self.should_continue || !self.is_current(finished) {
            return None;
        }
        Some(self.next_attempt())
    }

    /// Transition to IDLE. Idempotent; callable from any state.
    pub fn request_stop(&mut self) {
        self.should_continue = false;
        self.is_listening = false;
        self.current_attempt = None;
    }

    /// Transition to IDLE, but only if `attempt` is still the current one.
    ///
    /// A restart loop that ends on its own (for example after an
    /// unrecoverable backend error) releases the session through this method
    /// so it cannot clobber a newer session that superseded it.
    pub fn finish_attempt(&mut self, attempt: AttemptId) {
        if self.is_current(attempt) {
            self.request_stop();
        }
    }

    fn next_attempt(&mut self) -> AttemptId {
        self.attempt_seq += 1;
        let attempt = AttemptId(self.attempt_seq);
        self.current_attempt = Some(attempt);
        attempt
    }
}
