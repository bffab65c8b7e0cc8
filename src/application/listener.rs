//! Continuous listening orchestrator

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex, Notify};
use tracing::{debug, warn};

use crate::domain::listening::{AttemptId, ListeningState, RecognitionResult};

use super::ports::{
    AttemptEvent, AttemptMessage, AttemptOptions, BackendError, PermissionGate, SpeechBackend,
};

/// Default pause before starting the next attempt after a completed utterance
pub const RESTART_DELAY: Duration = Duration::from_millis(50);

/// Default pause before starting the next attempt after a failed one,
/// giving transient resource contention time to clear
pub const ERROR_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Capacity of the attempt event channel
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Sink receiving live transcript updates.
/// Called zero or more times per listening session.
pub type TranscriptSink = Arc<dyn Fn(RecognitionResult) + Send + Sync>;

/// Errors from `start_listening`
#[derive(Debug, Clone, Error)]
pub enum StartError {
    #[error("Speech backend failed to start: {0}")]
    Backend(#[from] BackendError),
}

/// Outcome of a `start_listening` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Listening began; the sink will receive transcript updates
    Started,
    /// A listening session is already active; nothing changed
    AlreadyListening,
    /// Authorization is missing; a permission request was fired and
    /// listening did not start. Call `start_listening` again once the
    /// user has responded.
    PermissionRequested,
}

/// Tuning for the restart loop
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Options applied to every recognition attempt
    pub options: AttemptOptions,
    /// Pause before restarting after a completed utterance
    pub restart_delay: Duration,
    /// Pause before restarting after a failed attempt
    pub error_retry_delay: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            options: AttemptOptions::default(),
            restart_delay: RESTART_DELAY,
            error_retry_delay: ERROR_RETRY_DELAY,
        }
    }
}

/// Continuous listening orchestrator.
///
/// Platform speech APIs end a recognition session after a pause in speech,
/// a single utterance, or an error. This orchestrator stitches those short
/// sessions into one persistent stream: every session end is treated as a
/// neutral event followed by a debounced restart, for as long as the caller
/// has not asked to stop.
///
/// Completed utterances reach the sink with `is_final = false`, exactly like
/// partial fragments: the sink is a live-transcript feed, not a
/// turn-boundary signal.
///
/// `start_listening`, `stop_listening` and `cleanup` are meant to be called
/// from one control task; backend events are marshalled onto the internal
/// restart loop through a channel, so they may originate on any thread.
pub struct ContinuousListener<B, P>
where
    B: SpeechBackend + 'static,
    P: PermissionGate,
{
    backend: Arc<B>,
    permission: P,
    config: ListenerConfig,
    state: Arc<Mutex<ListeningState>>,
    stop_signal: Arc<Notify>,
}

impl<B, P> ContinuousListener<B, P>
where
    B: SpeechBackend + 'static,
    P: PermissionGate,
{
    /// Create a listener with default tuning
    pub fn new(backend: B, permission: P) -> Self {
        Self::with_config(backend, permission, ListenerConfig::default())
    }

    /// Create a listener with explicit tuning
    pub fn with_config(backend: B, permission: P, config: ListenerConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            permission,
            config,
            state: Arc::new(Mutex::new(ListeningState::new())),
            stop_signal: Arc::new(Notify::new()),
        }
    }

    /// Whether a listening session is currently active
    pub async fn is_listening(&self) -> bool {
        self.state.lock().await.is_listening()
    }

    /// Start a continuous listening session.
    ///
    /// The first recognition attempt is issued before this returns, so a
    /// backend that cannot initialize at all surfaces as a hard error here
    /// rather than disappearing into the retry loop.
    pub async fn start_listening(&self, sink: TranscriptSink) -> Result<StartOutcome, StartError> {
        let attempt = {
            let mut state = self.state.lock().await;
            if state.is_listening() {
                return Ok(StartOutcome::AlreadyListening);
            }
            if !self.permission.has_permission() {
                self.permission.request_permission();
                return Ok(StartOutcome::PermissionRequested);
            }
            match state.begin() {
                Ok(attempt) => attempt,
                Err(_) => return Ok(StartOutcome::AlreadyListening),
            }
        };

        debug!(%attempt, "starting listening session");
        let (sender, events) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        if let Err(e) = self
            .backend
            .begin_attempt(attempt, &self.config.options, sender.clone())
            .await
        {
            self.state.lock().await.request_stop();
            return Err(StartError::Backend(e));
        }

        tokio::spawn(run_loop(
            self.backend.clone(),
            self.state.clone(),
            self.stop_signal.clone(),
            self.config.clone(),
            events,
            sender,
            sink,
            attempt,
        ));

        Ok(StartOutcome::Started)
    }

    /// Stop the current listening session.
    ///
    /// Idempotent and non-blocking: flips the session flags, wakes the
    /// restart loop, and issues a best-effort cancel without waiting for
    /// the backend to quiesce. Calling while idle is a no-op.
    pub async fn stop_listening(&self) {
        {
            let mut state = self.state.lock().await;
            if !state.is_listening() && !state.should_continue() {
                return;
            }
            state.request_stop();
        }
        self.stop_signal.notify_one();
        self.backend.cancel_attempt().await;
    }

    /// Stop listening and release backend-held native resources.
    /// Safe to call multiple times, and safe to call when never started.
    pub async fn cleanup(&self) {
        self.stop_listening().await;
        self.backend.release_resources().await;
    }
}

/// How one attempt ended, as observed by the restart loop
enum AttemptOutcome {
    Completed,
    Errored(BackendError),
    Stopped,
}

/// The restart loop: one iteration per recognition attempt.
///
/// The attempt passed in has already been started by the caller.
#[allow(clippy::too_many_arguments)]
async fn run_loop<B: SpeechBackend>(
    backend: Arc<B>,
    state: Arc<Mutex<ListeningState>>,
    stop_signal: Arc<Notify>,
    config: ListenerConfig,
    mut events: mpsc::Receiver<AttemptMessage>,
    sender: mpsc::Sender<AttemptMessage>,
    sink: TranscriptSink,
    mut attempt: AttemptId,
) {
    loop {
        let attempt_started = tokio::time::Instant::now();
        let outcome = pump_attempt(&state, &stop_signal, &mut events, &sink).await;

        let delay = match outcome {
            AttemptOutcome::Stopped => break,
            AttemptOutcome::Completed => {
                let elapsed_ms = attempt_started.elapsed().as_millis() as u64;
                debug!(%attempt, elapsed_ms, "utterance completed");
                config.restart_delay
            }
            AttemptOutcome::Errored(e) if e.is_retryable() => {
                // Swallowed: errors are invisible retries, never sink events.
                warn!(%attempt, error = %e, "recognition attempt failed, will retry");
                config.error_retry_delay
            }
            AttemptOutcome::Errored(e) => {
                warn!(%attempt, error = %e, "recognition attempt failed, ending session");
                break;
            }
        };

        tokio::time::sleep(delay).await;

        // The delay was scheduled before any stop that may have landed in
        // the meantime; intent is re-read now, at fire time.
        let next = {
            let mut state = state.lock().await;
            state.begin_restart(attempt)
        };
        let Some(next) = next else {
            break;
        };
        attempt = next;

        debug!(%attempt, "starting next recognition attempt");
        if let Err(e) = backend
            .begin_attempt(attempt, &config.options, sender.clone())
            .await
        {
            // Route the start failure through the normal event path so the
            // retry policy applies exactly once.
            let _ = sender
                .send(AttemptMessage {
                    attempt,
                    event: AttemptEvent::Error(e),
                })
                .await;
        } else if !state.lock().await.should_continue() {
            // A stop landed while the attempt was starting; take it back.
            backend.cancel_attempt().await;
        }
    }

    // Release the session, unless a newer one already took over.
    state.lock().await.finish_attempt(attempt);
}

/// Consume events until the current attempt ends or the session stops.
async fn pump_attempt(
    state: &Arc<Mutex<ListeningState>>,
    stop_signal: &Arc<Notify>,
    events: &mut mpsc::Receiver<AttemptMessage>,
    sink: &TranscriptSink,
) -> AttemptOutcome {
    loop {
        tokio::select! {
            biased;
            _ = stop_signal.notified() => {
                if !state.lock().await.should_continue() {
                    return AttemptOutcome::Stopped;
                }
                // Wakeup left over from an earlier session; keep pumping.
            }
            message = events.recv() => {
                let Some(message) = message else {
                    // Every sender is gone; nothing more can arrive.
                    return AttemptOutcome::Stopped;
                };
                if !state.lock().await.is_current(message.attempt) {
                    // Late event from a superseded attempt.
                    continue;
                }
                match message.event {
                    AttemptEvent::Partial(text) => {
                        sink(RecognitionResult::partial(text));
                    }
                    AttemptEvent::Completed(text) => {
                        // Forwarded as non-final: the transcript keeps appending.
                        sink(RecognitionResult::partial(text));
                        return AttemptOutcome::Completed;
                    }
                    AttemptEvent::Error(e) => return AttemptOutcome::Errored(e),
                }
            }
        }
    }
}
