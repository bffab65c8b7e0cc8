//! Speech backend port interface

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::listening::{AttemptId, LanguageTag};

/// Speech backend errors
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("Microphone or recognition permission denied")]
    PermissionDenied,

    #[error("Recognizer unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("Recognition failed: {0}")]
    Transient(String),
}

impl BackendError {
    /// Whether the restart loop may retry after this error.
    /// Authorization loss never clears on its own, so it is not retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::PermissionDenied)
    }
}

/// Options for one recognition attempt
#[derive(Debug, Clone)]
pub struct AttemptOptions {
    /// Recognition language/locale
    pub language: LanguageTag,
    /// Whether in-progress fragments are reported during the attempt
    pub partial_results: bool,
}

impl Default for AttemptOptions {
    fn default() -> Self {
        Self {
            language: LanguageTag::default(),
            partial_results: true,
        }
    }
}

/// Event reported by a backend during one attempt.
/// `Completed` and `Error` end the attempt; `Partial` does not.
#[derive(Debug, Clone)]
pub enum AttemptEvent {
    /// In-progress transcription fragment that may still change
    Partial(String),
    /// The platform's end-of-utterance result
    Completed(String),
    /// The attempt failed
    Error(BackendError),
}

/// An attempt event tagged with the attempt that produced it, so late
/// events from a superseded attempt can be discarded.
#[derive(Debug, Clone)]
pub struct AttemptMessage {
    pub attempt: AttemptId,
    pub event: AttemptEvent,
}

/// Sending half of the attempt event channel, handed to the backend
pub type EventSender = mpsc::Sender<AttemptMessage>;

/// Port for single-shot platform speech recognition sessions.
///
/// A backend performs one bounded recognition attempt at a time: platform
/// speech APIs end a session after a pause in speech, a single utterance, or
/// an error. Stitching attempts into a continuous stream is the listener's
/// job, not the backend's.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Start one bounded recognition attempt.
    ///
    /// Events for the attempt are pushed to `events`, each tagged with
    /// `attempt`. The attempt ends with a `Completed` or `Error` event, or
    /// silently after `cancel_attempt`.
    ///
    /// # Errors
    /// `PermissionDenied` or `ResourceUnavailable` when the attempt cannot
    /// start at all; no events are delivered in that case.
    async fn begin_attempt(
        &self,
        attempt: AttemptId,
        options: &AttemptOptions,
        events: EventSender,
    ) -> Result<(), BackendError>;

    /// Best-effort immediate stop of the in-flight attempt, if any.
    async fn cancel_attempt(&self);

    /// Release any held native audio/recognition handles.
    async fn release_resources(&self);
}

#[async_trait]
impl SpeechBackend for Box<dyn SpeechBackend> {
    async fn begin_attempt(
        &self,
        attempt: AttemptId,
        options: &AttemptOptions,
        events: EventSender,
    ) -> Result<(), BackendError> {
        (**self).begin_attempt(attempt, options, events).await
    }

    async fn cancel_attempt(&self) {
        (**self).cancel_attempt().await
    }

    async fn release_resources(&self) {
        (**self).release_resources().await
    }
}
