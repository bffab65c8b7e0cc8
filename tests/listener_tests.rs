//! Listening orchestration integration tests
//!
//! Drive the public listener API with a scripted backend behind trait
//! objects, the way an embedding application would wire it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use voxloop::application::ports::{
    AttemptEvent, AttemptMessage, AttemptOptions, BackendError, EventSender, PermissionGate,
    SpeechBackend,
};
use voxloop::application::{ContinuousListener, StartOutcome, TranscriptSink};
use voxloop::domain::listening::{AttemptId, RecognitionResult};

/// Backend that plays back one event script per attempt
struct ScriptedBackend {
    scripts: Mutex<VecDeque<Vec<AttemptEvent>>>,
    attempts: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    fn new(scripts: Vec<Vec<AttemptEvent>>) -> (Self, Arc<AtomicUsize>) {
        let attempts = Arc::new(AtomicUsize::new(0));
        (
            Self {
                scripts: Mutex::new(scripts.into()),
                attempts: attempts.clone(),
            },
            attempts,
        )
    }
}

#[async_trait]
impl SpeechBackend for ScriptedBackend {
    async fn begin_attempt(
        &self,
        attempt: AttemptId,
        _options: &AttemptOptions,
        events: EventSender,
    ) -> Result<(), BackendError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.lock().unwrap().pop_front();
        if let Some(script) = script {
            for event in script {
                let _ = events.send(AttemptMessage { attempt, event }).await;
            }
        }
        Ok(())
    }

    async fn cancel_attempt(&self) {}

    async fn release_resources(&self) {}
}

struct StaticGate {
    granted: bool,
    requests: Arc<AtomicUsize>,
}

impl StaticGate {
    fn new(granted: bool) -> (Self, Arc<AtomicUsize>) {
        let requests = Arc::new(AtomicUsize::new(0));
        (
            Self {
                granted,
                requests: requests.clone(),
            },
            requests,
        )
    }
}

impl PermissionGate for StaticGate {
    fn has_permission(&self) -> bool {
        self.granted
    }

    fn request_permission(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

fn capture_sink() -> (TranscriptSink, Arc<Mutex<Vec<RecognitionResult>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let sink: TranscriptSink = Arc::new(move |result| {
        recorder.lock().unwrap().push(result);
    });
    (sink, seen)
}

fn boxed_listener(
    backend: ScriptedBackend,
    gate: StaticGate,
) -> ContinuousListener<Box<dyn SpeechBackend>, Box<dyn PermissionGate>> {
    ContinuousListener::new(Box::new(backend), Box::new(gate))
}

#[tokio::test(start_paused = true)]
async fn stitches_multiple_utterances_into_one_transcript() {
    let (backend, attempts) = ScriptedBackend::new(vec![
        vec![
            AttemptEvent::Partial("good".into()),
            AttemptEvent::Completed("good morning".into()),
        ],
        vec![
            AttemptEvent::Partial("every".into()),
            AttemptEvent::Completed("everyone".into()),
        ],
        vec![],
    ]);
    let (gate, _) = StaticGate::new(true);
    let listener = boxed_listener(backend, gate);
    let (sink, seen) = capture_sink();

    let outcome = listener.start_listening(sink).await.unwrap();
    assert_eq!(outcome, StartOutcome::Started);

    // Two utterances plus the restart into a third, silent attempt.
    sleep(Duration::from_millis(300)).await;

    let texts: Vec<String> = seen.lock().unwrap().iter().map(|r| r.text.clone()).collect();
    assert_eq!(texts, vec!["good", "good morning", "every", "everyone"]);
    assert!(seen.lock().unwrap().iter().all(|r| !r.is_final));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert!(listener.is_listening().await);

    listener.cleanup().await;
    assert!(!listener.is_listening().await);
}

#[tokio::test(start_paused = true)]
async fn recovers_from_transient_errors_between_utterances() {
    let (backend, attempts) = ScriptedBackend::new(vec![
        vec![AttemptEvent::Completed("first".into())],
        vec![AttemptEvent::Error(BackendError::Transient(
            "no speech detected".into(),
        ))],
        vec![AttemptEvent::Completed("second".into())],
        vec![],
    ]);
    let (gate, _) = StaticGate::new(true);
    let listener = boxed_listener(backend, gate);
    let (sink, seen) = capture_sink();

    listener.start_listening(sink).await.unwrap();

    // Covers one fast restart, one slow error retry, and another fast restart.
    sleep(Duration::from_secs(3)).await;

    let texts: Vec<String> = seen.lock().unwrap().iter().map(|r| r.text.clone()).collect();
    assert_eq!(texts, vec!["first", "second"]);
    assert_eq!(attempts.load(Ordering::SeqCst), 4);
    assert!(listener.is_listening().await);

    listener.stop_listening().await;
    assert!(!listener.is_listening().await);
}

#[tokio::test(start_paused = true)]
async fn denied_permission_never_reaches_backend() {
    let (backend, attempts) = ScriptedBackend::new(vec![vec![]]);
    let (gate, requests) = StaticGate::new(false);
    let listener = boxed_listener(backend, gate);
    let (sink, seen) = capture_sink();

    let outcome = listener.start_listening(sink).await.unwrap();
    sleep(Duration::from_secs(2)).await;

    assert_eq!(outcome, StartOutcome::PermissionRequested);
    assert_eq!(requests.load(Ordering::SeqCst), 1);
    assert_eq!(attempts.load(Ordering::SeqCst), 0);
    assert!(seen.lock().unwrap().is_empty());
    assert!(!listener.is_listening().await);
}
