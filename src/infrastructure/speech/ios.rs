//! iOS speech recognition adapter
//!
//! Binds `SFSpeechRecognizer` through the Objective-C runtime. One
//! recognition task runs at a time; its result handler runs on an arbitrary
//! dispatch queue and forwards events into the channel of the attempt
//! registered at `begin_attempt` time.

use std::sync::{Mutex as StdMutex, OnceLock};

use async_trait::async_trait;
use block2::RcBlock;
use objc2::rc::Id;
use objc2::runtime::AnyObject;
use objc2::{class, msg_send, msg_send_id};
use objc2_foundation::{NSError, NSString};
use tracing::warn;

use crate::application::ports::{
    AttemptEvent, AttemptMessage, AttemptOptions, BackendError, EventSender, PermissionGate,
    SpeechBackend,
};
use crate::domain::listening::{AttemptId, LanguageTag};

#[link(name = "Speech", kind = "framework")]
extern "C" {}

#[link(name = "AVFoundation", kind = "framework")]
extern "C" {}

/// SFSpeechRecognizerAuthorizationStatusAuthorized
const AUTHORIZATION_AUTHORIZED: isize = 3;

/// The attempt currently allowed to publish events, if any
struct ActiveAttempt {
    attempt: AttemptId,
    events: EventSender,
}

static ACTIVE_ATTEMPT: OnceLock<StdMutex<Option<ActiveAttempt>>> = OnceLock::new();

fn active_attempt() -> &'static StdMutex<Option<ActiveAttempt>> {
    ACTIVE_ATTEMPT.get_or_init(|| StdMutex::new(None))
}

fn publish(event: AttemptEvent) {
    let target = active_attempt()
        .lock()
        .ok()
        .and_then(|guard| guard.as_ref().map(|a| (a.attempt, a.events.clone())));
    send_event(target, event);
}

fn publish_terminal(event: AttemptEvent) {
    let target = active_attempt()
        .lock()
        .ok()
        .and_then(|mut guard| guard.take())
        .map(|a| (a.attempt, a.events));
    send_event(target, event);
}

fn send_event(target: Option<(AttemptId, EventSender)>, event: AttemptEvent) {
    let Some((attempt, events)) = target else {
        return;
    };
    // The result handler runs on a dispatch queue; never block it.
    if events.try_send(AttemptMessage { attempt, event }).is_err() {
        warn!(%attempt, "dropping recognition event: channel full or closed");
    }
}

fn authorization_status() -> isize {
    unsafe { msg_send![class!(SFSpeechRecognizer), authorizationStatus] }
}

/// Speech backend over `SFSpeechRecognizer`
pub struct IosSpeechBackend {
    /// Recognizer for the locale of the last attempt, reused across restarts
    recognizer: StdMutex<Option<(LanguageTag, Id<AnyObject>)>>,
    task: StdMutex<Option<Id<AnyObject>>>,
}

// SAFETY: the recognizer and task handles are only used for control calls
// (start/cancel), which the Speech framework accepts from any thread.
unsafe impl Send for IosSpeechBackend {}
unsafe impl Sync for IosSpeechBackend {}

impl IosSpeechBackend {
    pub fn new() -> Self {
        Self {
            recognizer: StdMutex::new(None),
            task: StdMutex::new(None),
        }
    }

    fn ensure_recognizer(&self, language: &LanguageTag) -> Result<Id<AnyObject>, BackendError> {
        let mut slot = self
            .recognizer
            .lock()
            .map_err(|_| BackendError::ResourceUnavailable("recognizer lock poisoned".into()))?;
        if let Some((cached_language, recognizer)) = slot.as_ref() {
            if cached_language == language {
                return Ok(recognizer.clone());
            }
        }

        let recognizer: Option<Id<AnyObject>> = unsafe {
            let identifier = NSString::from_str(language.as_str());
            let locale: Id<AnyObject> =
                msg_send_id![class!(NSLocale), localeWithLocaleIdentifier: &*identifier];
            let allocated = msg_send_id![class!(SFSpeechRecognizer), alloc];
            msg_send_id![allocated, initWithLocale: &*locale]
        };
        let Some(recognizer) = recognizer else {
            return Err(BackendError::ResourceUnavailable(format!(
                "speech recognition unsupported for locale {language}"
            )));
        };

        let available: bool = unsafe { msg_send![&*recognizer, isAvailable] };
        if !available {
            return Err(BackendError::ResourceUnavailable(
                "speech recognizer is not currently available".into(),
            ));
        }

        *slot = Some((language.clone(), recognizer.clone()));
        Ok(recognizer)
    }

    /// Put the shared audio session into record mode.
    fn activate_audio_session(&self) -> Result<(), BackendError> {
        unsafe {
            let session: Id<AnyObject> = msg_send_id![class!(AVAudioSession), sharedInstance];
            let category = NSString::from_str("AVAudioSessionCategoryRecord");
            let ok: bool = msg_send![
                &*session,
                setCategory: &*category,
                error: std::ptr::null_mut::<*mut NSError>()
            ];
            if !ok {
                return Err(BackendError::ResourceUnavailable(
                    "failed to configure audio session".into(),
                ));
            }
            let ok: bool = msg_send![
                &*session,
                setActive: true,
                error: std::ptr::null_mut::<*mut NSError>()
            ];
            if !ok {
                return Err(BackendError::ResourceUnavailable(
                    "failed to activate audio session".into(),
                ));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SpeechBackend for IosSpeechBackend {
    async fn begin_attempt(
        &self,
        attempt: AttemptId,
        options: &AttemptOptions,
        events: EventSender,
    ) -> Result<(), BackendError> {
        if authorization_status() != AUTHORIZATION_AUTHORIZED {
            return Err(BackendError::PermissionDenied);
        }
        let recognizer = self.ensure_recognizer(&options.language)?;
        self.activate_audio_session()?;

        // Register before starting the task: the handler may fire immediately.
        if let Ok(mut guard) = active_attempt().lock() {
            *guard = Some(ActiveAttempt { attempt, events });
        }

        let task: Id<AnyObject> = unsafe {
            let request: Id<AnyObject> =
                msg_send_id![class!(SFSpeechAudioBufferRecognitionRequest), new];
            let _: () = msg_send![
                &*request,
                setShouldReportPartialResults: options.partial_results
            ];

            let handler = RcBlock::new(|result: *mut AnyObject, error: *mut NSError| {
                if !error.is_null() {
                    let description = unsafe { (*error).localizedDescription() };
                    publish_terminal(AttemptEvent::Error(BackendError::Transient(
                        description.to_string(),
                    )));
                    return;
                }
                if result.is_null() {
                    return;
                }
                let (text, is_final) = unsafe {
                    let transcription: Id<AnyObject> =
                        msg_send_id![&*result, bestTranscription];
                    let text: Id<NSString> = msg_send_id![&*transcription, formattedString];
                    let is_final: bool = msg_send![&*result, isFinal];
                    (text.to_string(), is_final)
                };
                if is_final {
                    publish_terminal(AttemptEvent::Completed(text));
                } else {
                    publish(AttemptEvent::Partial(text));
                }
            });

            msg_send_id![
                &*recognizer,
                recognitionTaskWithRequest: &*request,
                resultHandler: &*handler
            ]
        };

        if let Ok(mut slot) = self.task.lock() {
            *slot = Some(task);
        }
        Ok(())
    }

    async fn cancel_attempt(&self) {
        if let Ok(mut guard) = active_attempt().lock() {
            guard.take();
        }
        let task = self.task.lock().ok().and_then(|mut slot| slot.take());
        if let Some(task) = task {
            unsafe {
                let _: () = msg_send![&*task, cancel];
            }
        }
    }

    async fn release_resources(&self) {
        self.cancel_attempt().await;
        if let Ok(mut slot) = self.recognizer.lock() {
            slot.take();
        }
    }
}

/// Speech-recognition authorization gate over `SFSpeechRecognizer`
pub struct IosPermissionGate;

impl IosPermissionGate {
    pub fn new() -> Self {
        Self
    }
}

impl Default for IosPermissionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionGate for IosPermissionGate {
    fn has_permission(&self) -> bool {
        authorization_status() == AUTHORIZATION_AUTHORIZED
    }

    fn request_permission(&self) {
        let handler = RcBlock::new(|status: isize| {
            tracing::debug!(status, "speech recognition authorization status");
        });
        unsafe {
            let _: () = msg_send![
                class!(SFSpeechRecognizer),
                requestAuthorization: &*handler
            ];
        }
    }
}
