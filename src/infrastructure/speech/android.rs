//! Android speech recognition adapter
//!
//! Binds `android.speech.SpeechRecognizer` through JNI. Recognition
//! callbacks arrive through the `VoxloopRecognitionListener` Java shim class
//! (shipped under `platform/android/`), whose native methods forward into
//! the event channel of the attempt registered at `begin_attempt` time. The
//! shim has no notion of attempt ids: tagging happens at the registration
//! boundary, and a registration accepts exactly one terminal event.
//!
//! `SpeechRecognizer` methods must be invoked from the app's main thread;
//! drive the listener from the platform main-thread executor.

use std::sync::{Mutex as StdMutex, OnceLock};

use async_trait::async_trait;
use jni::objects::{GlobalRef, JClass, JObject, JString, JValue};
use jni::sys::jint;
use jni::{JNIEnv, JavaVM};
use tracing::warn;

use crate::application::ports::{
    AttemptEvent, AttemptMessage, AttemptOptions, BackendError, EventSender, PermissionGate,
    SpeechBackend,
};
use crate::domain::listening::AttemptId;

/// android.speech.SpeechRecognizer.ERROR_INSUFFICIENT_PERMISSIONS
const ERROR_INSUFFICIENT_PERMISSIONS: jint = 9;

/// Request code passed to Activity.requestPermissions
const PERMISSION_REQUEST_CODE: jint = 1234;

const RECORD_AUDIO_PERMISSION: &str = "android.permission.RECORD_AUDIO";

/// The attempt currently allowed to publish events, if any
struct ActiveAttempt {
    attempt: AttemptId,
    events: EventSender,
}

static ACTIVE_ATTEMPT: OnceLock<StdMutex<Option<ActiveAttempt>>> = OnceLock::new();

fn active_attempt() -> &'static StdMutex<Option<ActiveAttempt>> {
    ACTIVE_ATTEMPT.get_or_init(|| StdMutex::new(None))
}

/// Forward a non-terminal event to the registered attempt.
fn publish(event: AttemptEvent) {
    let target = active_attempt()
        .lock()
        .ok()
        .and_then(|guard| guard.as_ref().map(|a| (a.attempt, a.events.clone())));
    send_event(target, event);
}

/// Forward a terminal event and release the registration.
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
    // Callbacks run on the platform main thread; never block it.
    if events.try_send(AttemptMessage { attempt, event }).is_err() {
        warn!(%attempt, "dropping recognition event: channel full or closed");
    }
}

fn map_error_code(code: jint) -> BackendError {
    if code == ERROR_INSUFFICIENT_PERMISSIONS {
        BackendError::PermissionDenied
    } else {
        BackendError::Transient(format!("recognizer error code {code}"))
    }
}

fn jni_err(e: jni::errors::Error) -> BackendError {
    BackendError::ResourceUnavailable(e.to_string())
}

/// Speech backend over `android.speech.SpeechRecognizer`
pub struct AndroidSpeechBackend {
    vm: JavaVM,
    context: GlobalRef,
    recognizer: StdMutex<Option<GlobalRef>>,
}

impl AndroidSpeechBackend {
    pub fn new() -> Result<Self, BackendError> {
        let ctx = ndk_context::android_context();
        let vm = unsafe { JavaVM::from_raw(ctx.vm().cast()) }.map_err(jni_err)?;
        let context = {
            let mut env = vm.attach_current_thread().map_err(jni_err)?;
            let context = unsafe { JObject::from_raw(ctx.context().cast()) };
            env.new_global_ref(context).map_err(jni_err)?
        };
        Ok(Self {
            vm,
            context,
            recognizer: StdMutex::new(None),
        })
    }

    /// Create the recognizer and wire the listener shim on first use.
    fn ensure_recognizer(&self, env: &mut JNIEnv) -> Result<GlobalRef, BackendError> {
        let mut slot = self
            .recognizer
            .lock()
            .map_err(|_| BackendError::ResourceUnavailable("recognizer lock poisoned".into()))?;
        if let Some(recognizer) = slot.as_ref() {
            return Ok(recognizer.clone());
        }

        let available = env
            .call_static_method(
                "android/speech/SpeechRecognizer",
                "isRecognitionAvailable",
                "(Landroid/content/Context;)Z",
                &[JValue::Object(self.context.as_obj())],
            )
            .and_then(|v| v.z())
            .map_err(jni_err)?;
        if !available {
            return Err(BackendError::ResourceUnavailable(
                "no speech recognition service installed".into(),
            ));
        }

        let recognizer = env
            .call_static_method(
                "android/speech/SpeechRecognizer",
                "createSpeechRecognizer",
                "(Landroid/content/Context;)Landroid/speech/SpeechRecognizer;",
                &[JValue::Object(self.context.as_obj())],
            )
            .and_then(|v| v.l())
            .map_err(jni_err)?;

        let listener = env
            .new_object("dev/voxloop/VoxloopRecognitionListener", "()V", &[])
            .map_err(jni_err)?;
        env.call_method(
            &recognizer,
            "setRecognitionListener",
            "(Landroid/speech/RecognitionListener;)V",
            &[JValue::Object(&listener)],
        )
        .map_err(jni_err)?;

        let global = env.new_global_ref(&recognizer).map_err(jni_err)?;
        *slot = Some(global.clone());
        Ok(global)
    }

    fn build_intent<'a>(
        &self,
        env: &mut JNIEnv<'a>,
        options: &AttemptOptions,
    ) -> Result<JObject<'a>, BackendError> {
        let action = env
            .new_string("android.speech.action.RECOGNIZE_SPEECH")
            .map_err(jni_err)?;
        let intent = env
            .new_object(
                "android/content/Intent",
                "(Ljava/lang/String;)V",
                &[JValue::Object(&action)],
            )
            .map_err(jni_err)?;

        self.put_string_extra(
            env,
            &intent,
            "android.speech.extra.LANGUAGE",
            options.language.as_str(),
        )?;
        self.put_string_extra(
            env,
            &intent,
            "android.speech.extra.LANGUAGE_MODEL",
            "free_form",
        )?;
        self.put_bool_extra(
            env,
            &intent,
            "android.speech.extra.PARTIAL_RESULTS",
            options.partial_results,
        )?;

        Ok(intent)
    }

    fn put_string_extra(
        &self,
        env: &mut JNIEnv,
        intent: &JObject,
        key: &str,
        value: &str,
    ) -> Result<(), BackendError> {
        let key = env.new_string(key).map_err(jni_err)?;
        let value = env.new_string(value).map_err(jni_err)?;
        env.call_method(
            intent,
            "putExtra",
            "(Ljava/lang/String;Ljava/lang/String;)Landroid/content/Intent;",
            &[JValue::Object(&key), JValue::Object(&value)],
        )
        .map_err(jni_err)?;
        Ok(())
    }

    fn put_bool_extra(
        &self,
        env: &mut JNIEnv,
        intent: &JObject,
        key: &str,
        value: bool,
    ) -> Result<(), BackendError> {
        let key = env.new_string(key).map_err(jni_err)?;
        env.call_method(
            intent,
            "putExtra",
            "(Ljava/lang/String;Z)Landroid/content/Intent;",
            &[JValue::Object(&key), JValue::Bool(value.into())],
        )
        .map_err(jni_err)?;
        Ok(())
    }
}

#[async_trait]
impl SpeechBackend for AndroidSpeechBackend {
    async fn begin_attempt(
        &self,
        attempt: AttemptId,
        options: &AttemptOptions,
        events: EventSender,
    ) -> Result<(), BackendError> {
        let mut env = self.vm.attach_current_thread().map_err(jni_err)?;
        let recognizer = self.ensure_recognizer(&mut env)?;

        // Register before startListening: the first callback may be immediate.
        if let Ok(mut guard) = active_attempt().lock() {
            *guard = Some(ActiveAttempt { attempt, events });
        }

        let intent = self.build_intent(&mut env, options)?;
        env.call_method(
            recognizer.as_obj(),
            "startListening",
            "(Landroid/content/Intent;)V",
            &[JValue::Object(&intent)],
        )
        .map_err(jni_err)?;
        Ok(())
    }

    async fn cancel_attempt(&self) {
        if let Ok(mut guard) = active_attempt().lock() {
            guard.take();
        }
        let Ok(mut env) = self.vm.attach_current_thread() else {
            return;
        };
        let recognizer = self.recognizer.lock().ok().and_then(|slot| slot.clone());
        if let Some(recognizer) = recognizer {
            if let Err(e) = env.call_method(recognizer.as_obj(), "cancel", "()V", &[]) {
                warn!(error = %e, "failed to cancel recognition attempt");
            }
        }
    }

    async fn release_resources(&self) {
        if let Ok(mut guard) = active_attempt().lock() {
            guard.take();
        }
        let recognizer = self.recognizer.lock().ok().and_then(|mut slot| slot.take());
        let Some(recognizer) = recognizer else {
            return;
        };
        let Ok(mut env) = self.vm.attach_current_thread() else {
            return;
        };
        if let Err(e) = env.call_method(recognizer.as_obj(), "destroy", "()V", &[]) {
            warn!(error = %e, "failed to destroy speech recognizer");
        }
    }
}

/// Record-audio permission gate over the Android runtime-permission API
pub struct AndroidPermissionGate {
    vm: JavaVM,
    context: GlobalRef,
}

impl AndroidPermissionGate {
    /// The embedded context must be the foreground activity for
    /// `request_permission` to be able to show the system dialog.
    pub fn new() -> Result<Self, BackendError> {
        let ctx = ndk_context::android_context();
        let vm = unsafe { JavaVM::from_raw(ctx.vm().cast()) }.map_err(jni_err)?;
        let context = {
            let mut env = vm.attach_current_thread().map_err(jni_err)?;
            let context = unsafe { JObject::from_raw(ctx.context().cast()) };
            env.new_global_ref(context).map_err(jni_err)?
        };
        Ok(Self { vm, context })
    }
}

impl PermissionGate for AndroidPermissionGate {
    fn has_permission(&self) -> bool {
        let Ok(mut env) = self.vm.attach_current_thread() else {
            return false;
        };
        let granted = env
            .new_string(RECORD_AUDIO_PERMISSION)
            .and_then(|permission| {
                env.call_method(
                    self.context.as_obj(),
                    "checkSelfPermission",
                    "(Ljava/lang/String;)I",
                    &[JValue::Object(&permission)],
                )
            })
            .and_then(|v| v.i());
        match granted {
            // PackageManager.PERMISSION_GRANTED
            Ok(code) => code == 0,
            Err(e) => {
                warn!(error = %e, "permission check failed");
                false
            }
        }
    }

    fn request_permission(&self) {
        let Ok(mut env) = self.vm.attach_current_thread() else {
            return;
        };
        let result = env.new_string(RECORD_AUDIO_PERMISSION).and_then(|permission| {
            let array = env.new_object_array(1, "java/lang/String", &permission)?;
            env.call_method(
                self.context.as_obj(),
                "requestPermissions",
                "([Ljava/lang/String;I)V",
                &[
                    JValue::Object(&array),
                    JValue::Int(PERMISSION_REQUEST_CODE),
                ],
            )
            .map(|_| ())
        });
        if let Err(e) = result {
            warn!(error = %e, "permission request failed");
        }
    }
}

/// Native half of VoxloopRecognitionListener.onResults
#[no_mangle]
pub extern "system" fn Java_dev_voxloop_VoxloopRecognitionListener_nativeOnResults(
    mut env: JNIEnv,
    _class: JClass,
    text: JString,
) {
    match env.get_string(&text) {
        Ok(text) => publish_terminal(AttemptEvent::Completed(text.into())),
        Err(e) => warn!(error = %e, "failed to read recognition result"),
    }
}

/// Native half of VoxloopRecognitionListener.onPartialResults
#[no_mangle]
pub extern "system" fn Java_dev_voxloop_VoxloopRecognitionListener_nativeOnPartialResults(
    mut env: JNIEnv,
    _class: JClass,
    text: JString,
) {
    match env.get_string(&text) {
        Ok(text) => publish(AttemptEvent::Partial(text.into())),
        Err(e) => warn!(error = %e, "failed to read partial recognition result"),
    }
}

/// Native half of VoxloopRecognitionListener.onError
#[no_mangle]
pub extern "system" fn Java_dev_voxloop_VoxloopRecognitionListener_nativeOnError(
    _env: JNIEnv,
    _class: JClass,
    code: jint,
) {
    publish_terminal(AttemptEvent::Error(map_error_code(code)));
}
