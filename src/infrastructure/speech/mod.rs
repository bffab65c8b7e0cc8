//! Platform speech recognition adapters
//!
//! One adapter per platform speech service:
//! - Android: `android.speech.SpeechRecognizer` over JNI
//! - iOS: `SFSpeechRecognizer` over the Objective-C runtime
//!
//! The backend for the host platform is chosen once, at construction; it is
//! immutable for the listener's lifetime.

#[cfg(target_os = "android")]
mod android;

#[cfg(target_os = "ios")]
mod ios;

#[cfg(target_os = "android")]
pub use android::{AndroidPermissionGate, AndroidSpeechBackend};

#[cfg(target_os = "ios")]
pub use ios::{IosPermissionGate, IosSpeechBackend};

use crate::application::ports::{BackendError, PermissionGate, SpeechBackend};

/// Construct the speech backend and permission gate for the host platform.
#[cfg(target_os = "android")]
pub fn platform_speech() -> Result<(Box<dyn SpeechBackend>, Box<dyn PermissionGate>), BackendError>
{
    let backend = AndroidSpeechBackend::new()?;
    let gate = AndroidPermissionGate::new()?;
    Ok((Box::new(backend), Box::new(gate)))
}

/// Construct the speech backend and permission gate for the host platform.
#[cfg(target_os = "ios")]
pub fn platform_speech() -> Result<(Box<dyn SpeechBackend>, Box<dyn PermissionGate>), BackendError>
{
    let backend = IosSpeechBackend::new();
    let gate = IosPermissionGate::new();
    Ok((Box::new(backend), Box::new(gate)))
}

/// Construct the speech backend and permission gate for the host platform.
#[cfg(not(any(target_os = "android", target_os = "ios")))]
pub fn platform_speech() -> Result<(Box<dyn SpeechBackend>, Box<dyn PermissionGate>), BackendError>
{
    Err(BackendError::ResourceUnavailable(
        "speech recognition is not available on this platform".to_string(),
    ))
}
