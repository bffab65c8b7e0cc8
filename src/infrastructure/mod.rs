//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with the platform speech services and local storage.

pub mod config;
pub mod speech;

// Re-export adapters
pub use config::XdgConfigStore;
pub use speech::platform_speech;

#[cfg(target_os = "android")]
pub use speech::{AndroidPermissionGate, AndroidSpeechBackend};

#[cfg(target_os = "ios")]
pub use speech::{IosPermissionGate, IosSpeechBackend};
