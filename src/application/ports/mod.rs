//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod config;
pub mod permission;
pub mod speech;

// Re-export common types
pub use config::ConfigStore;
pub use permission::PermissionGate;
pub use speech::{
    AttemptEvent, AttemptMessage, AttemptOptions, BackendError, EventSender, SpeechBackend,
};
