//! Listening session domain model

pub mod language;
pub mod result;
pub mod state;

pub use language::{LanguageTag, DEFAULT_LANGUAGE};
pub use result::RecognitionResult;
pub use state::{AlreadyListening, AttemptId, ListeningState};
