//! Voxloop - continuous speech-recognition listening
//!
//! Turns the single-shot, session-based speech APIs of Android and iOS into
//! a persistent listening stream: every session end is followed by a
//! debounced restart, so callers see one uninterrupted live transcript
//! until they explicitly stop.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: listening state machine, value objects, and errors
//! - **Application**: the continuous listener and port interfaces (traits)
//! - **Infrastructure**: adapter implementations (platform recognizers, config)
//! - **CLI**: command-line interface and live transcript rendering

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
