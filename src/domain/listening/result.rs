//! Recognition result value object

/// A transcription produced during a listening session.
///
/// `is_final` carries the platform's own end-of-utterance signal. The
/// continuous listener forwards every result as non-final so consumers see
/// one uninterrupted transcript stream; the flag exists for backends and for
/// consumers wiring their own delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionResult {
    pub text: String,
    pub is_final: bool,
}

impl RecognitionResult {
    /// Create a result with an explicit finality flag
    pub fn new(text: impl Into<String>, is_final: bool) -> Self {
        Self {
            text: text.into(),
            is_final,
        }
    }

    /// Create an in-progress (non-final) result
    pub fn partial(text: impl Into<String>) -> Self {
        Self::new(text, false)
    }
}
