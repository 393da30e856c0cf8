use thiserror::Error;

/// Failures that callers need to tell apart from generic I/O errors.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Input could not be decoded as {primary} or {fallback}")]
    Decode {
        primary: &'static str,
        fallback: &'static str,
    },
    #[error("Input contains no header row")]
    EmptyInput,
    #[error(
        "Field '{field}' is typed FLOAT but no float value produced a digit envelope; \
         precision and scale cannot be derived"
    )]
    MissingDigitEnvelope { field: String },
}
