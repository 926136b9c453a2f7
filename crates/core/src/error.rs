/// Domain error shared by every layer.
///
/// The HTTP layer maps each variant onto a status code; see `AppError` in the
/// api crate.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Malformed input: {0}")]
    Malformed(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("No free id found after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
