use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {reason}")]
    Validation { reason: String },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("{entity} '{id}' is '{actual}', expected '{expected}'")]
    InvalidState {
        entity: &'static str,
        id: String,
        expected: &'static str,
        actual: String,
    },

    #[error("Duplicate report: same reporter within {radius_m:.0} m in the last {window_hours} h")]
    DuplicateReport { radius_m: f64, window_hours: i64 },

    #[error("Insufficient points: requested {requested}, available {available}")]
    InsufficientPoints { requested: i64, available: i64 },

    #[error("Redemption below minimum: requested {requested}, minimum is {minimum}")]
    BelowMinimum { requested: i64, minimum: i64 },

    #[error("Unknown badge: '{name}'")]
    UnknownBadge { name: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    pub fn validation(reason: impl Into<String>) -> Self {
        CoreError::Validation { reason: reason.into() }
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound { entity, id: id.into() }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        CoreError::Forbidden { reason: reason.into() }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
