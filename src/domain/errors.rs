/// Flat error type shared by every layer of the dashboard.
///
/// Failures never bubble into the chart surface: callers log them and fall
/// back to an empty or unpersisted state.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    NetworkError(String),
    /// The request was superseded by a newer one. Expected, never logged as a failure.
    Aborted,
    ParseError(String),
    ValidationError(String),
    PersistenceError(String),
    RenderingError(String),
    StorageError(String),
}

impl AppError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, AppError::Aborted)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NetworkError(msg) => write!(f, "Network Error: {}", msg),
            AppError::Aborted => write!(f, "Request aborted"),
            AppError::ParseError(msg) => write!(f, "Parse Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::PersistenceError(msg) => write!(f, "Persistence Error: {}", msg),
            AppError::RenderingError(msg) => write!(f, "Rendering Error: {}", msg),
            AppError::StorageError(msg) => write!(f, "Storage Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::ParseError(error.to_string())
    }
}

impl From<futures::future::Aborted> for AppError {
    fn from(_: futures::future::Aborted) -> Self {
        AppError::Aborted
    }
}

pub type AppResult<T> = Result<T, AppError>;
pub type NetworkResult<T> = Result<T, AppError>;
