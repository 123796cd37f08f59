use parse_display::Display;

/// Failure descriptor returned by every registry and network operation.
///
/// The `Display` output is the human-readable message shown by the demo screens.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The requested identifier or route does not exist.
    #[display("{0}")]
    NotFound(String),

    /// A failure synthesized by the network simulation (error injection, sentinel ids, timeouts).
    #[display("{0}")]
    SimulatedNetworkFailure(String),

    /// A create payload was rejected before it reached the store.
    #[display("{0}")]
    ValidationFailure(String),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
    pub fn network(message: impl Into<String>) -> Self {
        Self::SimulatedNetworkFailure(message.into())
    }
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailure(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::SimulatedNetworkFailure(_) => ErrorKind::SimulatedNetworkFailure,
            Self::ValidationFailure(_) => ErrorKind::ValidationFailure,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(message)
            | Self::SimulatedNetworkFailure(message)
            | Self::ValidationFailure(message) => message,
        }
    }

    /// HTTP status the mock host would answer with.
    pub fn status(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::SimulatedNetworkFailure => 503,
            ErrorKind::ValidationFailure => 422,
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    SimulatedNetworkFailure,
    ValidationFailure,
}
