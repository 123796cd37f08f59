use crate::ApiError;

/// State of one region of a screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Status<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Status<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

impl<T> From<Result<T, ApiError>> for Status<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}
