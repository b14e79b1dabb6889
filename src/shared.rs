use thiserror::Error;

/// Text shown for transport failures, where the cause is not actionable.
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred. Please try again.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The session was cleared because the API no longer accepts it.
    #[error("Session is no longer valid, logged out")]
    ForcedLogout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Payment error: {0}")]
    Payment(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn rejected(status: u16, msg: impl Into<String>) -> Self {
        AppError::Rejected {
            status,
            message: msg.into(),
        }
    }

    pub fn is_forced_logout(&self) -> bool {
        matches!(self, AppError::ForcedLogout)
    }

    /// Text to show the user, if any.
    ///
    /// Forced logout is handled by resetting state, so it has no message.
    pub fn user_message(&self) -> Option<String> {
        match self {
            AppError::Validation(msg) => Some(msg.clone()),
            AppError::Rejected { message, .. } => Some(message.clone()),
            AppError::Payment(msg) => Some(msg.clone()),
            AppError::ForcedLogout => None,
            AppError::Transport(_) | AppError::InvalidResponse(_) | AppError::Config(_) => {
                Some(GENERIC_FAILURE_MESSAGE.to_string())
            }
        }
    }
}
