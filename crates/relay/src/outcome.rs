use crate::sender::SendError;

/// Terminal result of one send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Success,
    /// Missing credential or remote rejection; the user may edit and resubmit.
    UserError(String),
    /// The request never got a response.
    NetworkError(String),
}

impl SendOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Text for the error banner, if this outcome is an error.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::UserError(msg) | Self::NetworkError(msg) => Some(msg.as_str()),
        }
    }
}

impl From<Result<(), SendError>> for SendOutcome {
    fn from(result: Result<(), SendError>) -> Self {
        match result {
            Ok(()) => Self::Success,
            Err(err @ (SendError::AuthUnavailable | SendError::RemoteRejected { .. })) => {
                Self::UserError(err.to_string())
            },
            Err(SendError::Transport(err)) => Self::NetworkError(err.to_string()),
        }
    }
}
