use crate::messages;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Caught before any request was issued.
    #[error("{message}")]
    Validation { message: &'static str },

    /// The server rejected the request. `errors` is the raw server error
    /// set; `message` is the user-facing mapping an operation chose.
    #[error("{message}")]
    Rejected {
        status: u16,
        errors: Vec<String>,
        message: String,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ClientError {
    pub fn validation(message: &'static str) -> Self {
        Self::Validation { message }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message } => (*message).to_string(),
            Self::Rejected { message, .. } => message.clone(),
            Self::Http(_) => messages::UNKNOWN.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server's error set contains an exact message, e.g.
    /// "Email has already been taken".
    pub fn has_server_message(&self, needle: &str) -> bool {
        match self {
            Self::Rejected { errors, .. } => errors.iter().any(|m| m == needle),
            _ => false,
        }
    }

    /// Replace the user-facing message on a rejection; other variants pass
    /// through untouched.
    pub(crate) fn with_message(self, message: impl Into<String>) -> Self {
        match self {
            Self::Rejected { status, errors, .. } => Self::Rejected {
                status,
                errors,
                message: message.into(),
            },
            other => other,
        }
    }
}
