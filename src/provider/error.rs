use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("identity provider returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid identity provider response: {0}")]
    InvalidResponse(String),
    #[error("invalid identity provider URL: {0}")]
    InvalidUrl(String),
}

impl ProviderError {
    /// HTTP status reported by the provider, if the request got that far.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|status| status.as_u16()),
            Self::InvalidResponse(_) | Self::InvalidUrl(_) => None,
        }
    }

    /// True when the provider rejected our credentials or the operation (401/403).
    #[must_use]
    pub fn is_authorization(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Best-effort diagnostic text to show a user. `None` when the provider
    /// answered without a message.
    #[must_use]
    pub fn provider_message(&self) -> Option<String> {
        match self {
            Self::Status { message, .. } if message.trim().is_empty() => None,
            Self::Status { message, .. } => Some(message.clone()),
            other => Some(other.to_string()),
        }
    }
}
