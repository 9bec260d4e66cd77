//! Password reset transition.
//!
//! Clears the reset-required flag together with the credential change, in a
//! single provider update. Preconditions are checked before anything is sent
//! to the provider, so a failed submission leaves the account untouched.

use crate::provider::{IdentityProvider, IdentitySession, UserUpdate, PASSWORD_RESET_REQUIRED};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

pub const RESET_SUCCESSFUL: &str = "Password reset successful";
pub const RESET_FAILED: &str = "Failed to reset password";
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred. Please try again.";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResetError {
    #[error("You must be logged in to reset your password")]
    Unauthenticated,
    #[error("Password reset not required")]
    NotRequired,
    #[error("Password is required")]
    PasswordRequired,
    #[error("{0}")]
    Validation(String),
    #[error("Not authorized to perform this action")]
    NotAuthorized,
    #[error("{0}")]
    Provider(String),
}

impl ResetError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::NotRequired => StatusCode::CONFLICT,
            Self::PasswordRequired | Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotAuthorized => StatusCode::FORBIDDEN,
            Self::Provider(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ResetError {
    fn into_response(self) -> Response {
        (self.status(), Json(ResetOutcome::from(self))).into_response()
    }
}

/// Result of a reset submission as shown to the user.
#[derive(ToSchema, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetOutcome {
    pub success: bool,
    pub message: String,
}

impl ResetOutcome {
    #[must_use]
    pub fn succeeded() -> Self {
        Self {
            success: true,
            message: RESET_SUCCESSFUL.to_string(),
        }
    }
}

impl From<ResetError> for ResetOutcome {
    fn from(err: ResetError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
        }
    }
}

/// Check the form's password and confirmation fields.
///
/// # Errors
/// Returns [`ResetError::Validation`] when a field is empty or they differ.
pub fn validate_confirmation(password: &str, confirm_password: &str) -> Result<(), ResetError> {
    if password.is_empty() || confirm_password.is_empty() {
        return Err(ResetError::Validation(
            "Both password fields are required".to_string(),
        ));
    }

    if password != confirm_password {
        return Err(ResetError::Validation("Passwords do not match".to_string()));
    }

    Ok(())
}

/// Set a new password for `user_id` and clear its reset-required flag.
///
/// `session` must be the caller's freshly fetched session; its metadata is
/// merged into the update so unrelated keys survive.
///
/// # Errors
/// Fails without contacting the provider when the caller is not signed in, is
/// not flagged for a reset, or sent an empty password. Provider rejections map
/// to [`ResetError::NotAuthorized`] (401/403) or [`ResetError::Provider`].
#[instrument(skip(provider, password, session))]
pub async fn submit_reset<P: IdentityProvider>(
    provider: &P,
    user_id: Option<&str>,
    password: &SecretString,
    session: &IdentitySession,
) -> Result<ResetOutcome, ResetError> {
    let Some(user_id) = user_id.filter(|id| !id.is_empty()) else {
        return Err(ResetError::Unauthenticated);
    };

    if !session.password_reset_required() {
        debug!("Rejecting reset for user without the reset flag");

        return Err(ResetError::NotRequired);
    }

    if password.expose_secret().is_empty() {
        return Err(ResetError::PasswordRequired);
    }

    let mut public_metadata = session.metadata().cloned().unwrap_or_default();
    public_metadata.insert(PASSWORD_RESET_REQUIRED.to_string(), Value::Bool(false));

    let update = UserUpdate {
        password: Some(password.clone()),
        public_metadata,
    };

    match provider.update_user(user_id, &update).await {
        Ok(()) => {
            info!("Password reset completed");

            Ok(ResetOutcome::succeeded())
        }
        Err(err) if err.is_authorization() => {
            warn!("Identity provider refused the update: {}", err);

            Err(ResetError::NotAuthorized)
        }
        Err(err) => {
            error!("Error updating user: {}", err);

            Err(ResetError::Provider(
                err.provider_message()
                    .unwrap_or_else(|| RESET_FAILED.to_string()),
            ))
        }
    }
}
