//! Reset page and the two submission endpoints.
//!
//! The form endpoint re-renders the page with the failure message, the JSON
//! endpoint answers with a [`ResetOutcome`]. Both read the session the gate
//! stored in the request extensions.

use super::{escape, layout};
use crate::{
    gate::{HOME_PATH, RESET_PASSWORD_PATH},
    provider::{IdentityProvider, IdentitySession},
    reset::{self, ResetError, ResetOutcome, UNEXPECTED_ERROR},
};
use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        Extension, Form, Json,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use std::{fmt, sync::Arc};
use tracing::error;
use utoipa::ToSchema;

const INVALID_BODY: &str = "Invalid request body";

#[derive(ToSchema, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    password: String,
}

impl fmt::Debug for ResetRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetRequest")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
pub struct ResetForm {
    #[serde(default)]
    password: String,
    #[serde(default, rename = "confirmPassword")]
    confirm_password: String,
}

/// Render the reset form, optionally with an error above it.
#[must_use]
pub fn render_form(error: Option<&str>) -> Html<String> {
    let error = error.map_or_else(String::new, |message| {
        format!(
            "<div role=\"alert\" style=\"color: red\">{}</div>\n",
            escape(message)
        )
    });

    layout(
        "Reset Password",
        &format!(
            r#"<h1>Reset Password</h1>
{error}<form method="post" action="{RESET_PASSWORD_PATH}">
<div>
<label for="password">New Password</label>
<input type="password" id="password" name="password" required>
</div>
<div>
<label for="confirmPassword">Confirm Password</label>
<input type="password" id="confirmPassword" name="confirmPassword" required>
</div>
<button type="submit">Reset Password</button>
</form>"#
        ),
    )
}

// axum handler for GET /reset-password
pub async fn form() -> Html<String> {
    render_form(None)
}

/// Handle the HTML form post. Success sends the user home with a 303.
pub async fn submit<P: IdentityProvider>(
    Extension(provider): Extension<Arc<P>>,
    Extension(session): Extension<IdentitySession>,
    payload: Result<Form<ResetForm>, FormRejection>,
) -> Response {
    let form = match payload {
        Ok(Form(form)) => form,
        Err(err) => {
            error!("Failed to read reset form: {}", err);

            return (StatusCode::BAD_REQUEST, render_form(Some(UNEXPECTED_ERROR))).into_response();
        }
    };

    if let Err(err) = reset::validate_confirmation(&form.password, &form.confirm_password) {
        return failure(&err);
    }

    let password = SecretString::from(form.password);

    match reset::submit_reset(provider.as_ref(), session.user_id(), &password, &session).await {
        Ok(_) => Redirect::to(HOME_PATH).into_response(),
        Err(err) => failure(&err),
    }
}

fn failure(err: &ResetError) -> Response {
    (err.status(), render_form(Some(&err.to_string()))).into_response()
}

#[utoipa::path(
    post,
    path= "/api/reset-password",
    request_body = ResetRequest,
    responses (
        (status = 200, description = "Password changed and reset flag cleared", body = ResetOutcome),
        (status = 401, description = "No signed-in user", body = ResetOutcome),
        (status = 403, description = "Provider refused the update", body = ResetOutcome),
        (status = 409, description = "Password reset not required", body = ResetOutcome),
        (status = 422, description = "Password is required or the body is not valid", body = ResetOutcome),
        (status = 502, description = "Provider failed to apply the update", body = ResetOutcome)
    ),
    tag = "reset",
)]
/// Set a new password for the signed-in user and clear the reset flag.
pub async fn reset_password<P: IdentityProvider>(
    Extension(provider): Extension<Arc<P>>,
    Extension(session): Extension<IdentitySession>,
    payload: Result<Json<ResetRequest>, JsonRejection>,
) -> Result<Json<ResetOutcome>, ResetError> {
    let Json(request) = payload.map_err(|err| {
        error!("Failed to read reset request: {}", err);

        ResetError::Validation(INVALID_BODY.to_string())
    })?;

    let password = SecretString::from(request.password);

    reset::submit_reset(provider.as_ref(), session.user_id(), &password, &session)
        .await
        .map(Json)
}
