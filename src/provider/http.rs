//! Client for the identity provider's backend API.
//!
//! Every call authenticates with the administrative secret key as a bearer
//! token. Error bodies follow the `{"errors": [{"message", "long_message"}]}`
//! shape; the most descriptive message found is carried in
//! [`ProviderError::Status`].

use super::{
    session_token, IdentityProvider, IdentitySession, NewCredential, NewUser, ProviderError,
    User, UserDirectory, UserUpdate, DEFAULT_SESSION_COOKIE,
};
use crate::APP_USER_AGENT;
use axum::http::HeaderMap;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::{debug, error, instrument};
use url::Url;

#[derive(Clone)]
pub struct HttpProvider {
    client: Client,
    api_url: Url,
    secret_key: SecretString,
    session_cookie: String,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("api_url", &self.api_url.as_str())
            .field("secret_key", &"***")
            .field("session_cookie", &self.session_cookie)
            .finish()
    }
}

impl HttpProvider {
    /// Build a client for the provider API rooted at `api_url`.
    ///
    /// # Errors
    /// Returns an error if the URL is not an absolute http(s) URL or the HTTP
    /// client cannot be built.
    pub fn new(api_url: &str, secret_key: SecretString) -> Result<Self, ProviderError> {
        let api_url = Url::parse(api_url)
            .map_err(|err| ProviderError::InvalidUrl(format!("{api_url}: {err}")))?;

        if !matches!(api_url.scheme(), "http" | "https") || api_url.cannot_be_a_base() {
            return Err(ProviderError::InvalidUrl(format!(
                "{api_url}: unsupported scheme {}",
                api_url.scheme()
            )));
        }

        let client = Client::builder().user_agent(APP_USER_AGENT).build()?;

        Ok(Self {
            client,
            api_url,
            secret_key,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
        })
    }

    #[must_use]
    pub fn with_session_cookie(mut self, cookie_name: impl Into<String>) -> Self {
        self.session_cookie = cookie_name.into();
        self
    }

    #[must_use]
    pub fn session_cookie(&self) -> &str {
        &self.session_cookie
    }

    /// Append path segments to the API root, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| ProviderError::InvalidUrl(self.api_url.to_string()))?
            .pop_if_empty()
            .extend(segments);

        debug!("endpoint URL: {}", url);

        Ok(url)
    }

    async fn verify_session(&self, token: &str) -> Result<IdentitySession, ProviderError> {
        let url = self.endpoint(&["v1", "sessions", "verify"])?;

        let response = self
            .client
            .post(url)
            .bearer_auth(self.secret_key.expose_secret())
            .json(&json!({ "token": token }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            // Unknown, expired and revoked tokens all mean "no session".
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::GONE => {
                debug!("session token rejected: {}", response.status());

                Ok(IdentitySession::anonymous())
            }
            _ => Err(status_error(response).await),
        }
    }
}

impl IdentityProvider for HttpProvider {
    #[instrument(skip_all)]
    async fn session(&self, headers: &HeaderMap) -> Result<IdentitySession, ProviderError> {
        match session_token(headers, &self.session_cookie) {
            Some(token) => self.verify_session(&token).await,
            None => Ok(IdentitySession::anonymous()),
        }
    }

    #[instrument(skip(self, update))]
    async fn update_user(&self, user_id: &str, update: &UserUpdate) -> Result<(), ProviderError> {
        let url = self.endpoint(&["v1", "users", user_id])?;

        let mut payload = json!({ "public_metadata": update.public_metadata });
        if let Some(password) = &update.password {
            payload["password"] = Value::String(password.expose_secret().to_string());
        }

        let response = self
            .client
            .patch(url)
            .bearer_auth(self.secret_key.expose_secret())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = status_error(response).await;

            error!("Failed to update user: {}", err);

            return Err(err);
        }

        Ok(())
    }
}

impl UserDirectory for HttpProvider {
    #[instrument(skip(self, user), fields(email = ?user.email_addresses))]
    async fn create_user(&self, user: &NewUser) -> Result<User, ProviderError> {
        let url = self.endpoint(&["v1", "users"])?;

        let mut payload = json!({
            "email_address": user.email_addresses,
            "public_metadata": user.public_metadata,
        });
        if let Some(first_name) = &user.first_name {
            payload["first_name"] = json!(first_name);
        }
        if let Some(last_name) = &user.last_name {
            payload["last_name"] = json!(last_name);
        }
        match &user.credential {
            NewCredential::Skip => {
                payload["skip_password_requirement"] = json!(true);
            }
            NewCredential::Digest { digest, hasher } => {
                payload["password_digest"] = json!(digest.expose_secret());
                payload["password_hasher"] = json!(hasher.as_str());
            }
        }

        let response = self
            .client
            .post(url)
            .bearer_auth(self.secret_key.expose_secret())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        Ok(response.json().await?)
    }

    #[instrument(skip(self))]
    async fn list_users(&self, limit: usize) -> Result<Vec<User>, ProviderError> {
        let url = self.endpoint(&["v1", "users"])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(self.secret_key.expose_secret())
            .query(&[("limit", limit)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        Ok(response.json().await?)
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, user_id: &str) -> Result<(), ProviderError> {
        let url = self.endpoint(&["v1", "users", user_id])?;

        let response = self
            .client
            .delete(url)
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        Ok(())
    }
}

/// Turn a non-success response into a [`ProviderError::Status`].
async fn status_error(response: Response) -> ProviderError {
    let status = response.status().as_u16();
    let message = response
        .json::<Value>()
        .await
        .map(|body| error_message(&body))
        .unwrap_or_default();

    ProviderError::Status { status, message }
}

fn error_message(body: &Value) -> String {
    let first = &body["errors"][0];
    first["long_message"]
        .as_str()
        .or_else(|| first["message"].as_str())
        .or_else(|| body["message"].as_str())
        .unwrap_or_default()
        .to_string()
}
