//! Identity provider contract.
//!
//! The provider owns sessions, credentials and user metadata. The gate reads
//! sessions through [`IdentityProvider::session`], the reset handler writes
//! through [`IdentityProvider::update_user`], and the provisioning commands use
//! [`UserDirectory`]. Two implementations ship with the crate: [`HttpProvider`]
//! for the provider's backend API and [`MemoryProvider`] for tests and local
//! runs.

pub mod error;
pub mod http;
pub mod memory;
mod session;

pub use error::ProviderError;
pub use http::HttpProvider;
pub use memory::MemoryProvider;
pub use session::{IdentitySession, PASSWORD_RESET_REQUIRED, SessionClaims};

use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    HeaderMap,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, future::Future};

/// Cookie carrying the provider-issued session token.
pub const DEFAULT_SESSION_COOKIE: &str = "__session";

/// Session and credential operations the gate depends on.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Resolve the caller's session from the request headers.
    ///
    /// Requests without a session token, or with one the provider does not
    /// recognise, resolve to [`IdentitySession::anonymous`].
    fn session(
        &self,
        headers: &HeaderMap,
    ) -> impl Future<Output = Result<IdentitySession, ProviderError>> + Send;

    /// Apply a credential and metadata change in a single provider call.
    fn update_user(
        &self,
        user_id: &str,
        update: &UserUpdate,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;
}

/// Bulk user administration used by the provisioning commands.
pub trait UserDirectory: Send + Sync {
    fn create_user(
        &self,
        user: &NewUser,
    ) -> impl Future<Output = Result<User, ProviderError>> + Send;

    fn list_users(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<User>, ProviderError>> + Send;

    fn delete_user(&self, user_id: &str) -> impl Future<Output = Result<(), ProviderError>> + Send;
}

/// New credential plus the complete public metadata to store with it.
pub struct UserUpdate {
    pub password: Option<SecretString>,
    pub public_metadata: Map<String, Value>,
}

impl fmt::Debug for UserUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserUpdate")
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("public_metadata", &self.public_metadata)
            .finish()
    }
}

/// Hashing schemes the provider accepts for imported password digests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordHasher {
    Argon2i,
    Argon2id,
    Bcrypt,
    Md5,
    Pbkdf2Sha1,
    Pbkdf2Sha256,
    Pbkdf2Sha256Django,
    Pbkdf2Sha512,
    ScryptFirebase,
}

impl PasswordHasher {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Argon2i => "argon2i",
            Self::Argon2id => "argon2id",
            Self::Bcrypt => "bcrypt",
            Self::Md5 => "md5",
            Self::Pbkdf2Sha1 => "pbkdf2_sha1",
            Self::Pbkdf2Sha256 => "pbkdf2_sha256",
            Self::Pbkdf2Sha256Django => "pbkdf2_sha256_django",
            Self::Pbkdf2Sha512 => "pbkdf2_sha512",
            Self::ScryptFirebase => "scrypt_firebase",
        }
    }
}

impl fmt::Display for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a newly created user gets (or skips) a credential.
pub enum NewCredential {
    /// No password; the user is expected to go through the reset flow.
    Skip,
    /// Precomputed digest imported as-is.
    Digest {
        digest: SecretString,
        hasher: PasswordHasher,
    },
}

impl fmt::Debug for NewCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => f.write_str("Skip"),
            Self::Digest { hasher, .. } => f
                .debug_struct("Digest")
                .field("digest", &"***")
                .field("hasher", hasher)
                .finish(),
        }
    }
}

#[derive(Debug)]
pub struct NewUser {
    pub email_addresses: Vec<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub credential: NewCredential,
    pub public_metadata: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub email_address: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    pub public_metadata: Map<String, Value>,
}

impl User {
    /// First listed email address.
    #[must_use]
    pub fn primary_email(&self) -> Option<&str> {
        self.email_addresses
            .first()
            .map(|address| address.email_address.as_str())
    }
}

/// Extract the session token, preferring `Authorization: Bearer` over the cookie.
#[must_use]
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
