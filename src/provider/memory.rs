//! In-process identity provider.
//!
//! Keeps users and session tokens in a mutex-guarded map. Sessions are looked
//! up on every call, so metadata changes made through [`update_user`] are
//! visible on the next request, matching the real provider's behaviour.
//!
//! [`update_user`]: IdentityProvider::update_user

use super::{
    session_token, EmailAddress, IdentityProvider, IdentitySession, NewUser, ProviderError, User,
    UserDirectory, UserUpdate, DEFAULT_SESSION_COOKIE,
};
use axum::http::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, MutexGuard, PoisonError},
};
use ulid::Ulid;

struct StoredUser {
    emails: Vec<String>,
    password: Option<SecretString>,
    public_metadata: Map<String, Value>,
}

#[derive(Default)]
struct State {
    // BTreeMap keeps `list_users` ordering stable.
    users: BTreeMap<String, StoredUser>,
    sessions: HashMap<String, String>,
    update_failure: Option<(u16, String)>,
    update_calls: usize,
}

pub struct MemoryProvider {
    session_cookie: String,
    state: Mutex<State>,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("MemoryProvider")
            .field("session_cookie", &self.session_cookie)
            .field("users", &state.users.len())
            .field("sessions", &state.sessions.len())
            .finish()
    }
}

impl MemoryProvider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            state: Mutex::new(State::default()),
        }
    }

    #[must_use]
    pub fn with_session_cookie(mut self, cookie_name: impl Into<String>) -> Self {
        self.session_cookie = cookie_name.into();
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a user with the given public metadata, replacing any existing one.
    pub fn insert_user(&self, user_id: &str, email: &str, public_metadata: Map<String, Value>) {
        self.state().users.insert(
            user_id.to_string(),
            StoredUser {
                emails: vec![email.to_string()],
                password: None,
                public_metadata,
            },
        );
    }

    /// Issue a session token for `user_id`.
    pub fn issue_session(&self, user_id: &str) -> String {
        let token = format!("sess_{}", Ulid::new());
        self.state()
            .sessions
            .insert(token.clone(), user_id.to_string());
        token
    }

    pub fn revoke_session(&self, token: &str) {
        self.state().sessions.remove(token);
    }

    /// Make subsequent `update_user` calls fail with the given status.
    pub fn fail_updates_with(&self, status: u16, message: &str) {
        self.state().update_failure = Some((status, message.to_string()));
    }

    /// Number of `update_user` calls received, including failed ones.
    #[must_use]
    pub fn update_calls(&self) -> usize {
        self.state().update_calls
    }

    #[must_use]
    pub fn public_metadata(&self, user_id: &str) -> Option<Map<String, Value>> {
        self.state()
            .users
            .get(user_id)
            .map(|user| user.public_metadata.clone())
    }

    #[must_use]
    pub fn password_matches(&self, user_id: &str, candidate: &str) -> bool {
        self.state()
            .users
            .get(user_id)
            .and_then(|user| user.password.as_ref())
            .is_some_and(|password| password.expose_secret() == candidate)
    }

    fn resolve(&self, token: &str) -> IdentitySession {
        let state = self.state();
        let Some(user_id) = state.sessions.get(token) else {
            return IdentitySession::anonymous();
        };
        state.users.get(user_id).map_or_else(IdentitySession::anonymous, |user| {
            IdentitySession::signed_in(user_id.clone(), user.public_metadata.clone())
        })
    }

    fn to_user(id: &str, stored: &StoredUser) -> User {
        User {
            id: id.to_string(),
            email_addresses: stored
                .emails
                .iter()
                .map(|email| EmailAddress {
                    email_address: email.clone(),
                })
                .collect(),
            public_metadata: stored.public_metadata.clone(),
        }
    }
}

impl IdentityProvider for MemoryProvider {
    async fn session(&self, headers: &HeaderMap) -> Result<IdentitySession, ProviderError> {
        Ok(session_token(headers, &self.session_cookie)
            .map(|token| self.resolve(&token))
            .unwrap_or_default())
    }

    async fn update_user(&self, user_id: &str, update: &UserUpdate) -> Result<(), ProviderError> {
        let mut state = self.state();
        state.update_calls += 1;

        if let Some((status, message)) = state.update_failure.clone() {
            return Err(ProviderError::Status { status, message });
        }

        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| ProviderError::Status {
                status: 404,
                message: format!("User {user_id} not found"),
            })?;

        // Credential and metadata change under the same lock.
        if let Some(password) = &update.password {
            user.password = Some(password.clone());
        }
        user.public_metadata = update.public_metadata.clone();

        Ok(())
    }
}

impl UserDirectory for MemoryProvider {
    async fn create_user(&self, user: &NewUser) -> Result<User, ProviderError> {
        if user.email_addresses.is_empty() {
            return Err(ProviderError::Status {
                status: 422,
                message: "email_address is required".to_string(),
            });
        }

        let mut state = self.state();
        let taken = state.users.values().any(|existing| {
            existing
                .emails
                .iter()
                .any(|email| user.email_addresses.contains(email))
        });
        if taken {
            return Err(ProviderError::Status {
                status: 422,
                message: "That email address is taken. Please try another.".to_string(),
            });
        }

        let id = format!("user_{}", Ulid::new());
        let stored = StoredUser {
            emails: user.email_addresses.clone(),
            password: None,
            public_metadata: user.public_metadata.clone(),
        };
        let created = Self::to_user(&id, &stored);
        state.users.insert(id, stored);

        Ok(created)
    }

    async fn list_users(&self, limit: usize) -> Result<Vec<User>, ProviderError> {
        Ok(self
            .state()
            .users
            .iter()
            .take(limit)
            .map(|(id, stored)| Self::to_user(id, stored))
            .collect())
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), ProviderError> {
        let mut state = self.state();
        if state.users.remove(user_id).is_none() {
            return Err(ProviderError::Status {
                status: 404,
                message: format!("User {user_id} not found"),
            });
        }
        state.sessions.retain(|_, owner| owner != user_id);

        Ok(())
    }
}
