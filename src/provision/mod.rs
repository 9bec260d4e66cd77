//! Bulk user provisioning and cleanup against a [`UserDirectory`].
//!
//! Both operations keep going after a per-user failure and report counts at
//! the end. Only a failure to list users aborts a cleanup.

use crate::provider::{
    NewCredential, NewUser, PasswordHasher, ProviderError, UserDirectory, PASSWORD_RESET_REQUIRED,
};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::{fmt, path::Path};
use thiserror::Error;
use tracing::{error, info, instrument};

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid user list: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("password_digest for {0} needs a password_hasher")]
    MissingHasher(String),
    #[error("failed to list users: {0}")]
    List(#[source] ProviderError),
}

/// One entry of the provisioning file.
#[derive(Deserialize)]
pub struct UserRecord {
    pub email: String,
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(default, alias = "passwordResetRequired")]
    pub password_reset_required: bool,
    #[serde(default, alias = "passwordDigest")]
    pub password_digest: Option<String>,
    #[serde(default, alias = "passwordHasher")]
    pub password_hasher: Option<PasswordHasher>,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password_reset_required", &self.password_reset_required)
            .field("password_digest", &self.password_digest.as_ref().map(|_| "***"))
            .field("password_hasher", &self.password_hasher)
            .finish()
    }
}

impl UserRecord {
    /// Provider request for this record. Users without a digest are created
    /// with no password at all.
    ///
    /// # Errors
    /// Returns [`ProvisionError::MissingHasher`] for a digest without a hasher.
    pub fn to_new_user(&self) -> Result<NewUser, ProvisionError> {
        let credential = match (&self.password_digest, self.password_hasher) {
            (Some(digest), Some(hasher)) => NewCredential::Digest {
                digest: SecretString::from(digest.as_str()),
                hasher,
            },
            (Some(_), None) => return Err(ProvisionError::MissingHasher(self.email.clone())),
            (None, _) => NewCredential::Skip,
        };

        let mut public_metadata = Map::new();
        public_metadata.insert(
            PASSWORD_RESET_REQUIRED.to_string(),
            Value::Bool(self.password_reset_required),
        );

        Ok(NewUser {
            email_addresses: vec![self.email.clone()],
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            credential,
            public_metadata,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub created: usize,
    pub failed: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub matched: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Read a JSON array of [`UserRecord`]s.
///
/// # Errors
/// Returns an error if the file cannot be read or is not a valid user list.
pub fn load_records(path: &Path) -> Result<Vec<UserRecord>, ProvisionError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ProvisionError::Read {
        path: path.display().to_string(),
        source,
    })?;

    Ok(serde_json::from_str(&contents)?)
}

/// Create every record, logging and counting failures.
#[instrument(skip_all, fields(users = records.len()))]
pub async fn create_users<D: UserDirectory>(
    directory: &D,
    records: &[UserRecord],
) -> ProvisionReport {
    info!("Starting user upload");

    let mut report = ProvisionReport::default();

    for record in records {
        let created = match record.to_new_user() {
            Ok(new_user) => directory
                .create_user(&new_user)
                .await
                .map_err(|err| err.to_string()),
            Err(err) => Err(err.to_string()),
        };

        match created {
            Ok(user) => {
                info!(user_id = %user.id, "Successfully created user: {}", record.email);
                report.created += 1;
            }
            Err(err) => {
                error!("Failed to create user {}: {}", record.email, err);
                report.failed += 1;
            }
        }
    }

    info!(
        created = report.created,
        failed = report.failed,
        "Upload complete"
    );

    report
}

/// Delete the users, among the first `limit` listed, whose primary email
/// contains `needle`.
///
/// # Errors
/// Returns [`ProvisionError::List`] if the user list cannot be fetched.
/// Individual delete failures are logged and counted instead.
#[instrument(skip(directory))]
pub async fn cleanup_users<D: UserDirectory>(
    directory: &D,
    needle: &str,
    limit: usize,
) -> Result<CleanupReport, ProvisionError> {
    let users = directory
        .list_users(limit)
        .await
        .map_err(ProvisionError::List)?;

    info!("Found {} users", users.len());

    let mut report = CleanupReport::default();

    for user in users
        .iter()
        .filter(|user| user.primary_email().is_some_and(|email| email.contains(needle)))
    {
        report.matched += 1;
        let email = user.primary_email().unwrap_or_default();

        match directory.delete_user(&user.id).await {
            Ok(()) => {
                info!("Deleted user: {} ({})", email, user.id);
                report.deleted += 1;
            }
            Err(err) => {
                error!("Error deleting user {}: {}", user.id, err);
                report.failed += 1;
            }
        }
    }

    info!(
        matched = report.matched,
        deleted = report.deleted,
        failed = report.failed,
        "Cleanup complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MemoryProvider;
    use serde_json::json;

    fn records(value: Value) -> anyhow::Result<Vec<UserRecord>> {
        Ok(serde_json::from_value(value)?)
    }

    #[test]
    fn record_defaults_to_skipped_password() -> anyhow::Result<()> {
        let records = records(json!([
            {"email": "jane@example.com", "firstName": "Jane", "passwordResetRequired": true}
        ]))?;

        let new_user = records[0].to_new_user()?;
        assert!(matches!(new_user.credential, NewCredential::Skip));
        assert_eq!(new_user.first_name.as_deref(), Some("Jane"));
        assert_eq!(new_user.email_addresses, vec!["jane@example.com"]);
        assert_eq!(
            new_user.public_metadata.get(PASSWORD_RESET_REQUIRED),
            Some(&json!(true))
        );
        Ok(())
    }

    #[test]
    fn record_with_digest() -> anyhow::Result<()> {
        let records = records(json!([
            {"email": "a@example.com", "password_digest": "$2a$10$abc", "password_hasher": "bcrypt"},
            {"email": "b@example.com", "password_digest": "$2a$10$abc"}
        ]))?;

        assert!(matches!(
            records[0].to_new_user()?.credential,
            NewCredential::Digest {
                hasher: PasswordHasher::Bcrypt,
                ..
            }
        ));
        assert!(matches!(
            records[1].to_new_user(),
            Err(ProvisionError::MissingHasher(ref email)) if email == "b@example.com"
        ));
        assert!(!format!("{:?}", records[0]).contains("$2a$10$abc"));
        Ok(())
    }

    #[tokio::test]
    async fn create_users_counts_failures_and_continues() -> anyhow::Result<()> {
        let directory = MemoryProvider::new();
        let records = records(json!([
            {"email": "justin+50@example.com", "password_reset_required": true},
            {"email": "justin+50@example.com", "password_reset_required": true},
            {"email": "c@example.com", "password_digest": "x"},
            {"email": "justin+51@example.com"}
        ]))?;

        let report = create_users(&directory, &records).await;

        assert_eq!(report, ProvisionReport { created: 2, failed: 2 });
        let users = directory.list_users(10).await?;
        assert_eq!(users.len(), 2);
        let flagged = users
            .iter()
            .find(|user| user.primary_email() == Some("justin+50@example.com"))
            .map(|user| user.public_metadata.get(PASSWORD_RESET_REQUIRED).cloned());
        assert_eq!(flagged, Some(Some(json!(true))));
        Ok(())
    }

    #[tokio::test]
    async fn cleanup_deletes_only_matching_users() -> anyhow::Result<()> {
        let directory = MemoryProvider::new();
        directory.insert_user("u1", "justin+1@example.com", Map::new());
        directory.insert_user("u2", "justin+2@example.com", Map::new());
        directory.insert_user("u3", "someone@example.com", Map::new());

        let report = cleanup_users(&directory, "justin+", 500).await?;

        assert_eq!(
            report,
            CleanupReport {
                matched: 2,
                deleted: 2,
                failed: 0
            }
        );
        let remaining: Vec<String> = directory
            .list_users(500)
            .await?
            .into_iter()
            .map(|user| user.id)
            .collect();
        assert_eq!(remaining, vec!["u3"]);
        Ok(())
    }

    #[tokio::test]
    async fn cleanup_respects_limit() -> anyhow::Result<()> {
        let directory = MemoryProvider::new();
        directory.insert_user("u1", "justin+1@example.com", Map::new());
        directory.insert_user("u2", "justin+2@example.com", Map::new());

        let report = cleanup_users(&directory, "justin+", 1).await?;

        assert_eq!(report.deleted, 1);
        assert_eq!(directory.list_users(500).await?.len(), 1);
        Ok(())
    }

    #[test]
    fn load_records_reports_missing_file() {
        let result = load_records(Path::new("/nonexistent/users.json"));
        assert!(matches!(result, Err(ProvisionError::Read { .. })));
    }
}
