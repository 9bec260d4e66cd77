use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Public metadata key holding the reset-required flag.
pub const PASSWORD_RESET_REQUIRED: &str = "passwordResetRequired";

/// Caller identity for a single request, as reported by the identity provider.
///
/// The gate only reads this value. It is fetched once per request and handed
/// to handlers through the request extensions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentitySession {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub claims: Option<SessionClaims>,
}

/// Signed, provider-issued claims attached to a session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl IdentitySession {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn signed_in(user_id: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            claims: Some(SessionClaims { metadata }),
        }
    }

    /// The authenticated user id. Empty ids count as absent.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|id| !id.is_empty())
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.user_id().is_some()
    }

    #[must_use]
    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.claims.as_ref().map(|claims| &claims.metadata)
    }

    /// Only a JSON `true` sets the flag; missing claims, missing keys and
    /// non-boolean values all read as `false`.
    #[must_use]
    pub fn password_reset_required(&self) -> bool {
        self.metadata()
            .and_then(|metadata| metadata.get(PASSWORD_RESET_REQUIRED))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session_with(metadata: Value) -> IdentitySession {
        IdentitySession::signed_in("u1", metadata.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn anonymous_session_is_not_signed_in() {
        let session = IdentitySession::anonymous();
        assert!(!session.is_signed_in());
        assert!(!session.password_reset_required());
        assert!(session.metadata().is_none());
    }

    #[test]
    fn empty_user_id_is_treated_as_absent() {
        let session = IdentitySession::signed_in("", Map::new());
        assert_eq!(session.user_id(), None);
        assert!(!session.is_signed_in());
    }

    #[test]
    fn reset_flag_reads_boolean_true_only() {
        let flagged = session_with(json!({ "passwordResetRequired": true }));
        assert!(flagged.password_reset_required());

        let cleared = session_with(json!({ "passwordResetRequired": false }));
        assert!(!cleared.password_reset_required());

        let stringly = session_with(json!({ "passwordResetRequired": "true" }));
        assert!(!stringly.password_reset_required());

        let missing = IdentitySession::signed_in("u1", Map::new());
        assert!(!missing.password_reset_required());
    }

    #[test]
    fn deserializes_provider_payload() -> anyhow::Result<()> {
        let session: IdentitySession = serde_json::from_value(json!({
            "user_id": "user_2abc",
            "claims": { "metadata": { "passwordResetRequired": true, "plan": "pro" } }
        }))?;
        assert_eq!(session.user_id(), Some("user_2abc"));
        assert!(session.password_reset_required());
        assert_eq!(
            session.metadata().and_then(|m| m.get("plan")),
            Some(&json!("pro"))
        );
        Ok(())
    }

    #[test]
    fn deserializes_missing_fields_as_anonymous() -> anyhow::Result<()> {
        let session: IdentitySession = serde_json::from_value(json!({}))?;
        assert_eq!(session, IdentitySession::anonymous());
        Ok(())
    }
}
