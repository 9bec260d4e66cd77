use anyhow::{Context, Result};
use axum::http::{header::COOKIE, HeaderMap, HeaderValue};
use resetgate::provider::{
    HttpProvider, IdentityProvider, NewCredential, NewUser, PasswordHasher, ProviderError,
    UserDirectory, UserUpdate, PASSWORD_RESET_REQUIRED,
};
use secrecy::SecretString;
use serde_json::{json, Map, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET_KEY: &str = "sk_test_secret";

fn provider(server: &MockServer) -> Result<HttpProvider> {
    Ok(HttpProvider::new(
        &server.uri(),
        SecretString::from(SECRET_KEY),
    )?)
}

fn cookie(value: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, HeaderValue::from_str(value)?);
    Ok(headers)
}

fn flagged_metadata(flag: bool) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert(PASSWORD_RESET_REQUIRED.to_string(), json!(flag));
    metadata.insert("plan".to_string(), json!("pro"));
    metadata
}

#[tokio::test]
async fn session_is_verified_with_secret_key() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions/verify"))
        .and(header("authorization", format!("Bearer {SECRET_KEY}").as_str()))
        .and(body_json(json!({ "token": "sess_abc" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": "user_1",
            "claims": { "metadata": { "passwordResetRequired": true } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = provider(&server)?
        .session(&cookie("theme=dark; __session=sess_abc")?)
        .await?;

    assert_eq!(session.user_id(), Some("user_1"));
    assert!(session.password_reset_required());
    Ok(())
}

#[tokio::test]
async fn missing_token_skips_the_provider() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let session = provider(&server)?.session(&HeaderMap::new()).await?;

    assert!(!session.is_signed_in());
    Ok(())
}

#[tokio::test]
async fn rejected_token_is_anonymous() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions/verify"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{ "message": "not found" }]
        })))
        .mount(&server)
        .await;

    let session = provider(&server)?
        .session(&cookie("__session=sess_gone")?)
        .await?;

    assert_eq!(session.user_id(), None);
    Ok(())
}

#[tokio::test]
async fn custom_session_cookie() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions/verify"))
        .and(body_json(json!({ "token": "sess_custom" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user_id": "user_2" })))
        .mount(&server)
        .await;

    let session = provider(&server)?
        .with_session_cookie("__session_dev")
        .session(&cookie("__session=other; __session_dev=sess_custom")?)
        .await?;

    assert_eq!(session.user_id(), Some("user_2"));
    assert!(!session.password_reset_required());
    Ok(())
}

#[tokio::test]
async fn session_server_error_is_reported() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions/verify"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = provider(&server)?
        .session(&cookie("__session=sess_abc")?)
        .await;

    assert!(matches!(
        result,
        Err(ProviderError::Status { status: 503, .. })
    ));
    Ok(())
}

#[tokio::test]
async fn update_sends_password_and_full_metadata() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/v1/users/user_1"))
        .and(header("authorization", format!("Bearer {SECRET_KEY}").as_str()))
        .and(body_json(json!({
            "password": "NewP@ss1",
            "public_metadata": { "passwordResetRequired": false, "plan": "pro" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "user_1" })))
        .expect(1)
        .mount(&server)
        .await;

    let update = UserUpdate {
        password: Some(SecretString::from("NewP@ss1")),
        public_metadata: flagged_metadata(false),
    };

    provider(&server)?.update_user("user_1", &update).await?;
    Ok(())
}

#[tokio::test]
async fn update_forbidden_carries_status_and_message() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/v1/users/user_1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "errors": [{
                "message": "forbidden",
                "long_message": "The secret key is not allowed to update users"
            }]
        })))
        .mount(&server)
        .await;

    let update = UserUpdate {
        password: Some(SecretString::from("NewP@ss1")),
        public_metadata: flagged_metadata(false),
    };
    let err = provider(&server)?
        .update_user("user_1", &update)
        .await
        .err()
        .context("update should fail")?;

    assert!(err.is_authorization());
    assert_eq!(err.status(), Some(403));
    assert_eq!(
        err.provider_message().as_deref(),
        Some("The secret key is not allowed to update users")
    );
    Ok(())
}

#[tokio::test]
async fn create_user_without_password() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/users"))
        .and(body_json(json!({
            "email_address": ["justin+50@example.com"],
            "first_name": "Justin",
            "last_name": "50",
            "skip_password_requirement": true,
            "public_metadata": { "passwordResetRequired": true }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user_50",
            "email_addresses": [{ "email_address": "justin+50@example.com" }],
            "public_metadata": { "passwordResetRequired": true }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut public_metadata = Map::new();
    public_metadata.insert(PASSWORD_RESET_REQUIRED.to_string(), json!(true));
    let user = provider(&server)?
        .create_user(&NewUser {
            email_addresses: vec!["justin+50@example.com".to_string()],
            first_name: Some("Justin".to_string()),
            last_name: Some("50".to_string()),
            credential: NewCredential::Skip,
            public_metadata,
        })
        .await?;

    assert_eq!(user.id, "user_50");
    assert_eq!(user.primary_email(), Some("justin+50@example.com"));
    Ok(())
}

#[tokio::test]
async fn create_user_with_digest() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/users"))
        .and(body_json(json!({
            "email_address": ["jane@example.com"],
            "password_digest": "$argon2id$v=19$abc",
            "password_hasher": "argon2id",
            "public_metadata": {}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "user_jane" })))
        .expect(1)
        .mount(&server)
        .await;

    let user = provider(&server)?
        .create_user(&NewUser {
            email_addresses: vec!["jane@example.com".to_string()],
            first_name: None,
            last_name: None,
            credential: NewCredential::Digest {
                digest: SecretString::from("$argon2id$v=19$abc"),
                hasher: PasswordHasher::Argon2id,
            },
            public_metadata: Map::new(),
        })
        .await?;

    assert_eq!(user.id, "user_jane");
    assert!(user.email_addresses.is_empty());
    Ok(())
}

#[tokio::test]
async fn list_and_delete_users() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .and(query_param("limit", "500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "user_1", "email_addresses": [{ "email_address": "justin+1@example.com" }] },
            { "id": "user_2", "email_addresses": [] }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/users/user_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "deleted": true })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider(&server)?;
    let users = provider.list_users(500).await?;
    assert_eq!(users.len(), 2);
    assert_eq!(users[1].primary_email(), None);

    provider.delete_user("user_1").await?;
    Ok(())
}

#[tokio::test]
async fn cleanup_through_http_provider() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "user_1", "email_addresses": [{ "email_address": "justin+1@example.com" }] },
            { "id": "user_2", "email_addresses": [{ "email_address": "justin+2@example.com" }] },
            { "id": "user_3", "email_addresses": [{ "email_address": "ops@example.com" }] }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/users/user_1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/users/user_2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let report = resetgate::provision::cleanup_users(&provider(&server)?, "justin+", 500).await?;

    assert_eq!(report.matched, 2);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.failed, 1);
    Ok(())
}

#[tokio::test]
async fn cleanup_fails_when_listing_fails() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errors": [{ "message": "Invalid authentication" }]
        })))
        .mount(&server)
        .await;

    let result = resetgate::provision::cleanup_users(&provider(&server)?, "justin+", 500).await;

    assert!(result.is_err());
    Ok(())
}
