use super::{
    decide,
    routes::{is_api, RouteMatcher},
    Decision, HOME_PATH, RESET_PASSWORD_PATH,
};
use crate::provider::{IdentityProvider, IdentitySession};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

/// Shared state for the gate middleware.
pub struct Gate<P> {
    provider: Arc<P>,
    routes: Arc<RouteMatcher>,
    sign_in_url: Option<String>,
}

impl<P> Clone for Gate<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            routes: Arc::clone(&self.routes),
            sign_in_url: self.sign_in_url.clone(),
        }
    }
}

impl<P: IdentityProvider> Gate<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, routes: RouteMatcher) -> Self {
        Self {
            provider,
            routes: Arc::new(routes),
            sign_in_url: None,
        }
    }

    /// Where unauthenticated page requests are sent. Without it they get a 401.
    #[must_use]
    pub fn with_sign_in_url(mut self, sign_in_url: Option<String>) -> Self {
        self.sign_in_url = sign_in_url.filter(|url| !url.trim().is_empty());
        self
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    #[must_use]
    pub fn routes(&self) -> &RouteMatcher {
        &self.routes
    }

    fn unauthenticated(&self, request: &Request) -> Response {
        let path = request.uri().path();

        match &self.sign_in_url {
            Some(sign_in_url) if !is_api(path) => {
                let target = request
                    .uri()
                    .path_and_query()
                    .map_or(path, |path_and_query| path_and_query.as_str());
                let query = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("redirect_url", target)
                    .finish();
                let separator = if sign_in_url.contains('?') { '&' } else { '?' };

                Redirect::temporary(&format!("{sign_in_url}{separator}{query}")).into_response()
            }
            _ => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Authentication required" })),
            )
                .into_response(),
        }
    }
}

/// Gate middleware: classify, fetch the session, decide, dispatch.
///
/// Allowed requests carry the fetched [`IdentitySession`] in their extensions.
pub async fn enforce<P: IdentityProvider>(
    State(gate): State<Gate<P>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if gate.routes.is_bypassed(&path) {
        return next.run(request).await;
    }

    let class = gate.routes.classify(&path);

    let headers = request.headers().clone();

    // A session that cannot be fetched is handled like no session at all.
    let session = match gate.provider.session(&headers).await {
        Ok(session) => session,
        Err(err) => {
            error!("Failed to fetch session, treating request as anonymous: {}", err);

            IdentitySession::anonymous()
        }
    };

    let decision = decide(class, &session);

    debug!(
        path = %path,
        route = class.as_str(),
        decision = decision.as_str(),
        user_id = session.user_id(),
        "gate decision"
    );

    match decision {
        Decision::RedirectToReset => Redirect::temporary(RESET_PASSWORD_PATH).into_response(),
        Decision::RedirectToHome => Redirect::temporary(HOME_PATH).into_response(),
        Decision::RequireAuth if !session.is_signed_in() => gate.unauthenticated(&request),
        Decision::Allow | Decision::RequireAuth => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
    }
}
