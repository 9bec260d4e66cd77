//! Request path classification.
//!
//! Patterns are either exact literals (`/reset-password`, a trailing slash is
//! tolerated) or a prefix followed by the `(.*)` wildcard (`/public(.*)`).
//! The reset table wins over the public table; anything unmatched is
//! protected. A reset table must cover the reset page and must not cover
//! the home page, otherwise the gate's own redirects would loop.

use super::{HOME_PATH, RESET_PASSWORD_PATH};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Default public routes.
pub const DEFAULT_PUBLIC_ROUTES: &[&str] = &["/", "/health"];

/// Default reset routes: the form page and its action endpoint.
pub const DEFAULT_RESET_ROUTES: &[&str] = &["/reset-password", "/api/reset-password"];

const WILDCARD: &str = "(.*)";

// API/RPC endpoints always go through the gate, even when they look like assets.
static API_NAMESPACE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^/(?:api|trpc)").ok());

static STATIC_ASSET: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)\.(?:html?|css|js|jpe?g|webp|png|gif|svg|ttf|woff2?|ico|csv|docx?|xlsx?|zip|webmanifest)$",
    )
    .ok()
});

const FRAMEWORK_PREFIXES: &[&str] = &["/_next", "/_assets"];

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route pattern must start with '/': {0}")]
    Relative(String),
    #[error("invalid route pattern: {0}")]
    Regex(#[from] regex::Error),
    #[error("reset routes must include {RESET_PASSWORD_PATH}")]
    ResetPageNotCovered,
    #[error("reset routes must not include {HOME_PATH}")]
    HomeCovered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RouteClass {
    Public,
    ResetPassword,
    Protected,
}

impl RouteClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::ResetPassword => "reset-password",
            Self::Protected => "protected",
        }
    }
}

/// Compiled route tables.
#[derive(Clone, Debug)]
pub struct RouteMatcher {
    public: Vec<Regex>,
    reset: Vec<Regex>,
}

impl Default for RouteMatcher {
    fn default() -> Self {
        Self {
            public: DEFAULT_PUBLIC_ROUTES
                .iter()
                .filter_map(|pattern| compile(pattern).ok())
                .collect(),
            reset: DEFAULT_RESET_ROUTES
                .iter()
                .filter_map(|pattern| compile(pattern).ok())
                .collect(),
        }
    }
}

impl RouteMatcher {
    /// Build a matcher from route patterns.
    ///
    /// # Errors
    /// Returns an error if a pattern does not start with `/` or does not
    /// compile, or if the reset table misses the reset page or covers home.
    pub fn new<P, R>(public: P, reset: R) -> Result<Self, RouteError>
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        let matcher = Self {
            public: compile_all(public)?,
            reset: compile_all(reset)?,
        };

        if matcher.classify(RESET_PASSWORD_PATH) != RouteClass::ResetPassword {
            return Err(RouteError::ResetPageNotCovered);
        }

        if matcher.classify(HOME_PATH) == RouteClass::ResetPassword {
            return Err(RouteError::HomeCovered);
        }

        Ok(matcher)
    }

    /// Classify a request path.
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.reset.iter().any(|re| re.is_match(path)) {
            RouteClass::ResetPassword
        } else if self.public.iter().any(|re| re.is_match(path)) {
            RouteClass::Public
        } else {
            RouteClass::Protected
        }
    }

    /// Paths that skip the gate entirely: static assets and framework internals.
    /// API/RPC paths are never bypassed.
    #[must_use]
    pub fn is_bypassed(&self, path: &str) -> bool {
        if is_api(path) {
            return false;
        }

        let internal = FRAMEWORK_PREFIXES.iter().any(|prefix| {
            path.strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        });

        internal
            || STATIC_ASSET
                .as_ref()
                .is_some_and(|re| re.is_match(last_segment(path)))
    }
}

/// True for paths starting with `/api` or `/trpc`, including `/apidocs`.
#[must_use]
pub fn is_api(path: &str) -> bool {
    API_NAMESPACE.as_ref().is_some_and(|re| re.is_match(path))
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn compile_all<I>(patterns: I) -> Result<Vec<Regex>, RouteError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|pattern| compile(pattern.as_ref()))
        .collect()
}

fn compile(pattern: &str) -> Result<Regex, RouteError> {
    let pattern = pattern.trim();
    if !pattern.starts_with('/') {
        return Err(RouteError::Relative(pattern.to_string()));
    }

    let expression = match pattern.strip_suffix(WILDCARD) {
        Some(prefix) => format!("^{}.*$", regex::escape(prefix)),
        None if pattern == "/" => "^/$".to_string(),
        None => format!("^{}/?$", regex::escape(pattern.trim_end_matches('/'))),
    };

    Ok(Regex::new(&expression)?)
}
