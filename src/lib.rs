//! # Resetgate (mandatory password-reset gate)
//!
//! `resetgate` sits in front of an identity-managed web application and forces
//! accounts flagged by the identity provider through a password reset before
//! they can reach anything else.
//!
//! ## Gate
//!
//! Every request is classified by path (`public`, `reset-password`,
//! `protected`) and evaluated against the caller's session, fetched fresh from
//! the identity provider on each request. The outcome is one of four explicit
//! decisions: allow, redirect to the reset page, redirect home, or require
//! authentication.
//!
//! - **Flagged accounts** are redirected to `/reset-password` from every other
//!   route, public ones included.
//! - **Unflagged or anonymous callers** are redirected away from the reset
//!   routes, including the `/api/reset-password` action endpoint.
//!
//! ## Reset transition
//!
//! A successful reset sets the new password and clears `passwordResetRequired`
//! in one provider update that merges into the existing public metadata.
//!
//! ## Provisioning
//!
//! The `provision` and `cleanup` subcommands bulk-create flagged users and
//! remove test users through the provider's admin API.

pub mod api;
pub mod cli;
pub mod gate;
pub mod provider;
pub mod provision;
pub mod reset;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
