use super::{escape, layout};
use crate::{gate::RESET_PASSWORD_PATH, provider::IdentitySession};
use axum::{extract::Extension, response::Html};

// axum handler for the home page
pub async fn home(Extension(session): Extension<IdentitySession>) -> Html<String> {
    let greeting = session.user_id().map_or_else(
        || "<p>You are not signed in.</p>".to_string(),
        |user_id| format!("<p>Signed in as {}.</p>", escape(user_id)),
    );

    layout(
        "Home",
        &format!("<h1>Welcome</h1>\n{greeting}\n<p><a href=\"/dashboard\">Dashboard</a></p>"),
    )
}

/// Sample protected page. The gate only lets signed-in users without a
/// pending reset through.
pub async fn dashboard(Extension(session): Extension<IdentitySession>) -> Html<String> {
    let user_id = session.user_id().unwrap_or_default();

    layout(
        "Dashboard",
        &format!(
            "<h1>Dashboard</h1>\n<p>User {}</p>\n<p><a href=\"{RESET_PASSWORD_PATH}\">Reset password</a></p>",
            escape(user_id)
        ),
    )
}
