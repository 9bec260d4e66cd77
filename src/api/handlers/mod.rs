pub mod health;
pub mod pages;
pub mod reset_password;

pub use self::health::health;
pub use self::pages::{dashboard, home};

use axum::response::Html;

/// Wrap `content` in the shared page layout.
pub(crate) fn layout(title: &str, content: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n<main>\n{content}\n</main>\n</body>\n</html>\n",
        escape(title)
    ))
}

/// Escape text for use in HTML element content and quoted attributes.
pub(crate) fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
