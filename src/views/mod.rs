//! HTML views
//!
//! Pages are small enough to be rendered with `format!`;
//! every interpolated value is escaped or sanitized.

mod post;

pub use post::render_post;

use html_escape::encode_text;

use crate::provider::Post;

/// Render the global stream page
pub fn stream_page(display_name: Option<&str>, posts: &[Post]) -> String {
    let greeting = match display_name {
        Some(name) => format!("Signed in as {}", encode_text(name)),
        None => "Signed in".to_string(),
    };

    let items = if posts.is_empty() {
        r#"<p class="empty">Nothing in the global stream right now.</p>"#.to_string()
    } else {
        posts.iter().map(render_post).collect::<Vec<_>>().join("\n")
    };

    layout(
        "Global stream",
        &format!(
            r#"<nav><span>{greeting}</span> <a href="/auth/logout">Sign out</a></nav>
<h1>Global stream</h1>
<section class="stream">
{items}
</section>"#
        ),
    )
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{} - adnstream</title>
</head>
<body>
{body}
</body>
</html>
"#,
        encode_text(title)
    )
}
