//! Reusable "Post" rendering unit

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::provider::Post;

/// Render one post as an `<article>` fragment
///
/// Provider HTML is passed through `ammonia` before it is embedded;
/// plain text is escaped.
pub fn render_post(post: &Post) -> String {
    if post.is_deleted {
        return format!(
            r#"<article class="post deleted" id="post-{id}"><p>[deleted]</p></article>"#,
            id = encode_double_quoted_attribute(&post.id),
        );
    }

    let body = match post.html.as_deref() {
        Some(html) if !html.trim().is_empty() => ammonia::clean(html),
        _ => encode_text(&post.text).into_owned(),
    };

    let author = match &post.user {
        Some(user) => {
            let avatar = user
                .avatar_image
                .as_ref()
                .map(|image| {
                    format!(
                        r#"<img class="avatar" src="{}" alt="" width="48" height="48">"#,
                        encode_double_quoted_attribute(&image.url)
                    )
                })
                .unwrap_or_default();
            let display = user.name.as_deref().unwrap_or(&user.username);
            format!(
                r#"{avatar}<span class="name">{}</span> <span class="username">@{}</span>"#,
                encode_text(display),
                encode_text(&user.username),
            )
        }
        None => String::new(),
    };

    let created_at = post
        .created_at
        .as_deref()
        .map(|ts| {
            format!(
                r#"<time datetime="{}">{}</time>"#,
                encode_double_quoted_attribute(ts),
                encode_text(ts)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<article class="post" id="post-{id}">
  <header>{author}</header>
  <div class="body">{body}</div>
  <footer>{created_at} <span class="counts">{replies} replies, {reposts} reposts</span></footer>
</article>"#,
        id = encode_double_quoted_attribute(&post.id),
        replies = post.num_replies,
        reposts = post.num_reposts,
    )
}
