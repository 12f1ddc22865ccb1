/// Email template functions
///
/// This module provides functions to generate the moderator-facing emails.
use super::{send_moderation_email, EmailResult};
use crate::orm::reviews;

/// Send a "pending review awaiting moderation" email
pub async fn send_pending_review_email(
    to: &str,
    tool_name: &str,
    review: &reviews::Model,
) -> EmailResult<()> {
    let subject = format!("New review awaiting moderation: {}", tool_name);
    let title = review.title.as_deref().unwrap_or("(no title)");
    let excerpt = excerpt(&review.body, 300);

    let body_text = format!(
        r#"A new review is awaiting moderation.

Tool:   {}
Score:  {}/5
Title:  {}
Locale: {}

{}

Review id: {}

---
Starboard
"#,
        tool_name, review.score, title, review.locale, excerpt, review.id
    );

    let body_html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Review awaiting moderation</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2>New review awaiting moderation</h2>
        <p><strong>{}</strong> &mdash; {}/5</p>
        <p><em>{}</em></p>
        <blockquote style="border-left: 3px solid #ddd; margin: 20px 0; padding-left: 15px; color: #555;">
            {}
        </blockquote>
        <p style="color: #666; font-size: 0.9em;">Review id {} &middot; locale {}</p>
    </div>
</body>
</html>"#,
        tool_name, review.score, title, excerpt, review.id, review.locale
    );

    send_moderation_email(to, &subject, &body_text, &body_html).await
}

fn excerpt(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        body.to_string()
    } else {
        let cut: String = body.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}
