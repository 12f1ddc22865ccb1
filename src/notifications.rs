//! Moderator notification dispatch
//!
//! Best-effort email to the moderation inbox when a pending review is
//! created. Dispatch is fire-and-forget: the review is already durably
//! pending by the time this runs, so delivery failure is logged and never
//! reaches the submitter-facing result.

use crate::catalog;
use crate::config::Config;
use crate::email;
use crate::orm::reviews;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Notify the moderation inbox that a pending review was created.
///
/// Spawns onto the runtime and returns immediately. When no notification
/// address is configured this is a no-op.
pub fn notify_pending_review(
    db: &'static DatabaseConnection,
    config: Arc<Config>,
    review: reviews::Model,
) {
    let recipient = match config.moderation_notify_email() {
        Some(recipient) => recipient,
        None => {
            log::debug!("No moderator notification address configured; skipping");
            return;
        }
    };

    actix_web::rt::spawn(async move {
        let tool_name = catalog::display_name(db, &review.subject_id).await;

        if let Err(e) = email::templates::send_pending_review_email(
            &recipient,
            &tool_name,
            &review,
        )
        .await
        {
            log::warn!(
                "Failed to send moderator notification for review {}: {}",
                review.id,
                e
            );
        }
    });
}
