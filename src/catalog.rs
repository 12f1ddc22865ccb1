//! Catalog lookup collaborator
//!
//! The tool catalog is owned by the directory site; the engine only needs
//! a display name for moderator notifications. A missing catalog entry
//! must never abort review creation, so lookups degrade to the raw
//! subject id.

use crate::orm::tools;
use sea_orm::{DatabaseConnection, EntityTrait};

/// Display name for a subject, falling back to the subject id when the
/// catalog has no match (or the lookup itself fails).
pub async fn display_name(db: &DatabaseConnection, subject_id: &str) -> String {
    let found = tools::Entity::find_by_id(subject_id.to_string())
        .one(db)
        .await;

    match found {
        Ok(Some(tool)) => tool.name,
        Ok(None) => subject_id.to_string(),
        Err(e) => {
            log::warn!("Catalog lookup failed for {}: {}", subject_id, e);
            subject_id.to_string()
        }
    }
}
