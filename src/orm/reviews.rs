//! SeaORM Entity for reviews table

use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Review moderation status. Closed enum: a new status fails to compile at
/// every match site instead of silently falling through a lookup table.
/// Deleted is not a status; deleted reviews are physically removed.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
pub enum ReviewStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl ReviewStatus {
    /// Human label for the moderation UI.
    pub fn label(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "Pending",
            ReviewStatus::Approved => "Approved",
            ReviewStatus::Rejected => "Rejected",
        }
    }

    /// Icon name for the moderation UI.
    pub fn icon(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "hourglass",
            ReviewStatus::Approved => "check-circle",
            ReviewStatus::Rejected => "x-circle",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "pending" => Some(ReviewStatus::Pending),
            "approved" => Some(ReviewStatus::Approved),
            "rejected" => Some(ReviewStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub subject_id: String,
    pub submitter_identity: String,
    pub score: i16,
    pub title: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub locale: String,
    pub status: ReviewStatus,
    pub helpful_count: i32,
    pub unhelpful_count: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::review_votes::Entity")]
    Votes,
}

impl Related<super::review_votes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Votes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
