//! SeaORM Entity for review_votes table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Helpful/unhelpful vote. Unique per (review, voter identity); a second
/// differing vote flips the type rather than adding a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    #[sea_orm(string_value = "helpful")]
    Helpful,
    #[sea_orm(string_value = "unhelpful")]
    Unhelpful,
}

impl VoteType {
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "helpful" => Some(VoteType::Helpful),
            "unhelpful" => Some(VoteType::Unhelpful),
            _ => None,
        }
    }

    /// The opposite vote type.
    pub fn flipped(self) -> Self {
        match self {
            VoteType::Helpful => VoteType::Unhelpful,
            VoteType::Unhelpful => VoteType::Helpful,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "review_votes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub review_id: i32,
    pub voter_identity: String,
    pub vote_type: VoteType,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::reviews::Entity",
        from = "Column::ReviewId",
        to = "super::reviews::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Review,
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
