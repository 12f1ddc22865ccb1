//! SeaORM Entity for submissions table
//!
//! Anti-duplicate marker: one row per (subject, identity) that has ever
//! submitted a review, created in the same transaction as the review
//! insert. Its presence, not the review's status, is the duplicate test;
//! the row outlives rejection and even physical deletion of the review.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub subject_id: String,
    pub submitter_identity: String,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
