//! SeaORM Entity for rating_aggregates table
//!
//! Denormalized per-subject summary of approved reviews. Not authoritative:
//! always rebuildable from the reviews table. A subject with zero approved
//! reviews has no row here.

use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "rating_aggregates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub subject_id: String,
    /// Arithmetic mean of approved scores, rounded half-up to 2 decimals.
    pub average_score: f64,
    pub review_count: i32,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
