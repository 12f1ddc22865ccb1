//! SeaORM entities for the review engine

pub mod moderation_log;
pub mod rating_aggregates;
pub mod review_votes;
pub mod reviews;
pub mod settings;
pub mod submissions;
pub mod tools;
