//! Test fixtures for creating test data
#![allow(dead_code)]

use sea_orm::DatabaseConnection;
use starboard::identity::{hash_identity, Identity};
use starboard::orm::reviews;
use starboard::rate_limit::MemoryRateLimiter;
use starboard::reviews::{submit_review, SubmitReview};

/// A deterministic identity derived from an authenticated-user label.
pub fn identity(label: &str) -> Identity {
    hash_identity(None, Some(label))
}

/// A deterministic identity derived from a network address.
pub fn address_identity(addr: &str) -> Identity {
    hash_identity(Some(addr), None)
}

/// A well-formed submission for the given subject and score.
pub fn review_form(subject_id: &str, score: f64) -> SubmitReview {
    SubmitReview {
        subject_id: Some(subject_id.to_string()),
        score: Some(score),
        title: Some("Quick impressions".to_string()),
        body: Some("This tool does exactly what it promises to do.".to_string()),
        locale: Some("en".to_string()),
    }
}

/// Push a review through the real submission pipeline.
pub async fn create_pending_review(
    db: &DatabaseConnection,
    limiter: &MemoryRateLimiter,
    subject_id: &str,
    submitter: &str,
    score: f64,
) -> reviews::Model {
    submit_review(
        db,
        limiter,
        &identity(submitter),
        &review_form(subject_id, score),
    )
    .await
    .expect("Failed to create pending review")
}
