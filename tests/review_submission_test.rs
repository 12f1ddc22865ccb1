//! Integration tests for the review submission pipeline

mod common;

use common::{database::*, fixtures::*};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serial_test::serial;
use starboard::error::ReviewError;
use starboard::identity::Identity;
use starboard::orm::{reviews, submissions};
use starboard::orm::reviews::ReviewStatus;
use starboard::rate_limit::MemoryRateLimiter;
use starboard::reviews::submit_review;
use starboard::{moderation, rating};

#[actix_rt::test]
#[serial]
async fn test_submission_creates_pending_review_and_marker() {
    let db = match setup_test_database().await {
        Some(db) => db,
        None => return,
    };
    cleanup_test_data(&db).await.expect("Failed to clean test data");

    let limiter = MemoryRateLimiter::new();
    let review = create_pending_review(&db, &limiter, "tool-alpha", "alice", 4.0).await;

    assert_eq!(review.subject_id, "tool-alpha");
    assert_eq!(review.score, 4);
    assert_eq!(review.status, ReviewStatus::Pending);
    assert_eq!(review.helpful_count, 0);
    assert_eq!(review.unhelpful_count, 0);

    // The anti-duplicate marker lands in the same transaction
    let markers = submissions::Entity::find()
        .filter(submissions::Column::SubjectId.eq("tool-alpha"))
        .all(&db)
        .await
        .expect("Failed to query submission markers");
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].submitter_identity, identity("alice").token());

    // Pending reviews never reach the public aggregate
    let aggregate = rating::get_aggregate(&db, "tool-alpha")
        .await
        .expect("Failed to read aggregate");
    assert!(aggregate.is_none(), "Pending review should not be aggregated");
}

#[actix_rt::test]
#[serial]
async fn test_duplicate_submission_blocked() {
    let db = match setup_test_database().await {
        Some(db) => db,
        None => return,
    };
    cleanup_test_data(&db).await.expect("Failed to clean test data");

    let limiter = MemoryRateLimiter::new();
    create_pending_review(&db, &limiter, "tool-alpha", "alice", 4.0).await;

    let second = submit_review(
        &db,
        &limiter,
        &identity("alice"),
        &review_form("tool-alpha", 2.0),
    )
    .await;
    assert!(
        matches!(second, Err(ReviewError::DuplicateSubmission)),
        "Second review for the same subject should be refused, got {:?}",
        second
    );

    // Same reviewer is still free to review a different subject
    let other_subject = submit_review(
        &db,
        &limiter,
        &identity("alice"),
        &review_form("tool-beta", 5.0),
    )
    .await;
    assert!(other_subject.is_ok(), "Different subject should be accepted");

    let count = reviews::Entity::find()
        .filter(reviews::Column::SubjectId.eq("tool-alpha"))
        .count(&db)
        .await
        .expect("Failed to count reviews");
    assert_eq!(count, 1, "Only the first review should be stored");
}

#[actix_rt::test]
#[serial]
async fn test_duplicate_block_survives_rejection_and_deletion() {
    let db = match setup_test_database().await {
        Some(db) => db,
        None => return,
    };
    cleanup_test_data(&db).await.expect("Failed to clean test data");

    let limiter = MemoryRateLimiter::new();

    // Rejection does not free the slot
    let rejected = create_pending_review(&db, &limiter, "tool-alpha", "alice", 1.0).await;
    moderation::reject(&db, rejected.id, "mod-1", Some("Off topic".to_string()))
        .await
        .expect("Failed to reject review");

    let retry = submit_review(
        &db,
        &limiter,
        &identity("alice"),
        &review_form("tool-alpha", 3.0),
    )
    .await;
    assert!(
        matches!(retry, Err(ReviewError::DuplicateSubmission)),
        "Rejected reviewer should not be able to resubmit"
    );

    // Neither does deletion: the marker outlives the review row
    let deleted = create_pending_review(&db, &limiter, "tool-beta", "bob", 5.0).await;
    moderation::delete(&db, deleted.id, "mod-1")
        .await
        .expect("Failed to delete review");

    let retry = submit_review(
        &db,
        &limiter,
        &identity("bob"),
        &review_form("tool-beta", 4.0),
    )
    .await;
    assert!(
        matches!(retry, Err(ReviewError::DuplicateSubmission)),
        "Deleted review should still block resubmission"
    );
}

#[actix_rt::test]
#[serial]
async fn test_unknown_identity_exempt_from_duplicate_suppression() {
    let db = match setup_test_database().await {
        Some(db) => db,
        None => return,
    };
    cleanup_test_data(&db).await.expect("Failed to clean test data");

    let limiter = MemoryRateLimiter::new();
    let unknown = Identity::unknown();

    let first = submit_review(&db, &limiter, &unknown, &review_form("tool-alpha", 4.0)).await;
    assert!(first.is_ok(), "First anonymous submission should be accepted");

    // A second ambiguous client must not be blocked by the first one
    let second = submit_review(&db, &limiter, &unknown, &review_form("tool-alpha", 2.0)).await;
    assert!(
        second.is_ok(),
        "Unknown identity should bypass duplicate suppression, got {:?}",
        second
    );

    // No markers are written for the unknown sentinel
    let markers = submissions::Entity::find()
        .count(&db)
        .await
        .expect("Failed to count submission markers");
    assert_eq!(markers, 0);
}

#[actix_rt::test]
#[serial]
async fn test_validation_rejects_bad_submissions() {
    let db = match setup_test_database().await {
        Some(db) => db,
        None => return,
    };
    cleanup_test_data(&db).await.expect("Failed to clean test data");

    let limiter = MemoryRateLimiter::new();
    let alice = identity("alice");

    // Body too short (under 10 characters after trimming)
    let mut form = review_form("tool-alpha", 4.0);
    form.body = Some("Too short".to_string());
    let result = submit_review(&db, &limiter, &alice, &form).await;
    assert!(matches!(result, Err(ReviewError::Validation(_))));

    // Body too long
    let mut form = review_form("tool-alpha", 4.0);
    form.body = Some("x".repeat(5001));
    let result = submit_review(&db, &limiter, &alice, &form).await;
    assert!(matches!(result, Err(ReviewError::Validation(_))));

    // Score out of range after rounding
    let mut form = review_form("tool-alpha", 5.5);
    form.score = Some(5.5);
    let result = submit_review(&db, &limiter, &alice, &form).await;
    assert!(matches!(result, Err(ReviewError::Validation(_))));

    // Missing subject
    let mut form = review_form("tool-alpha", 4.0);
    form.subject_id = None;
    let result = submit_review(&db, &limiter, &alice, &form).await;
    assert!(matches!(result, Err(ReviewError::Validation(_))));

    // Nothing should have been written
    let count = reviews::Entity::find()
        .count(&db)
        .await
        .expect("Failed to count reviews");
    assert_eq!(count, 0, "Invalid submissions must not be stored");
}

#[actix_rt::test]
#[serial]
async fn test_fractional_scores_round_half_away_from_zero() {
    let db = match setup_test_database().await {
        Some(db) => db,
        None => return,
    };
    cleanup_test_data(&db).await.expect("Failed to clean test data");

    let limiter = MemoryRateLimiter::new();

    let review = create_pending_review(&db, &limiter, "tool-alpha", "alice", 3.5).await;
    assert_eq!(review.score, 4, "3.5 should round up to 4");

    let review = create_pending_review(&db, &limiter, "tool-beta", "bob", 0.5).await;
    assert_eq!(review.score, 1, "0.5 should round up into range");
}

#[actix_rt::test]
#[serial]
async fn test_submission_rate_limit_enforced() {
    let db = match setup_test_database().await {
        Some(db) => db,
        None => return,
    };
    cleanup_test_data(&db).await.expect("Failed to clean test data");

    let limiter = MemoryRateLimiter::new();
    let alice = identity("alice");

    // Default budget: 5 submissions per hour. Distinct subjects so the
    // duplicate check stays out of the way.
    for i in 0..5 {
        let form = review_form(&format!("tool-{}", i), 4.0);
        submit_review(&db, &limiter, &alice, &form)
            .await
            .expect("Submission within budget should succeed");
    }

    let sixth = submit_review(&db, &limiter, &alice, &review_form("tool-6", 4.0)).await;
    match sixth {
        Err(ReviewError::RateLimited {
            retry_after_seconds,
        }) => {
            assert!(retry_after_seconds > 0, "Retry hint should be positive");
        }
        other => panic!("Sixth submission should be rate limited, got {:?}", other),
    }

    // A different identity is unaffected
    let bob = submit_review(&db, &limiter, &identity("bob"), &review_form("tool-6", 4.0)).await;
    assert!(bob.is_ok(), "Other identities keep their own budget");
}

#[actix_rt::test]
#[serial]
async fn test_rate_limit_rejection_leaves_no_rows() {
    let db = match setup_test_database().await {
        Some(db) => db,
        None => return,
    };
    cleanup_test_data(&db).await.expect("Failed to clean test data");

    let limiter = MemoryRateLimiter::new();
    let alice = identity("alice");

    for i in 0..5 {
        submit_review(&db, &limiter, &alice, &review_form(&format!("tool-{}", i), 4.0))
            .await
            .expect("Submission within budget should succeed");
    }

    let before = reviews::Entity::find().count(&db).await.expect("count");
    let _ = submit_review(&db, &limiter, &alice, &review_form("tool-late", 4.0)).await;
    let after = reviews::Entity::find().count(&db).await.expect("count");
    assert_eq!(before, after, "Rate limited submission must not be stored");

    let markers = submissions::Entity::find().count(&db).await.expect("count");
    assert_eq!(markers, before, "No stray markers from refused submissions");
}

#[actix_rt::test]
#[serial]
async fn test_title_is_truncated_and_locale_defaulted() {
    let db = match setup_test_database().await {
        Some(db) => db,
        None => return,
    };
    cleanup_test_data(&db).await.expect("Failed to clean test data");

    let limiter = MemoryRateLimiter::new();

    let mut form = review_form("tool-alpha", 4.0);
    form.title = Some("t".repeat(300));
    form.locale = None;

    let review = submit_review(&db, &limiter, &identity("alice"), &form)
        .await
        .expect("Submission should succeed");

    assert_eq!(
        review.title.as_deref().map(|t| t.chars().count()),
        Some(255),
        "Overlong titles are truncated, not refused"
    );
    assert_eq!(review.locale, "en", "Missing locale falls back to the default");
}

#[actix_rt::test]
#[serial]
async fn test_user_identity_takes_precedence_over_address() {
    let db = match setup_test_database().await {
        Some(db) => db,
        None => return,
    };
    cleanup_test_data(&db).await.expect("Failed to clean test data");

    let limiter = MemoryRateLimiter::new();

    // Same user from two networks is still one reviewer
    let from_home = starboard::identity::hash_identity(Some("203.0.113.7"), Some("carol"));
    let from_work = starboard::identity::hash_identity(Some("198.51.100.23"), Some("carol"));
    assert_eq!(from_home.token(), from_work.token());

    submit_review(&db, &limiter, &from_home, &review_form("tool-alpha", 5.0))
        .await
        .expect("First submission should succeed");

    let second = submit_review(&db, &limiter, &from_work, &review_form("tool-alpha", 1.0)).await;
    assert!(
        matches!(second, Err(ReviewError::DuplicateSubmission)),
        "Same account from a new address is still a duplicate"
    );
}
