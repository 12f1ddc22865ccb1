//! Review submission pipeline
//!
//! Validates, deduplicates and persists a review in pending state. Ordering
//! matters: validation and the rate/duplicate checks run before any write,
//! and the review + submission-record pair is inserted in one transaction
//! so a race between two requests from the same identity can never leave a
//! review without its duplicate marker.

use crate::error::{is_unique_violation, ReviewError, ReviewResult};
use crate::identity::Identity;
use crate::orm::{reviews, submissions};
use crate::rate_limit::{ActionClass, RateLimit};
use chrono::Utc;
use sea_orm::{entity::*, query::*, ActiveValue::Set, DatabaseConnection};
use serde::Deserialize;

pub const SCORE_MIN: i16 = 1;
pub const SCORE_MAX: i16 = 5;
pub const BODY_MIN_CHARS: usize = 10;
pub const BODY_MAX_CHARS: usize = 5000;
pub const TITLE_MAX_CHARS: usize = 255;

const DEFAULT_LOCALE: &str = "en";

/// Raw submission payload as it arrives from the site.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitReview {
    pub subject_id: Option<String>,
    pub score: Option<f64>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub locale: Option<String>,
}

/// A submission that passed validation, with lenient fields normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidReview {
    pub subject_id: String,
    pub score: i16,
    pub title: Option<String>,
    pub body: String,
    pub locale: String,
}

/// Validate a submission. Checks run in a fixed order and the first
/// failure wins, so error messages are deterministic:
/// presence, score range (after rounding), body length (after trimming).
/// The title is lenient: silently truncated rather than rejected.
pub fn validate(form: &SubmitReview) -> ReviewResult<ValidReview> {
    let subject_id = form
        .subject_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ReviewError::Validation("A subject is required.".to_string()))?;

    let score = form
        .score
        .filter(|s| s.is_finite())
        .ok_or_else(|| ReviewError::Validation("A score is required.".to_string()))?;

    let body = form
        .body
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .ok_or_else(|| ReviewError::Validation("A review body is required.".to_string()))?;

    // Non-integer scores round before the range check
    let score = score.round();
    if score < f64::from(SCORE_MIN) || score > f64::from(SCORE_MAX) {
        return Err(ReviewError::Validation(format!(
            "Score is out of range (must be {}-{}).",
            SCORE_MIN, SCORE_MAX
        )));
    }
    let score = score as i16;

    let body_chars = body.chars().count();
    if body_chars < BODY_MIN_CHARS {
        return Err(ReviewError::Validation(format!(
            "Review is too short (minimum {} characters).",
            BODY_MIN_CHARS
        )));
    }
    if body_chars > BODY_MAX_CHARS {
        return Err(ReviewError::Validation(format!(
            "Review is too long (maximum {} characters).",
            BODY_MAX_CHARS
        )));
    }

    let title = form
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.chars().take(TITLE_MAX_CHARS).collect::<String>());

    let locale = form
        .locale
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(DEFAULT_LOCALE)
        .to_string();

    Ok(ValidReview {
        subject_id: subject_id.to_string(),
        score,
        title,
        body: body.to_string(),
        locale,
    })
}

/// Submit a review. On success the review is durably pending and the
/// duplicate marker for this (subject, identity) pair exists; the caller
/// should tell the user moderation is pending, not that the review is
/// published.
///
/// Unknown identities (no determinable address) skip duplicate suppression
/// entirely. Writing a marker for the sentinel token would let the first
/// ambiguous client block every later one.
pub async fn submit_review(
    db: &DatabaseConnection,
    limiter: &dyn RateLimit,
    identity: &Identity,
    form: &SubmitReview,
) -> ReviewResult<reviews::Model> {
    let valid = validate(form)?;

    limiter
        .check(ActionClass::SubmitReview, identity.token())
        .await?;

    // Fast-path duplicate check before any write. The unique constraint on
    // submissions is the hard guarantee; this read just produces a clean
    // error for the common case.
    //
    // Product decision, preserved from the original site: the marker is
    // keyed on (subject, identity) regardless of review status, so an
    // identity whose review was rejected or deleted can never resubmit for
    // that subject.
    if identity.dedup_eligible() && submission_exists(db, &valid.subject_id, identity).await? {
        return Err(ReviewError::DuplicateSubmission);
    }

    let now = Utc::now().naive_utc();

    let txn = db.begin().await?;

    let review = reviews::ActiveModel {
        subject_id: Set(valid.subject_id.clone()),
        submitter_identity: Set(identity.token().to_string()),
        score: Set(valid.score),
        title: Set(valid.title.clone()),
        body: Set(valid.body.clone()),
        locale: Set(valid.locale.clone()),
        status: Set(reviews::ReviewStatus::Pending),
        helpful_count: Set(0),
        unhelpful_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let review = review.insert(&txn).await?;

    if identity.dedup_eligible() {
        let marker = submissions::ActiveModel {
            subject_id: Set(valid.subject_id.clone()),
            submitter_identity: Set(identity.token().to_string()),
            created_at: Set(now),
            ..Default::default()
        };
        if let Err(e) = marker.insert(&txn).await {
            // Lost the race against a concurrent submission from the same
            // identity. Dropping the transaction rolls the review back; no
            // partial state becomes visible.
            if is_unique_violation(&e) {
                return Err(ReviewError::DuplicateSubmission);
            }
            return Err(e.into());
        }
    }

    txn.commit().await?;

    log::info!(
        "Pending review {} created for subject {}",
        review.id,
        review.subject_id
    );

    Ok(review)
}

/// Whether this identity has ever submitted a review for this subject.
pub async fn submission_exists(
    db: &DatabaseConnection,
    subject_id: &str,
    identity: &Identity,
) -> ReviewResult<bool> {
    let existing = submissions::Entity::find()
        .filter(submissions::Column::SubjectId.eq(subject_id))
        .filter(submissions::Column::SubmitterIdentity.eq(identity.token()))
        .one(db)
        .await?;
    Ok(existing.is_some())
}
