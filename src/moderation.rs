//! Moderation queue and audit log
//!
//! Transitions reviews between pending/approved/rejected, physically
//! removes deleted reviews, and appends one audit row per effective
//! transition. The log is the durable record of who changed what and when;
//! it keys on raw review ids so it survives deletion of the review row.
//!
//! Legal transitions: pending -> approved/rejected, approved <-> rejected
//! (re-review), and any state -> deleted. Transitions that would change
//! nothing (approving an approved review) are no-ops and append no entry.

use crate::error::{ReviewError, ReviewResult};
use crate::orm::moderation_log::{self, ModerationAction};
use crate::orm::reviews::{self, ReviewStatus};
use crate::rating;
use chrono::Utc;
use sea_orm::{entity::*, query::*, ActiveValue::Set, DatabaseConnection, DatabaseTransaction};

/// Approve a review. Idempotent: re-approving an approved review changes
/// nothing and appends no audit entry.
pub async fn approve(
    db: &DatabaseConnection,
    review_id: i32,
    actor: &str,
) -> ReviewResult<ReviewStatus> {
    let review = find_review(db, review_id).await?;

    if review.status == ReviewStatus::Approved {
        return Ok(ReviewStatus::Approved);
    }

    let subject_id = review.subject_id.clone();

    let txn = db.begin().await?;
    set_status(&txn, review, ReviewStatus::Approved).await?;
    append_log(&txn, review_id, ModerationAction::Approved, None, actor).await?;
    txn.commit().await?;

    // The review entered the approved set; the aggregate must follow.
    rating::recompute_subject(db, &subject_id).await?;

    log::info!("Review {} approved by {}", review_id, actor);

    Ok(ReviewStatus::Approved)
}

/// Reject a review, optionally with a reason that lands in the audit log.
/// Rejecting an approved review pulls it back out of the aggregate.
pub async fn reject(
    db: &DatabaseConnection,
    review_id: i32,
    actor: &str,
    reason: Option<String>,
) -> ReviewResult<ReviewStatus> {
    let review = find_review(db, review_id).await?;

    if review.status == ReviewStatus::Rejected {
        return Ok(ReviewStatus::Rejected);
    }

    let was_approved = review.status == ReviewStatus::Approved;
    let subject_id = review.subject_id.clone();

    let txn = db.begin().await?;
    set_status(&txn, review, ReviewStatus::Rejected).await?;
    append_log(&txn, review_id, ModerationAction::Rejected, reason, actor).await?;
    txn.commit().await?;

    if was_approved {
        rating::recompute_subject(db, &subject_id).await?;
    }

    log::info!("Review {} rejected by {}", review_id, actor);

    Ok(ReviewStatus::Rejected)
}

/// Physically remove a review. The audit entry is written before the row
/// is removed, in the same transaction, so the trail survives the
/// deletion. The submission record is left in place: the identity stays
/// blocked from resubmitting for this subject.
pub async fn delete(db: &DatabaseConnection, review_id: i32, actor: &str) -> ReviewResult<()> {
    let review = find_review(db, review_id).await?;

    let was_approved = review.status == ReviewStatus::Approved;
    let subject_id = review.subject_id.clone();

    let txn = db.begin().await?;
    append_log(&txn, review_id, ModerationAction::Deleted, None, actor).await?;
    reviews::Entity::delete_by_id(review_id).exec(&txn).await?;
    txn.commit().await?;

    if was_approved {
        rating::recompute_subject(db, &subject_id).await?;
    }

    log::info!("Review {} deleted by {}", review_id, actor);

    Ok(())
}

/// Approve every currently-pending review. One audit entry per review, not
/// one for the batch, to preserve per-review auditability. Returns the
/// number of reviews transitioned. A full aggregate sweep afterwards is
/// cheaper than N incremental recomputes.
pub async fn approve_all_pending(db: &DatabaseConnection, actor: &str) -> ReviewResult<usize> {
    let pending = reviews::Entity::find()
        .filter(reviews::Column::Status.eq(ReviewStatus::Pending))
        .all(db)
        .await?;

    if pending.is_empty() {
        return Ok(0);
    }

    let count = pending.len();

    let txn = db.begin().await?;
    for review in pending {
        let review_id = review.id;
        set_status(&txn, review, ReviewStatus::Approved).await?;
        append_log(&txn, review_id, ModerationAction::Approved, None, actor).await?;
    }
    txn.commit().await?;

    rating::recompute_all(db).await?;

    log::info!("{} pending reviews approved by {}", count, actor);

    Ok(count)
}

/// List reviews for the moderation queue, newest first. `status` of `None`
/// lists everything.
pub async fn list_reviews(
    db: &DatabaseConnection,
    status: Option<ReviewStatus>,
) -> ReviewResult<Vec<reviews::Model>> {
    let mut query = reviews::Entity::find();
    if let Some(status) = status {
        query = query.filter(reviews::Column::Status.eq(status));
    }
    Ok(query
        .order_by_desc(reviews::Column::CreatedAt)
        .all(db)
        .await?)
}

/// Audit entries for a review, oldest first. Works for deleted reviews too.
pub async fn audit_trail(
    db: &DatabaseConnection,
    review_id: i32,
) -> ReviewResult<Vec<moderation_log::Model>> {
    Ok(moderation_log::Entity::find()
        .filter(moderation_log::Column::ReviewId.eq(review_id))
        .order_by_asc(moderation_log::Column::CreatedAt)
        .all(db)
        .await?)
}

async fn find_review(db: &DatabaseConnection, review_id: i32) -> ReviewResult<reviews::Model> {
    reviews::Entity::find_by_id(review_id)
        .one(db)
        .await?
        .ok_or(ReviewError::ReviewNotFound)
}

async fn set_status(
    txn: &DatabaseTransaction,
    review: reviews::Model,
    status: ReviewStatus,
) -> ReviewResult<()> {
    let mut active: reviews::ActiveModel = review.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now().naive_utc());
    active.update(txn).await?;
    Ok(())
}

async fn append_log(
    txn: &DatabaseTransaction,
    review_id: i32,
    action: ModerationAction,
    reason: Option<String>,
    actor: &str,
) -> ReviewResult<()> {
    let entry = moderation_log::ActiveModel {
        review_id: Set(review_id),
        action: Set(action),
        reason: Set(reason),
        actor: Set(actor.to_string()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    entry.insert(txn).await?;
    Ok(())
}
