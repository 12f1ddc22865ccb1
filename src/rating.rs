//! Rating aggregation
//!
//! Maintains the denormalized (average_score, review_count) summary per
//! subject. Every trigger recomputes from the full set of approved reviews
//! rather than nudging a running sum, so the aggregate can never drift and
//! is always rebuildable. Subjects with zero approved reviews have no
//! aggregate row at all.

use crate::error::{is_unique_violation, ReviewResult};
use crate::orm::rating_aggregates;
use crate::orm::reviews::{self, ReviewStatus};
use chrono::{NaiveDateTime, Utc};
use sea_orm::{entity::*, query::*, sea_query::Expr, ActiveValue::Set, DatabaseConnection};
use std::collections::HashSet;

/// Recompute the aggregate for one subject from its approved reviews.
/// Returns the fresh aggregate, or `None` (with the stale row removed)
/// when the subject has no approved reviews left.
pub async fn recompute_subject(
    db: &DatabaseConnection,
    subject_id: &str,
) -> ReviewResult<Option<rating_aggregates::Model>> {
    let approved = reviews::Entity::find()
        .filter(reviews::Column::SubjectId.eq(subject_id))
        .filter(reviews::Column::Status.eq(ReviewStatus::Approved))
        .all(db)
        .await?;

    if approved.is_empty() {
        // No approved reviews means no row, not a row with count 0.
        rating_aggregates::Entity::delete_many()
            .filter(rating_aggregates::Column::SubjectId.eq(subject_id))
            .exec(db)
            .await?;
        return Ok(None);
    }

    let sum: i64 = approved.iter().map(|r| i64::from(r.score)).sum();
    let count = approved.len() as i64;
    let average = mean_rounded(sum, count);
    let now = Utc::now().naive_utc();

    // Update first, insert when no row was touched. Two concurrent
    // recomputes can both miss the update and race on the insert; the
    // loser applies its (identical, freshly computed) values as an update
    // instead of surfacing the unique violation.
    let touched = store_aggregate(db, subject_id, average, count as i32, now).await?;
    if touched == 0 {
        let fresh = rating_aggregates::ActiveModel {
            subject_id: Set(subject_id.to_string()),
            average_score: Set(average),
            review_count: Set(count as i32),
            updated_at: Set(now),
        };
        if let Err(e) = fresh.insert(db).await {
            if !is_unique_violation(&e) {
                return Err(e.into());
            }
            store_aggregate(db, subject_id, average, count as i32, now).await?;
        }
    }

    Ok(rating_aggregates::Entity::find_by_id(subject_id.to_string())
        .one(db)
        .await?)
}

/// Write the aggregate columns for an existing row. Returns the number of
/// rows touched; zero means the subject has no aggregate row yet.
async fn store_aggregate(
    db: &DatabaseConnection,
    subject_id: &str,
    average: f64,
    count: i32,
    now: NaiveDateTime,
) -> ReviewResult<u64> {
    let result = rating_aggregates::Entity::update_many()
        .col_expr(rating_aggregates::Column::AverageScore, Expr::value(average))
        .col_expr(rating_aggregates::Column::ReviewCount, Expr::value(count))
        .col_expr(rating_aggregates::Column::UpdatedAt, Expr::value(now))
        .filter(rating_aggregates::Column::SubjectId.eq(subject_id))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Full sweep: recompute the aggregate for every subject with at least one
/// approved review, and prune stale rows for subjects that no longer have
/// any. Used after bulk moderation actions. Returns the number of subjects
/// holding an aggregate afterwards.
pub async fn recompute_all(db: &DatabaseConnection) -> ReviewResult<usize> {
    let approved = reviews::Entity::find()
        .filter(reviews::Column::Status.eq(ReviewStatus::Approved))
        .all(db)
        .await?;

    let mut subjects: HashSet<String> = approved.into_iter().map(|r| r.subject_id).collect();
    let live = subjects.len();

    // Stale aggregates belong to subjects outside the approved set now.
    let aggregates = rating_aggregates::Entity::find().all(db).await?;
    for aggregate in aggregates {
        subjects.insert(aggregate.subject_id);
    }

    for subject_id in subjects {
        recompute_subject(db, &subject_id).await?;
    }

    Ok(live)
}

/// Read the aggregate for a subject. `None` means zero approved reviews;
/// callers must treat the two as equivalent.
pub async fn get_aggregate(
    db: &DatabaseConnection,
    subject_id: &str,
) -> ReviewResult<Option<rating_aggregates::Model>> {
    Ok(rating_aggregates::Entity::find_by_id(subject_id.to_string())
        .one(db)
        .await?)
}

/// Arithmetic mean of `sum` over `count`, rounded half-up to 2 decimals.
/// Scaling before the division keeps the rounding exact for score sums.
fn mean_rounded(sum: i64, count: i64) -> f64 {
    ((sum as f64) * 100.0 / (count as f64)).round() / 100.0
}
