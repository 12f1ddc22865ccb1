//! Helpfulness vote recorder
//!
//! Records or flips a helpful/unhelpful vote per (review, identity) and
//! keeps the denormalized counters on the review in sync. Counter
//! adjustments are expressed as database-level column expressions inside
//! the same transaction as the vote mutation, never read-modify-write, so
//! simultaneous votes cannot lose an increment.

use crate::error::{is_unique_violation, ReviewError, ReviewResult};
use crate::identity::Identity;
use crate::orm::review_votes::{self, VoteType};
use crate::orm::reviews;
use crate::rate_limit::{ActionClass, RateLimit};
use chrono::Utc;
use sea_orm::{entity::*, query::*, sea_query::Expr, ActiveValue::Set, DatabaseConnection};
use serde::Serialize;

/// Denormalized counters returned to the caller after a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteTotals {
    pub helpful_count: i32,
    pub unhelpful_count: i32,
}

/// Cast or flip a vote on a review.
///
/// First vote by an identity inserts a row and increments the matching
/// counter. The same vote twice is `AlreadyVoted` with no state change. A
/// differing vote flips the row's type and moves one count from the old
/// counter (floored at zero) to the new one.
pub async fn cast_vote(
    db: &DatabaseConnection,
    limiter: &dyn RateLimit,
    identity: &Identity,
    review_id: i32,
    vote_type: VoteType,
) -> ReviewResult<VoteTotals> {
    limiter.check(ActionClass::CastVote, identity.token()).await?;

    let review = reviews::Entity::find_by_id(review_id)
        .one(db)
        .await?
        .ok_or(ReviewError::ReviewNotFound)?;

    let existing = review_votes::Entity::find()
        .filter(review_votes::Column::ReviewId.eq(review_id))
        .filter(review_votes::Column::VoterIdentity.eq(identity.token()))
        .one(db)
        .await?;

    match existing {
        None => {
            let txn = db.begin().await?;

            let vote = review_votes::ActiveModel {
                review_id: Set(review_id),
                voter_identity: Set(identity.token().to_string()),
                vote_type: Set(vote_type),
                created_at: Set(Utc::now().naive_utc()),
                ..Default::default()
            };
            if let Err(e) = vote.insert(&txn).await {
                // Two requests from the same identity raced; the unique
                // constraint on (review, identity) caught the second one.
                if is_unique_violation(&e) {
                    return Err(ReviewError::AlreadyVoted);
                }
                return Err(e.into());
            }

            reviews::Entity::update_many()
                .col_expr(
                    counter_column(vote_type),
                    Expr::col(counter_column(vote_type)).add(1),
                )
                .filter(reviews::Column::Id.eq(review_id))
                .exec(&txn)
                .await?;

            txn.commit().await?;
        }
        Some(vote) if vote.vote_type == vote_type => {
            return Err(ReviewError::AlreadyVoted);
        }
        Some(vote) => {
            let old_type = vote.vote_type;
            let txn = db.begin().await?;

            let mut active: review_votes::ActiveModel = vote.into();
            active.vote_type = Set(vote_type);
            active.update(&txn).await?;

            // One atomic statement adjusts both counters; the decrement is
            // floored at zero in case the counters ever drifted.
            reviews::Entity::update_many()
                .col_expr(counter_column(vote_type), Expr::col(counter_column(vote_type)).add(1))
                .col_expr(counter_column(old_type), floored_decrement(old_type))
                .filter(reviews::Column::Id.eq(review_id))
                .exec(&txn)
                .await?;

            txn.commit().await?;
        }
    }

    // Re-read for fresh counters; concurrent voters may have moved them
    // past what this request alone would produce.
    let review = reviews::Entity::find_by_id(review.id)
        .one(db)
        .await?
        .ok_or(ReviewError::ReviewNotFound)?;

    Ok(VoteTotals {
        helpful_count: review.helpful_count,
        unhelpful_count: review.unhelpful_count,
    })
}

fn counter_column(vote_type: VoteType) -> reviews::Column {
    match vote_type {
        VoteType::Helpful => reviews::Column::HelpfulCount,
        VoteType::Unhelpful => reviews::Column::UnhelpfulCount,
    }
}

fn floored_decrement(vote_type: VoteType) -> sea_orm::sea_query::SimpleExpr {
    match vote_type {
        VoteType::Helpful => Expr::cust("GREATEST(helpful_count - 1, 0)"),
        VoteType::Unhelpful => Expr::cust("GREATEST(unhelpful_count - 1, 0)"),
    }
}
