//! Helpfulness vote endpoint

use crate::db::get_db_pool;
use crate::error::ReviewError;
use crate::identity::RequesterMeta;
use crate::orm::review_votes::VoteType;
use crate::rate_limit;
use crate::votes;
use actix_web::{post, web, Error, HttpRequest, HttpResponse};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(cast_vote);
}

#[derive(Deserialize)]
struct VoteForm {
    vote_type: String,
}

/// Cast or flip a helpful/unhelpful vote on a review. Responds with the
/// review's fresh counters.
#[post("/reviews/{review_id}/votes")]
async fn cast_vote(
    req: HttpRequest,
    path: web::Path<i32>,
    form: web::Json<VoteForm>,
) -> Result<HttpResponse, Error> {
    let review_id = path.into_inner();

    let vote_type = VoteType::from_slug(form.vote_type.trim()).ok_or_else(|| {
        ReviewError::Validation("Vote type must be \"helpful\" or \"unhelpful\".".to_string())
    })?;

    let identity = RequesterMeta::from_request(&req).identity();
    let db = get_db_pool();

    let totals =
        votes::cast_vote(db, rate_limit::active_limiter(), &identity, review_id, vote_type).await?;

    Ok(HttpResponse::Ok().json(totals))
}
