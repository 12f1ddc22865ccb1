//! Review submission endpoint

use crate::config::Config;
use crate::db::get_db_pool;
use crate::identity::RequesterMeta;
use crate::rate_limit;
use crate::{notifications, reviews};
use actix_web::{post, web, Error, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(submit_review);
}

#[derive(Deserialize)]
struct SubmitReviewForm {
    subject_id: Option<String>,
    score: Option<f64>,
    title: Option<String>,
    body: Option<String>,
    locale: Option<String>,
}

#[derive(Serialize)]
struct SubmitReviewResponse {
    review_id: i32,
    status: &'static str,
    message: &'static str,
}

/// Submit a review for a tool. The review lands in the moderation queue;
/// the response says "pending", never "published".
#[post("/reviews")]
async fn submit_review(
    req: HttpRequest,
    form: web::Json<SubmitReviewForm>,
    config: web::Data<Arc<Config>>,
) -> Result<HttpResponse, Error> {
    let meta = RequesterMeta::from_request(&req);
    let identity = meta.identity();
    let db = get_db_pool();

    let submission = reviews::SubmitReview {
        subject_id: form.subject_id.clone(),
        score: form.score,
        title: form.title.clone(),
        body: form.body.clone(),
        // Form locale wins; Accept-Language is the fallback.
        locale: form.locale.clone().or_else(|| meta.locale.clone()),
    };

    let review =
        reviews::submit_review(db, rate_limit::active_limiter(), &identity, &submission).await?;

    // Best-effort; the review is already durably pending.
    notifications::notify_pending_review(db, config.get_ref().clone(), review.clone());

    Ok(HttpResponse::Created().json(SubmitReviewResponse {
        review_id: review.id,
        status: "pending",
        message: "Thanks! Your review is awaiting moderation.",
    }))
}
