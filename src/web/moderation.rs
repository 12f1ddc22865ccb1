//! Moderation endpoints
//!
//! These run on the elevated database credential. Authentication itself is
//! external: the site's auth layer injects the acting moderator's handle in
//! the `x-moderator` header, and requests without it are refused.

use crate::db::get_admin_db_pool;
use crate::moderation;
use crate::orm::reviews::ReviewStatus;
use actix_web::{error, get, post, web, Error, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_reviews)
        .service(approve_all_pending)
        .service(moderate_review);
}

fn require_actor(req: &HttpRequest) -> Result<String, Error> {
    req.headers()
        .get("x-moderator")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| error::ErrorUnauthorized("Moderator authentication required"))
}

#[derive(Deserialize)]
struct ListQuery {
    status: Option<String>,
}

#[derive(Serialize)]
struct QueueEntry {
    id: i32,
    subject_id: String,
    score: i16,
    title: Option<String>,
    body: String,
    locale: String,
    status: ReviewStatus,
    status_label: &'static str,
    status_icon: &'static str,
    helpful_count: i32,
    unhelpful_count: i32,
    created_at: String,
    updated_at: String,
}

/// List reviews for the moderation queue, newest first. Optional
/// `?status=pending|approved|rejected` filter.
#[get("/mod/reviews")]
async fn list_reviews(req: HttpRequest, query: web::Query<ListQuery>) -> Result<HttpResponse, Error> {
    require_actor(&req)?;

    let status = match query.status.as_deref() {
        None | Some("") | Some("all") => None,
        Some(slug) => Some(ReviewStatus::from_slug(slug).ok_or_else(|| {
            error::ErrorBadRequest("Status must be pending, approved or rejected")
        })?),
    };

    let db = get_admin_db_pool();
    let listing = moderation::list_reviews(db, status).await?;

    let entries: Vec<QueueEntry> = listing
        .into_iter()
        .map(|r| QueueEntry {
            id: r.id,
            subject_id: r.subject_id,
            score: r.score,
            title: r.title,
            body: r.body,
            locale: r.locale,
            status_label: r.status.label(),
            status_icon: r.status.icon(),
            status: r.status,
            helpful_count: r.helpful_count,
            unhelpful_count: r.unhelpful_count,
            created_at: r.created_at.to_string(),
            updated_at: r.updated_at.to_string(),
        })
        .collect();

    Ok(HttpResponse::Ok().json(entries))
}

#[derive(Deserialize)]
struct ModerateForm {
    action: String,
    reason: Option<String>,
}

#[derive(Serialize)]
struct ModerateResponse {
    review_id: i32,
    status: Option<ReviewStatus>,
}

/// Apply a moderation action to one review.
#[post("/mod/reviews/{review_id}")]
async fn moderate_review(
    req: HttpRequest,
    path: web::Path<i32>,
    form: web::Json<ModerateForm>,
) -> Result<HttpResponse, Error> {
    let actor = require_actor(&req)?;
    let review_id = path.into_inner();
    let db = get_admin_db_pool();

    let status = match form.action.as_str() {
        "approve" => Some(moderation::approve(db, review_id, &actor).await?),
        "reject" => {
            Some(moderation::reject(db, review_id, &actor, form.reason.clone()).await?)
        }
        "delete" => {
            moderation::delete(db, review_id, &actor).await?;
            None
        }
        _ => return Err(error::ErrorBadRequest("Action must be approve, reject or delete")),
    };

    Ok(HttpResponse::Ok().json(ModerateResponse { review_id, status }))
}

#[derive(Serialize)]
struct ApproveAllResponse {
    approved: usize,
}

/// Approve every pending review in one batch.
#[post("/mod/reviews/approve-all")]
async fn approve_all_pending(req: HttpRequest) -> Result<HttpResponse, Error> {
    let actor = require_actor(&req)?;
    let db = get_admin_db_pool();

    let approved = moderation::approve_all_pending(db, &actor).await?;

    Ok(HttpResponse::Ok().json(ApproveAllResponse { approved }))
}
