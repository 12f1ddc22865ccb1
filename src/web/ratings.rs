//! Rating aggregate read endpoint

use crate::db::get_db_pool;
use crate::rating;
use actix_web::{error, get, web, Error, HttpResponse};
use serde::Serialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(get_rating);
}

#[derive(Serialize)]
struct RatingResponse {
    subject_id: String,
    average_score: f64,
    review_count: i32,
}

/// Read the denormalized rating for a subject. 404 means zero approved
/// reviews; callers treat "no row" and "no reviews" as equivalent.
#[get("/ratings/{subject_id}")]
async fn get_rating(path: web::Path<String>) -> Result<HttpResponse, Error> {
    let subject_id = path.into_inner();
    let db = get_db_pool();

    let aggregate = rating::get_aggregate(db, &subject_id)
        .await?
        .ok_or_else(|| error::ErrorNotFound("No rating for this subject"))?;

    Ok(HttpResponse::Ok().json(RatingResponse {
        subject_id: aggregate.subject_id,
        average_score: aggregate.average_score,
        review_count: aggregate.review_count,
    }))
}
