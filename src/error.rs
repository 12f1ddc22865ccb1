//! Error taxonomy for the review engine
//!
//! Validation, dedup and rate-limit failures are distinct, user-facing
//! errors so the UI can explain *why* a request was refused. Storage
//! failures are logged with full context and surfaced as a generic message
//! that never exposes internal store details.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use sea_orm::DbErr;

/// Engine result type
pub type ReviewResult<T> = Result<T, ReviewError>;

/// Errors surfaced by the review, vote and moderation pipelines.
#[derive(Debug)]
pub enum ReviewError {
    /// Malformed or out-of-range input; the message is shown verbatim.
    Validation(String),
    /// Too many actions within the window; retry hint included.
    RateLimited { retry_after_seconds: u64 },
    /// This identity has already reviewed this subject.
    DuplicateSubmission,
    /// This identity has already cast this exact vote.
    AlreadyVoted,
    /// The referenced review does not exist.
    ReviewNotFound,
    /// The data store rejected or timed out a write.
    Storage(DbErr),
}

impl std::fmt::Display for ReviewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewError::Validation(msg) => write!(f, "{}", msg),
            ReviewError::RateLimited {
                retry_after_seconds,
            } => write!(
                f,
                "Too many requests. Try again in {} seconds.",
                retry_after_seconds
            ),
            ReviewError::DuplicateSubmission => {
                write!(f, "You have already submitted a review for this tool.")
            }
            ReviewError::AlreadyVoted => write!(f, "You have already cast this vote."),
            ReviewError::ReviewNotFound => write!(f, "Review not found."),
            ReviewError::Storage(_) => write!(f, "Something went wrong. Please try again later."),
        }
    }
}

impl std::error::Error for ReviewError {}

impl From<DbErr> for ReviewError {
    fn from(e: DbErr) -> Self {
        log::error!("Database error: {}", e);
        ReviewError::Storage(e)
    }
}

impl ReviewError {
    /// Stable machine-readable code for JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ReviewError::Validation(_) => "validation_failed",
            ReviewError::RateLimited { .. } => "rate_limited",
            ReviewError::DuplicateSubmission => "duplicate_submission",
            ReviewError::AlreadyVoted => "already_voted",
            ReviewError::ReviewNotFound => "not_found",
            ReviewError::Storage(_) => "storage_failure",
        }
    }
}

impl actix_web::ResponseError for ReviewError {
    fn status_code(&self) -> StatusCode {
        match self {
            ReviewError::Validation(_) => StatusCode::BAD_REQUEST,
            ReviewError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ReviewError::DuplicateSubmission => StatusCode::FORBIDDEN,
            ReviewError::AlreadyVoted => StatusCode::CONFLICT,
            ReviewError::ReviewNotFound => StatusCode::NOT_FOUND,
            ReviewError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());

        if let ReviewError::RateLimited {
            retry_after_seconds,
        } = self
        {
            builder.insert_header(("Retry-After", retry_after_seconds.to_string()));
        }

        builder.json(serde_json::json!({
            "error": self.code(),
            "message": self.to_string(),
        }))
    }
}

/// Whether a database error is a unique-constraint violation. Used to map
/// insert races onto the dedup errors instead of a generic storage failure.
pub fn is_unique_violation(e: &DbErr) -> bool {
    let msg = e.to_string();
    msg.contains("duplicate key") // PostgreSQL
        || msg.contains("Duplicate entry") // MySQL
        || msg.contains("UNIQUE constraint") // SQLite
}
