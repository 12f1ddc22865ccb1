//! Test database setup and management
#![allow(dead_code)]

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::env;

/// Connect to the test database.
///
/// Uses the TEST_DATABASE_URL environment variable and ensures the engine
/// schema exists. Returns None when the variable is unset so suites skip
/// gracefully on machines without a provisioned database.
pub async fn setup_test_database() -> Option<DatabaseConnection> {
    let database_url = match env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL not set; skipping database-backed test");
            return None;
        }
    };

    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    create_schema(&db).await.expect("Failed to create schema");

    Some(db)
}

/// Create the engine tables if they do not exist yet (idempotent).
///
/// Mirrors the production schema closely enough for integration tests; the
/// unique constraints on submissions and review_votes are load-bearing.
async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS reviews (
            id SERIAL PRIMARY KEY,
            subject_id VARCHAR(64) NOT NULL,
            submitter_identity VARCHAR(64) NOT NULL,
            score SMALLINT NOT NULL,
            title VARCHAR(255),
            body TEXT NOT NULL,
            locale VARCHAR(16) NOT NULL,
            status VARCHAR(16) NOT NULL,
            helpful_count INTEGER NOT NULL DEFAULT 0,
            unhelpful_count INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS submissions (
            id SERIAL PRIMARY KEY,
            subject_id VARCHAR(64) NOT NULL,
            submitter_identity VARCHAR(64) NOT NULL,
            created_at TIMESTAMP NOT NULL,
            CONSTRAINT submissions_subject_identity_key UNIQUE (subject_id, submitter_identity)
        )",
        "CREATE TABLE IF NOT EXISTS review_votes (
            id SERIAL PRIMARY KEY,
            review_id INTEGER NOT NULL,
            voter_identity VARCHAR(64) NOT NULL,
            vote_type VARCHAR(16) NOT NULL,
            created_at TIMESTAMP NOT NULL,
            CONSTRAINT review_votes_review_voter_key UNIQUE (review_id, voter_identity)
        )",
        "CREATE TABLE IF NOT EXISTS moderation_log (
            id SERIAL PRIMARY KEY,
            review_id INTEGER NOT NULL,
            action VARCHAR(16) NOT NULL,
            reason TEXT,
            actor VARCHAR(64) NOT NULL,
            created_at TIMESTAMP NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS rating_aggregates (
            subject_id VARCHAR(64) PRIMARY KEY,
            average_score DOUBLE PRECISION NOT NULL,
            review_count INTEGER NOT NULL,
            updated_at TIMESTAMP NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS settings (
            key VARCHAR(128) PRIMARY KEY,
            value TEXT NOT NULL,
            value_type VARCHAR(16) NOT NULL,
            updated_at TIMESTAMP NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS tools (
            id VARCHAR(64) PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            slug VARCHAR(255) NOT NULL
        )",
    ];

    for sql in statements {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            sql.to_string(),
        ))
        .await?;
    }

    Ok(())
}

/// Cleanup function to remove test data
///
/// Truncates all engine tables. RESTART IDENTITY resets the id sequences
/// back to 1 so tests see stable primary keys.
pub async fn cleanup_test_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "TRUNCATE TABLE
            reviews,
            submissions,
            review_votes,
            moderation_log,
            rating_aggregates,
            settings,
            tools
        RESTART IDENTITY CASCADE;"
            .to_string(),
    ))
    .await?;

    Ok(())
}
