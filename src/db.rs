//! Database connection management
//!
//! Holds the global SeaORM connection pools. Two credential tiers are
//! supported: a restricted pool used by the anonymous submission and vote
//! paths, and an elevated pool used by moderation and admin paths. When no
//! elevated credential is configured, moderation falls back to the
//! restricted pool (useful for development and tests).

use once_cell::sync::OnceCell;
use sea_orm::{Database, DatabaseConnection};

static DB_POOL: OnceCell<DatabaseConnection> = OnceCell::new();
static ADMIN_DB_POOL: OnceCell<DatabaseConnection> = OnceCell::new();

/// Connect the global pools. Call once at startup, before the web server
/// accepts requests.
///
/// `admin_url` carries the elevated credential for moderation paths; pass
/// `None` to reuse the restricted connection.
pub async fn init_db(url: String, admin_url: Option<String>) {
    let pool = Database::connect(&url)
        .await
        .expect("Failed to connect to database.");
    DB_POOL
        .set(pool)
        .expect("init_db() called more than once.");

    if let Some(admin_url) = admin_url {
        let admin_pool = Database::connect(&admin_url)
            .await
            .expect("Failed to connect to database with the admin credential.");
        ADMIN_DB_POOL
            .set(admin_pool)
            .expect("init_db() called more than once.");
    }
}

/// Restricted-tier pool for submission and vote paths.
pub fn get_db_pool() -> &'static DatabaseConnection {
    DB_POOL
        .get()
        .expect("Database pool accessed before init_db().")
}

/// Elevated-tier pool for moderation and admin paths. Falls back to the
/// restricted pool when no admin credential was configured.
pub fn get_admin_db_pool() -> &'static DatabaseConnection {
    ADMIN_DB_POOL.get().unwrap_or_else(get_db_pool)
}
