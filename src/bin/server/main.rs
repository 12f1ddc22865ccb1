use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use env_logger::Env;
use starboard::config::create_config;
use starboard::db::{get_db_pool, init_db};
use std::time::Duration;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_lib_mods();
    starboard::init_our_mods();
    init_db(
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set."),
        std::env::var("ADMIN_DATABASE_URL").ok(),
    )
    .await;

    // Load configuration from database
    let config = create_config();
    if let Err(e) = config.load_from_database(get_db_pool()).await {
        log::warn!(
            "Failed to load settings from database, using defaults: {}",
            e
        );
    }

    // Initialize rate limits from database settings
    starboard::rate_limit::init_rate_limits(&config);

    // Spawn rate limiter cleanup task
    actix_web::rt::spawn(async {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(300)); // Every 5 minutes
        loop {
            interval.tick().await;
            starboard::rate_limit::cleanup_old_entries_public();
            log::debug!("Rate limiter cleanup completed");
        }
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    HttpServer::new(move || {
        App::new()
            .app_data(Data::new(config.clone()))
            // Security headers - applied to all responses
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
            )
            .wrap(Logger::new("%a %{User-Agent}i"))
            .configure(starboard::web::configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}

/// Initialize third party crates we rely on but don't have control over.
pub fn init_lib_mods() {
    // This should be calls to crates without any transformative work applied.
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
