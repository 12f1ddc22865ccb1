//! Rate limiting module for bounding review and vote submissions
//!
//! Implements sliding window rate limiting using in-memory storage (DashMap).
//! This is suitable for single-instance deployments. A Redis-backed
//! implementation is provided for multi-instance deployments, where the
//! in-memory limiter degrades: a determined abuser can multiply the
//! effective limit by the number of instances. Rate limiting is a courtesy
//! control either way; duplicate prevention is enforced by the database
//! unique constraint on submission records and never depends on this state.
//!
//! Rate limits are configurable via database settings and support hot
//! reload. Setting REDIS_URL selects the shared-store limiter at startup;
//! otherwise the in-memory limiter is used.

use arc_swap::ArcSwap;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;

/// Global in-memory rate limiter instance
static RATE_LIMITER: Lazy<Arc<MemoryRateLimiter>> =
    Lazy::new(|| Arc::new(MemoryRateLimiter::new()));

/// Shared-store limiter, built once when REDIS_URL is set.
static REDIS_LIMITER: Lazy<Option<RedisRateLimiter>> = Lazy::new(|| {
    let url = match std::env::var("REDIS_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => return None,
    };
    match RedisRateLimiter::new(&url) {
        Ok(limiter) => {
            log::info!("Rate limiting via shared Redis counters");
            Some(limiter)
        }
        Err(e) => {
            log::warn!(
                "Invalid REDIS_URL, falling back to the in-memory rate limiter: {}",
                e
            );
            None
        }
    }
});

/// The limiter the request handlers use: Redis-backed when REDIS_URL is
/// configured, the process-local limiter otherwise.
pub fn active_limiter() -> &'static dyn RateLimit {
    match Lazy::force(&REDIS_LIMITER) {
        Some(redis) => redis,
        None => Lazy::force(&RATE_LIMITER).as_ref(),
    }
}

/// Global rate limit configuration (hot-reloadable)
static RATE_LIMIT_CONFIG: Lazy<ArcSwap<RateLimitConfig>> =
    Lazy::new(|| ArcSwap::from_pointee(RateLimitConfig::default()));

/// The classes of rate-limited actions. Closed enum: adding an action
/// means deciding its limits here, not inventing a key string at a call
/// site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionClass {
    SubmitReview,
    CastVote,
}

impl ActionClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionClass::SubmitReview => "submit_review",
            ActionClass::CastVote => "cast_vote",
        }
    }
}

/// Rate limit configuration loaded from database settings
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub submit_review_max: usize,
    pub submit_review_window: Duration,
    pub cast_vote_max: usize,
    pub cast_vote_window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            submit_review_max: 5,
            submit_review_window: Duration::from_secs(3600), // 1 hour
            cast_vote_max: 30,
            cast_vote_window: Duration::from_secs(60), // 1 minute
        }
    }
}

impl RateLimitConfig {
    /// Load rate limit configuration from the Config settings
    pub fn from_config(config: &Config) -> Self {
        Self {
            submit_review_max: config.get_int_or("rate_limit.submit_review.max_requests", 5)
                as usize,
            submit_review_window: Duration::from_secs(
                config.get_int_or("rate_limit.submit_review.window_seconds", 3600) as u64,
            ),
            cast_vote_max: config.get_int_or("rate_limit.cast_vote.max_requests", 30) as usize,
            cast_vote_window: Duration::from_secs(
                config.get_int_or("rate_limit.cast_vote.window_seconds", 60) as u64,
            ),
        }
    }

    /// The (max, window) pair for an action class.
    pub fn limits_for(&self, action: ActionClass) -> (usize, Duration) {
        match action {
            ActionClass::SubmitReview => (self.submit_review_max, self.submit_review_window),
            ActionClass::CastVote => (self.cast_vote_max, self.cast_vote_window),
        }
    }
}

/// Initialize rate limits from config (call at startup after loading settings)
pub fn init_rate_limits(config: &Config) {
    let rate_config = RateLimitConfig::from_config(config);
    RATE_LIMIT_CONFIG.store(Arc::new(rate_config));
    log::info!("Rate limit configuration initialized from database settings");
}

/// Reload rate limits from config (call when rate limit settings are changed)
pub fn reload_rate_limits(config: &Config) {
    let rate_config = RateLimitConfig::from_config(config);
    RATE_LIMIT_CONFIG.store(Arc::new(rate_config));
    log::info!("Rate limit configuration reloaded");
}

/// Get the current rate limit configuration
pub fn get_rate_limit_config() -> Arc<RateLimitConfig> {
    RATE_LIMIT_CONFIG.load_full()
}

/// Error returned when rate limit is exceeded
#[derive(Debug, Clone)]
pub struct RateLimitError {
    /// Number of seconds until the rate limit resets
    pub retry_after_seconds: u64,
}

impl From<RateLimitError> for crate::error::ReviewError {
    fn from(e: RateLimitError) -> Self {
        crate::error::ReviewError::RateLimited {
            retry_after_seconds: e.retry_after_seconds,
        }
    }
}

/// Rate limiting capability injected into the pipelines. The submission
/// pipeline does not care whether the backing store is process-local or
/// shared.
#[async_trait::async_trait]
pub trait RateLimit: Send + Sync {
    /// Returns `Ok(())` if the action is allowed for this identity,
    /// `Err(RateLimitError)` with a retry hint otherwise.
    async fn check(&self, action: ActionClass, identity: &str) -> Result<(), RateLimitError>;
}

/// Rate limiter using in-memory storage
pub struct MemoryRateLimiter {
    /// Map of (action:identity) -> Request timestamps
    requests: DashMap<String, Vec<Instant>>,
}

impl MemoryRateLimiter {
    /// Create a new rate limiter
    pub fn new() -> Self {
        Self {
            requests: DashMap::new(),
        }
    }

    /// Check if a request should be rate limited
    ///
    /// # Arguments
    /// * `action` - The action being rate limited (e.g., "submit_review")
    /// * `identifier` - Unique identifier for the requester (identity token)
    /// * `max_requests` - Maximum number of requests allowed in the window
    /// * `window` - Time window for the rate limit
    pub fn check_window(
        &self,
        action: &str,
        identifier: &str,
        max_requests: usize,
        window: Duration,
    ) -> Result<(), RateLimitError> {
        let key = format!("{}:{}", action, identifier);
        let now = Instant::now();

        // Get or create entry for this key
        let mut entry = self.requests.entry(key).or_default();

        // Remove requests outside the time window (sliding window)
        entry.retain(|&timestamp| now.duration_since(timestamp) < window);

        // Check if we've exceeded the limit
        if entry.len() >= max_requests {
            // Calculate how long until the oldest request expires
            let oldest = entry[0];
            let retry_after = window.saturating_sub(now.duration_since(oldest));

            return Err(RateLimitError {
                retry_after_seconds: retry_after.as_secs() + 1, // Round up
            });
        }

        // Add current request
        entry.push(now);

        Ok(())
    }

    /// Clean up old entries to prevent memory leaks
    ///
    /// This should be called periodically (e.g., every 5 minutes) to remove
    /// entries for keys whose requests have all aged out of the widest
    /// configured window.
    pub fn cleanup_old_entries(&self) {
        let config = get_rate_limit_config();
        let horizon = config.submit_review_window.max(config.cast_vote_window);
        let now = Instant::now();

        self.requests.retain(|_, timestamps| {
            timestamps.retain(|&timestamp| now.duration_since(timestamp) < horizon);
            !timestamps.is_empty()
        });
    }

    /// Get the number of tracked keys (for monitoring/debugging)
    pub fn tracked_keys_count(&self) -> usize {
        self.requests.len()
    }
}

impl Default for MemoryRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RateLimit for MemoryRateLimiter {
    async fn check(&self, action: ActionClass, identity: &str) -> Result<(), RateLimitError> {
        let config = get_rate_limit_config();
        let (max, window) = config.limits_for(action);
        self.check_window(action.as_str(), identity, max, window)
    }
}

/// Rate limiter backed by shared Redis counters, for multi-instance
/// deployments. Fixed-window INCR/EXPIRE rather than a sliding window;
/// coarser, but consistent across instances.
pub struct RedisRateLimiter {
    client: redis::Client,
}

impl RedisRateLimiter {
    pub fn new(redis_url: &str) -> Result<Self, redis::RedisError> {
        Ok(Self {
            client: redis::Client::open(redis_url)?,
        })
    }
}

/// Counter key for one (action, identity) pair. Every instance derives the
/// same key, which is what makes the Redis counters shared.
fn redis_key(action: ActionClass, identity: &str) -> String {
    format!("rate_limit:{}:{}", action.as_str(), identity)
}

#[async_trait::async_trait]
impl RateLimit for RedisRateLimiter {
    async fn check(&self, action: ActionClass, identity: &str) -> Result<(), RateLimitError> {
        let config = get_rate_limit_config();
        let (max, window) = config.limits_for(action);
        let key = redis_key(action, identity);

        // Fail open on Redis trouble: rate limiting is a courtesy control,
        // not the duplicate-prevention guarantee.
        let mut conn = match self.client.get_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                log::warn!("Rate limiter could not reach Redis, allowing request: {}", e);
                return Ok(());
            }
        };

        let count: i64 = match redis::cmd("INCR").arg(&key).query_async(&mut conn).await {
            Ok(count) => count,
            Err(e) => {
                log::warn!("Rate limiter INCR failed, allowing request: {}", e);
                return Ok(());
            }
        };

        if count == 1 {
            // First hit opens the window
            let _: Result<(), redis::RedisError> = redis::cmd("EXPIRE")
                .arg(&key)
                .arg(window.as_secs())
                .query_async(&mut conn)
                .await;
        }

        if count > max as i64 {
            let ttl: i64 = redis::cmd("TTL")
                .arg(&key)
                .query_async(&mut conn)
                .await
                .unwrap_or(window.as_secs() as i64);

            return Err(RateLimitError {
                retry_after_seconds: ttl.max(1) as u64,
            });
        }

        Ok(())
    }
}

/// Start-up helper for the periodic cleanup task spawned by the binary.
pub fn cleanup_old_entries_public() {
    RATE_LIMITER.cleanup_old_entries();
}
