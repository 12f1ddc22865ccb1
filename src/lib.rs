//! Review & rating integrity engine for the tool directory.
//!
//! Accepts user-submitted reviews and helpfulness votes, prevents duplicate
//! and abusive submissions, queues content for human moderation, and keeps
//! the per-tool denormalized rating aggregate consistent with the set of
//! approved reviews. Rendering, routing, auth and catalog management live
//! in the surrounding site and are not part of this crate.

pub mod catalog;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod identity;
pub mod moderation;
pub mod notifications;
pub mod orm;
pub mod rate_limit;
pub mod rating;
pub mod reviews;
pub mod votes;
pub mod web;

/// Initialize all local mods.
/// Panics
pub fn init_our_mods() {
    // This should be a list of simple function calls.
    // Each module should work mostly independent of others.
    // This way, we can unit test individual modules without loading the entire application.
    identity::init();
}
