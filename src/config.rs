//! Configuration management module
//!
//! Provides database-backed configuration with in-memory caching. Settings
//! are loaded from the `settings` table on startup and cached for fast
//! access; rate-limit tunables and the moderator notification address live
//! here so they can be changed without a deploy.

use crate::orm::settings;
use dashmap::DashMap;
use sea_orm::{entity::*, DatabaseConnection, DbErr};
use std::sync::Arc;

/// Represents a typed setting value
#[derive(Debug, Clone)]
pub enum SettingValue {
    String(String),
    Int(i64),
    Bool(bool),
}

impl SettingValue {
    /// Parse a string value based on the value_type
    pub fn parse(value: &str, value_type: &str) -> Option<Self> {
        match value_type {
            "string" => Some(SettingValue::String(value.to_string())),
            "int" => value.parse().ok().map(SettingValue::Int),
            "bool" => value.parse().ok().map(SettingValue::Bool),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&String> {
        match self {
            SettingValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Configuration manager with caching
pub struct Config {
    settings: DashMap<String, SettingValue>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Create a new empty config
    pub fn new() -> Self {
        Self {
            settings: DashMap::new(),
        }
    }

    /// Load all settings from the database
    pub async fn load_from_database(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        let db_settings = settings::Entity::find().all(db).await?;

        for setting in db_settings {
            if let Some(value) = SettingValue::parse(&setting.value, &setting.value_type) {
                self.settings.insert(setting.key, value);
            }
        }

        log::info!("Loaded {} settings from database", self.settings.len());

        Ok(())
    }

    /// Get a string setting
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.settings.get(key).and_then(|v| v.as_string().cloned())
    }

    /// Get a string setting with a default value
    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|| default.to_string())
    }

    /// Get an integer setting
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.settings.get(key).and_then(|v| v.as_int())
    }

    /// Get an integer setting with a default value
    pub fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }

    /// Get a boolean setting
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.settings.get(key).and_then(|v| v.as_bool())
    }

    /// Get a boolean setting with a default value
    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    // Convenience methods for common settings

    /// Address that receives "pending review" moderator notifications.
    /// Unset or blank means notifications are disabled.
    pub fn moderation_notify_email(&self) -> Option<String> {
        self.get_string("moderation.notify_email")
            .filter(|s| !s.trim().is_empty())
    }
}

/// Create a new Arc-wrapped Config
pub fn create_config() -> Arc<Config> {
    Arc::new(Config::new())
}
