//! Preference manager that merges config.toml defaults with DB overrides.
//!
//! Config values serve as defaults; DB values (user_preferences table) override them.
//! Writes always go to the DB, never to the config file.
use std::collections::HashMap;

use anyhow::Result;

use crate::config::Config;
use crate::profile::NutritionProfile;
use crate::storage::Database;
use crate::theme::ThemeVariant;

// ============================================================================
// PreferenceManager
// ============================================================================

/// Merged preference store: config.toml defaults + DB overrides.
///
/// On load, config values are flattened into a `HashMap<String, String>`, then
/// all DB preferences are layered on top. Reads are in-memory O(1). Writes
/// persist to the DB and update the in-memory map atomically.
pub struct PreferenceManager {
    prefs: HashMap<String, String>,
}

impl PreferenceManager {
    /// Load preferences by merging config defaults with DB overrides.
    ///
    /// 1. Flatten `Config` fields into dotted key-value pairs
    /// 2. Query all rows from `user_preferences` table
    /// 3. DB values overwrite config values for matching keys
    pub async fn load(config: &Config, db: &Database) -> Result<Self> {
        let mut prefs = Self::flatten_config(config);

        // Layer DB preferences on top (DB wins over config)
        let db_prefs = db.get_preferences_by_prefix("").await?;
        for (key, value) in db_prefs {
            prefs.insert(key, value);
        }

        Ok(Self { prefs })
    }

    /// Create from config only (no DB). Fallback for when DB load fails.
    pub fn from_config(config: &Config) -> Self {
        Self {
            prefs: Self::flatten_config(config),
        }
    }

    /// Get a preference value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.prefs.get(key).map(String::as_str)
    }

    /// Set a preference: writes to DB and updates in-memory map.
    pub async fn set(&mut self, db: &Database, key: &str, value: &str) -> Result<()> {
        db.set_preference(key, value).await?;
        self.prefs.insert(key.to_string(), value.to_string());
        Ok(())
    }

    // ========================================================================
    // Type-safe Accessors
    // ========================================================================

    /// Current theme variant. Unknown names fall back to Dark.
    pub fn theme_variant(&self) -> ThemeVariant {
        self.get("theme")
            .and_then(ThemeVariant::from_str_name)
            .unwrap_or(ThemeVariant::Dark)
    }

    /// Whether the app skips the network and browses the cached menu.
    pub fn offline(&self) -> bool {
        self.get("offline")
            .and_then(|v| v.parse().ok())
            .unwrap_or(false)
    }

    /// Per-request timeout for service calls, in seconds.
    pub fn request_timeout_secs(&self) -> u64 {
        self.get("request_timeout_secs")
            .and_then(|v| v.parse().ok())
            .unwrap_or(60)
    }

    /// The nutrition profile as currently stored. Missing or unparseable
    /// keys keep their defaults.
    pub fn nutrition_profile(&self) -> NutritionProfile {
        NutritionProfile::from_lookup(|key| self.get(key))
    }

    /// Persist the whole nutrition profile: one atomic DB write covering
    /// every `profile.*` key, then the in-memory map catches up.
    pub async fn save_profile(&mut self, db: &Database, profile: &NutritionProfile) -> Result<()> {
        let pairs: Vec<(String, String)> = profile
            .to_pairs()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        db.set_preferences(&pairs).await?;
        for (key, value) in pairs {
            self.prefs.insert(key, value);
        }
        Ok(())
    }

    // ========================================================================
    // Internal Helpers
    // ========================================================================

    /// Flatten Config struct into key-value pairs.
    ///
    /// `server_url` is intentionally NOT flattened: the HTTP client is built
    /// from the config at startup, and a DB override would silently not take
    /// effect until the next launch.
    fn flatten_config(config: &Config) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert("theme".to_string(), config.theme.clone());
        map.insert("offline".to_string(), config.offline.to_string());
        map.insert(
            "request_timeout_secs".to_string(),
            config.request_timeout_secs.to_string(),
        );

        map
    }
}

// ============================================================================
// Tests
// ============================================================================
