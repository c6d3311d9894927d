// Operator Settings (stored in the `sync` area of the KeyValueStore)

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::FilterRuleSet;

pub const KEY_ENABLED: &str = "enabled";
pub const KEY_COMPANY_BLACKLIST: &str = "jobs_company_blacklist";
pub const KEY_DOMAIN_BLACKLIST: &str = "jobs_domain_blacklist";
pub const KEY_REMOVE_APPLIED: &str = "jobs_remove_applied";
pub const KEY_REMOVE_PROMOTED: &str = "jobs_remove_promoted";
pub const KEY_SHOW_ICONS: &str = "jobs_show_icons";
pub const KEY_CACHE_RETENTION_HOURS: &str = "jobs_cache_retention_hours";
pub const KEY_FEED_HIDE: &str = "feed_hide";
pub const KEY_NETWORK_AUTO_ACCEPT: &str = "network_auto_accept";

/// Every key the poll loop reads
pub const ALL_KEYS: &[&str] = &[
    KEY_ENABLED,
    KEY_COMPANY_BLACKLIST,
    KEY_DOMAIN_BLACKLIST,
    KEY_REMOVE_APPLIED,
    KEY_REMOVE_PROMOTED,
    KEY_SHOW_ICONS,
    KEY_CACHE_RETENTION_HOURS,
    KEY_FEED_HIDE,
    KEY_NETWORK_AUTO_ACCEPT,
];

/// Default retention window for cached job URLs (hours)
pub const DEFAULT_CACHE_RETENTION_HOURS: i64 = 72;

/// Largest accepted retention window (ten years, in hours)
pub const MAX_CACHE_RETENTION_HOURS: i64 = 10 * 365 * 24;

/// Whether `hours` is an acceptable cache retention window
pub fn is_valid_retention(hours: i64) -> bool {
    (1..=MAX_CACHE_RETENTION_HOURS).contains(&hours)
}

/// Typed view of the operator settings for one tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub enabled: bool,
    pub rules: FilterRuleSet,
    pub show_icons: bool,
    pub cache_retention_hours: i64,
    pub feed_hide: bool,
    pub network_auto_accept: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            rules: FilterRuleSet::default(),
            show_icons: false,
            cache_retention_hours: DEFAULT_CACHE_RETENTION_HOURS,
            feed_hide: false,
            network_auto_accept: false,
        }
    }
}

impl Settings {
    /// Decode settings from a raw key/value map.
    ///
    /// Missing keys take their default; values of the wrong type are logged
    /// and also take their default. Unknown keys are ignored.
    pub fn from_values(values: &HashMap<String, serde_json::Value>) -> Self {
        let defaults = Self::default();
        let retention = read(values, KEY_CACHE_RETENTION_HOURS, defaults.cache_retention_hours);

        Self {
            enabled: read(values, KEY_ENABLED, defaults.enabled),
            rules: FilterRuleSet {
                blacklisted_companies: read(values, KEY_COMPANY_BLACKLIST, Vec::new()),
                blacklisted_domains: read(values, KEY_DOMAIN_BLACKLIST, Vec::new()),
                remove_applied: read(values, KEY_REMOVE_APPLIED, false),
                remove_promoted: read(values, KEY_REMOVE_PROMOTED, false),
                ..defaults.rules
            },
            show_icons: read(values, KEY_SHOW_ICONS, defaults.show_icons),
            cache_retention_hours: if is_valid_retention(retention) {
                retention
            } else if retention > MAX_CACHE_RETENTION_HOURS {
                warn!(value = retention, "Cache retention too large, clamping");
                MAX_CACHE_RETENTION_HOURS
            } else {
                warn!(value = retention, "Non-positive cache retention, using default");
                defaults.cache_retention_hours
            },
            feed_hide: read(values, KEY_FEED_HIDE, defaults.feed_hide),
            network_auto_accept: read(values, KEY_NETWORK_AUTO_ACCEPT, defaults.network_auto_accept),
        }
    }

    /// Whether `key` is a setting the poll loop understands
    pub fn is_known_key(key: &str) -> bool {
        ALL_KEYS.contains(&key)
    }

    /// Check that `value` has the right shape for `key`
    pub fn validate_value(key: &str, value: &serde_json::Value) -> Result<(), String> {
        let ok = match key {
            KEY_COMPANY_BLACKLIST | KEY_DOMAIN_BLACKLIST => {
                serde_json::from_value::<Vec<String>>(value.clone()).is_ok()
            }
            KEY_CACHE_RETENTION_HOURS => value.as_i64().is_some_and(is_valid_retention),
            _ if Self::is_known_key(key) => value.is_boolean(),
            _ => return Err(format!("unknown setting: {}", key)),
        };

        if ok {
            Ok(())
        } else {
            Err(format!("invalid value for {}: {}", key, value))
        }
    }
}

fn read<T: DeserializeOwned>(values: &HashMap<String, serde_json::Value>, key: &str, default: T) -> T {
    match values.get(key) {
        None | Some(serde_json::Value::Null) => default,
        Some(value) => match serde_json::from_value(value.clone()) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(key = key, error = %e, "Malformed setting, using default");
                default
            }
        },
    }
}
