use std::time::Duration;

use stockfinder_core::AppConfig;

use crate::history::DEFAULT_HISTORY_KEY;

const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_MAX_ENTRIES: usize = 50;
const DEFAULT_HISTORY_MAX: usize = 10;
const DEFAULT_RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub cache_ttl: Duration,
    pub cache_max_entries: usize,
    pub history_max: usize,
    pub recent_limit: usize,
    pub history_key: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            history_max: DEFAULT_HISTORY_MAX,
            recent_limit: DEFAULT_RECENT_LIMIT,
            history_key: DEFAULT_HISTORY_KEY.to_string(),
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
            cache_max_entries: config.cache_max_entries,
            history_max: config.history_max,
            recent_limit: config.recent_limit,
            ..Self::default()
        }
    }
}
