//! Hierarchy configuration

/// Environment variable overriding the domain event channel capacity
pub const EVENT_CAPACITY_ENV: &str = "FLATDOC_EVENT_CAPACITY";

/// Environment variable enabling warnings for dangling pending parents
pub const WARN_DANGLING_ENV: &str = "FLATDOC_WARN_DANGLING";

/// Default domain event channel capacity
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 128;

/// Configuration for the document store and its hierarchy resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyConfig {
    /// Capacity of the domain event broadcast channel (default: 128)
    pub event_channel_capacity: usize,

    /// Log a warning when a bulk load leaves pending parent entries behind
    /// (default: false, dangling entries are tolerated silently)
    pub warn_on_dangling: bool,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            warn_on_dangling: false,
        }
    }
}

impl HierarchyConfig {
    /// Build a config from `FLATDOC_*` environment variables
    ///
    /// Unset or unparsable variables fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            event_channel_capacity: lookup(EVENT_CAPACITY_ENV)
                .and_then(|v| v.parse().ok())
                .filter(|capacity: &usize| *capacity > 0)
                .unwrap_or(defaults.event_channel_capacity),
            warn_on_dangling: lookup(WARN_DANGLING_ENV)
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.warn_on_dangling),
        }
    }
}
