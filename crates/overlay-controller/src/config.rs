//! Overlay Controller configuration.
//!
//! `Config` is loaded from environment variables. `ControllerConfig` is the
//! runtime form handed to the actor; the conference filter may also be a custom
//! predicate there.

use common::types::PresentationMode;
use std::collections::{HashMap, HashSet};
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default attach settle delay in milliseconds.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;

/// Default controller mailbox capacity.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

/// Default presentation for new overlay content.
pub const DEFAULT_PRESENTATION: PresentationMode = PresentationMode::Minimized;

/// Default controller instance ID prefix.
pub const DEFAULT_CONTROLLER_ID_PREFIX: &str = "oc";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Overlay Controller configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Unique identifier for this controller instance.
    pub controller_id: String,

    /// Whether the overlay starts enabled (default: true).
    pub enabled: bool,

    /// Keep the overlay allocated when the conference ends (default: false).
    pub retained_on_leave: bool,

    /// Presentation used when nothing is saved (default: minimized).
    pub default_presentation: PresentationMode,

    /// Delay between a join/create success and the attach (default: 1000ms).
    pub settle_delay_ms: u64,

    /// Accepted conference ids or aliases. Empty accepts everything.
    pub conference_allowlist: Vec<String>,

    /// Route screen-share updates to the camera map and vice versa.
    pub invert_update_stream_kind: bool,

    /// Controller mailbox capacity (default: 256).
    pub mailbox_capacity: usize,
}

fn parse_bool(vars: &HashMap<String, String>, key: &str, default: bool) -> Result<bool, ConfigError> {
    match vars.get(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue(format!("{key}={raw}"))),
        },
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let enabled = parse_bool(vars, "OC_ENABLED", true)?;
        let retained_on_leave = parse_bool(vars, "OC_RETAINED_ON_LEAVE", false)?;
        let invert_update_stream_kind = parse_bool(vars, "OC_INVERT_UPDATE_STREAM_KIND", false)?;

        let default_presentation = match vars.get("OC_DEFAULT_PRESENTATION") {
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("OC_DEFAULT_PRESENTATION: {e}")))?,
            None => DEFAULT_PRESENTATION,
        };

        let settle_delay_ms = match vars.get("OC_SETTLE_DELAY_MS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(format!("OC_SETTLE_DELAY_MS={raw}")))?,
            None => DEFAULT_SETTLE_DELAY_MS,
        };

        let mailbox_capacity = match vars.get("OC_MAILBOX_CAPACITY") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(capacity) if capacity > 0 => capacity,
                _ => {
                    return Err(ConfigError::InvalidValue(format!(
                        "OC_MAILBOX_CAPACITY={raw}"
                    )))
                }
            },
            None => DEFAULT_MAILBOX_CAPACITY,
        };

        let conference_allowlist = vars
            .get("OC_CONFERENCE_ALLOWLIST")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        // Generate controller instance ID
        let controller_id = vars.get("OC_CONTROLLER_ID").cloned().unwrap_or_else(|| {
            let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{DEFAULT_CONTROLLER_ID_PREFIX}-{hostname}-{short_suffix}")
        });

        Ok(Config {
            controller_id,
            enabled,
            retained_on_leave,
            default_presentation,
            settle_delay_ms,
            conference_allowlist,
            invert_update_stream_kind,
            mailbox_capacity,
        })
    }
}

/// Decides which conferences the controller reacts to.
#[derive(Clone, Default)]
pub enum ConferenceFilter {
    /// Accept every conference.
    #[default]
    Any,
    /// Accept only these ids or aliases.
    AllowList(HashSet<String>),
    /// Custom predicate over an id or alias.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl ConferenceFilter {
    /// Build a filter from a predicate.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        ConferenceFilter::Predicate(Arc::new(f))
    }

    /// Whether `key` (a conference id or alias) passes.
    #[must_use]
    pub fn accepts(&self, key: &str) -> bool {
        match self {
            ConferenceFilter::Any => true,
            ConferenceFilter::AllowList(ids) => ids.contains(key),
            ConferenceFilter::Predicate(f) => f(key),
        }
    }

    /// Whether an event referencing `conference_id` and `alias` passes.
    ///
    /// Either value passing is enough.
    #[must_use]
    pub fn accepts_ref(&self, conference_id: &str, alias: Option<&str>) -> bool {
        self.accepts(conference_id) || alias.is_some_and(|a| self.accepts(a))
    }
}

impl fmt::Debug for ConferenceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConferenceFilter::Any => f.write_str("Any"),
            ConferenceFilter::AllowList(ids) => {
                let mut sorted: Vec<&String> = ids.iter().collect();
                sorted.sort();
                f.debug_tuple("AllowList").field(&sorted).finish()
            }
            ConferenceFilter::Predicate(_) => f.write_str("Predicate(<fn>)"),
        }
    }
}

/// Runtime configuration of the controller actor.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Instance id used in logs.
    pub controller_id: String,
    /// Conference filter.
    pub filter: ConferenceFilter,
    /// Keep the overlay allocated when the conference ends.
    pub retained_on_leave: bool,
    /// Initial enabled flag.
    pub enabled: bool,
    /// Presentation used when nothing is saved.
    pub default_presentation: PresentationMode,
    /// Attach settle delay.
    pub settle_delay: Duration,
    /// Route participant-updated stream re-pulls to the opposite kind.
    pub invert_update_stream_kind: bool,
    /// Mailbox capacity.
    pub mailbox_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            controller_id: format!("{DEFAULT_CONTROLLER_ID_PREFIX}-local"),
            filter: ConferenceFilter::Any,
            retained_on_leave: false,
            enabled: true,
            default_presentation: DEFAULT_PRESENTATION,
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            invert_update_stream_kind: false,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

impl ControllerConfig {
    /// Replace the conference filter.
    #[must_use]
    pub fn with_filter(mut self, filter: ConferenceFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the retention policy.
    #[must_use]
    pub fn with_retained_on_leave(mut self, retained: bool) -> Self {
        self.retained_on_leave = retained;
        self
    }

    /// Set the initial enabled flag.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the default presentation.
    #[must_use]
    pub fn with_default_presentation(mut self, mode: PresentationMode) -> Self {
        self.default_presentation = mode;
        self
    }

    /// Set the attach settle delay.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Set the participant-updated stream routing polarity.
    #[must_use]
    pub fn with_inverted_update_stream_kind(mut self, invert: bool) -> Self {
        self.invert_update_stream_kind = invert;
        self
    }
}

impl From<&Config> for ControllerConfig {
    fn from(config: &Config) -> Self {
        let filter = if config.conference_allowlist.is_empty() {
            ConferenceFilter::Any
        } else {
            ConferenceFilter::AllowList(config.conference_allowlist.iter().cloned().collect())
        };

        Self {
            controller_id: config.controller_id.clone(),
            filter,
            retained_on_leave: config.retained_on_leave,
            enabled: config.enabled,
            default_presentation: config.default_presentation,
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            invert_update_stream_kind: config.invert_update_stream_kind,
            mailbox_capacity: config.mailbox_capacity,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_vars(&HashMap::new()).expect("Config should load successfully");

        assert!(config.enabled);
        assert!(!config.retained_on_leave);
        assert_eq!(config.default_presentation, PresentationMode::Minimized);
        assert_eq!(config.settle_delay_ms, DEFAULT_SETTLE_DELAY_MS);
        assert!(config.conference_allowlist.is_empty());
        assert!(!config.invert_update_stream_kind);
        assert_eq!(config.mailbox_capacity, DEFAULT_MAILBOX_CAPACITY);
        // Controller ID should be auto-generated
        assert!(config.controller_id.starts_with("oc-"));
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let vars = HashMap::from([
            ("OC_CONTROLLER_ID".to_string(), "oc-custom-001".to_string()),
            ("OC_ENABLED".to_string(), "false".to_string()),
            ("OC_RETAINED_ON_LEAVE".to_string(), "1".to_string()),
            ("OC_DEFAULT_PRESENTATION".to_string(), "expanded".to_string()),
            ("OC_SETTLE_DELAY_MS".to_string(), "250".to_string()),
            (
                "OC_CONFERENCE_ALLOWLIST".to_string(),
                " conf-1, standup ,,".to_string(),
            ),
            ("OC_INVERT_UPDATE_STREAM_KIND".to_string(), "yes".to_string()),
            ("OC_MAILBOX_CAPACITY".to_string(), "32".to_string()),
        ]);

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.controller_id, "oc-custom-001");
        assert!(!config.enabled);
        assert!(config.retained_on_leave);
        assert_eq!(config.default_presentation, PresentationMode::Expanded);
        assert_eq!(config.settle_delay_ms, 250);
        assert_eq!(config.conference_allowlist, vec!["conf-1", "standup"]);
        assert!(config.invert_update_stream_kind);
        assert_eq!(config.mailbox_capacity, 32);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for (key, value) in [
            ("OC_ENABLED", "maybe"),
            ("OC_DEFAULT_PRESENTATION", "fullscreen"),
            ("OC_SETTLE_DELAY_MS", "-5"),
            ("OC_MAILBOX_CAPACITY", "0"),
        ] {
            let vars = HashMap::from([(key.to_string(), value.to_string())]);
            let result = Config::from_vars(&vars);
            assert!(
                matches!(result, Err(ConfigError::InvalidValue(ref msg)) if msg.contains(key)),
                "{key}={value} should be rejected"
            );
        }
    }

    #[test]
    fn test_controller_config_from_allowlist() {
        let vars = HashMap::from([(
            "OC_CONFERENCE_ALLOWLIST".to_string(),
            "conf-1".to_string(),
        )]);
        let config = Config::from_vars(&vars).unwrap();
        let runtime = ControllerConfig::from(&config);

        assert!(runtime.filter.accepts("conf-1"));
        assert!(!runtime.filter.accepts("conf-2"));
        assert_eq!(runtime.settle_delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_filter_accepts_alias() {
        let filter = ConferenceFilter::AllowList(HashSet::from(["standup".to_string()]));

        assert!(filter.accepts_ref("conf-1", Some("standup")));
        assert!(!filter.accepts_ref("conf-1", None));
        assert!(!filter.accepts_ref("conf-1", Some("retro")));
    }

    #[test]
    fn test_predicate_filter() {
        let filter = ConferenceFilter::predicate(|id| id.starts_with("team-"));

        assert!(filter.accepts("team-a"));
        assert!(!filter.accepts("other"));
        assert_eq!(format!("{filter:?}"), "Predicate(<fn>)");
    }

    #[test]
    fn test_controller_config_debug_lists_fields() {
        let debug_output = format!("{:?}", ControllerConfig::default());

        assert!(debug_output.contains("retained_on_leave"));
        assert!(debug_output.contains("settle_delay"));
        assert!(debug_output.contains("filter: Any"));
    }
}
