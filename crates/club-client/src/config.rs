//! Application configuration.
//!
//! One [`AppConfig`] value is built per page (from defaults or a JSON file) and
//! handed to the components that need it. Keys are camelCase, as in the page
//! templates:
//!
//! ```json
//! {
//!   "api": { "baseUrl": "/api", "timeout": 30000 },
//!   "validation": { "showErrorsOnBlur": false },
//!   "rates": { "normal": 1800 }
//! }
//! ```
//!
//! Missing sections and keys take their defaults. Unknown top-level sections
//! are kept so dotted-path lookups still see them.

use std::path::Path;
use std::time::Duration;

use club_forms::panel::PANEL_CONTAINER_ID;
use club_forms::{GuardConfig, ToastStack, ValidatorOptions};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::rates::{PageRates, RateBook};

/// Application identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSection {
    /// Display name.
    pub name: String,
    /// Release.
    pub version: String,
    /// `development` or `production`.
    pub environment: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "PAQUETES EL CLUB".to_string(),
            version: "4.0.0".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// REST backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiSection {
    /// Prefix of every endpoint.
    pub base_url: String,
    /// Request timeout in milliseconds.
    pub timeout: u64,
    /// Attempts before giving up.
    pub retry_attempts: u32,
}

impl ApiSection {
    /// The request timeout.
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: "/api".to_string(),
            timeout: 30_000,
            retry_attempts: 3,
        }
    }
}

/// Toast settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlertSection {
    /// Default toast lifetime in milliseconds.
    pub default_duration: u64,
    /// Toasts on screen at once.
    pub max_alerts: usize,
    /// Screen corner.
    pub position: String,
}

impl Default for AlertSection {
    fn default() -> Self {
        Self {
            default_duration: 5000,
            max_alerts: 5,
            position: "top-right".to_string(),
        }
    }
}

/// Validation behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationSection {
    /// Delay before validating while typing, in milliseconds.
    pub debounce_delay: u64,
    /// Re-validate fields when they lose focus.
    pub show_errors_on_blur: bool,
    /// Show field errors after a failed submit.
    pub show_errors_on_submit: bool,
    /// Lifetime of the guard panel in milliseconds.
    pub panel_dismiss: u64,
}

impl Default for ValidationSection {
    fn default() -> Self {
        Self {
            debounce_delay: 300,
            show_errors_on_blur: true,
            show_errors_on_submit: true,
            panel_dismiss: 8000,
        }
    }
}

/// Form behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormsSection {
    /// Focus the first field on load.
    pub auto_focus: bool,
    /// Refuse a submit while the previous one is in flight.
    pub prevent_double_submit: bool,
    /// Show loading states on submit controls.
    pub show_loading_states: bool,
}

impl Default for FormsSection {
    fn default() -> Self {
        Self {
            auto_focus: true,
            prevent_double_submit: true,
            show_loading_states: true,
        }
    }
}

/// Notification polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationSection {
    /// Polling enabled.
    pub enabled: bool,
    /// Polling interval in milliseconds.
    pub check_interval: u64,
    /// Highest unread count displayed.
    pub max_unread: u32,
}

impl Default for NotificationSection {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval: 30_000,
            max_unread: 99,
        }
    }
}

/// Authentication redirects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthSection {
    /// Login page.
    pub login_url: String,
    /// Delay before redirecting, in milliseconds.
    pub redirect_delay: u64,
    /// Path prefixes that need a session.
    pub protected_paths: Vec<String>,
    /// Paths that never need one.
    pub public_paths: Vec<String>,
}

impl Default for AuthSection {
    fn default() -> Self {
        let list = |paths: &[&str]| paths.iter().map(|p| (*p).to_string()).collect();
        Self {
            login_url: "/auth/login".to_string(),
            redirect_delay: 1500,
            protected_paths: list(&[
                "/profile",
                "/settings",
                "/admin",
                "/dashboard",
                "/messages",
                "/packages",
                "/receive",
            ]),
            public_paths: list(&[
                "/announce",
                "/search",
                "/auth/login",
                "/auth/register",
                "/help",
                "/cookies",
                "/policies",
                "/",
                "/error-demo",
            ]),
        }
    }
}

/// Everything a page needs to know.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub app: AppSection,
    pub api: ApiSection,
    pub alerts: AlertSection,
    pub validation: ValidationSection,
    pub forms: FormsSection,
    pub notifications: NotificationSection,
    pub auth: AuthSection,
    /// Rates rendered into the page by the server, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rates: Option<PageRates>,
    /// Sections this crate does not know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppConfig {
    /// Parses a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the JSON does not fit the shape.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Looks up a value by dotted path, e.g. `api.timeout`.
    pub fn get(&self, path: &str) -> Option<Value> {
        let root = serde_json::to_value(self).ok()?;
        path.split('.').try_fold(root, |value, key| match value {
            Value::Object(mut map) => map.remove(key),
            _ => None,
        })
    }

    /// Stores a value at a dotted path, creating intermediate objects.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the value does not fit the
    /// typed shape at that path, or the path names no key of a known section.
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), ConfigError> {
        if path.is_empty() {
            return Err(ConfigError::EmptyPath);
        }

        let mut root = serde_json::to_value(&*self)?;
        let mut keys: Vec<&str> = path.split('.').collect();
        let last = keys.pop().unwrap_or(path);

        let mut target = &mut root;
        for key in keys {
            target = ensure_object(target)
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        ensure_object(target).insert(last.to_string(), value.clone());

        let invalid = |message: String| ConfigError::InvalidValue {
            path: path.to_string(),
            message,
        };
        let updated: Self = serde_json::from_value(root).map_err(|e| invalid(e.to_string()))?;
        if updated.get(path).as_ref() != Some(&value) {
            return Err(invalid("not a configuration key".to_string()));
        }

        *self = updated;
        Ok(())
    }

    /// Returns whether a feature flag is on. Missing and non-boolean values
    /// count as off.
    pub fn is_enabled(&self, path: &str) -> bool {
        self.get(path).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    /// Options for a [`FormValidator`](club_forms::FormValidator).
    pub const fn validator_options(&self) -> ValidatorOptions {
        ValidatorOptions {
            show_errors: self.validation.show_errors_on_submit,
            show_success: true,
            validate_on_submit: true,
            validate_on_change: self.validation.show_errors_on_blur,
        }
    }

    /// Settings for a [`FormGuard`](club_forms::FormGuard).
    pub fn guard_config(&self) -> GuardConfig {
        GuardConfig {
            panel_container_id: PANEL_CONTAINER_ID.to_string(),
            auto_dismiss: Duration::from_millis(self.validation.panel_dismiss),
        }
    }

    /// An empty toast stack sized by `alerts.maxAlerts`.
    pub fn toast_stack(&self) -> ToastStack {
        ToastStack::new(self.alerts.max_alerts)
    }

    /// A rate book seeded with the page rates.
    pub fn rate_book(&self) -> RateBook {
        RateBook::new(self.rates.clone())
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just made an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "/api");
        assert_eq!(config.alerts.max_alerts, 5);
        assert_eq!(config.auth.redirect_delay, 1500);
        assert!(config.forms.prevent_double_submit);
        assert!(config.rates.is_none());
    }

    #[test]
    fn test_partial_json() {
        let config = AppConfig::from_json_str(
            r#"{"api": {"timeout": 1000}, "rates": {"normal": 1800}, "theme": {"dark": true}}"#,
        )
        .unwrap();
        assert_eq!(config.api.timeout, 1000);
        assert_eq!(config.api.base_url, "/api");
        assert_eq!(config.rates.as_ref().and_then(|r| r.normal), Some(1800));
        assert!(config.is_enabled("theme.dark"));
    }

    #[test]
    fn test_invalid_json() {
        let err = AppConfig::from_json_str(r#"{"api": {"timeout": "soon"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_get() {
        let config = AppConfig::default();
        assert_eq!(config.get("api.timeout"), Some(json!(30000)));
        assert_eq!(config.get("alerts.position"), Some(json!("top-right")));
        assert_eq!(config.get("api.missing"), None);
        assert_eq!(config.get("api.timeout.deeper"), None);
        assert_eq!(config.get(""), None);
    }

    #[test]
    fn test_set() {
        let mut config = AppConfig::default();
        config.set("validation.panelDismiss", json!(4000)).unwrap();
        assert_eq!(config.validation.panel_dismiss, 4000);

        config.set("features.beta.enabled", json!(true)).unwrap();
        assert!(config.is_enabled("features.beta.enabled"));

        config.set("rates.extra_dimensioned", json!(2500)).unwrap();
        assert_eq!(config.rate_book().page().and_then(|r| r.extra_dimensioned), Some(2500));
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = AppConfig::default();
        assert!(matches!(
            config.set("api.timeout", json!("slow")),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.set("api.nonsense", json!(1)),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(config.set("", json!(1)), Err(ConfigError::EmptyPath)));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_is_enabled() {
        let config = AppConfig::default();
        assert!(config.is_enabled("notifications.enabled"));
        assert!(!config.is_enabled("notifications.checkInterval"));
        assert!(!config.is_enabled("nothing.here"));
    }

    #[test]
    fn test_adapters() {
        let mut config = AppConfig::default();
        config.validation.show_errors_on_blur = false;
        config.validation.panel_dismiss = 2000;
        config.alerts.max_alerts = 2;

        assert!(!config.validator_options().validate_on_change);
        assert_eq!(config.guard_config().auto_dismiss, Duration::from_secs(2));
        let mut stack = config.toast_stack();
        for _ in 0..3 {
            club_forms::Feedback::notify(&mut stack, club_forms::ToastKind::Info, "x");
        }
        assert_eq!(stack.len(), 2);
    }
}
