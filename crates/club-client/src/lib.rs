//! Page-side plumbing around [`club_forms`] for the PAQUETES EL CLUB site.
//!
//! - [`config`] - the shared application configuration with dotted-path access
//! - [`api`] - response classification and the [`ApiClient`] transport seam
//! - [`auth`] - redirects to the login page on expired sessions
//! - [`rates`] - delivery fee lookup with page, fetched and default rates
//! - [`submit`] - validated submission with double-submit protection
//!
//! # Example
//!
//! ```rust
//! use club_client::config::AppConfig;
//!
//! let mut config = AppConfig::from_json_str(r#"{"alerts": {"maxAlerts": 3}}"#).unwrap();
//! assert_eq!(config.get("alerts.maxAlerts"), Some(serde_json::json!(3)));
//! assert!(config.is_enabled("forms.preventDoubleSubmit"));
//!
//! config.set("validation.debounceDelay", serde_json::json!(150)).unwrap();
//! assert_eq!(config.validation.debounce_delay, 150);
//! ```

pub mod api;
pub mod auth;
pub mod config;
mod error;
pub mod rates;
pub mod submit;

pub use api::{classify, ApiClient, ApiOutcome, ApiResponse, BoxFuture};
pub use auth::{AuthRedirect, AuthRedirectHandler};
pub use config::AppConfig;
pub use error::{ClientError, ConfigError, Result};
pub use rates::{FeeDisplay, PackageType, RateBook, RateSource, Rates};
pub use submit::{PendingSubmit, SubmitController, SubmitOutcome};
