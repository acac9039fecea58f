//! Redirects to the login page when the session is gone.

use std::time::Duration;

use serde_json::Value;
use tracing::{error, info};

use crate::config::AuthSection;

/// Shown when a request comes back 401.
pub const SESSION_EXPIRED_MESSAGE: &str = "Sesión expirada. Por favor, inicie sesión nuevamente.";

/// `detail` of the 401 the backend sends when there is no session at all.
pub const NOT_AUTHENTICATED_DETAIL: &str = "No autenticado";

/// A pending redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRedirect {
    /// Where to go.
    pub target: String,
    /// How long to wait first.
    pub delay: Duration,
}

/// Decides when and where to send the user to log in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRedirectHandler {
    login_url: String,
    redirect_delay: Duration,
    protected_paths: Vec<String>,
    public_paths: Vec<String>,
}

impl Default for AuthRedirectHandler {
    fn default() -> Self {
        Self::from_config(&AuthSection::default())
    }
}

impl AuthRedirectHandler {
    /// Creates a handler from the `auth` configuration section.
    pub fn from_config(auth: &AuthSection) -> Self {
        Self {
            login_url: auth.login_url.clone(),
            redirect_delay: Duration::from_millis(auth.redirect_delay),
            protected_paths: auth.protected_paths.clone(),
            public_paths: auth.public_paths.clone(),
        }
    }

    /// Returns the login page.
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Handles a 401 body.
    ///
    /// A body flagged with `requires_auth` or carrying a `redirect_url`
    /// yields a delayed redirect. An undecodable body, or one whose `detail`
    /// is [`NOT_AUTHENTICATED_DETAIL`], yields an immediate redirect to the
    /// login page. Any other body yields none.
    pub fn on_unauthorized(&self, body: Option<&Value>, current_url: &str) -> Option<AuthRedirect> {
        let Some(body) = body else {
            error!("undecodable 401 response, redirecting to login");
            return Some(AuthRedirect {
                target: self.login_url.clone(),
                delay: Duration::ZERO,
            });
        };

        let redirect_url = body.get("redirect_url").filter(|v| truthy(v));
        let requires_auth = body.get("requires_auth").is_some_and(truthy);
        if !requires_auth && redirect_url.is_none() {
            if body.get("detail").and_then(Value::as_str) == Some(NOT_AUTHENTICATED_DETAIL) {
                info!("not authenticated, redirecting to login");
                return Some(AuthRedirect {
                    target: self.login_url.clone(),
                    delay: Duration::ZERO,
                });
            }
            return None;
        }

        let login_url = redirect_url
            .and_then(Value::as_str)
            .unwrap_or(self.login_url.as_str());
        let original_url = body
            .get("original_url")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(current_url);

        let target = redirect_target(login_url, Some(original_url), current_url);
        info!(%target, "session expired, redirecting");
        Some(AuthRedirect {
            target,
            delay: self.redirect_delay,
        })
    }

    /// Returns whether the session should be checked on `path`: it must be
    /// under a protected prefix and not public.
    pub fn should_check(&self, path: &str) -> bool {
        let is_public = self
            .public_paths
            .iter()
            .filter_map(|p| path.strip_prefix(p.as_str()))
            .any(|rest| rest.is_empty() || rest.starts_with('/'));
        let is_protected = self.protected_paths.iter().any(|p| path.starts_with(p.as_str()));
        is_protected && !is_public
    }
}

/// Builds the login URL, carrying the original URL as `redirect` when it
/// differs from the current one.
///
/// ```
/// use club_client::auth::redirect_target;
///
/// assert_eq!(
///     redirect_target("/auth/login", Some("/packages?page=2"), "/dashboard"),
///     "/auth/login?redirect=%2Fpackages%3Fpage%3D2"
/// );
/// assert_eq!(redirect_target("/auth/login", Some("/dashboard"), "/dashboard"), "/auth/login");
/// ```
pub fn redirect_target(login_url: &str, original_url: Option<&str>, current_url: &str) -> String {
    match original_url.filter(|original| *original != current_url) {
        Some(original) => {
            let separator = if login_url.contains('?') { '&' } else { '?' };
            format!(
                "{login_url}{separator}redirect={}",
                urlencoding::encode(original)
            )
        }
        None => login_url.to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_requires_auth() {
        let handler = AuthRedirectHandler::default();
        let redirect = handler
            .on_unauthorized(Some(&json!({"requires_auth": true})), "/dashboard")
            .unwrap();
        assert_eq!(redirect.target, "/auth/login");
        assert_eq!(redirect.delay, Duration::from_millis(1500));
    }

    #[test]
    fn test_redirect_url_and_original() {
        let handler = AuthRedirectHandler::default();
        let redirect = handler
            .on_unauthorized(
                Some(&json!({"redirect_url": "/auth/login?next=1", "original_url": "/packages/7"})),
                "/dashboard",
            )
            .unwrap();
        assert_eq!(redirect.target, "/auth/login?next=1&redirect=%2Fpackages%2F7");
    }

    #[test]
    fn test_not_authenticated_redirects_now() {
        let handler = AuthRedirectHandler::default();
        let redirect = handler
            .on_unauthorized(Some(&json!({"detail": "No autenticado"})), "/dashboard")
            .unwrap();
        assert_eq!(redirect.target, "/auth/login");
        assert_eq!(redirect.delay, Duration::ZERO);
    }

    #[test]
    fn test_plain_401_body_does_not_redirect() {
        let handler = AuthRedirectHandler::default();
        assert!(handler
            .on_unauthorized(Some(&json!({"detail": "Token inválido"})), "/dashboard")
            .is_none());
        assert!(handler
            .on_unauthorized(Some(&json!({"requires_auth": false})), "/dashboard")
            .is_none());
    }

    #[test]
    fn test_undecodable_body_redirects_now() {
        let handler = AuthRedirectHandler::default();
        let redirect = handler.on_unauthorized(None, "/dashboard").unwrap();
        assert_eq!(redirect.target, "/auth/login");
        assert_eq!(redirect.delay, Duration::ZERO);
    }

    #[test]
    fn test_should_check() {
        let handler = AuthRedirectHandler::default();
        assert!(handler.should_check("/dashboard"));
        assert!(handler.should_check("/packages/42"));
        assert!(!handler.should_check("/announce"));
        assert!(!handler.should_check("/"));
        assert!(!handler.should_check("/search/abc"));
    }

    #[test]
    fn test_public_wins_over_protected() {
        let handler = AuthRedirectHandler::from_config(&AuthSection {
            protected_paths: vec!["/help".into()],
            ..AuthSection::default()
        });
        assert!(!handler.should_check("/help"));
        assert!(!handler.should_check("/help/faq"));
        assert!(handler.should_check("/helpdesk"));
    }
}
