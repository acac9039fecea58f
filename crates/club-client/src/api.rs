//! REST response handling.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde_json::Value;

use crate::error::{ClientError, Result};

/// A boxed future for async client operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Shown when the backend rate-limits the page.
pub const RATE_LIMIT_MESSAGE: &str = "Demasiadas solicitudes. Intente nuevamente en unos momentos.";
/// Shown when an error body carries no message.
pub const DEFAULT_ERROR_MESSAGE: &str = "Error en la solicitud";

/// A backend response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Decoded JSON body, `None` when the body was not JSON.
    pub body: Option<Value>,
}

impl ApiResponse {
    /// A response with a JSON body.
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    /// A response whose body could not be decoded.
    pub const fn undecodable(status: u16) -> Self {
        Self { status, body: None }
    }

    /// Returns whether the status is 2xx.
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// How the page should react to a response.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome {
    /// 2xx, with the body (`null` when it was not JSON).
    Success(Value),
    /// 401, with the body if it was JSON.
    Unauthorized(Option<Value>),
    /// 429.
    RateLimited,
    /// Any other failure.
    Failed {
        /// Message to show the user.
        message: String,
    },
}

impl ApiOutcome {
    /// Returns the message to show for a failure.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success(_) | Self::Unauthorized(_) => None,
            Self::RateLimited => Some(RATE_LIMIT_MESSAGE),
            Self::Failed { message } => Some(message.as_str()),
        }
    }
}

/// Classifies a response.
pub fn classify(response: ApiResponse) -> ApiOutcome {
    if response.is_success() {
        return ApiOutcome::Success(response.body.unwrap_or(Value::Null));
    }

    match response.status {
        401 => ApiOutcome::Unauthorized(response.body),
        429 => ApiOutcome::RateLimited,
        _ => ApiOutcome::Failed {
            message: error_message(response.body.as_ref()),
        },
    }
}

/// Extracts the user-facing message of an error body: `detail`, else
/// `message`, else a generic message.
pub fn error_message(body: Option<&Value>) -> String {
    body.and_then(|b| {
        ["detail", "message"]
            .iter()
            .find_map(|key| b.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()))
    })
    .unwrap_or(DEFAULT_ERROR_MESSAGE)
    .to_string()
}

/// Awaits `request` for at most `timeout`. Expiry drops the request and
/// yields [`ClientError::Timeout`].
pub async fn with_timeout(
    request: BoxFuture<'_, Result<ApiResponse>>,
    timeout: Duration,
) -> Result<ApiResponse> {
    tokio::time::timeout(timeout, request)
        .await
        .map_err(|_| ClientError::Timeout(timeout))?
}

/// Transport to the REST backend.
///
/// # Example
///
/// ```ignore
/// struct Offline;
///
/// impl ApiClient for Offline {
///     fn get<'a>(&'a self, _path: &'a str) -> BoxFuture<'a, Result<ApiResponse>> {
///         Box::pin(async { Err(ClientError::Network("offline".into())) })
///     }
///
///     fn post<'a>(
///         &'a self,
///         _path: &'a str,
///         _body: &'a Value,
///     ) -> BoxFuture<'a, Result<ApiResponse>> {
///         Box::pin(async { Err(ClientError::Network("offline".into())) })
///     }
/// }
/// ```
pub trait ApiClient: Send + Sync {
    /// Sends a GET request.
    fn get<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<ApiResponse>>;

    /// Sends a POST request with a JSON body.
    fn post<'a>(
        &'a self,
        path: &'a str,
        body: &'a Value,
    ) -> BoxFuture<'a, Result<ApiResponse>>;
}
