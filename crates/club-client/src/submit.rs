//! Validated form submission to the REST backend.
//!
//! A submit goes through two steps so the in-flight window is explicit:
//! [`SubmitController::begin`] validates, disables the submit controls and
//! returns the payload; [`SubmitController::finish`] re-enables the controls,
//! classifies the response and tells the user. [`SubmitController::submit`]
//! runs both around the request, bounded by `api.timeout`; if its future is
//! dropped mid-request the controls are re-enabled all the same.

use std::time::Duration;

use club_forms::dom::Document;
use club_forms::event::Event;
use club_forms::validator::SUCCESS_MESSAGE;
use club_forms::{
    form_data, CustomRegistry, Feedback, FieldErrors, FormValidator, ToastKind, ValidatorOptions,
};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::api::{
    classify, with_timeout, ApiClient, ApiOutcome, ApiResponse, DEFAULT_ERROR_MESSAGE,
};
use crate::auth::{AuthRedirect, AuthRedirectHandler, SESSION_EXPIRED_MESSAGE};
use crate::config::AppConfig;
use crate::error::Result;

/// Shown when the request never reached the backend.
pub const NETWORK_ERROR_MESSAGE: &str = "Error de conexión con el servidor";

/// How a submit ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// A previous submit is still waiting for its response.
    InFlight,
    /// The form is not on the page.
    NoForm,
    /// Validation failed; nothing was sent.
    Invalid(FieldErrors),
    /// The backend accepted the form.
    Accepted(Value),
    /// The backend refused the form.
    Rejected {
        /// Message shown to the user.
        message: String,
    },
    /// The session is gone.
    Unauthorized(Option<AuthRedirect>),
    /// The request failed before a response arrived.
    NetworkError(String),
}

/// A submit between [`SubmitController::begin`] and
/// [`SubmitController::finish`].
#[derive(Debug)]
pub struct PendingSubmit {
    form: usize,
    payload: Value,
    disabled: Vec<usize>,
}

impl PendingSubmit {
    /// Index of the submitted form.
    pub const fn form(&self) -> usize {
        self.form
    }

    /// JSON object sent to the backend.
    pub const fn payload(&self) -> &Value {
        &self.payload
    }
}

/// Validates a form and posts it to an endpoint, one submit at a time.
#[derive(Debug)]
pub struct SubmitController {
    validator: FormValidator,
    endpoint: String,
    success_message: String,
    prevent_double_submit: bool,
    timeout: Duration,
    auth: AuthRedirectHandler,
    in_flight: bool,
}

impl SubmitController {
    /// Creates a controller posting the form `form_id` to `endpoint`.
    pub fn new(form_id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::from_config(form_id, endpoint, &AppConfig::default())
    }

    /// Creates a controller configured from `config`.
    pub fn from_config(
        form_id: impl Into<String>,
        endpoint: impl Into<String>,
        config: &AppConfig,
    ) -> Self {
        let options = ValidatorOptions {
            show_success: false,
            ..config.validator_options()
        };
        Self {
            validator: FormValidator::new(form_id).options(options),
            endpoint: endpoint.into(),
            success_message: SUCCESS_MESSAGE.to_string(),
            prevent_double_submit: config.forms.prevent_double_submit,
            timeout: config.api.request_timeout(),
            auth: AuthRedirectHandler::from_config(&config.auth),
            in_flight: false,
        }
    }

    /// Sets the message shown when the backend accepts the form.
    #[must_use]
    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = message.into();
        self
    }

    /// Sets the custom rule registry.
    #[must_use]
    pub fn registry(mut self, registry: CustomRegistry) -> Self {
        self.validator = self.validator.registry(registry);
        self
    }

    /// Sets how long [`submit`](Self::submit) waits for the backend.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the validator.
    pub const fn validator(&self) -> &FormValidator {
        &self.validator
    }

    /// Returns whether a submit is waiting for its response.
    pub const fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Validates the form and prepares the request.
    ///
    /// The native submission is always blocked.
    ///
    /// # Errors
    ///
    /// Returns the final outcome when nothing is to be sent.
    pub fn begin(
        &mut self,
        doc: &mut Document,
        event: &mut Event,
        feedback: &mut dyn Feedback,
    ) -> std::result::Result<PendingSubmit, SubmitOutcome> {
        event.prevent_default();

        if self.in_flight && self.prevent_double_submit {
            debug!(form = self.validator.form_id(), "submit already in flight");
            return Err(SubmitOutcome::InFlight);
        }

        let Some(index) = doc.form_by_id(self.validator.form_id()) else {
            warn!(form = self.validator.form_id(), "form not found");
            return Err(SubmitOutcome::NoForm);
        };

        if !self.validator.handle_submit(doc, event, feedback) {
            return Err(SubmitOutcome::Invalid(self.validator.errors().clone()));
        }

        let form = &mut doc.forms[index];
        let payload: Map<String, Value> = form_data(form)
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect();

        let mut disabled = Vec::new();
        for (i, element) in form.elements.iter_mut().enumerate() {
            if element.input_type() == "submit" && !element.is_disabled() {
                element.attrs.set("disabled", "disabled");
                disabled.push(i);
            }
        }

        self.in_flight = true;
        Ok(PendingSubmit {
            form: index,
            payload: Value::Object(payload),
            disabled,
        })
    }

    /// Completes a submit with the backend's answer.
    pub fn finish(
        &mut self,
        doc: &mut Document,
        pending: PendingSubmit,
        response: Result<ApiResponse>,
        feedback: &mut dyn Feedback,
        current_url: &str,
    ) -> SubmitOutcome {
        self.release(doc, &pending);
        self.conclude(response, feedback, current_url)
    }

    /// Gives up on a submit without an answer: the controls are re-enabled
    /// and nothing is shown.
    pub fn abandon(&mut self, doc: &mut Document, pending: PendingSubmit) {
        self.release(doc, &pending);
    }

    /// Validates the form, posts it and handles the answer.
    pub async fn submit(
        &mut self,
        doc: &mut Document,
        event: &mut Event,
        feedback: &mut dyn Feedback,
        client: &dyn ApiClient,
        current_url: &str,
    ) -> SubmitOutcome {
        let pending = match self.begin(doc, event, feedback) {
            Ok(pending) => pending,
            Err(outcome) => return outcome,
        };
        let timeout = self.timeout;
        let in_flight = InFlightSubmit {
            controller: self,
            doc,
            pending,
            released: false,
        };

        let request = client.post(&in_flight.controller.endpoint, &in_flight.pending.payload);
        let response = with_timeout(request, timeout).await;
        in_flight.finish(response, feedback, current_url)
    }

    fn release(&mut self, doc: &mut Document, pending: &PendingSubmit) {
        if let Some(form) = doc.form_at_mut(pending.form) {
            for &i in &pending.disabled {
                if let Some(element) = form.get_mut(i) {
                    element.attrs.remove("disabled");
                }
            }
        }
        self.in_flight = false;
    }

    fn conclude(
        &self,
        response: Result<ApiResponse>,
        feedback: &mut dyn Feedback,
        current_url: &str,
    ) -> SubmitOutcome {
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, endpoint = %self.endpoint, "submit failed");
                feedback.notify(ToastKind::Error, NETWORK_ERROR_MESSAGE);
                return SubmitOutcome::NetworkError(e.to_string());
            }
        };

        match classify(response) {
            ApiOutcome::Success(body) => {
                info!(endpoint = %self.endpoint, "form accepted");
                feedback.notify(ToastKind::Success, &self.success_message);
                SubmitOutcome::Accepted(body)
            }
            ApiOutcome::Unauthorized(body) => {
                warn!(endpoint = %self.endpoint, "session expired");
                feedback.notify(ToastKind::Error, SESSION_EXPIRED_MESSAGE);
                SubmitOutcome::Unauthorized(self.auth.on_unauthorized(body.as_ref(), current_url))
            }
            outcome @ (ApiOutcome::RateLimited | ApiOutcome::Failed { .. }) => {
                let message = outcome
                    .error_message()
                    .unwrap_or(DEFAULT_ERROR_MESSAGE)
                    .to_string();
                warn!(endpoint = %self.endpoint, %message, "form rejected");
                feedback.notify(ToastKind::Error, &message);
                SubmitOutcome::Rejected { message }
            }
        }
    }
}

/// A submit whose request is on the wire. Dropping it before
/// [`finish`](Self::finish) releases the controls.
struct InFlightSubmit<'a> {
    controller: &'a mut SubmitController,
    doc: &'a mut Document,
    pending: PendingSubmit,
    released: bool,
}

impl InFlightSubmit<'_> {
    fn finish(
        mut self,
        response: Result<ApiResponse>,
        feedback: &mut dyn Feedback,
        current_url: &str,
    ) -> SubmitOutcome {
        self.controller.release(self.doc, &self.pending);
        self.released = true;
        self.controller.conclude(response, feedback, current_url)
    }
}

impl Drop for InFlightSubmit<'_> {
    fn drop(&mut self) {
        if !self.released {
            warn!(endpoint = %self.controller.endpoint, "submit dropped before an answer");
            self.controller.release(self.doc, &self.pending);
        }
    }
}
