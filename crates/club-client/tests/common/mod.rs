#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use club_client::{ApiClient, ApiResponse, BoxFuture, ClientError, Result};
use club_forms::dom::{Document, Element, Form};
use serde_json::Value;

/// What the mock answers to the next request.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(ApiResponse),
    Fail(String),
    /// Never answers.
    Hang,
}

/// An [`ApiClient`] replaying canned replies and recording every request.
#[derive(Debug, Default)]
pub struct MockClient {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<(String, Option<Value>)>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn respond(self, response: ApiResponse) -> Self {
        self.push(Reply::Respond(response));
        self
    }

    /// Queues a request that never completes.
    pub fn hang(self) -> Self {
        self.push(Reply::Hang);
        self
    }

    /// Queues a transport failure.
    pub fn fail(self, message: &str) -> Self {
        self.push(Reply::Fail(message.to_string()));
        self
    }

    fn push(&self, reply: Reply) {
        self.replies
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push_back(reply);
    }

    /// Requests seen so far, as `(path, body)`.
    pub fn requests(&self) -> Vec<(String, Option<Value>)> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn answer(&self, path: &str, body: Option<&Value>) -> Option<Result<ApiResponse>> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((path.to_string(), body.cloned()));
        let reply = self
            .replies
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front();
        match reply {
            Some(Reply::Respond(response)) => Some(Ok(response)),
            Some(Reply::Fail(message)) => Some(Err(ClientError::Network(message))),
            Some(Reply::Hang) => None,
            None => Some(Err(ClientError::Network("no reply queued".to_string()))),
        }
    }
}

impl ApiClient for MockClient {
    fn get<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<ApiResponse>> {
        Box::pin(async move {
            match self.answer(path, None) {
                Some(result) => result,
                None => std::future::pending().await,
            }
        })
    }

    fn post<'a>(&'a self, path: &'a str, body: &'a Value) -> BoxFuture<'a, Result<ApiResponse>> {
        Box::pin(async move {
            match self.answer(path, Some(body)) {
                Some(result) => result,
                None => std::future::pending().await,
            }
        })
    }
}

pub const ANNOUNCE_ENDPOINT: &str = "/api/packages/announce";

/// A filled-in package announcement form.
pub fn announce_page(guide_number: &str) -> Document {
    Document::new().form(
        Form::new("announce-form")
            .element(
                Element::input("guide_number")
                    .id("guide_number")
                    .required()
                    .value(guide_number)
                    .rules(r#"[{"type": "custom", "value": "trackingNumber"}]"#),
            )
            .element(
                Element::input("customer_name")
                    .id("customer_name")
                    .required()
                    .value("Mariana Ruiz"),
            )
            .element(Element::input("phone").kind("tel").value("3001234567"))
            .element(Element::button("Anunciar").id("announce-submit"))
            .element(Element::button("Cancelar").kind("button")),
    )
}

/// Whether the announce button is disabled.
pub fn submit_disabled(doc: &Document) -> bool {
    doc.find_by_id("announce-submit")
        .and_then(|at| doc.element(at))
        .is_some_and(Element::is_disabled)
}
