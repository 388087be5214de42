//! Scripted transport used by the unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};

/// Replays queued responses in order and records every request it sees.
/// Runs out with a `Transport` error, so an unexpected call fails loudly.
#[derive(Debug, Default)]
pub(crate) struct RecordingTransport {
    responses: RefCell<VecDeque<Result<HttpResponse, ApiError>>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl RecordingTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, response: HttpResponse) {
        self.responses.borrow_mut().push_back(Ok(response));
    }

    pub(crate) fn push_json(&self, status: u16, body: Value) {
        self.push(HttpResponse::new(status, body.to_string()));
    }

    pub(crate) fn push_failure(&self, message: &str) {
        self.responses
            .borrow_mut()
            .push_back(Err(ApiError::Transport(message.to_string())));
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl Transport for RecordingTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.borrow_mut().push(request);
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no scripted response".to_string())))
    }
}
