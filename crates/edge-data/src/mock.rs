//! Scripted in-memory transport.

use std::cell::RefCell;
use std::collections::VecDeque;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::request::OutboundRequest;
use crate::response::Response;
use crate::transport::HttpTransport;

/// Replays queued responses in order and records every request it sees.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: RefCell<VecDeque<Result<Response, FetchError>>>,
    requests: RefCell<Vec<OutboundRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON reply.
    pub fn reply_json(self, status: u16, body: serde_json::Value) -> Self {
        self.replies
            .borrow_mut()
            .push_back(Ok(Response::json_body(status, &body)));
        self
    }

    /// Queue a transport failure.
    pub fn reply_error(self, error: FetchError) -> Self {
        self.replies.borrow_mut().push_back(Err(error));
        self
    }

    /// Requests sent so far.
    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.borrow().clone()
    }

    /// Number of queued replies not yet consumed.
    pub fn pending(&self) -> usize {
        self.replies.borrow().len()
    }
}

#[async_trait(?Send)]
impl HttpTransport for MockTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<Response, FetchError> {
        self.requests.borrow_mut().push(request.clone());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Connection(format!("no scripted reply for {}", request.url))))
    }
}
