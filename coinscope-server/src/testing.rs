//! Stub requesters for tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::upstream::{Requester, TransportError, UpstreamRequest, UpstreamResponse};

/// Answers every request with the same canned response and counts calls
pub struct StaticRequester {
    response: UpstreamResponse,
    calls: AtomicUsize,
    last: Mutex<Option<UpstreamRequest>>,
}

impl StaticRequester {
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            response: UpstreamResponse::new(status, body),
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn ok(body: &str) -> Self {
        Self::new(200, body)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<UpstreamRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Requester for StaticRequester {
    async fn get(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request);
        Ok(self.response.clone())
    }
}

/// Fails every request as if the host were unreachable
pub struct FailingRequester;

#[async_trait::async_trait]
impl Requester for FailingRequester {
    async fn get(&self, _request: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        Err(TransportError::Connect("connection refused".into()))
    }
}

/// Sleeps before answering and records when each call starts and ends
pub struct DelayedRequester {
    delay: Duration,
    body: String,
    events: Mutex<Vec<String>>,
}

impl DelayedRequester {
    pub fn new(delay: Duration, body: &str) -> Self {
        Self {
            delay,
            body: body.into(),
            events: Mutex::new(Vec::new()),
        }
    }

    /// `start:<ids>` / `end:<ids>` markers in the order they happened
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Requester for DelayedRequester {
    async fn get(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        let tag = request.query_value("ids").unwrap_or("?").to_string();
        self.events.lock().unwrap().push(format!("start:{}", tag));
        tokio::time::sleep(self.delay).await;
        self.events.lock().unwrap().push(format!("end:{}", tag));
        Ok(UpstreamResponse::new(200, self.body.clone()))
    }
}
