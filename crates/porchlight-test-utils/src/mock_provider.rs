// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM provider for deterministic testing.
//!
//! `MockProvider` implements `LlmProvider` with pre-configured responses,
//! popped from a FIFO queue. When the queue is empty, a default
//! "mock response" text is returned. Requests are captured so tests can
//! assert on prompt contents and call counts.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use porchlight_core::{LlmProvider, LlmRequest, LlmResponse, PorchlightError};

/// A mock LLM provider that returns pre-configured responses.
///
/// Two scripting styles compose: marker stubs route a response to the
/// first pending stub whose marker appears in the request's user
/// content (deterministic under concurrent callers), and a FIFO queue
/// serves requests no stub matches.
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<Result<String, String>>>>,
    stubs: Arc<Mutex<Vec<(String, VecDeque<String>)>>>,
    requests: Arc<Mutex<Vec<LlmRequest>>>,
    calls: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

impl MockProvider {
    /// Create a new mock provider with an empty response queue.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            stubs: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            calls: AtomicUsize::new(0),
            delay: Mutex::new(None),
        }
    }

    /// Create a mock provider pre-loaded with the given responses.
    pub fn with_responses(responses: Vec<&str>) -> Self {
        let provider = Self::new();
        {
            let queue = provider.responses.clone();
            let mut guard = queue.try_lock().expect("fresh mutex");
            for r in responses {
                guard.push_back(Ok(r.to_string()));
            }
        }
        provider
    }

    /// Add a response to the end of the queue.
    pub async fn push_response(&self, text: impl Into<String>) {
        self.responses.lock().await.push_back(Ok(text.into()));
    }

    /// Add a transport failure to the end of the queue.
    pub async fn push_error(&self, message: impl Into<String>) {
        self.responses.lock().await.push_back(Err(message.into()));
    }

    /// Route a response to requests whose user content contains `marker`.
    ///
    /// Stubs are consulted before the FIFO queue, each serving its
    /// responses in order, which keeps concurrent callers deterministic.
    pub async fn stub(&self, marker: &str, response: &str) {
        let mut stubs = self.stubs.lock().await;
        if let Some((_, queue)) = stubs.iter_mut().find(|(m, _)| m == marker) {
            queue.push_back(response.to_string());
        } else {
            stubs.push((
                marker.to_string(),
                VecDeque::from([response.to_string()]),
            ));
        }
    }

    /// Sleep this long before answering each request (virtual time
    /// friendly: pairs with `#[tokio::test(start_paused = true)]`).
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.lock().await = Some(delay);
    }

    /// Number of completion calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// All requests seen so far, in order.
    pub async fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().await.clone()
    }

    /// Pop the next scripted response, or return the default.
    async fn next_response(&self) -> Result<String, String> {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok("mock response".to_string()))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, PorchlightError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let user_content = request
            .messages
            .last()
            .map(|turn| turn.content.clone())
            .unwrap_or_default();
        self.requests.lock().await.push(request);

        {
            let mut stubs = self.stubs.lock().await;
            for (marker, queue) in stubs.iter_mut() {
                if user_content.contains(marker.as_str()) {
                    if let Some(text) = queue.pop_front() {
                        return Ok(LlmResponse { text });
                    }
                }
            }
        }

        match self.next_response().await {
            Ok(text) => Ok(LlmResponse { text }),
            Err(message) => Err(PorchlightError::Provider {
                message,
                source: None,
            }),
        }
    }
}
