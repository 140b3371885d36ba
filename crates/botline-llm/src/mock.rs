//! Scriptable mock provider for tests.

use crate::error::{Error, Result};
use crate::provider::{Completion, CompletionProvider, CompletionRequest};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Default reply when no scripted reply is queued
const DEFAULT_REPLY: &str = "mock reply";

/// A completion provider that replays scripted replies and records every
/// request it sees.
#[derive(Default)]
pub struct MockProvider {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
    fail: AtomicBool,
}

impl MockProvider {
    /// Create a mock with no scripted replies (answers [`DEFAULT_REPLY`]).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that answers `reply` first.
    #[must_use]
    pub fn with_reply(reply: impl Into<String>) -> Self {
        let mock = Self::new();
        mock.push_reply(reply);
        mock
    }

    /// Queue another scripted reply.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(reply.into());
    }

    /// Make subsequent calls fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Every request seen so far.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        self.requests.lock().unwrap().push(request);

        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Api("mock completion failure".to_string()));
        }

        let text = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| DEFAULT_REPLY.to_string());

        Ok(Completion {
            text,
            model: "mock".to_string(),
        })
    }
}
