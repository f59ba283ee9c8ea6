use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::suggester::{SuggestError, TagSuggester};

/// Pre-programmed suggester for deterministic tests without API calls.
/// Responses are consumed in order; calls past the end fail.
pub struct MockSuggester {
    responses: Mutex<VecDeque<Result<Vec<String>, SuggestError>>>,
    seen_notes: Mutex<Vec<String>>,
    call_count: AtomicUsize,
}

impl MockSuggester {
    pub fn new(responses: Vec<Result<Vec<String>, SuggestError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            seen_notes: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Convenience: always-empty queue, every call fails.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Convenience: one successful response.
    pub fn with_tags(tags: &[&str]) -> Self {
        Self::new(vec![Ok(tags.iter().map(|t| t.to_string()).collect())])
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Notes passed to `suggest`, in call order.
    pub fn seen_notes(&self) -> Vec<String> {
        self.seen_notes.lock().expect("mock lock").clone()
    }
}

#[async_trait]
impl TagSuggester for MockSuggester {
    async fn suggest(&self, notes: &str) -> Result<Vec<String>, SuggestError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.seen_notes.lock().expect("mock lock").push(notes.to_string());
        self.responses
            .lock()
            .expect("mock lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(SuggestError::Malformed("MockSuggester: no response configured".into()))
            })
    }
}
