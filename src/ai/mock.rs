use super::{GenerationClient, GenerationRequest};
use crate::shape::ExpectedShape;
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum MockResponse {
    Value(Value),
    Empty,
    Failure(String),
    Hang,
}

/// Scripted [`GenerationClient`]: the n-th call gets the n-th queued response.
///
/// Clones share state, so a clone kept by a test can observe calls made
/// through the copy handed to a pipeline.
#[derive(Clone)]
pub struct MockGenerationClient {
    responses: Arc<Mutex<Vec<MockResponse>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_response(self, response: Value) -> Self {
        self.push(MockResponse::Value(response))
    }

    pub fn with_empty_response(self) -> Self {
        self.push(MockResponse::Empty)
    }

    pub fn with_failure(self, message: &str) -> Self {
        self.push(MockResponse::Failure(message.to_string()))
    }

    /// The matching call never completes; used to exercise cancellation.
    pub fn with_hang(self) -> Self {
        self.push(MockResponse::Hang)
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn push(self, response: MockResponse) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
        _shape: &ExpectedShape,
    ) -> Result<Option<Value>> {
        let index = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count - 1
        };
        self.requests.lock().unwrap().push(request.clone());

        // Past the end of the script every call behaves like an empty reply.
        let response = self
            .responses
            .lock()
            .unwrap()
            .get(index)
            .cloned()
            .unwrap_or(MockResponse::Empty);

        match response {
            MockResponse::Value(value) => Ok(Some(value)),
            MockResponse::Empty => Ok(None),
            MockResponse::Failure(message) => Err(Error::AiProvider(message)),
            MockResponse::Hang => {
                std::future::pending::<()>().await;
                Ok(None)
            }
        }
    }
}
