use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use diagramlens_core::{LensError, LensResult, ModelProvider, ModelRequest, ModelResponse};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Fail(String),
}

/// A mock provider that returns canned responses and remembers what it was asked.
pub struct MockProvider {
    name: String,
    fixed_response: Option<String>,
    schema_replies: HashMap<String, String>,
    queue: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_response: None,
            schema_replies: HashMap::new(),
            queue: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reply used once the queue is empty.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    /// Reply used for structured requests declaring this schema name.
    pub fn with_schema_reply(mut self, schema: impl Into<String>, reply: impl Into<String>) -> Self {
        self.schema_replies.insert(schema.into(), reply.into());
        self
    }

    /// Offline provider answering every request with a fixed sample
    /// diagram walkthrough.
    pub fn demo() -> Self {
        Self::new("mock")
            .with_response(DEMO_ANSWER)
            .with_schema_reply("diagram_explanation", DEMO_EXPLANATION)
            .with_schema_reply("diagram_quiz", DEMO_QUIZ)
    }

    /// Queue replies consumed in order, one per call.
    pub fn with_replies(self, replies: impl IntoIterator<Item = MockReply>) -> Self {
        if let Ok(mut queue) = self.queue.lock() {
            queue.extend(replies);
        }
        self
    }

    pub fn push_reply(&self, reply: MockReply) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(reply);
        }
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &ModelRequest) -> LensResult<ModelResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let next = self.queue.lock().ok().and_then(|mut q| q.pop_front());
        let text = match next {
            Some(MockReply::Text(text)) => text,
            Some(MockReply::Fail(message)) => {
                return Err(LensError::provider(self.name.clone(), message));
            }
            None => request
                .response_schema
                .as_ref()
                .and_then(|s| self.schema_replies.get(&s.name).cloned())
                .or_else(|| self.fixed_response.clone())
                .unwrap_or_else(|| "Mock response".to_string()),
        };
        Ok(ModelResponse {
            text,
            provider: self.name.clone(),
            model: "mock".to_string(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }
}

const DEMO_EXPLANATION: &str = r#"{
  "title": "Client-server request flow",
  "summary": "The diagram shows a **browser** sending a request through a load balancer to one of two application servers, which read from a shared database.",
  "components": [
    {"name": "Browser", "description": "Starts each request."},
    {"name": "Load balancer", "description": "Spreads requests across servers."},
    {"name": "App servers", "description": "Run the application logic."},
    {"name": "Database", "description": "Stores shared state."}
  ],
  "relationships": [
    "The browser sends an HTTP request to the load balancer.",
    "The load balancer forwards it to a healthy app server.",
    "The app server queries the database and responds."
  ],
  "key_takeaways": ["Servers are stateless", "The database is a single point of failure"]
}"#;

const DEMO_QUIZ: &str = r#"{
  "questions": [
    {
      "question": "Which component spreads requests across servers?",
      "options": ["Browser", "Load balancer", "Database", "App server"],
      "correct_index": 1,
      "explanation": "The load balancer forwards each request to a healthy app server."
    },
    {
      "question": "Where is shared state kept?",
      "options": ["In the browser", "On each app server", "In the database"],
      "correct_index": 2,
      "explanation": "App servers are stateless and read from the shared database."
    }
  ]
}"#;

const DEMO_ANSWER: &str = "The **load balancer** keeps working if one app server fails:\n\n* it stops routing to the failed server\n* the remaining server takes all traffic";

#[cfg(test)]
mod tests {
    use super::*;
    use diagramlens_core::Content;

    fn req() -> ModelRequest {
        ModelRequest {
            model: String::new(),
            system_instruction: String::new(),
            contents: vec![Content::user_text("hi")],
            response_schema: None,
            temperature: 0.0,
            max_output_tokens: 10,
        }
    }

    #[tokio::test]
    async fn queue_then_fallback() {
        let mock = MockProvider::new("mock")
            .with_response("fallback")
            .with_replies([MockReply::Text("first".into()), MockReply::Fail("down".into())]);

        assert_eq!(mock.generate(&req()).await.unwrap().text, "first");
        assert!(mock.generate(&req()).await.is_err());
        assert_eq!(mock.generate(&req()).await.unwrap().text, "fallback");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn schema_replies_match_by_name() {
        use diagramlens_core::{ResponseSchema, SchemaNode};

        let mock = MockProvider::demo();
        let mut structured = req();
        structured.response_schema =
            Some(ResponseSchema::new("diagram_quiz", SchemaNode::object()));
        let text = mock.generate(&structured).await.unwrap().text;
        assert!(text.contains("\"questions\""));

        let text = mock.generate(&req()).await.unwrap().text;
        assert!(text.contains("load balancer"));
    }
}
