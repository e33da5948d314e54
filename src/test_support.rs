// Shared fixtures for unit tests: a fake embedding service and a recording
// progress reporter.

use std::sync::Mutex;

use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use crate::config::Config;
use crate::documents::DocumentOutcome;
use crate::progress::ProgressReporter;

pub(crate) const TEST_API_KEY: &str = "sk-test-key";

/// Terms that span the fake embedding space, one dimension each
pub(crate) const VOCABULARY: [&str; 4] = ["rust", "python", "cooking", "music"];

/// Count of each vocabulary term in `text`; texts sharing terms point the same way
pub(crate) fn keyword_embedding(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    VOCABULARY
        .iter()
        .map(|term| lower.matches(term).count() as f32)
        .collect()
}

/// Answers embedding requests with [`keyword_embedding`] of every input, in order
pub(crate) struct KeywordEmbeddings;

impl Respond for KeywordEmbeddings {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).expect("request body is JSON");
        let data: Vec<Value> = body["input"]
            .as_array()
            .expect("input is an array")
            .iter()
            .map(|text| json!({ "embedding": keyword_embedding(text.as_str().unwrap_or_default()) }))
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({ "object": "list", "data": data }))
    }
}

pub(crate) async fn mount_keyword_embeddings(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("authorization", format!("Bearer {TEST_API_KEY}").as_str()))
        .respond_with(KeywordEmbeddings)
        .mount(server)
        .await;
}

pub(crate) fn completion_body(answer: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": answer },
            "finish_reason": "stop"
        }]
    })
}

/// Config pointing every service endpoint at a mock server
pub(crate) fn test_config(server: &MockServer, base_dir: &std::path::Path) -> Config {
    let mut config = Config {
        base_dir: base_dir.to_path_buf(),
        ..Config::default()
    };
    config.service.base_url = format!("{}/v1/", server.uri());
    config.service.timeout_seconds = 5;
    config
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ProgressEvent {
    DocumentStarted(String, usize, usize),
    DocumentFinished(String, DocumentOutcome),
    Embedding(usize, usize),
    Finished,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub(crate) fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().expect("progress lock").clone()
    }

    pub(crate) fn embedding_offsets(&self) -> Vec<(usize, usize)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ProgressEvent::Embedding(done, total) => Some((done, total)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ProgressEvent) {
        self.events.lock().expect("progress lock").push(event);
    }
}

impl ProgressReporter for RecordingProgress {
    fn document_started(&self, name: &str, index: usize, total: usize) {
        self.push(ProgressEvent::DocumentStarted(name.to_string(), index, total));
    }

    fn document_finished(&self, name: &str, outcome: &DocumentOutcome) {
        self.push(ProgressEvent::DocumentFinished(
            name.to_string(),
            outcome.clone(),
        ));
    }

    fn embedding_progress(&self, done: usize, total: usize) {
        self.push(ProgressEvent::Embedding(done, total));
    }

    fn finished(&self) {
        self.push(ProgressEvent::Finished);
    }
}
