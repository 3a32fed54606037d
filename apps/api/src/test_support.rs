//! In-memory collaborators shared by unit tests.

use crate::error::{ApiError, Result};
use crate::ml::{ChatMessage, ChatModel};
use crate::models::{Candidate, DishMetadata};
use crate::services::SimilarityRetriever;
use async_trait::async_trait;
use std::sync::Mutex;

type Responder = Box<dyn Fn(&[ChatMessage]) -> Result<String> + Send + Sync>;

/// A chat model that answers from a closure and records every call.
pub struct ScriptedModel {
    responder: Responder,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    pub fn new(responder: impl Fn(&[ChatMessage]) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |_| Ok(reply.clone()))
    }

    pub fn failing() -> Self {
        Self::new(|_| Err(ApiError::ModelError("Rate limit exceeded".to_string())))
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of calls whose system message equals `system`.
    pub fn calls_with_system(&self, system: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|messages| messages.first().map(|m| m.text()).as_deref() == Some(system))
            .count()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.lock().unwrap().push(messages.to_vec());
        (self.responder)(messages)
    }
}

/// A retriever that serves a fixed, already-ranked list.
pub struct StaticRetriever {
    candidates: Vec<Candidate>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl StaticRetriever {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SimilarityRetriever for StaticRetriever {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Candidate>> {
        self.queries.lock().unwrap().push((query.to_string(), k));
        Ok(self.candidates.iter().take(k).cloned().collect())
    }
}

pub fn dish(name: &str, image_path: &str) -> Candidate {
    Candidate::new(
        format!("{}: a dish from the test menu", name),
        DishMetadata {
            image_path: Some(image_path.to_string()),
            menu_item_name: Some(name.to_string()),
            restaurant_name: Some("Test Kitchen".to_string()),
            ..Default::default()
        },
    )
}

/// The user message of a relevance or summary prompt.
pub fn user_text(messages: &[ChatMessage]) -> String {
    messages.get(1).map(|m| m.text()).unwrap_or_default()
}
