use crate::error::Result;
use crate::ml::ChatModel;
use crate::models::{Candidate, Recommendation};
use crate::services::prompts;
use std::sync::Arc;
use tracing::debug;

/// Writes the short "why this dish" blurb for each accepted candidate.
///
/// The model's reply is only trimmed; its length and shape are not checked.
#[derive(Clone)]
pub struct Summarizer {
    model: Arc<dyn ChatModel>,
}

impl Summarizer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub async fn summarize(&self, candidate: &Candidate, preference: &str) -> Result<String> {
        let reply = self
            .model
            .invoke(&prompts::dish_summary(&candidate.content, preference))
            .await?;
        Ok(reply.trim().to_string())
    }

    /// Summarize in order, one model call at a time.
    pub async fn summarize_all(
        &self,
        accepted: Vec<Candidate>,
        preference: &str,
    ) -> Result<Vec<Recommendation>> {
        let mut recommendations = Vec::with_capacity(accepted.len());
        for candidate in accepted {
            let summary = self.summarize(&candidate, preference).await?;
            debug!(
                "Summary for {:?}: {}",
                candidate.metadata.menu_item_name, summary
            );
            recommendations.push(Recommendation { summary, candidate });
        }
        Ok(recommendations)
    }
}
