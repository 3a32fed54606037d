use crate::error::{ApiError, Result};
use crate::ml::ChatModel;
use crate::models::Candidate;
use crate::services::prompts;
use futures::{stream, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, info};

/// Accepted candidates plus how many candidates were judged to get them.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub accepted: Vec<Candidate>,
    pub examined: usize,
}

/// A model answer counts as "yes" only if, once trimmed and lowercased, it
/// starts with `y`. Anything else, including malformed output, is a no.
pub fn parse_relevance(answer: &str) -> bool {
    answer.trim().to_lowercase().starts_with('y')
}

/// Yes/no relevance gate in front of the summarizer.
#[derive(Clone)]
pub struct RelevanceFilter {
    model: Arc<dyn ChatModel>,
}

impl RelevanceFilter {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub async fn is_relevant(&self, candidate: &Candidate, preference: &str) -> Result<bool> {
        let answer = self
            .model
            .invoke(&prompts::relevance(&candidate.content, preference))
            .await?;
        let relevant = parse_relevance(&answer);

        debug!(
            "Relevance for {:?}: {:?} -> {}",
            candidate.metadata.menu_item_name,
            answer.trim(),
            relevant
        );
        Ok(relevant)
    }

    /// Judge candidates one at a time in retrieval order, keeping the
    /// accepted ones, and stop as soon as `cap` have been accepted.
    /// Candidates after that point are never sent to the model.
    pub async fn filter(
        &self,
        candidates: Vec<Candidate>,
        preference: &str,
        cap: usize,
    ) -> Result<FilterOutcome> {
        let total = candidates.len();
        let mut examined = 0usize;

        let accepted: Vec<Candidate> = stream::iter(candidates.into_iter().map(Ok::<_, ApiError>))
            .try_filter_map(|candidate| {
                examined += 1;
                async move {
                    let relevant = self.is_relevant(&candidate, preference).await?;
                    Ok(relevant.then_some(candidate))
                }
            })
            .take(cap)
            .try_collect()
            .await?;

        info!(
            "Relevance filter accepted {} of {} examined ({} retrieved, cap {})",
            accepted.len(),
            examined,
            total,
            cap
        );

        Ok(FilterOutcome { accepted, examined })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::prompts::RELEVANCE_SYSTEM;
    use crate::test_support::{dish, user_text, ScriptedModel};

    #[test]
    fn test_parse_relevance() {
        assert!(parse_relevance("Yes"));
        assert!(parse_relevance("  yes.\n"));
        assert!(parse_relevance("YES, it matches"));
        assert!(parse_relevance("y"));

        assert!(!parse_relevance("No"));
        assert!(!parse_relevance(""));
        assert!(!parse_relevance("Maybe"));
        assert!(!parse_relevance("I think yes"));
        assert!(!parse_relevance("\"Yes\""));
    }

    #[tokio::test]
    async fn test_stops_at_cap() {
        let model = Arc::new(ScriptedModel::always("Yes"));
        let filter = RelevanceFilter::new(model.clone());
        let candidates = (1..=5)
            .map(|i| dish(&format!("Noodles {}", i), &format!("images/R00{}.png", i)))
            .collect();

        let outcome = filter.filter(candidates, "spicy noodles", 3).await.unwrap();

        assert_eq!(outcome.accepted.len(), 3);
        assert_eq!(outcome.examined, 3);
        assert_eq!(model.calls_with_system(RELEVANCE_SYSTEM), 3);
    }

    #[tokio::test]
    async fn test_keeps_retrieval_order() {
        let model = Arc::new(ScriptedModel::new(|messages| {
            let prompt = user_text(messages);
            Ok(if prompt.contains("Keep") { "yes" } else { "no" }.to_string())
        }));
        let filter = RelevanceFilter::new(model.clone());
        let candidates = vec![
            dish("Keep A", "a.png"),
            dish("Drop B", "b.png"),
            dish("Keep C", "c.png"),
            dish("Drop D", "d.png"),
            dish("Keep E", "e.png"),
        ];

        let outcome = filter.filter(candidates, "anything", 3).await.unwrap();

        let names: Vec<_> = outcome
            .accepted
            .iter()
            .map(|c| c.metadata.menu_item_name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["Keep A", "Keep C", "Keep E"]);
        assert_eq!(outcome.examined, 5);
    }

    #[tokio::test]
    async fn test_ambiguous_answers_reject() {
        let model = Arc::new(ScriptedModel::always("It depends on your taste"));
        let filter = RelevanceFilter::new(model.clone());

        let outcome = filter
            .filter(vec![dish("Tiramisu", "t.png")], "vegan dessert", 3)
            .await
            .unwrap();

        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.examined, 1);
    }

    #[tokio::test]
    async fn test_prompt_uses_content_and_preference() {
        let model = Arc::new(ScriptedModel::always("No"));
        let filter = RelevanceFilter::new(model.clone());

        filter
            .filter(vec![dish("Pad Thai", "p.png")], "peanut-free", 3)
            .await
            .unwrap();

        let prompt = user_text(&model.calls()[0]);
        assert!(prompt.contains("Pad Thai: a dish from the test menu"));
        assert!(prompt.contains("User preference:\npeanut-free"));
    }

    #[tokio::test]
    async fn test_model_error_stops_filtering() {
        let model = Arc::new(ScriptedModel::failing());
        let filter = RelevanceFilter::new(model.clone());

        let result = filter
            .filter(vec![dish("A", "a.png"), dish("B", "b.png")], "x", 3)
            .await;

        assert!(result.is_err());
        assert_eq!(model.call_count(), 1);
    }
}
