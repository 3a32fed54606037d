use crate::error::Result;
use crate::ml::ChatModel;
use crate::services::prompts;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// What the menu assistant made of a user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantReply {
    /// The model returned the requested JSON object.
    Structured { recommend: bool, response: String },
    /// The model output did not decode; `text` is the output as received.
    Unstructured { text: String },
}

impl AssistantReply {
    /// Whether a direct recommendation was made. Unstructured replies never
    /// count as one.
    pub fn recommends(&self) -> bool {
        matches!(self, AssistantReply::Structured { recommend: true, .. })
    }

    pub fn response(&self) -> &str {
        match self {
            AssistantReply::Structured { response, .. } => response,
            AssistantReply::Unstructured { text } => text,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, AssistantReply::Structured { .. })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum YesNo {
    Text(String),
    Flag(bool),
}

#[derive(Deserialize)]
struct Decision {
    recommendation: YesNo,
    response: String,
}

/// Decode the model output as `{"recommendation": "yes"|"no", "response": ...}`,
/// falling back to [`AssistantReply::Unstructured`] with the text untouched.
pub fn parse_reply(raw: &str) -> AssistantReply {
    match serde_json::from_str::<Decision>(raw) {
        Ok(decision) => {
            let recommend = match decision.recommendation {
                YesNo::Text(text) => text.trim().eq_ignore_ascii_case("yes"),
                YesNo::Flag(flag) => flag,
            };
            AssistantReply::Structured {
                recommend,
                response: decision.response,
            }
        }
        Err(e) => {
            warn!("Assistant output was not valid JSON ({}); using raw text", e);
            AssistantReply::Unstructured {
                text: raw.to_string(),
            }
        }
    }
}

/// Answers free-form questions against a menu: one-sentence recommendation
/// or one clarifying question.
#[derive(Clone)]
pub struct MenuAssistant {
    model: Arc<dyn ChatModel>,
}

impl MenuAssistant {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub async fn respond(&self, menu_context: &str, user_input: &str) -> Result<AssistantReply> {
        let raw = self
            .model
            .invoke(&prompts::assistant(menu_context, user_input))
            .await?;
        let reply = parse_reply(raw.trim());
        debug!("Assistant reply: {:?}", reply);
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedModel;

    #[test]
    fn test_structured_reply() {
        let reply = parse_reply(r#"{"recommendation": "yes", "response": "Try the tonkotsu ramen."}"#);
        assert_eq!(
            reply,
            AssistantReply::Structured {
                recommend: true,
                response: "Try the tonkotsu ramen.".into()
            }
        );
        assert!(reply.recommends());
    }

    #[test]
    fn test_structured_no() {
        let reply = parse_reply(r#"{"recommendation": "No", "response": "Do you eat meat?"}"#);
        assert!(reply.is_structured());
        assert!(!reply.recommends());
        assert_eq!(reply.response(), "Do you eat meat?");
    }

    #[test]
    fn test_boolean_flag_is_accepted() {
        let reply = parse_reply(r#"{"recommendation": true, "response": "Gyoza."}"#);
        assert!(reply.recommends());
    }

    #[test]
    fn test_invalid_json_falls_back_verbatim() {
        let raw = "Sure! {\"recommendation\": \"yes\", \"response\": \"Ramen\"";
        let reply = parse_reply(raw);

        assert_eq!(reply, AssistantReply::Unstructured { text: raw.into() });
        assert!(!reply.recommends());
        assert_eq!(reply.response(), raw);
    }

    #[test]
    fn test_wrong_shape_falls_back() {
        let reply = parse_reply(r#"{"answer": "ramen"}"#);
        assert!(!reply.is_structured());
        assert_eq!(reply.response(), r#"{"answer": "ramen"}"#);
    }

    #[tokio::test]
    async fn test_respond_uses_model_output() {
        let model = Arc::new(ScriptedModel::always(
            "  I'd suggest the miso ramen; it is warm and hearty.  ",
        ));
        let assistant = MenuAssistant::new(model.clone());

        let reply = assistant
            .respond("Menu: miso ramen, gyoza", "something warm")
            .await
            .unwrap();

        assert_eq!(
            reply,
            AssistantReply::Unstructured {
                text: "I'd suggest the miso ramen; it is warm and hearty.".into()
            }
        );
        assert_eq!(model.call_count(), 1);
    }
}
