//! Prompt templates for every model call the pipeline makes.

use crate::ml::{ChatMessage, ContentPart};

pub const IMAGE_DESCRIPTION_SYSTEM: &str = "You are an AI assistant specializing in analyzing \
and describing food images. Return a concise, keyword-heavy description for similarity search.";

pub const QUERY_EXPANSION_SYSTEM: &str =
    "You are an expert culinary assistant. Output search keywords only.";

pub const RELEVANCE_SYSTEM: &str = "You decide if the dish matches the user's preference.";

pub const SUMMARY_SYSTEM: &str = "You summarize dishes in a savoury way for the user.";

pub const ASSISTANT_SYSTEM: &str = "You are a restaurant assistant. Output valid JSON only.";

pub fn image_description(image_data_url: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(IMAGE_DESCRIPTION_SYSTEM),
        ChatMessage::user(vec![
            ContentPart::text(
                "Describe ONLY the food. Do not mention plates, utensils, background, or decorations.\n\
                 Keep it short and keyword-heavy for similarity search.\n\
                 Identify the dish if possible; if unsure, describe appearance.\n\
                 Mention cuisine and key ingredients.",
            ),
            ContentPart::image_url(image_data_url),
        ]),
    ]
}

pub fn query_expansion(user_input: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(QUERY_EXPANSION_SYSTEM),
        ChatMessage::user_text(format!(
            "User input:\n{}\n\n\
             Return ONLY key unique search terms (comma-separated). No filler words.\n\
             Include:\n\
             - similar dishes\n\
             - cuisines\n\
             - key ingredients\n\
             - dietary preferences (veg/non-veg/vegan etc.)\n\
             - nutrition constraints if present\n\
             - exclude allergens if mentioned",
            user_input
        )),
    ]
}

pub fn relevance(dish_context: &str, preference: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(RELEVANCE_SYSTEM),
        ChatMessage::user_text(format!(
            "Answer with exactly one word: Yes or No.\n\n\
             Dish context:\n{}\n\n\
             User preference:\n{}",
            dish_context, preference
        )),
    ]
}

pub fn dish_summary(dish_description: &str, preference: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SUMMARY_SYSTEM),
        ChatMessage::user_text(format!(
            "Write a VERY short 2-line summary explaining why the dish matches the user.\n\
             Include dish name, cuisine/origin, key ingredients, and preference match.\n\
             No extra commentary.\n\n\
             Dish description:\n{}\n\n\
             User preference:\n{}",
            dish_description, preference
        )),
    ]
}

pub fn assistant(menu_context: &str, user_input: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(ASSISTANT_SYSTEM),
        ChatMessage::user_text(format!(
            "You have a menu context. If the user wants recommendations, respond with one sentence.\n\
             If preferences are missing, ask ONE follow-up question.\n\
             If you cannot answer from context, set recommendation=\"no\".\n\n\
             User input:\n{}\n\n\
             Menu context:\n{}\n\n\
             Return ONLY valid JSON in this schema:\n\
             {{\n  \"recommendation\": \"yes\" or \"no\",\n  \"response\": \"string\"\n}}",
            user_input, menu_context
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relevance_prompt_carries_both_inputs() {
        let messages = relevance("Tofu stir fry with chili", "spicy vegan");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text(), RELEVANCE_SYSTEM);

        let user = messages[1].text();
        assert!(user.starts_with("Answer with exactly one word: Yes or No."));
        assert!(user.contains("Dish context:\nTofu stir fry with chili"));
        assert!(user.contains("User preference:\nspicy vegan"));
    }

    #[test]
    fn test_image_prompt_embeds_image() {
        let messages = image_description("data:image/jpeg;base64,AAAA");
        assert!(messages[1].has_image());
        assert!(messages[1].text().contains("Describe ONLY the food."));
    }

    #[test]
    fn test_assistant_prompt_shows_schema() {
        let user = assistant("Menu: ramen, gyoza", "something warm").remove(1).text();
        assert!(user.contains("\"recommendation\": \"yes\" or \"no\""));
        assert!(user.contains("Menu context:\nMenu: ramen, gyoza"));
    }
}
