pub mod chat_model;
pub mod embedder;

pub use chat_model::{ChatCompletionsClient, ChatMessage, ChatModel, ContentPart};
pub use embedder::EmbeddingClient;
