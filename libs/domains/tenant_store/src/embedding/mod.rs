mod hashing;
mod openai;
mod provider;

pub use hashing::HashingProvider;
pub use openai::{OpenAIConfig, OpenAIProvider};
pub use provider::EmbeddingProvider;

#[cfg(test)]
pub use provider::MockEmbeddingProvider;
