use async_trait::async_trait;

use crate::enrichment::error::Result;

/// A hosted (or scripted) text-generation model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Sends one prompt and returns the model's reply text.
    async fn generate(&self, prompt: &str) -> Result<String>;

    fn model_name(&self) -> &str;
}
