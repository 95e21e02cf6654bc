use async_trait::async_trait;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest, MessageContent};

use super::{GenerationError, GenerationRequest, TextGenerator};

/// [`TextGenerator`] backed by the genai multi-provider client
///
/// Credentials come from the environment (`OPENAI_API_KEY`,
/// `ANTHROPIC_API_KEY`, ...), resolved by genai from the model name.
#[derive(Debug, Clone)]
pub struct GenAiGenerator {
    client: genai::Client,
    model: String,
}

impl GenAiGenerator {
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_client(genai::Client::default(), model)
    }

    pub fn with_client(client: genai::Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for GenAiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let chat_request = ChatRequest::new(vec![
            ChatMessage::system(request.system.clone()),
            ChatMessage::user(request.prompt.clone()),
        ]);
        let options = ChatOptions::default()
            .with_temperature(request.temperature)
            .with_max_tokens(request.max_tokens);

        let response = self
            .client
            .exec_chat(&self.model, chat_request, Some(&options))
            .await
            .map_err(|e| GenerationError::Provider {
                model: self.model.clone(),
                cause: Box::new(e),
            })?;
        tracing::debug!("GenAI usage for {}: {:?}", self.model, response.usage);

        let text: String = response
            .content
            .into_iter()
            .filter_map(|content| match content {
                MessageContent::Text(text) => Some(text),
                _ => None,
            })
            .collect();

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse {
                model: self.model.clone(),
            });
        }
        Ok(text)
    }
}
