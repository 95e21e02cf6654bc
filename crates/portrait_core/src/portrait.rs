//! Portrait generation
//!
//! The accumulated friend answers are folded into a single prompt and sent to
//! a text-generation service. The service sits behind [`TextGenerator`] so
//! the funnel can be exercised without network access.

use std::time::Duration;

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::FriendAnswerSet;
use crate::config::ModelConfig;

mod genai_client;
pub mod prompt;

pub use genai_client::GenAiGenerator;
pub use prompt::{ARCHETYPES, Archetype, SYSTEM_INSTRUCTION, build_prompt};

/// Everything the generation service receives for one portrait
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[derive(Error, Diagnostic, Debug)]
pub enum GenerationError {
    #[error("Generation timed out after {after:?}")]
    #[diagnostic(
        code(portrait_core::generation_timeout),
        help("Raise model.timeout_secs or check the provider's status page")
    )]
    Timeout { after: Duration },

    #[error("Model provider error")]
    #[diagnostic(
        code(portrait_core::model_provider_error),
        help("Check API credentials and rate limits for {model}")
    )]
    Provider {
        model: String,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Model returned no text")]
    #[diagnostic(
        code(portrait_core::empty_response),
        help("Model {model} answered without any text content")
    )]
    EmptyResponse { model: String },
}

/// The external text-generation boundary
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Turns answer sets into portrait text through a [`TextGenerator`]
#[derive(Debug, Clone)]
pub struct PortraitGenerator<G> {
    generator: G,
    temperature: f64,
    max_tokens: u32,
    timeout: Option<Duration>,
}

impl<G: TextGenerator> PortraitGenerator<G> {
    pub fn new(generator: G, config: &ModelConfig) -> Self {
        Self {
            generator,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn request_for(&self, count: u32, sets: &[FriendAnswerSet]) -> GenerationRequest {
        GenerationRequest {
            system: SYSTEM_INSTRUCTION.to_string(),
            prompt: build_prompt(count, sets),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Generate one portrait. No retries.
    pub async fn generate(
        &self,
        count: u32,
        sets: &[FriendAnswerSet],
    ) -> Result<String, GenerationError> {
        let request = self.request_for(count, sets);
        tracing::debug!(
            "Requesting portrait from {} answer sets ({} prompt chars)",
            sets.len(),
            request.prompt.chars().count()
        );

        let text = match self.timeout {
            Some(after) => tokio::time::timeout(after, self.generator.generate(&request))
                .await
                .map_err(|_| GenerationError::Timeout { after })??,
            None => self.generator.generate(&request).await?,
        };

        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UserId;

    fn config() -> ModelConfig {
        ModelConfig {
            timeout_secs: 0,
            ..ModelConfig::default()
        }
    }

    fn sets() -> Vec<FriendAnswerSet> {
        vec![FriendAnswerSet {
            id: surrealdb::RecordId::from_table_key("friend_answers", "a"),
            user_id: UserId::new(1),
            friend_id: UserId::new(2),
            answers: ["Свет", "Река", "Тепло", "Синий", "В танце"]
                .map(String::from)
                .to_vec(),
            created_at: chrono::Utc::now().into(),
        }]
    }

    #[tokio::test]
    async fn sends_system_and_prompt_with_sampling_settings() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .withf(|req| {
                req.system == SYSTEM_INSTRUCTION
                    && req.prompt.contains("Проанализируй 3 ответов")
                    && req.prompt.contains("1. Свет")
                    && req.temperature == 0.8
                    && req.max_tokens == 500
            })
            .times(1)
            .returning(|_| Ok("  Ты — свет.  \n".to_string()));

        let portraits = PortraitGenerator::new(mock, &config());
        assert_eq!(portraits.generate(3, &sets()).await.unwrap(), "Ты — свет.");
    }

    #[tokio::test]
    async fn provider_failure_is_returned_not_retried() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate().times(1).returning(|_| {
            Err(GenerationError::EmptyResponse {
                model: "gpt-4".to_string(),
            })
        });

        let portraits = PortraitGenerator::new(mock, &config());
        let err = portraits.generate(3, &sets()).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse { .. }));
    }

    struct Stalled;

    #[async_trait]
    impl TextGenerator for Stalled {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("too late".to_string())
        }
    }

    #[tokio::test]
    async fn stalled_provider_times_out() {
        let portraits =
            PortraitGenerator::new(Stalled, &config()).with_timeout(Duration::from_millis(20));
        let err = portraits.generate(5, &sets()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Timeout { .. }));
    }
}
