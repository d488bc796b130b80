//! Conversational help about the scoring rules.
//!
//! Answers come from a language model primed with the rules restatement, or,
//! when no model is configured or it fails, from a keyword lookup over the
//! same text. Nothing here takes part in scoring.

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

pub mod error;
pub mod ollama_client;
pub mod prompts;
pub mod rules;

pub use error::{AssistantError, Result};
pub use ollama_client::OllamaClient;

use prompts::PromptBuilder;

const FALLBACK_SECTIONS: usize = 2;

/// Something that can complete a prompt
#[async_trait]
pub trait AnswerBackend: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Model,
    RulesLookup,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Answer {
    pub answer: String,
    pub source: AnswerSource,
}

pub struct RulesAssistant {
    backend: Option<Box<dyn AnswerBackend>>,
}

impl RulesAssistant {
    pub fn new(backend: Box<dyn AnswerBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Lookup-only assistant
    pub fn offline() -> Self {
        Self { backend: None }
    }

    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::EmptyQuestion);
        }

        if let Some(backend) = &self.backend {
            match backend
                .complete(&PromptBuilder::system_prompt(), &PromptBuilder::user_prompt(question))
                .await
            {
                Ok(text) if !text.trim().is_empty() => {
                    return Ok(Answer {
                        answer: text.trim().to_string(),
                        source: AnswerSource::Model,
                    });
                }
                Ok(_) => tracing::warn!("Assistant model returned an empty answer"),
                Err(e) => tracing::warn!("Assistant model unavailable, using rules lookup: {}", e),
            }
        }

        Ok(lookup_answer(question))
    }
}

fn lookup_answer(question: &str) -> Answer {
    let sections = rules::lookup(question);

    let answer = if sections.is_empty() {
        "I could not match your question to a scoring rule. The rules cover height, \
         service position, dive, climb rate, capture, time bonus, retrieval bonus, \
         penalties, disqualification and ranking."
            .to_string()
    } else {
        sections
            .iter()
            .take(FALLBACK_SECTIONS)
            .map(|section| format!("{}: {}", section.title, section.body))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    Answer {
        answer,
        source: AnswerSource::RulesLookup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedBackend(Result<String>);

    #[async_trait]
    impl AnswerBackend for CannedBackend {
        async fn complete(&self, system_prompt: &str, _user_prompt: &str) -> Result<String> {
            assert!(system_prompt.contains("Time bonus"));
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(AssistantError::ModelError(e.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_model_answer_is_used() {
        let backend = CannedBackend(Ok(" Six points. ".to_string()));
        let assistant = RulesAssistant::new(Box::new(backend));
        let answer = assistant.answer("What is the time bonus for 6 minutes?").await.unwrap();
        assert_eq!(answer.answer, "Six points.");
        assert_eq!(answer.source, AnswerSource::Model);
    }

    #[tokio::test]
    async fn test_falls_back_to_lookup_on_failure() {
        let assistant = RulesAssistant::new(Box::new(CannedBackend(Err(
            AssistantError::ModelError("connection refused".to_string()),
        ))));
        let answer = assistant.answer("How is the dive speed scored?").await.unwrap();
        assert_eq!(answer.source, AnswerSource::RulesLookup);
        assert!(answer.answer.starts_with("Dive:"));
    }

    #[tokio::test]
    async fn test_falls_back_on_empty_model_answer() {
        let assistant = RulesAssistant::new(Box::new(CannedBackend(Ok("   ".to_string()))));
        let answer = assistant.answer("capture points?").await.unwrap();
        assert_eq!(answer.source, AnswerSource::RulesLookup);
    }

    #[tokio::test]
    async fn test_offline_unmatched_question() {
        let answer = RulesAssistant::offline().answer("Who won in 1998?").await.unwrap();
        assert_eq!(answer.source, AnswerSource::RulesLookup);
        assert!(answer.answer.contains("could not match"));
    }

    #[tokio::test]
    async fn test_empty_question_is_rejected() {
        let result = RulesAssistant::offline().answer("   ").await;
        assert!(matches!(result, Err(AssistantError::EmptyQuestion)));
    }
}
