use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{AssistantError, Result};
use crate::AnswerBackend;

#[derive(Debug, Clone, Serialize)]
pub struct OllamaGenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OllamaOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct OllamaGenerateResponse {
    pub model: String,
    pub response: String,
    pub done: bool,
    #[serde(default)]
    pub total_duration: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct OllamaModel {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct OllamaModelsResponse {
    pub models: Vec<OllamaModel>,
}

/// Client for the Ollama generate API
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    default_options: OllamaOptions,
}

impl OllamaClient {
    /// Create a new Ollama client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of Ollama API (e.g., "http://localhost:11434")
    /// * `model` - Model name (e.g., "qwen2.5:7b")
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        // Factual answers over a short rule text
        let default_options = OllamaOptions {
            temperature: Some(0.2),
            top_p: Some(0.9),
            num_predict: Some(512),
        };

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            default_options,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a plain text completion
    pub async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let request = OllamaGenerateRequest {
            model: self.model.clone(),
            prompt: user_prompt.to_string(),
            system: Some(system_prompt.to_string()),
            stream: false,
            options: Some(self.default_options.clone()),
        };

        tracing::debug!(
            "Sending request to Ollama (model: {}, prompt length: {} chars)",
            self.model,
            user_prompt.len()
        );

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AssistantError::ModelError(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let ollama_response: OllamaGenerateResponse = response.json().await?;

        if let Some(total) = ollama_response.total_duration {
            tracing::info!(
                "Ollama answer generated in {:.2}s ({} chars)",
                total as f64 / 1_000_000_000.0,
                ollama_response.response.len()
            );
        }

        Ok(ollama_response.response)
    }

    /// List available models
    pub async fn list_models(&self) -> Result<Vec<OllamaModel>> {
        let models_response: OllamaModelsResponse = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await?
            .json()
            .await?;

        Ok(models_response.models)
    }

    /// Check if Ollama service is available
    pub async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}

#[async_trait]
impl AnswerBackend for OllamaClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.generate(system_prompt, user_prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OllamaClient {
        OllamaClient::new("http://localhost:11434/", "qwen2.5:7b").unwrap()
    }

    #[test]
    fn test_base_url_is_normalised() {
        assert_eq!(client().base_url, "http://localhost:11434");
    }

    #[test]
    fn test_request_skips_empty_fields() {
        let request = OllamaGenerateRequest {
            model: "m".to_string(),
            prompt: "p".to_string(),
            system: None,
            stream: false,
            options: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
        assert!(json.get("options").is_none());
        assert_eq!(json["stream"], false);
    }

    #[tokio::test]
    async fn test_health_check_errors_when_unreachable() {
        let unreachable = OllamaClient::new("http://127.0.0.1:9", "qwen2.5:7b").unwrap();
        assert!(unreachable.health_check().await.is_err());
    }

    #[tokio::test]
    #[ignore] // Only run when Ollama is running
    async fn test_ollama_health_check() {
        let result = client().health_check().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    #[ignore] // Only run when Ollama is running
    async fn test_list_models() {
        let models = client().list_models().await.unwrap();
        assert!(!models.is_empty());
    }
}
