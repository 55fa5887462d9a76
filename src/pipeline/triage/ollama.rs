use serde::{Deserialize, Serialize};

use super::types::{EmbeddingModel, LlmClient};
use super::TriageError;

/// Ollama HTTP client for local inference, serving both generation and
/// embeddings.
pub struct OllamaClient {
    base_url: String,
    generation_model: String,
    embedding_model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(
        base_url: &str,
        generation_model: &str,
        embedding_model: &str,
        timeout_secs: u64,
    ) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            generation_model: generation_model.to_string(),
            embedding_model: embedding_model.to_string(),
            client,
            timeout_secs,
        }
    }

    /// Client against the configured local Ollama instance with a 5-minute
    /// timeout.
    pub fn default_local() -> Self {
        Self::new(
            &crate::config::ollama_base_url(),
            &crate::config::generation_model(),
            &crate::config::embedding_model(),
            300,
        )
    }

    fn map_send_error(&self, e: reqwest::Error) -> TriageError {
        if e.is_connect() {
            TriageError::OllamaConnection(self.base_url.clone())
        } else if e.is_timeout() {
            TriageError::HttpClient(format!("Request timed out after {}s", self.timeout_secs))
        } else {
            TriageError::HttpClient(e.to_string())
        }
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// Request body for Ollama /api/embeddings
#[derive(Serialize)]
struct OllamaEmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response body from Ollama /api/embeddings
#[derive(Deserialize)]
struct OllamaEmbeddingsResponse {
    embedding: Vec<f32>,
}

impl LlmClient for OllamaClient {
    fn complete(
        &self,
        system: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, TriageError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.generation_model,
            prompt,
            system,
            stream: false,
            options: OllamaOptions { temperature },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TriageError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| TriageError::JsonParsing(e.to_string()))?;

        Ok(parsed.response)
    }
}

impl EmbeddingModel for OllamaClient {
    fn embed(&self, text: &str) -> Result<Vec<f32>, TriageError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let body = OllamaEmbeddingsRequest {
            model: &self.embedding_model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TriageError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaEmbeddingsResponse = response
            .json()
            .map_err(|e| TriageError::EmbeddingFailed(e.to_string()))?;

        Ok(parsed.embedding)
    }
}

/// Mock LLM client for testing — returns a configurable response.
pub struct MockLlmClient {
    response: String,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

impl LlmClient for MockLlmClient {
    fn complete(
        &self,
        _system: &str,
        _prompt: &str,
        _temperature: f32,
    ) -> Result<String, TriageError> {
        Ok(self.response.clone())
    }
}
