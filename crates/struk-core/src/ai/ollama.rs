//! Ollama backend implementation
//!
//! HTTP client for the Ollama API. Receipt analysis goes to a vision model
//! (`/api/generate` with base64 `images`), categorization to the text model.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::extract::CATEGORY_VOCABULARY;
use crate::prompts::{PromptId, PromptLibrary, RenderedPrompt};

use super::parsing::{parse_categories, parse_extraction};
use super::types::{ExtractionResult, ItemCategory};
use super::AIBackend;

/// Default vision model when `OLLAMA_VISION_MODEL` is not set
pub const DEFAULT_VISION_MODEL: &str = "llava";

/// Ollama backend
///
/// # Configuration
///
/// - `OLLAMA_HOST`: server URL (required)
/// - `OLLAMA_MODEL`: text model used for categorization (default: llama3.2)
/// - `OLLAMA_VISION_MODEL`: model used for receipt images (default: llava)
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
    vision_model: String,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    /// Create a new instance with a different text model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    /// Create a new instance with a different vision model
    pub fn with_vision_model(&self, vision_model: &str) -> Self {
        Self {
            vision_model: vision_model.to_string(),
            ..self.clone()
        }
    }

    /// Use a specific prompt library (tests use `PromptLibrary::embedded_only`)
    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = Arc::new(RwLock::new(prompts));
        self
    }

    /// Create from environment variables
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        let backend = Self::new(&host, &model);
        Some(match std::env::var("OLLAMA_VISION_MODEL") {
            Ok(vision) => backend.with_vision_model(&vision),
            Err(_) => backend,
        })
    }

    /// Vision model used for image analysis
    pub fn vision_model(&self) -> &str {
        &self.vision_model
    }

    fn render(&self, id: PromptId, vars: &HashMap<&str, &str>) -> Result<RenderedPrompt> {
        let mut prompts = self
            .prompts
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
        prompts.render(id, vars)
    }

    async fn generate<T: Serialize + ?Sized>(&self, request: &T) -> Result<String> {
        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        let ollama_response: OllamaResponse = response.json().await?;
        Ok(ollama_response.response)
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    prompt: String,
    stream: bool,
}

/// Request to Ollama API with images (for vision models)
#[derive(Debug, Serialize)]
struct OllamaVisionRequest {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    prompt: String,
    images: Vec<String>,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl AIBackend for OllamaBackend {
    async fn analyze_image(&self, image_data: &[u8], _mime_type: &str) -> Result<ExtractionResult> {
        let prompt = self.render(PromptId::AnalyzeImage, &HashMap::new())?;

        let request = OllamaVisionRequest {
            model: self.vision_model.clone(),
            system: prompt.system,
            prompt: prompt.user,
            images: vec![base64::engine::general_purpose::STANDARD.encode(image_data)],
            stream: false,
        };

        let raw = self.generate(&request).await?;
        debug!("Ollama image analysis response: {}", raw);

        parse_extraction(&raw)
    }

    async fn categorize_items(&self, items: &[String]) -> Result<Vec<ItemCategory>> {
        let items_json = serde_json::to_string(items)?;
        let categories = CATEGORY_VOCABULARY.join(", ");
        let vars = HashMap::from([
            ("items", items_json.as_str()),
            ("categories", categories.as_str()),
        ]);
        let prompt = self.render(PromptId::CategorizeItems, &vars)?;

        let request = OllamaRequest {
            model: self.model.clone(),
            system: prompt.system,
            prompt: prompt.user,
            stream: false,
        };

        let raw = self.generate(&request).await?;
        debug!("Ollama categorize response: {}", raw);

        parse_categories(&raw)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slash() {
        let backend = OllamaBackend::new("http://localhost:11434/", "llama3.2");
        assert_eq!(backend.host(), "http://localhost:11434");
        assert_eq!(backend.model(), "llama3.2");
        assert_eq!(backend.vision_model(), DEFAULT_VISION_MODEL);
    }

    #[test]
    fn test_with_models() {
        let backend = OllamaBackend::new("http://localhost:11434", "llama3.2")
            .with_vision_model("llama3.2-vision");
        let other = backend.with_model("gemma3");
        assert_eq!(other.model(), "gemma3");
        assert_eq!(other.vision_model(), "llama3.2-vision");
    }

    #[test]
    fn test_categorize_request_carries_system_and_categories() {
        let backend = OllamaBackend::new("http://localhost:11434", "llama3.2")
            .with_prompts(PromptLibrary::embedded_only());
        let categories = CATEGORY_VOCABULARY.join(", ");
        let vars = HashMap::from([("items", "[\"Roti\"]"), ("categories", categories.as_str())]);
        let prompt = backend.render(PromptId::CategorizeItems, &vars).unwrap();

        let json = serde_json::to_value(OllamaRequest {
            model: backend.model.clone(),
            system: prompt.system,
            prompt: prompt.user,
            stream: false,
        })
        .unwrap();
        assert!(json["system"].as_str().unwrap().contains("spending categories"));
        assert!(json["prompt"].as_str().unwrap().contains("Household"));
    }

    #[test]
    fn test_request_omits_missing_system() {
        let json = serde_json::to_value(OllamaRequest {
            model: "llama3.2".into(),
            system: None,
            prompt: "hi".into(),
            stream: false,
        })
        .unwrap();
        assert!(json.get("system").is_none());
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        // Port 9 (discard) is not an Ollama server
        let backend = OllamaBackend::new("http://127.0.0.1:9", "llama3.2");
        assert!(!backend.health_check().await);
    }
}
