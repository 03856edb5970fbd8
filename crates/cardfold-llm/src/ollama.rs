//! Ollama chat provider.

use async_trait::async_trait;

use cardfold_core::error::{CardfoldError, CardfoldResult};
use cardfold_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse};
use cardfold_core::types::{Message, MessageRole};

#[cfg(feature = "ollama")]
use ollama_rs::{
    generation::chat::{request::ChatMessageRequest, ChatMessage},
    generation::options::GenerationOptions as OllamaOptions,
    Ollama,
};

const DEFAULT_MODEL: &str = "llama3.1:8b";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama LLM provider.
pub struct OllamaLlm {
    #[cfg(feature = "ollama")]
    client: Ollama,
    config: LlmConfig,
}

impl OllamaLlm {
    /// Create a new Ollama LLM provider.
    pub fn new(mut config: LlmConfig) -> CardfoldResult<Self> {
        let url = url::Url::parse(config.base_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL))
            .map_err(|e| CardfoldError::Configuration(format!("Invalid Ollama URL: {}", e)))?;
        let host = format!("{}://{}", url.scheme(), url.host_str().unwrap_or("localhost"));
        let port = url.port().unwrap_or(11434);

        #[cfg(feature = "ollama")]
        let client = Ollama::new(host, port);
        #[cfg(not(feature = "ollama"))]
        let _ = (host, port);

        if config.model.is_empty() {
            config.model = DEFAULT_MODEL.to_string();
        }

        Ok(Self {
            #[cfg(feature = "ollama")]
            client,
            config,
        })
    }

    #[cfg(feature = "ollama")]
    fn message_to_ollama(msg: &Message) -> ChatMessage {
        match msg.role {
            MessageRole::System => ChatMessage::system(msg.content.clone()),
            MessageRole::User => ChatMessage::user(msg.content.clone()),
            MessageRole::Assistant => ChatMessage::assistant(msg.content.clone()),
        }
    }
}

#[async_trait]
impl Llm for OllamaLlm {
    #[cfg(feature = "ollama")]
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> CardfoldResult<LlmResponse> {
        let options = options.unwrap_or_default();
        let sampling = OllamaOptions::default()
            .temperature(options.temperature.unwrap_or(self.config.temperature))
            .num_predict(options.max_tokens.unwrap_or(self.config.max_tokens) as i32);

        let request = ChatMessageRequest::new(
            self.config.model.clone(),
            messages.iter().map(Self::message_to_ollama).collect(),
        )
        .options(sampling);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| CardfoldError::llm(format!("Ollama API error: {}", e)))?;

        Ok(LlmResponse {
            content: response.message.map(|m| m.content),
            usage: None,
        })
    }

    #[cfg(not(feature = "ollama"))]
    async fn generate(
        &self,
        _messages: &[Message],
        _options: Option<GenerationOptions>,
    ) -> CardfoldResult<LlmResponse> {
        Err(CardfoldError::Configuration(
            "Ollama feature not enabled. Enable the 'ollama' feature.".to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_configuration_error() {
        let result = OllamaLlm::new(LlmConfig {
            base_url: Some("not a url".to_string()),
            ..Default::default()
        });
        assert!(matches!(result, Err(CardfoldError::Configuration(_))));
    }

    #[test]
    fn test_keeps_configured_model() {
        let llm = OllamaLlm::new(LlmConfig {
            model: "mistral".to_string(),
            base_url: Some("http://gpu-box:11500".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(llm.model_name(), "mistral");
    }
}
