use async_trait::async_trait;
use log::{debug, trace};

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::request::{CompletionOptions, CompletionRequest, Message};
use super::wire::{ChatMessage, ChatRequest, ChatResponse};

/// OpenRouter chat completions client.
/// JSON mode is prompt-driven: the API has no portable switch for it
/// across the models it routes to.
pub struct OpenRouterClient
{   config: ProviderConfig
  , http_client: reqwest::Client
}

impl OpenRouterClient
{   pub fn new(config: ProviderConfig) -> Result<Self>
    {   Ok(Self::with_http(config, super::http_client()?))
    }

    pub fn with_http(
      config: ProviderConfig
    , http_client: reqwest::Client
    ) -> Self
    {   debug!("Creating OpenRouterClient");
        OpenRouterClient { config, http_client }
    }

    pub fn endpoint(&self) -> String
    {   format!(
          "{}/chat/completions"
        , self.config.api_base.trim_end_matches('/')
        )
    }

    pub fn build_request(
      &self
    , messages: &[Message]
    , options: &CompletionOptions
    ) -> ChatRequest
    {   let shaped = if options.json_mode
        {   super::with_json_instruction(messages)
        } else
        {   messages.to_vec()
        };

        ChatRequest
        {   model: Some(
              options.model_or(&self.config.default_model).to_string()
            )
          , messages: shaped.iter().map(ChatMessage::from).collect()
          , max_tokens: Some(options.max_tokens_or_default())
          , temperature: Some(options.temperature_or_default())
          , response_format: None
          , stream: Some(false)
        }
    }
}

#[async_trait]
impl super::ProviderClient for OpenRouterClient
{   fn provider(&self) -> crate::Provider
    {   crate::Provider::OpenRouter
    }

    fn is_configured(&self) -> bool
    {   self.config.has_credentials()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String>
    {   let CompletionRequest { messages, options } = request;
        let api_key = match &self.config.api_key
        {   Some(key) => key
          , None => return Err(super::missing_key(&self.config, messages))
        };

        let request = self.build_request(messages, options);
        trace!("OpenRouter request model: {:?}", request.model);

        let mut builder = self.http_client
          .post(self.endpoint())
          .header("Authorization", format!("Bearer {}", api_key))
          .header("Content-Type", "application/json")
          .json(&request);
        if let Some(url) = &self.config.site_url
        {   builder = builder.header("HTTP-Referer", url);
        }
        if let Some(name) = &self.config.site_name
        {   builder = builder.header("X-Title", name);
        }

        let response: ChatResponse
          = super::send_json(self.provider(), builder, messages).await?;

        response.first_text().ok_or(Error::NoChoicesInResponse)
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::providers::{ProviderClient, JSON_INSTRUCTION};

    fn client(key: Option<&str>) -> OpenRouterClient
    {   OpenRouterClient::new(ProviderConfig::new(
          crate::Provider::OpenRouter
        , "https://openrouter.ai/api/v1/"
        , key.map(str::to_string)
        , "deepseek/deepseek-r1"
        )).unwrap()
    }

    #[test]
    fn request_applies_defaults_and_prompt_json_mode()
    {   let c = client(Some("k"));
        let req = c.build_request(
          &[Message::user("recommend")]
        , &CompletionOptions::json()
        );
        assert_eq!(req.model.as_deref(), Some("deepseek/deepseek-r1"));
        assert_eq!(req.temperature, Some(0.7));
        assert_eq!(req.max_tokens, Some(1024));
        assert!(req.response_format.is_none());
        assert_eq!(req.messages[0].role, "system");
        assert_eq!(req.messages[0].content, JSON_INSTRUCTION);
        assert_eq!(c.endpoint(), "https://openrouter.ai/api/v1/chat/completions");
    }

    #[test]
    fn caller_model_overrides_default()
    {   let c = client(Some("k"));
        let opts = CompletionOptions
        {   model: Some("openai/gpt-4o-mini".to_string())
          , ..Default::default()
        };
        let req = c.build_request(&[Message::user("hi")], &opts);
        assert_eq!(req.model.as_deref(), Some("openai/gpt-4o-mini"));
        assert_eq!(req.messages.len(), 1);
    }

    #[tokio::test]
    async fn missing_key_short_circuits()
    {   let c = client(None);
        assert!(!c.is_configured());
        let err = c
          .complete(&CompletionRequest::new(
            vec![Message::user("hi")]
          , CompletionOptions::default()
          ))
          .await
          .unwrap_err();
        assert_eq!(err, Error::MissingApiKey("openrouter".to_string()));
    }
}
