use async_trait::async_trait;
use log::{debug, trace};

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::request::{CompletionOptions, CompletionRequest, Message};
use super::wire::{ChatMessage, ChatRequest, ChatResponse, ResponseFormat};

/// How the OpenAI slot is addressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointShape
{   /// `{endpoint}/openai/deployments/{deployment}/chat/completions`
    AzureDeployment
    {   deployment: String
      , api_version: String
    }
  , /// `{endpoint}/models/chat/completions`, model named in the body
    AzureInference
    {   api_version: String
    }
  , /// `{base}/chat/completions` with a bearer token
    Public
}

/// Azure OpenAI or public OpenAI chat completions client.
/// The only provider with a first-class JSON response mode.
pub struct OpenAiClient
{   config: ProviderConfig
  , http_client: reqwest::Client
}

impl OpenAiClient
{   pub fn new(config: ProviderConfig) -> Result<Self>
    {   Ok(Self::with_http(config, super::http_client()?))
    }

    pub fn with_http(
      config: ProviderConfig
    , http_client: reqwest::Client
    ) -> Self
    {   debug!("Creating OpenAiClient (azure={})", config.azure.is_some());
        OpenAiClient { config, http_client }
    }

    pub fn shape(&self) -> EndpointShape
    {   match &self.config.azure
        {   Some(azure) if azure.use_inference => EndpointShape::AzureInference
            {   api_version: azure.api_version.clone()
            }
          , Some(azure) => EndpointShape::AzureDeployment
            {   deployment: azure.deployment.clone().unwrap_or_default()
              , api_version: azure.api_version.clone()
            }
          , None => EndpointShape::Public
        }
    }

    pub fn endpoint(&self) -> String
    {   let base = self.config.api_base.trim_end_matches('/');
        match self.shape()
        {   EndpointShape::AzureDeployment { deployment, api_version } => format!(
              "{}/openai/deployments/{}/chat/completions?api-version={}"
            , base, deployment, api_version
            )
          , EndpointShape::AzureInference { api_version } => format!(
              "{}/models/chat/completions?api-version={}"
            , base, api_version
            )
          , EndpointShape::Public => format!("{}/chat/completions", base)
        }
    }

    pub fn build_request(
      &self
    , messages: &[Message]
    , options: &CompletionOptions
    ) -> ChatRequest
    {   let native_json = options.json_mode && self.config.supports_json_mode;
        let shaped = if options.json_mode && !native_json
        {   super::with_json_instruction(messages)
        } else
        {   messages.to_vec()
        };

        // Deployments pin the model server-side
        let model = match self.shape()
        {   EndpointShape::AzureDeployment { .. } => None
          , _ => Some(options.model_or(&self.config.default_model).to_string())
        };

        ChatRequest
        {   model
          , messages: shaped.iter().map(ChatMessage::from).collect()
          , max_tokens: Some(options.max_tokens_or_default())
          , temperature: Some(options.temperature_or_default())
          , response_format: native_json.then(ResponseFormat::json_object)
          , stream: None
        }
    }
}

#[async_trait]
impl super::ProviderClient for OpenAiClient
{   fn provider(&self) -> crate::Provider
    {   crate::Provider::OpenAI
    }

    fn is_configured(&self) -> bool
    {   self.config.has_credentials()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String>
    {   let CompletionRequest { messages, options } = request;
        let api_key = match &self.config.api_key
        {   Some(key) if self.config.has_credentials() => key
          , _ => return Err(super::missing_key(&self.config, messages))
        };

        let request = self.build_request(messages, options);
        trace!("OpenAI request shape: {:?}", self.shape());

        let builder = self.http_client
          .post(self.endpoint())
          .header("Content-Type", "application/json")
          .json(&request);
        let builder = match self.shape()
        {   EndpointShape::Public => builder
              .header("Authorization", format!("Bearer {}", api_key))
          , _ => builder.header("api-key", api_key)
        };

        let response: ChatResponse
          = super::send_json(self.provider(), builder, messages).await?;

        response.first_text().ok_or(Error::NoChoicesInResponse)
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::config::GatewayConfig;
    use std::collections::HashMap;

    fn from_env(pairs: &[(&str, &str)]) -> OpenAiClient
    {   let map: HashMap<&str, &str> = pairs.iter().cloned().collect();
        let cfg = GatewayConfig::from_lookup(|k| map.get(k).map(|v| v.to_string()));
        OpenAiClient::new(cfg.providers[2].clone()).unwrap()
    }

    #[test]
    fn azure_deployment_url_and_no_model()
    {   let c = from_env(&[
          ("AZURE_OPENAI_API_KEY", "k")
        , ("AZURE_OPENAI_ENDPOINT", "https://acme.openai.azure.com/")
        , ("AZURE_OPENAI_DEPLOYMENT", "gpt4o")
        , ("AZURE_OPENAI_API_VERSION", "2024-10-21")
        ]);
        assert_eq!(
          c.endpoint(),
          "https://acme.openai.azure.com/openai/deployments/gpt4o/chat/completions?api-version=2024-10-21"
        );
        let req = c.build_request(&[Message::user("JSON please")], &CompletionOptions::json());
        assert!(req.model.is_none());
        assert_eq!(req.response_format, Some(ResponseFormat::json_object()));
        assert_eq!(req.messages.len(), 1);
    }

    #[test]
    fn azure_inference_url_names_model()
    {   let c = from_env(&[
          ("AZURE_OPENAI_API_KEY", "k")
        , ("AZURE_OPENAI_ENDPOINT", "https://acme.services.ai.azure.com")
        , ("AZURE_OPENAI_USE_INFERENCE", "true")
        , ("OPENAI_MODEL", "gpt-4o-mini")
        ]);
        assert!(matches!(c.shape(), EndpointShape::AzureInference { .. }));
        assert_eq!(
          c.endpoint(),
          "https://acme.services.ai.azure.com/models/chat/completions?api-version=2024-08-01-preview"
        );
        let req = c.build_request(&[Message::user("hi")], &CompletionOptions::default());
        assert_eq!(req.model.as_deref(), Some("gpt-4o-mini"));
        assert!(req.response_format.is_none());
    }

    #[test]
    fn public_openai_when_no_azure_key()
    {   let c = from_env(&[("OPENAI_API_KEY", "sk-test")]);
        assert_eq!(c.shape(), EndpointShape::Public);
        assert_eq!(c.endpoint(), "https://api.openai.com/v1/chat/completions");
        assert!(c.config.has_credentials());
    }
}
