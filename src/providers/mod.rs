//! LLM provider implementations

pub mod wire;
pub mod openrouter;
pub mod anthropic;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use log::{debug, error, trace};
use serde::de::DeserializeOwned;

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::request::{describe, CompletionRequest, Message, Role};

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;
pub use openrouter::OpenRouterClient;

/// Appended to prompts for APIs without a native JSON mode
pub const JSON_INSTRUCTION: &str
  = "Respond with a single valid JSON object only. \
     Do not wrap it in markdown code fences and do not add commentary.";

/// Uniform completion contract over one hosted API
#[async_trait]
pub trait ProviderClient: Send + Sync
{   /// Which provider this client talks to
    fn provider(&self) -> crate::Provider;

    /// Credential presence; a `false` here means `complete` does no I/O
    fn is_configured(&self) -> bool;

    /// Raw model text, or a typed error. Never retries.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Build the three clients in fixed priority order
pub fn from_configs(
  configs: &[ProviderConfig]
) -> Result<Vec<Arc<dyn ProviderClient>>>
{   let http = http_client()?;
    configs
      .iter()
      .map(|cfg| {
        let client: Arc<dyn ProviderClient> = match cfg.provider
        {   crate::Provider::OpenRouter => Arc::new(
              OpenRouterClient::with_http(cfg.clone(), http.clone())
            )
          , crate::Provider::Anthropic => Arc::new(
              AnthropicClient::with_http(cfg.clone(), http.clone())
            )
          , crate::Provider::OpenAI => Arc::new(
              OpenAiClient::with_http(cfg.clone(), http.clone())
            )
        };
        Ok(client)
      })
      .collect()
}

/// Shared reqwest client
pub fn http_client() -> Result<reqwest::Client>
{   reqwest::Client::builder()
      .connect_timeout(Duration::from_secs(10))
      .build()
      .map_err(|e| Error::InvalidConfiguration(e.to_string()))
}

/// Put a JSON-only instruction into the system prompt,
/// creating one at the front when the conversation has none.
pub fn with_json_instruction(messages: &[Message]) -> Vec<Message>
{   let mut out = messages.to_vec();
    match out.iter_mut().find(|m| m.role == Role::System)
    {   Some(system) => {
          system.content.push_str("\n\n");
          system.content.push_str(JSON_INSTRUCTION);
        }
      , None => out.insert(0, Message::system(JSON_INSTRUCTION))
    }
    out
}

/// Send a prepared request, check status, decode the body.
/// Logs carry the conversation summary, never its content.
pub(crate) async fn send_json<R>(
  provider: crate::Provider
, builder: reqwest::RequestBuilder
, messages: &[Message]
) -> Result<R>
where
  R: DeserializeOwned
{   let context = describe(messages);
    debug!("{}: sending completion ({})", provider, context);

    let response = builder
      .send()
      .await
      .map_err(|e| {
        error!("{}: transport failure ({}): {}", provider, context, e);
        Error::from(e)
      })?;

    let status = response.status();
    trace!("{} response status: {}", provider, status);

    if !status.is_success()
    {   let error_text = response.text().await
          .unwrap_or_else(|_|
            "Unknown error".to_string()
          );
        error!(
          "{}: API error {} ({}): {}"
        , provider, status, context, error_text
        );
        return Err(Error::ApiError(
          format!("{} returned {}", provider, status)
        ));
    }

    response.json::<R>().await.map_err(|e| {
      error!("{}: undecodable body ({}): {}", provider, context, e);
      Error::ParseError(e.to_string())
    })
}

/// Short-circuit for clients without credentials
pub(crate) fn missing_key(cfg: &ProviderConfig, messages: &[Message]) -> Error
{   debug!(
      "{}: no credentials, skipping network call ({})"
    , cfg.provider
    , describe(messages)
    );
    Error::MissingApiKey(cfg.provider.to_string())
}
