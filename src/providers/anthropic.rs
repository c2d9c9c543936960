use async_trait::async_trait;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::request::{CompletionOptions, CompletionRequest, Message, Role};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

// ===== Message Types =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnthropicMessage
{   pub role: String
  , pub content: String
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnthropicRequest
{   pub model: String
  , pub max_tokens: usize
  , pub temperature: f32
  , pub messages: Vec<AnthropicMessage>
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicResponse
{   #[serde(default)]
    pub content: Vec<ContentBlock>
  , #[serde(default)]
    pub stop_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock
{   #[serde(rename = "type")]
    pub kind: String
  , #[serde(default)]
    pub text: Option<String>
}

impl AnthropicResponse
{   /// Concatenated text blocks; `None` when there is no text at all
    pub fn text(&self) -> Option<String>
    {   let joined: String = self.content
          .iter()
          .filter(|b| b.kind == "text")
          .filter_map(|b| b.text.as_deref())
          .collect();
        if joined.trim().is_empty() { None } else { Some(joined) }
    }
}

/// Fold every system message into the first user turn; the messages
/// endpoint is called without a system role.
pub fn fold_system_messages(messages: &[Message]) -> Vec<AnthropicMessage>
{   let system: Vec<&str> = messages
      .iter()
      .filter(|m| m.role == Role::System)
      .map(|m| m.content.as_str())
      .collect();

    let mut out: Vec<AnthropicMessage> = messages
      .iter()
      .filter(|m| m.role != Role::System)
      .map(|m| AnthropicMessage
        {   role: m.role.as_str().to_string()
          , content: m.content.clone()
        })
      .collect();

    if system.is_empty()
    {   return out;
    }
    let preamble = system.join("\n\n");

    match out.first_mut()
    {   Some(first) if first.role == "user" => {
          first.content = format!("{}\n\n{}", preamble, first.content);
        }
      , _ => out.insert(0, AnthropicMessage
          {   role: "user".to_string()
            , content: preamble
          })
    }
    out
}

/// Anthropic messages API client
pub struct AnthropicClient
{   config: ProviderConfig
  , http_client: reqwest::Client
}

impl AnthropicClient
{   pub fn new(config: ProviderConfig) -> Result<Self>
    {   Ok(Self::with_http(config, super::http_client()?))
    }

    pub fn with_http(
      config: ProviderConfig
    , http_client: reqwest::Client
    ) -> Self
    {   debug!("Creating AnthropicClient");
        AnthropicClient { config, http_client }
    }

    pub fn endpoint(&self) -> String
    {   format!(
          "{}/v1/messages"
        , self.config.api_base.trim_end_matches('/')
        )
    }

    pub fn build_request(
      &self
    , messages: &[Message]
    , options: &CompletionOptions
    ) -> AnthropicRequest
    {   let folded = if options.json_mode
        {   fold_system_messages(&super::with_json_instruction(messages))
        } else
        {   fold_system_messages(messages)
        };

        AnthropicRequest
        {   model: options.model_or(&self.config.default_model).to_string()
          , max_tokens: options.max_tokens_or_default()
          , temperature: options.temperature_or_default()
          , messages: folded
        }
    }
}

#[async_trait]
impl super::ProviderClient for AnthropicClient
{   fn provider(&self) -> crate::Provider
    {   crate::Provider::Anthropic
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
        trace!("Anthropic request model: {}", request.model);

        let builder = self.http_client
          .post(self.endpoint())
          .header("x-api-key", api_key)
          .header("anthropic-version", ANTHROPIC_VERSION)
          .header("Content-Type", "application/json")
          .json(&request);

        let response: AnthropicResponse
          = super::send_json(self.provider(), builder, messages).await?;

        response.text().ok_or(Error::NoChoicesInResponse)
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::providers::JSON_INSTRUCTION;

    #[test]
    fn system_is_folded_into_first_user_message()
    {   let folded = fold_system_messages(&[
          Message::system("Be brief.")
        , Message::user("What is RPA?")
        , Message::assistant("Robotic process automation.")
        , Message::user("Thanks")
        ]);
        assert_eq!(folded.len(), 3);
        assert_eq!(folded[0].role, "user");
        assert_eq!(folded[0].content, "Be brief.\n\nWhat is RPA?");
        assert_eq!(folded[1].role, "assistant");
        assert!(folded.iter().all(|m| m.role != "system"));
    }

    #[test]
    fn system_alone_becomes_user_turn()
    {   let folded = fold_system_messages(&[
          Message::system("Rules")
        , Message::assistant("Hello")
        ]);
        assert_eq!(folded[0].role, "user");
        assert_eq!(folded[0].content, "Rules");
        assert_eq!(folded[1].role, "assistant");
    }

    #[test]
    fn json_mode_rides_in_the_folded_prompt()
    {   let client = AnthropicClient::new(ProviderConfig::new(
          crate::Provider::Anthropic
        , "https://api.anthropic.com"
        , Some("k".to_string())
        , "claude-3-7-sonnet-20250219"
        )).unwrap();
        let req = client.build_request(
          &[Message::user("Give me JSON")]
        , &CompletionOptions::json()
        );
        assert_eq!(req.messages.len(), 1);
        assert!(req.messages[0].content.starts_with(JSON_INSTRUCTION));
        assert!(req.messages[0].content.ends_with("Give me JSON"));
        assert_eq!(req.max_tokens, 1024);
        assert_eq!(client.endpoint(), "https://api.anthropic.com/v1/messages");
    }

    #[test]
    fn text_blocks_are_concatenated()
    {   let resp: AnthropicResponse = serde_json::from_str(r#"{
          "content": [
            {"type": "text", "text": "{\"a\":"},
            {"type": "tool_use", "id": "x"},
            {"type": "text", "text": "1}"}
          ],
          "stop_reason": "end_turn"
        }"#).unwrap();
        assert_eq!(resp.text().as_deref(), Some("{\"a\":1}"));
    }
}
