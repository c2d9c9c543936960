//! Unified request types shared by every provider

use serde::{Deserialize, Serialize};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: usize = 1024;

/// Speaker of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role
{   System
  , User
  , Assistant
}

impl Role
{   pub fn as_str(&self) -> &'static str
    {   match self
        {   Role::System => "system"
          , Role::User => "user"
          , Role::Assistant => "assistant"
        }
    }
}

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message
{   pub role: Role
  , pub content: String
}

impl Message
{   pub fn system(content: impl Into<String>) -> Self
    {   Message { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self
    {   Message { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self
    {   Message { role: Role::Assistant, content: content.into() }
    }
}

/// Per-call knobs; providers fill in their own defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions
{   /// Model override (provider default when absent)
    pub model: Option<String>
  , /// Ask for a JSON-only answer
    #[serde(default)]
    pub json_mode: bool
  , /// Temperature for sampling
    pub temperature: Option<f32>
  , /// Max tokens to generate
    pub max_tokens: Option<usize>
}

impl CompletionOptions
{   pub fn json() -> Self
    {   CompletionOptions
        {   json_mode: true
          , ..Default::default()
        }
    }

    pub fn temperature_or_default(&self) -> f32
    {   self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn max_tokens_or_default(&self) -> usize
    {   self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn model_or<'a>(&'a self, default_model: &'a str) -> &'a str
    {   self.model.as_deref().unwrap_or(default_model)
    }
}

/// A single completion call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest
{   pub messages: Vec<Message>
  , pub options: CompletionOptions
}

impl CompletionRequest
{   pub fn new(
      messages: Vec<Message>
    , options: CompletionOptions
    ) -> Self
    {   CompletionRequest { messages, options }
    }
}

/// Loggable summary of a conversation: count plus first and last roles.
/// Content is never included.
pub fn describe(messages: &[Message]) -> String
{   match (messages.first(), messages.last())
    {   (Some(first), Some(last)) => format!(
          "{} messages, first={}, last={}"
        , messages.len()
        , first.role.as_str()
        , last.role.as_str()
        )
      , _ => "0 messages".to_string()
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn defaults_apply_when_options_are_empty()
    {   let opts = CompletionOptions::default();
        assert_eq!(opts.temperature_or_default(), 0.7);
        assert_eq!(opts.max_tokens_or_default(), 1024);
        assert_eq!(opts.model_or("gpt-4o"), "gpt-4o");
    }

    #[test]
    fn describe_never_includes_content()
    {   let msgs = vec![
          Message::system("secret instructions")
        , Message::user("my revenue is 4M")
        ];
        let summary = describe(&msgs);
        assert_eq!(summary, "2 messages, first=system, last=user");
        assert!(!summary.contains("secret"));
    }

    #[test]
    fn roles_serialize_lowercase()
    {   let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
