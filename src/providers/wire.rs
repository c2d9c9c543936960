//! OpenAI-compatible chat completion wire types
//! (OpenRouter, Azure OpenAI and public OpenAI all speak this)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: String
}

impl From<&crate::Message> for ChatMessage
{   fn from(m: &crate::Message) -> Self
    {   ChatMessage
        {   role: m.role.as_str().to_string()
          , content: m.content.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFormat
{   #[serde(rename = "type")]
    pub kind: String
}

impl ResponseFormat
{   pub fn json_object() -> Self
    {   ResponseFormat { kind: "json_object".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest
{   #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>
  , pub messages: Vec<ChatMessage>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse
{   #[serde(default)]
    pub choices: Vec<Choice>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: ChoiceMessage
  , #[serde(default)]
    pub finish_reason: Option<String>
}

/// Reasoning models may answer with null content
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage
{   #[serde(default)]
    pub content: Option<String>
}

impl ChatResponse
{   /// Text of the first choice, if any non-empty text exists
    pub fn first_text(&self) -> Option<String>
    {   self.choices
          .first()
          .and_then(|c| c.message.content.clone())
          .filter(|t| !t.trim().is_empty())
    }
}
