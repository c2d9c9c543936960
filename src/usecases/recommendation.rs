use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::failover::{FallbackOrchestrator, Payload};
use crate::request::{CompletionOptions, Message};
use crate::store::Service;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceSuggestion
{   pub title: String
  , pub description: String
  , pub reason: String
  , pub benefits: Vec<String>
}

/// `{"serviceSuggestions": [...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecommendation
{   pub service_suggestions: Vec<ServiceSuggestion>
}

impl Payload for ServiceRecommendation
{   const EXPECTED_KEY: &'static str = "serviceSuggestions";
}

pub fn build_messages(challenge: &str, catalog: &[Service]) -> Vec<Message>
{   let services = super::bullets(
      catalog.iter().map(|s| format!("{} ({}): {}", s.title, s.category, s.summary))
    );
    vec![
      Message::system(super::CONSULTANT_PERSONA)
    , Message::user(format!(
"A prospective client described this business challenge:
\"{challenge}\"

Our services:
{services}

Recommend the 2-3 services that best address the challenge. Respond in JSON:
{{
  \"serviceSuggestions\": [
    {{
      \"title\": \"service name from the list\",
      \"description\": \"how it applies to this client\",
      \"reason\": \"why it fits the challenge\",
      \"benefits\": [\"benefit\", \"benefit\"]
    }}
  ]
}}"
      ))
    ]
}

/// Exhaustion propagates; there is no local fallback
pub async fn recommend(
  orchestrator: &FallbackOrchestrator
, challenge: &str
, catalog: &[Service]
) -> Result<ServiceRecommendation>
{   let messages = build_messages(challenge, catalog);
    let resolved = orchestrator
      .resolve::<ServiceRecommendation>(&messages, &CompletionOptions::json())
      .await?;
    Ok(resolved.payload)
}
