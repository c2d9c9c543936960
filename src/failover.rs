//! Ordered provider fallback

use std::sync::Arc;
use std::time::Duration;
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::FailoverConfig;
use crate::error::{Error, Result};
use crate::normalize::normalize;
use crate::providers::ProviderClient;
use crate::request::{describe, CompletionOptions, CompletionRequest, Message};

/// A structured answer identified by one required top-level key
pub trait Payload: DeserializeOwned + Send
{   const EXPECTED_KEY: &'static str;
}

/// What providers return, as valid JSON, when they cannot serve a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailableEnvelope
{   pub message: String
  , #[serde(default)]
    pub error: Option<String>
}

/// Decoding target for one normalized completion.
/// Variant order matters: a payload wins even if a `message` is present.
#[derive(Deserialize)]
#[serde(untagged)]
enum Reply<T>
{   Payload(T)
  , Unavailable(UnavailableEnvelope)
}

/// Result of one provider attempt
#[derive(Debug)]
pub enum CompletionOutcome<T>
{   Success(T)
  , /// Well-formed answer without the payload, e.g. `{"message": "unavailable"}`
    SoftFailure(String)
  , /// Transport, timeout, credential or parse failure
    HardFailure(Error)
}

/// Decode normalized text as either the payload or the unavailable envelope
pub fn classify<T>(normalized: &str) -> CompletionOutcome<T>
where
  T: Payload
{   let value: serde_json::Value = match serde_json::from_str(normalized)
    {   Ok(v) => v
      , Err(e) => return CompletionOutcome::HardFailure(
          Error::ParseError(format!("not JSON: {}", e))
        )
    };

    match serde_json::from_value::<Reply<T>>(value)
    {   Ok(Reply::Payload(payload)) => CompletionOutcome::Success(payload)
      , Ok(Reply::Unavailable(envelope)) => CompletionOutcome::SoftFailure(
          envelope.error.unwrap_or(envelope.message)
        )
      , Err(_) => CompletionOutcome::HardFailure(Error::ParseError(
          format!("missing or malformed `{}`", T::EXPECTED_KEY)
        ))
    }
}

/// Free-text classification for chat: anything but blank text or an
/// unavailable envelope is an answer
pub fn classify_text(raw: &str) -> CompletionOutcome<String>
{   let text = raw.trim();
    if text.is_empty()
    {   return CompletionOutcome::HardFailure(Error::NoChoicesInResponse);
    }
    match serde_json::from_str::<UnavailableEnvelope>(text)
    {   Ok(envelope) => CompletionOutcome::SoftFailure(
          envelope.error.unwrap_or(envelope.message)
        )
      , Err(_) => CompletionOutcome::Success(text.to_string())
    }
}

/// A payload plus the provider that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T>
{   pub payload: T
  , pub provider: crate::Provider
}

/// Tries providers one after another, first usable answer wins
pub struct FallbackOrchestrator
{   providers: Vec<Arc<dyn ProviderClient>>
  , provider_timeout: Duration
}

impl FallbackOrchestrator
{   /// `providers` must already be in priority order
    pub fn new(
      providers: Vec<Arc<dyn ProviderClient>>
    , config: &FailoverConfig
    ) -> Self
    {   debug!(
          "Creating fallback chain with {} providers",
          providers.len()
        );
        FallbackOrchestrator
        {   providers
          , provider_timeout: config.provider_timeout
        }
    }

    pub fn providers(&self) -> &[Arc<dyn ProviderClient>]
    {   &self.providers
    }

    /// Resolve a JSON payload keyed by `T::EXPECTED_KEY`
    pub async fn resolve<T>(
      &self
    , messages: &[Message]
    , options: &CompletionOptions
    ) -> Result<Resolved<T>>
    where
      T: Payload
    {   self.run_chain(
          messages
        , options
        , T::EXPECTED_KEY
        , |raw| classify::<T>(&normalize(raw))
        ).await
    }

    /// Resolve a free-text answer; the text is only trimmed, never normalized
    pub async fn resolve_text(
      &self
    , messages: &[Message]
    , options: &CompletionOptions
    ) -> Result<Resolved<String>>
    {   self.run_chain(messages, options, "text", classify_text).await
    }

    async fn run_chain<T, F>(
      &self
    , messages: &[Message]
    , options: &CompletionOptions
    , label: &str
    , classify: F
    ) -> Result<Resolved<T>>
    where
      F: Fn(&str) -> CompletionOutcome<T>
    {   let request = CompletionRequest::new(messages.to_vec(), options.clone());
        let mut last_reason = "no providers configured".to_string();

        for client in &self.providers
        {   let provider = client.provider();

            if !client.is_configured()
            {   info!("{}: not configured, skipping", provider);
                last_reason = format!("{}: not configured", provider);
                continue;
            }

            debug!("{}: trying for `{}` ({})", provider, label, describe(messages));
            let outcome = match tokio::time::timeout(
              self.provider_timeout,
              client.complete(&request)
            ).await
            {   Ok(Ok(raw)) => classify(&raw)
              , Ok(Err(e)) => CompletionOutcome::HardFailure(e)
              , Err(_) => CompletionOutcome::HardFailure(Error::Timeout)
            };

            match outcome
            {   CompletionOutcome::Success(payload) => {
                  info!("{}: answered `{}`", provider, label);
                  return Ok(Resolved { payload, provider });
                }
              , CompletionOutcome::SoftFailure(reason) => {
                  warn!("{}: available but declined `{}`: {}", provider, label, reason);
                  last_reason = format!("{}: unavailable: {}", provider, reason);
                }
              , CompletionOutcome::HardFailure(e) => {
                  warn!("{}: failed `{}`: {}", provider, label, e);
                  last_reason = format!("{}: {}", provider, e);
                }
            }
        }

        error!("All providers exhausted for `{}`: {}", label, last_reason);
        Err(Error::AllProvidersExhausted { last_reason })
    }
}
