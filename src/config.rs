//! Configuration for providers and failover behavior

use std::time::Duration;
use serde::{Deserialize, Serialize};
use log::{debug, info, warn};

pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const AZURE_DEFAULT_API_VERSION: &str = "2024-08-01-preview";

pub const OPENROUTER_DEFAULT_MODEL: &str = "deepseek/deepseek-r1";
pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";

/// Azure-specific addressing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureSettings
{   /// Deployment name (deployments URL shape)
    pub deployment: Option<String>
  , /// `api-version` query parameter
    pub api_version: String
  , /// Use the model-inference URL shape instead of deployments
    pub use_inference: bool
}

/// Static per-provider configuration, read once at start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig
{   /// Which provider this configures
    pub provider: crate::Provider
  , /// API base URL (endpoint root for Azure)
    pub api_base: String
  , /// Credential; absent means the provider is always skipped
    pub api_key: Option<String>
  , /// Model used when the caller passes none
    pub default_model: String
  , /// Whether the API accepts a native JSON response mode
    pub supports_json_mode: bool
  , /// Set when the OpenAI slot points at Azure
    pub azure: Option<AzureSettings>
  , /// Attribution headers (OpenRouter)
    pub site_url: Option<String>
  , pub site_name: Option<String>
}

impl ProviderConfig
{   pub fn new(
      provider: crate::Provider
    , api_base: impl Into<String>
    , api_key: Option<String>
    , default_model: impl Into<String>
    ) -> Self
    {   ProviderConfig
        {   supports_json_mode: provider == crate::Provider::OpenAI
          , provider
          , api_base: api_base.into()
          , api_key
          , default_model: default_model.into()
          , azure: None
          , site_url: None
          , site_name: None
        }
    }

    /// Credential presence check; never touches the network
    pub fn has_credentials(&self) -> bool
    {   if self.api_key.is_none()
        {   return false;
        }
        match &self.azure
        {   Some(azure) => azure.use_inference || azure.deployment.is_some()
          , None => true
        }
    }
}

/// Failover configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailoverConfig
{   /// Upper bound on a single provider attempt
    pub provider_timeout: Duration
}

impl Default for FailoverConfig
{   fn default() -> Self
    {   FailoverConfig
        {   provider_timeout: Duration::from_secs(30)
        }
    }
}

/// Whole-process configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig
{   /// Providers in fixed priority order
    pub providers: Vec<ProviderConfig>
  , /// Failover configuration
    pub failover: FailoverConfig
  , /// Socket address the HTTP server binds
    pub bind_addr: String
}

impl GatewayConfig
{   /// Load from process environment (after `.env`, if any)
    pub fn from_env() -> Self
    {   match dotenvy::dotenv()
        {   Ok(path) => debug!("Loaded environment from {}", path.display())
          , Err(_) => debug!("No .env file found")
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
      F: Fn(&str) -> Option<String>
    {   let get = |key: &str| -> Option<String>
        {   lookup(key)
              .map(|v| v.trim().to_string())
              .filter(|v| !v.is_empty())
        };

        let mut openrouter = ProviderConfig::new(
          crate::Provider::OpenRouter
        , get("OPENROUTER_BASE_URL")
            .unwrap_or_else(|| OPENROUTER_API_BASE.to_string())
        , get("OPENROUTER_API_KEY")
        , get("OPENROUTER_MODEL")
            .unwrap_or_else(|| OPENROUTER_DEFAULT_MODEL.to_string())
        );
        openrouter.site_url = get("SITE_URL");
        openrouter.site_name = get("SITE_NAME");

        let anthropic = ProviderConfig::new(
          crate::Provider::Anthropic
        , get("ANTHROPIC_BASE_URL")
            .unwrap_or_else(|| ANTHROPIC_API_BASE.to_string())
        , get("ANTHROPIC_API_KEY")
        , get("ANTHROPIC_MODEL")
            .unwrap_or_else(|| ANTHROPIC_DEFAULT_MODEL.to_string())
        );

        let openai = openai_config(&get);

        let provider_timeout = match get("PROVIDER_TIMEOUT_SECS")
        {   Some(raw) => match raw.parse::<u64>()
            {   Ok(secs) if secs > 0 => Duration::from_secs(secs)
              , _ => {
                  warn!("Ignoring invalid PROVIDER_TIMEOUT_SECS={}", raw);
                  FailoverConfig::default().provider_timeout
                }
            }
          , None => FailoverConfig::default().provider_timeout
        };

        let bind_addr = format!(
          "{}:{}"
        , get("HOST").unwrap_or_else(|| "0.0.0.0".to_string())
        , get("PORT").unwrap_or_else(|| "5000".to_string())
        );

        let config = GatewayConfig
        {   providers: vec![openrouter, anthropic, openai]
          , failover: FailoverConfig { provider_timeout }
          , bind_addr
        };
        for p in &config.providers
        {   info!(
              "Provider {} configured={} model={}"
            , p.provider
            , p.has_credentials()
            , p.default_model
            );
        }
        config
    }
}

/// Azure wins over public OpenAI when its key is set
fn openai_config<G>(get: &G) -> ProviderConfig
where
  G: Fn(&str) -> Option<String>
{   if let Some(key) = get("AZURE_OPENAI_API_KEY")
    {   let deployment = get("AZURE_OPENAI_DEPLOYMENT");
        let mut cfg = ProviderConfig::new(
          crate::Provider::OpenAI
        , get("AZURE_OPENAI_ENDPOINT").unwrap_or_default()
        , Some(key)
        , deployment.clone()
            .or_else(|| get("OPENAI_MODEL"))
            .unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string())
        );
        if cfg.api_base.is_empty()
        {   warn!("AZURE_OPENAI_API_KEY set without AZURE_OPENAI_ENDPOINT");
            cfg.api_key = None;
        }
        cfg.azure = Some(AzureSettings
        {   deployment
          , api_version: get("AZURE_OPENAI_API_VERSION")
              .unwrap_or_else(|| AZURE_DEFAULT_API_VERSION.to_string())
          , use_inference: get("AZURE_OPENAI_USE_INFERENCE")
              .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
              .unwrap_or(false)
        });
        return cfg;
    }

    ProviderConfig::new(
      crate::Provider::OpenAI
    , get("OPENAI_BASE_URL")
        .unwrap_or_else(|| OPENAI_API_BASE.to_string())
    , get("OPENAI_API_KEY")
    , get("OPENAI_MODEL")
        .unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string())
    )
}
