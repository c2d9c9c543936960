pub mod error;
pub mod config;
pub mod request;
pub mod providers;
pub mod normalize;
pub mod failover;
pub mod usecases;
pub mod store;
pub mod server;
use serde::{Deserialize, Serialize};

/*

aigate: one completion contract over several hosted LLM APIs, tried in a
fixed order until one of them hands back a usable JSON payload.

src/
├── lib.rs          # Provider enum, re-exports
├── error.rs        # Error enum shared by every layer
├── config.rs       # Env-driven provider and failover config
├── request.rs      # Message / CompletionOptions
├── providers/      # One ProviderClient per hosted API
│   ├── wire.rs     # OpenAI-compatible chat wire types
│   ├── openrouter.rs
│   ├── anthropic.rs
│   └── openai.rs   # Azure (two URL shapes) or public OpenAI
├── normalize.rs    # Fence / \boxed{} stripping
├── failover.rs     # FallbackOrchestrator
├── usecases/       # Prompt templates + payload types per feature
├── store.rs        # In-memory store actor
└── server.rs       # axum routes

*/

pub use error::{Error, Result};
pub use request::{CompletionOptions, CompletionRequest, Message, Role};
pub use providers::ProviderClient;
pub use failover::{CompletionOutcome, FallbackOrchestrator, Payload, Resolved};
pub use store::{MemStore, Store};
pub use server::{router, AppState};

/// Hosted completion APIs, in the order the gateway tries them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Hash)]
pub enum Provider
{   /// OpenRouter (unified API over many models)
    OpenRouter
  , /// Anthropic (Claude models)
    Anthropic
  , /// OpenAI or an Azure OpenAI deployment
    OpenAI
}

impl Provider
{   pub fn as_str(&self) -> &'static str
    {   match self
        {   Provider::OpenRouter => "openrouter"
          , Provider::Anthropic => "anthropic"
          , Provider::OpenAI => "openai"
        }
    }
}

impl std::fmt::Display for Provider
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {   f.write_str(self.as_str())
    }
}
