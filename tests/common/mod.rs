#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aigate::config::FailoverConfig;
use aigate::{CompletionRequest, Error, FallbackOrchestrator, Provider, ProviderClient};

/// What a scripted provider does on every call
#[derive(Clone)]
pub enum Script
{   Reply(String)
  , Fail(Error)
  , Hang
}

/// In-process provider that counts its calls
pub struct ScriptedProvider
{   provider: Provider
  , configured: bool
  , script: Script
  , calls: Arc<AtomicUsize>
}

impl ScriptedProvider
{   pub fn new(provider: Provider, script: Script) -> Self
    {   ScriptedProvider
        {   provider
          , configured: true
          , script
          , calls: Arc::new(AtomicUsize::new(0))
        }
    }

    pub fn unconfigured(provider: Provider) -> Self
    {   ScriptedProvider
        {   configured: false
          , ..Self::new(provider, Script::Fail(Error::MissingApiKey(provider.to_string())))
        }
    }

    pub fn counter(&self) -> Arc<AtomicUsize>
    {   self.calls.clone()
    }
}

#[async_trait::async_trait]
impl ProviderClient for ScriptedProvider
{   fn provider(&self) -> Provider
    {   self.provider
    }

    fn is_configured(&self) -> bool
    {   self.configured
    }

    async fn complete(&self, _request: &CompletionRequest) -> aigate::Result<String>
    {   self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script
        {   Script::Reply(text) => Ok(text.clone())
          , Script::Fail(e) => Err(e.clone())
          , Script::Hang => {
              tokio::time::sleep(Duration::from_secs(3600)).await;
              Ok(String::new())
            }
        }
    }
}

pub fn reply(text: &str) -> Script
{   Script::Reply(text.to_string())
}

pub fn soft() -> Script
{   reply(r#"{"message":"Service temporarily unavailable","error":"upstream outage"}"#)
}

/// Three-provider chain in the gateway's order, plus per-provider call counters
pub fn chain(scripts: [Script; 3]) -> (FallbackOrchestrator, [Arc<AtomicUsize>; 3])
{   let [a, b, c] = scripts;
    build([
      ScriptedProvider::new(Provider::OpenRouter, a)
    , ScriptedProvider::new(Provider::Anthropic, b)
    , ScriptedProvider::new(Provider::OpenAI, c)
    ])
}

pub fn build(providers: [ScriptedProvider; 3]) -> (FallbackOrchestrator, [Arc<AtomicUsize>; 3])
{   let counters = [
      providers[0].counter()
    , providers[1].counter()
    , providers[2].counter()
    ];
    let clients: Vec<Arc<dyn ProviderClient>> = providers
      .into_iter()
      .map(|p| Arc::new(p) as Arc<dyn ProviderClient>)
      .collect();
    (FallbackOrchestrator::new(clients, &FailoverConfig::default()), counters)
}

pub fn calls(counters: &[Arc<AtomicUsize>; 3]) -> [usize; 3]
{   [
      counters[0].load(Ordering::SeqCst)
    , counters[1].load(Ordering::SeqCst)
    , counters[2].load(Ordering::SeqCst)
    ]
}
