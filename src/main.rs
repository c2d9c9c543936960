use log::{error, info};

#[tokio::main]
async fn main()
{   env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or("info")
    ).init();

    let config = aigate::config::GatewayConfig::from_env();
    info!(
      "Starting aigate with {} of {} providers configured"
    , config.providers.iter().filter(|p| p.has_credentials()).count()
    , config.providers.len()
    );

    if let Err(e) = aigate::server::serve(config).await
    {   error!("aigate stopped: {}", e);
        std::process::exit(1);
    }
}
