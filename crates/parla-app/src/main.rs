//! Parla application binary - composition root.
//!
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Apply CLI / environment overrides
//! 3. Build the stage backends selected by configuration
//! 4. Start the axum REST API server

mod cli;

use clap::Parser;

use parla_agent::PipelineServices;
use parla_api::{start_server, AppState};
use parla_core::config::ProviderKind;
use parla_core::ParlaConfig;

use cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config is read before tracing starts so its log level can apply;
    // load problems are reported once the subscriber is up.
    let config_file = args.resolve_config_path();
    let loaded = if config_file.exists() {
        Some(ParlaConfig::load(&config_file))
    } else {
        None
    };
    let mut config = match &loaded {
        Some(Ok(config)) => config.clone(),
        _ => ParlaConfig::default(),
    };

    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    tracing::info!("Starting Parla v{}", env!("CARGO_PKG_VERSION"));
    match loaded {
        Some(Ok(_)) => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Some(Err(e)) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config. Using defaults."
        ),
        None => tracing::info!(path = %config_file.display(), "No config file; using defaults"),
    }

    // Overrides.
    config.general.port = args.resolve_port(config.general.port);
    if let Some(host) = &args.host {
        config.general.host = host.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.general.output_dir = dir.clone();
    }
    if args.mock {
        config.transcription.provider = ProviderKind::Mock;
        config.generation.provider = ProviderKind::Mock;
        config.synthesis.provider = ProviderKind::Mock;
        tracing::info!("Mock backends selected for every stage");
    }
    config.validate()?;

    // Backends.
    let services = match PipelineServices::from_config(&config) {
        Ok(services) => services,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize pipeline backends (use --mock to run offline)");
            return Err(e.into());
        }
    };
    for (stage, backend) in services.describe() {
        tracing::info!(stage, backend = %backend, "Backend ready");
    }
    tracing::info!(
        window = config.conversation.window,
        retrieval = config.retrieval.enabled,
        output_dir = %config.general.output_dir.display(),
        "Pipeline configured"
    );

    let state = AppState::new(config.clone(), services);
    start_server(&config, state).await?;

    Ok(())
}
