mod cli;

use streamgate::{config, server};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

async fn start_server(host: String, port: u16, config_path: Option<&std::path::Path>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    config.server.host = host;
    config.server.port = port;

    tracing::info!("Starting Streamgate gateway");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );
    tracing::info!(
        assets = config.assets.len(),
        users = config.users.len(),
        "Loaded in-memory catalog"
    );

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "streamgate=trace,streamgate_media=trace,streamgate_common=debug,tower_http=debug"
                .to_string()
        } else {
            "streamgate=debug,streamgate_media=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let runtime = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Start { host, port } => {
            runtime.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate { config: path } => {
            let path = path.or(cli.config);
            let config = config::load_config_or_default(path.as_deref())?;
            config::validate_config(&config)?;
            println!("Configuration is valid");
            println!(
                "  server: {}:{}, media dir: {:?}",
                config.server.host, config.server.port, config.server.media_dir
            );
            println!(
                "  catalog: {} assets, {} users",
                config.assets.len(),
                config.users.len()
            );
            Ok(())
        }
        Commands::Version => {
            println!("streamgate {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
