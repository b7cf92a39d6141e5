use std::{net::SocketAddr, path::Path};

use actionkit::{
    app::{self, AppState},
    config::{ServerConfigValidator, loader::load_config, models::ServerConfig},
    tracing_setup,
    utils::graceful_shutdown::GracefulShutdown,
};
use clap::Parser;
use color_eyre::{Result, eyre::Context};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
    /// Initialize a new configuration file
    Init {
        /// Output path for the new config file
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
    /// Start the demo server (default)
    Serve {
        /// Configuration file to use
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Some(Commands::Validate { config }) => validate_config_command(&config).await,
        Some(Commands::Init { config }) => init_config_command(&config).await,
        Some(Commands::Serve { config }) => serve(&config).await,
        None => serve(&args.config).await,
    }
}

async fn serve(config_path: &str) -> Result<()> {
    let config = if Path::new(config_path).exists() {
        load_config(config_path)
            .await
            .with_context(|| format!("Failed to load config from {config_path}"))?
    } else {
        eprintln!("⚠️  Configuration file '{config_path}' not found, using defaults");
        ServerConfig::default()
    };
    ServerConfigValidator::validate(&config).context("Invalid configuration")?;

    tracing_setup::init_tracing_with_config(&config.logging)
        .context("Failed to initialize tracing")?;

    let graceful_shutdown = GracefulShutdown::new();
    let state = AppState::from_config(&config, graceful_shutdown.token())
        .context("Failed to build application state")?;
    let router = app::router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address: {}", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    tracing::info!("actionkit demo server starting on {}", addr);
    println!("actionkit listening on {addr}");

    let signal_handler = graceful_shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signal_handler.run_signal_handler().await {
            tracing::error!("Signal handler failed: {}", e);
        }
    });

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            graceful_shutdown.wait_for_shutdown_signal().await;
        })
        .await
        .context("Server error")?;

    tracing::info!("Graceful shutdown completed");
    Ok(())
}

/// Validate configuration file and exit
async fn validate_config_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config(config_path).await {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e}");
            std::process::exit(1);
        }
    };

    match ServerConfigValidator::validate(&config) {
        Ok(()) => {
            println!("✅ Configuration validation: OK");
            println!();
            println!("📋 Configuration Summary:");
            println!("   • Listen Address: {}", config.listen_addr);
            match config.executor.worker_threads {
                Some(workers) => println!(
                    "   • Executor: dedicated pool '{}' with {} workers",
                    config.executor.thread_name, workers
                ),
                None => println!("   • Executor: server runtime"),
            }
            println!(
                "   • Logging: {} (json: {})",
                config.logging.level, config.logging.json
            );
            println!(
                "   • SSE: every {}, cancelled after {}",
                config.streaming.tick_interval, config.streaming.cancel_after
            );
            println!();
            println!("🎉 Configuration is valid and ready to use!");
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed:");
            eprintln!("{e}");
            println!();
            println!("💡 Common fixes:");
            println!("   • Verify listen address format (e.g., '127.0.0.1:3000')");
            println!("   • Use humantime durations (e.g., '500ms', '1s', '2m')");
            println!("   • Use a valid log filter (e.g., 'info' or 'actionkit=debug')");
            std::process::exit(1);
        }
    }
}

/// Initialize a new configuration file
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    let default_config = r#"# actionkit demo server configuration
# Every key can be overridden from the environment, e.g. ACTIONKIT__LISTEN_ADDR

# The address to listen on
listen_addr = "127.0.0.1:8080"

# Pool the actions run on. Without worker_threads they share the server runtime.
[executor]
# worker_threads = 4
thread_name = "action-pool"

[logging]
level = "info"
json = true
include_spans = true

# Demo streaming endpoints
[streaming]
tick_interval = "1s"
cancel_after = "5s"
websocket_interval = "1s"
"#;

    tokio::fs::write(path, default_config)
        .await
        .context("Failed to write config file")?;
    println!("✅ Created default configuration at: {config_path}");
    println!("   Run 'actionkit serve --config {config_path}' to start the server");
    Ok(())
}
