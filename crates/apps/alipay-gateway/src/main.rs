//! alipay-gateway binary entry point.

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use alipay_gateway::{
    cli::{Cli, Commands},
    commands,
    config::{GatewayConfig, DEFAULT_CONFIG_FILE},
    error::{AppError, AppResult},
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise info, and --verbose adds debug for our crates
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.verbose {
        if let Ok(directive) = "alipay=debug".parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    if let Err(e) = run(cli).await {
        print_error(&e);
        std::process::exit(e.exit_code());
    }
}

/// Print a user-friendly error message with a recovery hint.
fn print_error(e: &AppError) {
    eprintln!("{}: {}", "Error".red().bold(), e);

    if let Some(suggestion) = e.suggestion() {
        eprintln!("{}: {}", "Hint".cyan(), suggestion);
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let output = match cli.command {
        // Needs no configuration
        Commands::CertSn { file, root } => commands::cert_sn(&file, root)?,

        Commands::Sign {
            method,
            payload,
            output,
        } => {
            let config = load_config(cli.config)?;
            commands::sign(&config, &method, payload.as_deref(), output)?
        }

        Commands::Serve {
            listen,
            unsafe_routes,
        } => {
            let config = load_config(cli.config)?;
            commands::serve(config, listen, unsafe_routes).await?
        }
    };

    println!("{}", output);

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> AppResult<GatewayConfig> {
    let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    GatewayConfig::load(&path)
}
