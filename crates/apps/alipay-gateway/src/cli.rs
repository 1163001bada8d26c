//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Alipay open API gateway.
#[derive(Parser, Debug)]
#[command(name = "alipay-gateway")]
#[command(author = "use-alipay contributors")]
#[command(version)]
#[command(about = "Notification endpoint and request signer for the Alipay open API")]
#[command(
    long_about = "Receives and verifies Alipay payment notifications, and signs or submits open API calls.\n\nRun 'alipay-gateway serve' with a configuration file to get started."
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "ALIPAY_GATEWAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// What `sign` prints.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum SignOutput {
    /// The signed envelope as JSON.
    #[default]
    Envelope,
    /// The signed, percent-encoded query string (mobile app handoff).
    Query,
    /// The gateway URL carrying the signed query (browser redirect).
    Url,
}

/// CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the notification and signing routes.
    Serve {
        /// Address to listen on (overrides server.listen).
        #[arg(short, long)]
        listen: Option<String>,

        /// Mount the submit and decrypt routes.
        #[arg(long)]
        unsafe_routes: bool,
    },

    /// Sign a call without sending it.
    Sign {
        /// API method, e.g. alipay.trade.precreate.
        method: String,

        /// Business payload as JSON (omit for none).
        payload: Option<String>,

        /// Output form.
        #[arg(short, long, value_enum, default_value_t = SignOutput::Envelope)]
        output: SignOutput,
    },

    /// Print the fingerprint of a certificate file.
    CertSn {
        /// PEM certificate file.
        file: PathBuf,

        /// Treat the file as a root bundle and print the joined fingerprint.
        #[arg(long)]
        root: bool,
    },
}
