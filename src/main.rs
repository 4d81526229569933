//! oidc-hook: OpenID Connect login hook for gateways.
//!
//! Reads the login artifact from the environment (the `password` variable
//! by default, as handed over by the gateway), authenticates it and prints
//! `Welcome <email> !` on success. Exit status 0 accepts the login, 1 rejects it.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use oidc_hook::{Authenticator, HookConfig};

/// OpenID Connect authorization-code login hook
#[derive(Parser, Debug)]
#[command(name = "oidc-hook")]
#[command(
    about = "Authenticate a gateway login artifact against an OIDC provider",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Provider configuration file (TOML); the built-in table is used when absent
    #[arg(long, env = "OIDC_HOOK_CONFIG")]
    config: Option<PathBuf>,

    /// Environment variable holding the login artifact
    #[arg(long, default_value = "password")]
    artifact_env: String,

    /// Per-request HTTP timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Disable TLS certificate validation (development only)
    #[arg(long, hide_short_help = true)]
    danger_accept_invalid_certs: bool,

    /// Print configured provider identifiers and exit
    #[arg(long)]
    list_providers: bool,
}

#[cfg(feature = "logging")]
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(not(feature = "logging"))]
fn init_logging() {}

fn build_authenticator(cli: &Cli) -> Result<Authenticator> {
    let mut config = match &cli.config {
        Some(path) => HookConfig::from_file(path)
            .with_context(|| format!("loading provider configuration from {}", path.display()))?,
        None => HookConfig::builtin(),
    };

    if let Some(timeout) = cli.timeout_secs {
        config.http.timeout_secs = timeout;
    }
    if cli.danger_accept_invalid_certs {
        config.http.danger_accept_invalid_certs = true;
    }

    let (registry, http) = config
        .into_parts_with_env(|key| std::env::var(key).ok())
        .context("validating provider configuration")?;

    Authenticator::new(registry, &http).context("creating HTTP client")
}

fn read_artifact(name: &str) -> Option<Vec<u8>> {
    std::env::var_os(name).map(OsString::into_encoded_bytes)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        },
    };

    init_logging();

    let authenticator = match build_authenticator(&cli) {
        Ok(authenticator) => authenticator,
        Err(e) => {
            tracing::error!(
                error_kind = "config_error",
                error = %format!("{:#}", e),
                "Setup failed"
            );
            return ExitCode::FAILURE;
        },
    };

    if cli.list_providers {
        for id in authenticator.registry().ids() {
            println!("{}", id);
        }
        return ExitCode::SUCCESS;
    }

    let Some(artifact) = read_artifact(&cli.artifact_env) else {
        tracing::warn!(
            error_kind = "decode_error",
            variable = %cli.artifact_env,
            "Login artifact not set"
        );
        return ExitCode::FAILURE;
    };

    // The flow logs the failure kind; the gateway only sees the exit status.
    match authenticator.authenticate(&artifact).await {
        Ok(claims) => {
            println!("Welcome {} !", claims.email);
            ExitCode::SUCCESS
        },
        Err(_) => ExitCode::FAILURE,
    }
}
