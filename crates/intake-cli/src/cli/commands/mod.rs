pub mod ingest;
pub mod store;
pub mod validate;

use super::args::{Cli, Command};
use anyhow::Context;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const INVALID: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Ingest(args) => ingest::run(args).await,
        Command::Validate(args) => validate::run(args).await,
        Command::Store(args) => store::run(args).await,
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

/// Read a stage's JSON input from a file, from the file named by an
/// environment variable, or from stdin.
pub async fn read_input(
    file: &Option<PathBuf>,
    env: &Option<String>,
) -> anyhow::Result<serde_json::Value> {
    if let Some(var) = env {
        let path = std::env::var(var)
            .with_context(|| format!("environment variable {} is not set", var))?;
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path))?;
        return serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path));
    }
    if let Some(path) = file {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        return serde_json::from_str(&raw)
            .with_context(|| format!("invalid JSON in {}", path.display()));
    }
    let mut raw = String::new();
    tokio::io::stdin()
        .read_to_string(&mut raw)
        .await
        .context("failed to read stdin")?;
    serde_json::from_str(&raw).context("invalid JSON from stdin")
}
