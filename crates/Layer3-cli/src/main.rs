//! Labforge CLI - Main entry point
//!
//! stdout에는 JSON만 출력하고, 로그는 stderr로 보냅니다.

use anyhow::Context;
use clap::{Parser, Subcommand};
use labforge_core::{HttpApiClient, ToolCatalog, ToolContext};
use labforge_foundation::{EnvSnapshot, PolicyGate, ServerConfig};
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Labforge - GitLab tools for assistants and scripts
#[derive(Parser, Debug)]
#[command(name = "labforge")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Expose only read-only tools (overrides GITLAB_READ_ONLY_MODE)
    #[arg(long)]
    read_only: bool,

    /// Project directory holding `.labforge/` (defaults to the current directory)
    #[arg(long)]
    project_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the visible tool catalog
    Tools,
    /// Invoke a tool
    Call {
        /// Tool name, e.g. browse_projects
        tool: String,
        /// JSON arguments, or `-` to read them from stdin
        args: Option<String>,
    },
    /// Print the effective action policy
    Policy,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let env = EnvSnapshot::capture();
    let project_dir = args
        .project_dir
        .clone()
        .or_else(|| std::env::current_dir().ok());

    let policy = Arc::new(
        PolicyGate::load(&env, project_dir.as_deref()).context("failed to load action policy")?,
    );
    if let Command::Policy = args.command {
        println!("{}", serde_json::to_string_pretty(&policy.describe())?);
        return Ok(());
    }

    let mut config = ServerConfig::load(&env, project_dir.as_deref())
        .context("failed to load server configuration")?;
    if args.read_only {
        config = config.with_read_only(true);
    }
    debug!("Using {:?}", config);

    let config = Arc::new(config);
    let api = Arc::new(HttpApiClient::new(&config)?);
    let ctx = ToolContext::new(config, api, policy);
    let catalog = ToolCatalog::with_builtins(&ctx, env);

    match args.command {
        Command::Tools => {
            println!("{}", serde_json::to_string_pretty(&catalog.list_tools())?);
        }
        Command::Call { tool, args: raw } => {
            let input = read_arguments(raw.as_deref())?;
            match catalog.call_tool(&tool, input).await {
                Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
                Err(e) => {
                    println!("{}", serde_json::to_string_pretty(&e.to_json())?);
                    std::process::exit(1);
                }
            }
        }
        Command::Policy => {}
    }

    Ok(())
}

/// 인자 JSON 읽기 (없으면 빈 object)
fn read_arguments(raw: Option<&str>) -> anyhow::Result<Value> {
    let text = match raw {
        None => return Ok(Value::Object(Default::default())),
        Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read arguments from stdin")?;
            buf
        }
        Some(text) => text.to_string(),
    };
    serde_json::from_str(&text).context("arguments must be valid JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_arguments() {
        assert_eq!(read_arguments(None).unwrap(), serde_json::json!({}));
        assert_eq!(
            read_arguments(Some(r#"{"action": "get", "project_id": 1}"#)).unwrap()["action"],
            "get"
        );
        assert!(read_arguments(Some("{not json")).is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "labforge",
            "--read-only",
            "call",
            "browse_projects",
            "-",
        ])
        .unwrap();
        assert!(args.read_only);
        assert!(matches!(
            args.command,
            Command::Call { ref tool, args: Some(ref raw) } if tool == "browse_projects" && raw == "-"
        ));
    }
}
