// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # FileVault CLI
//!
//! One binary for both sides of the `filevault.v1.FileService` protocol.
//!
//! - `filevault --serve` - run the gRPC file server
//! - `filevault --list` - list stored files
//! - `filevault --upload <PATH> [--name <NAME>]` - upload a local file
//! - `filevault --download <NAME> [--out <PATH>]` - download a stored file
//! - `filevault config show|validate|generate` - configuration management
//!
//! Exit codes: 0 success, 1 usage/config, 2 resource exhausted, 3 not found,
//! 4 storage, 5 transport, 6 failed upload.

use anyhow::{Context, Result};
use clap::error::ErrorKind as ClapErrorKind;
use clap::{ArgGroup, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use filevault::commands::{self, ClientOptions, ConfigCommand, EXIT_GENERAL};
use filevault_core::domain::config::FileVaultConfig;

/// FileVault - chunked file transfer over gRPC
#[derive(Parser, Debug)]
#[command(name = "filevault")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(group(
    ArgGroup::new("action")
        .args(["list", "upload", "download", "serve"])
        .multiple(false)
))]
struct Cli {
    /// List all stored files
    #[arg(long)]
    list: bool,

    /// Upload a local file
    #[arg(long, value_name = "PATH")]
    upload: Option<PathBuf>,

    /// Remote name for --upload (default: file name of PATH)
    #[arg(
        long,
        value_name = "NAME",
        requires = "upload",
        conflicts_with_all = ["list", "download", "serve"]
    )]
    name: Option<String>,

    /// Download a stored file by name
    #[arg(long, value_name = "NAME")]
    download: Option<String>,

    /// Output path for --download (default: ./NAME)
    #[arg(
        long,
        value_name = "PATH",
        requires = "download",
        conflicts_with_all = ["list", "upload", "serve"]
    )]
    out: Option<PathBuf>,

    /// Run the gRPC file server
    #[arg(long)]
    serve: bool,

    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "FILEVAULT_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Server address for client commands (default: from config)
    #[arg(long, global = true, env = "FILEVAULT_SERVER", value_name = "ADDR")]
    server: Option<String>,

    /// Log level (trace, debug, info, warn, error; default: from config)
    #[arg(long, global = true, env = "FILEVAULT_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => exit(EXIT_GENERAL),
            };
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            exit(commands::exit_code(&err))
        }
    }
}

fn exit(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

async fn run(cli: Cli) -> Result<()> {
    if let Some(Commands::Config { command }) = cli.command {
        init_logging(cli.log_level.as_deref().unwrap_or("info"))?;
        return commands::config::handle_command(command, cli.config).await;
    }

    let config = FileVaultConfig::load_or_default(cli.config.clone())
        .context("Failed to load configuration")?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.spec.logging.level.clone());
    init_logging(&level)?;

    if cli.serve {
        info!("Starting FileVault in server mode");
        return commands::serve::run(&config).await;
    }

    let opts = ClientOptions::from_config(&config, cli.server);

    if cli.list {
        commands::transfer::list(&opts).await
    } else if let Some(path) = cli.upload {
        commands::transfer::upload(&opts, &path, cli.name).await
    } else if let Some(name) = cli.download {
        commands::transfer::download(&opts, &name, cli.out).await
    } else {
        // No action provided - point at help
        anyhow::bail!("No action specified. Use --list, --upload, --download, --serve or --help.")
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_are_mutually_exclusive() {
        let err = Cli::try_parse_from(["filevault", "--list", "--serve"]).unwrap_err();
        assert_eq!(err.kind(), ClapErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_name_requires_upload() {
        let err = Cli::try_parse_from(["filevault", "--name", "x"]).unwrap_err();
        assert_eq!(err.kind(), ClapErrorKind::MissingRequiredArgument);

        for action in [&["--list"][..], &["--serve"][..], &["--download", "f"][..]] {
            let mut args = vec!["filevault"];
            args.extend_from_slice(action);
            args.extend_from_slice(&["--name", "x"]);
            let err = Cli::try_parse_from(args).unwrap_err();
            assert_eq!(err.kind(), ClapErrorKind::ArgumentConflict);
        }
    }

    #[test]
    fn test_out_requires_download() {
        let err = Cli::try_parse_from(["filevault", "--out", "./o"]).unwrap_err();
        assert_eq!(err.kind(), ClapErrorKind::MissingRequiredArgument);

        for action in [&["--list"][..], &["--serve"][..], &["--upload", "a"][..]] {
            let mut args = vec!["filevault"];
            args.extend_from_slice(action);
            args.extend_from_slice(&["--out", "./o"]);
            let err = Cli::try_parse_from(args).unwrap_err();
            assert_eq!(err.kind(), ClapErrorKind::ArgumentConflict);
        }

        let cli = Cli::try_parse_from(["filevault", "--download", "f", "--out", "./o"]).unwrap();
        assert_eq!(cli.out, Some(PathBuf::from("./o")));
    }

    #[test]
    fn test_upload_with_name() {
        let cli =
            Cli::try_parse_from(["filevault", "--upload", "./a.bin", "--name", "b.bin"]).unwrap();
        assert_eq!(cli.upload, Some(PathBuf::from("./a.bin")));
        assert_eq!(cli.name.as_deref(), Some("b.bin"));
    }

    #[test]
    fn test_config_subcommand_parses() {
        let cli = Cli::try_parse_from(["filevault", "config", "validate"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Config { .. })));
    }

    #[test]
    fn test_clap_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
