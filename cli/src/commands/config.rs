// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use filevault_core::domain::config::FileVaultConfig;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./filevault.yaml)
        #[arg(short, long, default_value = "./filevault.yaml")]
        output: PathBuf,

        /// Include comments for every setting
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = FileVaultConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  --config flag: {}", path.display());
        } else {
            println!("  --config flag: {}", "(not set)".dimmed());
        }
        for (i, path) in FileVaultConfig::discovery_paths().iter().enumerate() {
            let marker = if path.exists() { "found".green() } else { "missing".dimmed() };
            println!("  {}. {} ({})", i + 1, path.display(), marker);
        }
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    let spec = &config.spec;
    println!("{}", "Server:".bold());
    println!("  Listen: {}", spec.server.listen_address());
    println!("  Storage root: {}", spec.server.storage_root.display());
    println!("  Serialize same-name writes: {}", spec.server.serialize_writes);
    println!();

    println!("{}", "Admission:".bold());
    println!("  List pool: {}", spec.limits.list_capacity);
    println!("  Transfer pool: {}", spec.limits.transfer_capacity);
    println!();

    println!("{}", "Transfer:".bold());
    println!("  Chunk size: {} bytes", spec.transfer.chunk_size);
    println!();

    println!("{}", "Client:".bold());
    println!("  Server: {}", spec.client.server_address);
    println!("  Connect timeout: {} ms", spec.client.connect_timeout_ms);
    println!();

    println!("{}", "Logging:".bold());
    println!("  Level: {}", spec.logging.level);

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = FileVaultConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
