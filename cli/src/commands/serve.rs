// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `filevault --serve`: run the gRPC file server until Ctrl+C.

use anyhow::{Context, Result};
use colored::Colorize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use filevault_core::application::{StandardTransferService, TransferService};
use filevault_core::domain::admission::AdmissionController;
use filevault_core::domain::config::FileVaultConfig;
use filevault_core::infrastructure::storage::{create_file_store, StorageBackend};
use filevault_core::presentation::grpc::start_grpc_server;

/// Build the transfer service described by `config`.
pub async fn build_service(config: &FileVaultConfig) -> Result<Arc<dyn TransferService>> {
    let spec = &config.spec;

    let store = create_file_store(StorageBackend::Local {
        root: spec.server.storage_root.clone(),
    })
    .with_context(|| {
        format!(
            "Failed to open storage root {}",
            spec.server.storage_root.display()
        )
    })?;
    store
        .health_check()
        .await
        .context("Storage health check failed")?;

    let admission = Arc::new(AdmissionController::new(spec.limits.admission_limits()));

    let service = StandardTransferService::new(store, admission)
        .with_chunk_size(spec.transfer.chunk_size)
        .with_serialized_writes(spec.server.serialize_writes);

    Ok(Arc::new(service))
}

pub async fn run(config: &FileVaultConfig) -> Result<()> {
    config
        .validate()
        .context("Configuration validation failed")?;

    let listen = config.spec.server.listen_address();
    let addr: SocketAddr = listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", listen))?;

    let service = build_service(config).await?;

    info!(
        storage_root = %config.spec.server.storage_root.display(),
        list_capacity = config.spec.limits.list_capacity,
        transfer_capacity = config.spec.limits.transfer_capacity,
        "FileVault server configured"
    );
    println!(
        "{}",
        format!("FileVault listening on {} (Ctrl+C to stop)", addr).green()
    );

    start_grpc_server(addr, service, shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("gRPC server failed")?;

    println!("{}", "FileVault stopped".dimmed());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_build_service_creates_storage_root() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = FileVaultConfig::default();
        config.spec.server.storage_root = temp_dir.path().join("store");

        let service = build_service(&config).await.unwrap();

        assert!(temp_dir.path().join("store").is_dir());
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_config() {
        let mut config = FileVaultConfig::default();
        config.spec.transfer.chunk_size = 0;
        assert!(run(&config).await.is_err());
    }
}
