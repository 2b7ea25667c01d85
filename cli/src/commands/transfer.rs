// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Client-side transfer commands: `--list`, `--upload`, `--download`.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use filevault_core::domain::config::FileVaultConfig;
use filevault_core::infrastructure::transfer_client::TransferClient;

/// Where and how the client connects.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub server: String,
    pub connect_timeout: Duration,
    pub chunk_size: usize,
}

impl ClientOptions {
    /// `--server` / `FILEVAULT_SERVER` wins over the config file.
    pub fn from_config(config: &FileVaultConfig, server_override: Option<String>) -> Self {
        Self {
            server: server_override.unwrap_or_else(|| config.spec.client.server_address.clone()),
            connect_timeout: config.spec.client.connect_timeout(),
            chunk_size: config.spec.transfer.chunk_size,
        }
    }
}

async fn connect(opts: &ClientOptions) -> Result<TransferClient> {
    let client = TransferClient::connect(&opts.server, opts.connect_timeout)
        .await
        .with_context(|| format!("Could not connect to server at {}", opts.server))?;
    Ok(client.with_chunk_size(opts.chunk_size))
}

pub async fn list(opts: &ClientOptions) -> Result<()> {
    let client = connect(opts).await?;
    let files = client.list().await.context("Could not list files")?;

    println!("{}", "Files:".bold());
    if files.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for file in files {
        println!(
            "Name: {}, Created: {}, Updated: {}",
            file.name.cyan(),
            file.created,
            file.updated
        );
    }
    Ok(())
}

/// Remote name for an upload: `--name`, else the source's file name.
pub fn remote_name(path: &Path, name: Option<String>) -> Result<String> {
    if let Some(name) = name {
        return Ok(name);
    }
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => Ok(name.to_string()),
        None => bail!(
            "Cannot derive a file name from {}; pass --name",
            path.display()
        ),
    }
}

pub async fn upload(opts: &ClientOptions, path: &Path, name: Option<String>) -> Result<()> {
    let remote = remote_name(path, name)?;
    let client = connect(opts).await?;

    let outcome = client
        .upload(path, &remote)
        .await
        .with_context(|| format!("Upload of {} failed", path.display()))?;

    let status = format!(
        "Upload status: success={}, message={}",
        outcome.success, outcome.message
    );
    if outcome.success {
        println!("{}", status.green());
    } else {
        println!("{}", status.red());
    }
    println!("  {} bytes sent as '{}'", outcome.bytes_sent, remote);
    Ok(())
}

/// Destination for a download: `--out`, else `./<name>`.
pub fn output_path(name: &str, out: Option<PathBuf>) -> PathBuf {
    out.unwrap_or_else(|| Path::new(".").join(name))
}

pub async fn download(opts: &ClientOptions, name: &str, out: Option<PathBuf>) -> Result<()> {
    let out = output_path(name, out);
    let client = connect(opts).await?;

    let bytes = client
        .download(name, &out)
        .await
        .with_context(|| format!("Download of '{}' failed", name))?;

    println!(
        "{}",
        format!("Downloaded {} to {} ({} bytes)", name, out.display(), bytes).green()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::exit_code;
    use filevault_core::application::StandardTransferService;
    use filevault_core::domain::admission::AdmissionController;
    use filevault_core::infrastructure::storage::InMemoryFileStore;
    use filevault_core::presentation::grpc::serve_with_listener;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::net::TcpListener;

    async fn spawn_server(store: InMemoryFileStore) -> ClientOptions {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let service = StandardTransferService::new(
            Arc::new(store),
            Arc::new(AdmissionController::default()),
        );
        tokio::spawn(serve_with_listener(
            listener,
            Arc::new(service),
            std::future::pending::<()>(),
        ));

        ClientOptions {
            server: addr,
            connect_timeout: Duration::from_secs(5),
            chunk_size: 1024,
        }
    }

    #[test]
    fn test_remote_name_defaults_to_file_name() {
        let path = Path::new("/tmp/report.pdf");
        assert_eq!(remote_name(path, None).unwrap(), "report.pdf");
        assert_eq!(remote_name(path, Some("r.pdf".into())).unwrap(), "r.pdf");
        assert!(remote_name(Path::new("/"), None).is_err());
    }

    #[test]
    fn test_output_path_defaults_to_cwd() {
        assert_eq!(output_path("a.txt", None), Path::new("./a.txt"));
        assert_eq!(
            output_path("a.txt", Some(PathBuf::from("/tmp/b"))),
            Path::new("/tmp/b")
        );
    }

    #[tokio::test]
    async fn test_upload_then_download_via_commands() {
        let store = InMemoryFileStore::new();
        let opts = spawn_server(store.clone()).await;
        let temp_dir = TempDir::new().unwrap();

        let source = temp_dir.path().join("notes.txt");
        std::fs::write(&source, "hello filevault").unwrap();
        upload(&opts, &source, None).await.unwrap();
        assert_eq!(store.contents("notes.txt").unwrap(), b"hello filevault");

        let out = temp_dir.path().join("copy.txt");
        download(&opts, "notes.txt", Some(out.clone())).await.unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap(), "hello filevault");

        list(&opts).await.unwrap();
    }

    #[tokio::test]
    async fn test_download_missing_exits_with_not_found() {
        let opts = spawn_server(InMemoryFileStore::new()).await;
        let temp_dir = TempDir::new().unwrap();

        let err = download(&opts, "ghost", Some(temp_dir.path().join("ghost")))
            .await
            .unwrap_err();
        assert_eq!(exit_code(&err), 3);
    }

    #[tokio::test]
    async fn test_unreachable_server_exits_with_transport() {
        let opts = ClientOptions {
            server: "127.0.0.1:1".to_string(),
            connect_timeout: Duration::from_millis(500),
            chunk_size: 1024,
        };
        let err = list(&opts).await.unwrap_err();
        assert_eq!(exit_code(&err), 5);
    }

    #[tokio::test]
    async fn test_missing_local_source_exits_with_storage() {
        let opts = spawn_server(InMemoryFileStore::new()).await;
        let err = upload(&opts, Path::new("/definitely/not/here.bin"), None)
            .await
            .unwrap_err();
        assert_eq!(exit_code(&err), 4);
    }
}
