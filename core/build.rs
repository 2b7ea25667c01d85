// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Build Script for filevault-core
//!
//! Compiles `../proto/filevault.proto` with `tonic-prost-build`. Generated code
//! lands in `OUT_DIR` and is pulled in by `tonic::include_proto!` in
//! `src/presentation/grpc/mod.rs`.
//!
//! `protoc` comes from `protoc-bin-vendored` so the build does not depend on a
//! system installation.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);

    let proto_root = "../proto";
    let protos = ["../proto/filevault.proto"];

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&protos, &[proto_root])?;

    println!("cargo:rerun-if-changed=../proto/filevault.proto");

    Ok(())
}
