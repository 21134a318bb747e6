use std::process::Command;

use tonic_build::manual::{Builder, Method, Service};

fn main() {
    emit_git_hash();
    compile_ledger_services();
}

fn emit_git_hash() {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok();

    let git_hash = match output {
        Some(o) if o.status.success() => {
            let hash = String::from_utf8_lossy(&o.stdout).trim().to_string();
            let dirty = Command::new("git")
                .args(["diff", "--quiet"])
                .output()
                .map(|o| !o.status.success())
                .unwrap_or(false);
            if dirty {
                format!("{}-dirty", hash)
            } else {
                hash
            }
        }
        _ => "unknown".to_string(),
    };

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads");
}

/// Generate the tonic client/server stubs for the core ledger services.
///
/// Messages are hand-written prost structs in `src/rpc/messages.rs`, so no
/// `protoc` is needed at build time.
fn compile_ledger_services() {
    let account_service = Service::builder()
        .name("AccountService")
        .package("ledger.v1")
        .method(
            Method::builder()
                .name("create_account")
                .route_name("CreateAccount")
                .input_type("crate::rpc::messages::CreateAccountRequest")
                .output_type("crate::rpc::messages::CreateAccountResponse")
                .codec_path("tonic::codec::ProstCodec")
                .build(),
        )
        .build();

    let transfer_service = Service::builder()
        .name("TransferService")
        .package("ledger.v1")
        .method(
            Method::builder()
                .name("make_transfer")
                .route_name("MakeTransfer")
                .input_type("crate::rpc::messages::TransferRequest")
                .output_type("crate::rpc::messages::TransferResponse")
                .codec_path("tonic::codec::ProstCodec")
                .build(),
        )
        .build();

    Builder::new().compile(&[account_service, transfer_service]);
    println!("cargo:rerun-if-changed=build.rs");
}
