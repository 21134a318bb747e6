//! Export the edge OpenAPI document
//!
//! Usage:
//!   cargo run --bin export_openapi > openapi.json
//!   cargo run --bin export_openapi -- --output docs/openapi.json

use account_transfer::gateway::openapi::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let json = ApiDoc::openapi().to_pretty_json()?;

    let args: Vec<String> = std::env::args().collect();
    match args.iter().position(|a| a == "--output") {
        Some(i) if i + 1 < args.len() => {
            std::fs::write(&args[i + 1], &json)?;
            eprintln!("OpenAPI document written to {}", args[i + 1]);
        }
        _ => println!("{}", json),
    }
    Ok(())
}
