//! Version commands.

use super::{print_json, Format};
use serde::Serialize;
use spoecfg_core::SpoeClient;

#[derive(Debug, Serialize)]
struct BumpResult {
    previous: i64,
    version: i64,
}

/// Increments the configuration version.
pub fn bump(client: &mut SpoeClient, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let previous = client.current_version(None)?;
    let version = client.increment_version()?;

    match format {
        Format::Json => print_json(&BumpResult {
            previous: previous.as_i64(),
            version: version.as_i64(),
        })?,
        Format::Text => println!("✓ Version {previous} -> {version}"),
    }
    Ok(())
}
