//! CLI command implementations.

pub mod sections;
pub mod transactions;
pub mod version;

use clap::ValueEnum;
use serde::Serialize;
use spoecfg_document::SectionKind;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Parses a section kind from its keyword or short name.
pub fn parse_kind(value: &str) -> Result<SectionKind, String> {
    let keyword = match value {
        "agent" => "spoe-agent",
        "message" => "spoe-message",
        "group" => "spoe-group",
        other => other,
    };
    SectionKind::from_keyword(keyword).ok_or_else(|| {
        format!("unknown section kind {value:?} (expected spoe-agent, spoe-message or spoe-group)")
    })
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_by_keyword_and_short_name() {
        assert_eq!(parse_kind("spoe-agent").unwrap(), SectionKind::Agent);
        assert_eq!(parse_kind("message").unwrap(), SectionKind::Message);
        assert_eq!(parse_kind("group").unwrap(), SectionKind::Group);
        assert!(parse_kind("backend").is_err());
    }
}
