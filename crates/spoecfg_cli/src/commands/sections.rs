//! Scope and section commands.

use super::{print_json, Format};
use spoecfg_core::{SpoeClient, TransactionId, TransactionRef};
use spoecfg_document::SectionKind;

/// Lists scopes.
pub fn scopes(
    client: &SpoeClient,
    transaction: Option<&TransactionId>,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let scopes = client.list_scopes(transaction)?;
    match format {
        Format::Json => print_json(&scopes)?,
        Format::Text => scopes.iter().for_each(|s| println!("[{s}]")),
    }
    Ok(())
}

/// Lists the sections of one kind in a scope.
pub fn list(
    client: &SpoeClient,
    scope: &str,
    kind: SectionKind,
    transaction: Option<&TransactionId>,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let names = client.list_sections(scope, kind, transaction)?;
    match format {
        Format::Json => print_json(&names)?,
        Format::Text => names.iter().for_each(|n| println!("{kind} {n}")),
    }
    Ok(())
}

/// Shows one section.
pub fn show(
    client: &SpoeClient,
    scope: &str,
    kind: SectionKind,
    name: &str,
    transaction: Option<&TransactionId>,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let section = client.get_section(scope, kind, name, transaction)?;
    match format {
        Format::Json => print_json(&section)?,
        Format::Text => {
            println!("{kind} {}", section.name);
            for line in &section.directives {
                println!("    {line}");
            }
        }
    }
    Ok(())
}

/// Deletes a section.
pub fn delete(
    client: &mut SpoeClient,
    scope: &str,
    kind: SectionKind,
    name: &str,
    txn: &TransactionRef,
) -> Result<(), Box<dyn std::error::Error>> {
    client.delete_section(scope, kind, name, txn)?;
    match txn {
        TransactionRef::Explicit(id) => println!("✓ Deleted {kind} {name} in transaction {id}"),
        TransactionRef::Implicit { .. } => println!("✓ Deleted {kind} {name}"),
    }
    Ok(())
}
