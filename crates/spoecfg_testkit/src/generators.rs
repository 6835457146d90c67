//! Property-based test generators using proptest.
//!
//! Provides strategies for generating documents that satisfy the SPOE
//! format's naming and layout rules, plus names and directives that break
//! them.

use proptest::prelude::*;
use spoecfg_document::{ConfigDocument, Section, SectionKind, SpoeDocument};
use std::collections::BTreeSet;

/// Strategy for generating valid scope names.
pub fn scope_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9-]{0,15}").expect("Invalid regex")
}

/// Strategy for generating valid section names.
pub fn section_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_.-]{0,23}").expect("Invalid regex")
}

/// Strategy for generating directive lines.
///
/// Lines never start or end with whitespace and never start with `#`.
pub fn directive_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9=._ -]{0,30}[a-z0-9]")
        .expect("Invalid regex")
}

/// Strategy for generating names a document must reject.
pub fn invalid_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        prop::string::string_regex("[a-z]{1,6}[ \t][a-z]{1,6}").expect("Invalid regex"),
        prop::string::string_regex("[a-z]{0,4}[\\[\\]#][a-z]{0,4}").expect("Invalid regex"),
    ]
}

/// Strategy for generating directive lines a document must reject.
pub fn invalid_directive_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex(" {0,3}").expect("Invalid regex"),
        directive_strategy().prop_map(|line| format!(" {line}")),
        directive_strategy().prop_map(|line| format!("{line} ")),
        (directive_strategy(), directive_strategy()).prop_map(|(a, b)| format!("{a}\n{b}")),
        (directive_strategy(), directive_strategy()).prop_map(|(a, b)| format!("{a}\r{b}")),
    ]
}

/// Strategy for generating section kinds.
pub fn section_kind_strategy() -> impl Strategy<Value = SectionKind> {
    prop::sample::select(SectionKind::ALL.to_vec())
}

/// Strategy for generating a section with up to `max_directives` lines.
pub fn section_strategy(max_directives: usize) -> impl Strategy<Value = Section> {
    (
        section_name_strategy(),
        prop::collection::vec(directive_strategy(), 0..=max_directives),
    )
        .prop_map(|(name, directives)| Section { name, directives })
}

/// Strategy for generating complete documents.
///
/// Scope names are unique, and section names are unique per kind within a
/// scope.
pub fn document_strategy() -> impl Strategy<Value = SpoeDocument> {
    (
        1i64..10_000,
        prop::collection::btree_set(scope_name_strategy(), 0..4),
        prop::collection::vec((section_kind_strategy(), section_strategy(4)), 0..8),
    )
        .prop_map(|(version, scopes, sections)| {
            let scopes: Vec<String> = scopes.into_iter().collect();
            let mut doc = SpoeDocument::new();
            doc.set_version(version);
            for scope in &scopes {
                doc.create_scope(scope).expect("Unique scope names");
            }

            let mut seen = BTreeSet::new();
            for (i, (kind, section)) in sections.into_iter().enumerate() {
                let Some(scope) = scopes.get(i % scopes.len().max(1)) else {
                    break;
                };
                if seen.insert((scope.clone(), kind, section.name.clone())) {
                    doc.create_section(scope, kind, section)
                        .expect("Unique section names");
                }
            }
            doc
        })
}
