//! # spoecfg document
//!
//! The configuration document handle consumed by the spoecfg transaction
//! engine.
//!
//! Documents are **opaque handles** to the engine: it loads, saves, edits
//! named sections and reads the embedded version marker through the
//! [`ConfigDocument`] trait, and never interprets the file text itself.
//!
//! ## Available Documents
//!
//! - [`SpoeDocument`] - HAProxy SPOE configuration text format
//!
//! ## Example
//!
//! ```rust
//! use spoecfg_document::{ConfigDocument, Section, SectionKind, SpoeDocument};
//!
//! let mut doc = SpoeDocument::new();
//! doc.create_section("scope", SectionKind::Agent, Section::new("agent1")).unwrap();
//! doc.set_version(2);
//! assert_eq!(doc.version().unwrap(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod error;
mod section;
mod spoe;

pub use document::ConfigDocument;
pub use error::{DocumentError, DocumentResult};
pub use section::{check_directive, check_name, Section, SectionKind};
pub use spoe::{SpoeDocument, DEFAULT_VERSION};
