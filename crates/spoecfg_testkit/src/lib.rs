//! # spoecfg testkit
//!
//! Test utilities for spoecfg.
//!
//! This crate provides:
//! - Temporary configuration fixtures and client helpers
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use spoecfg_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_client() {
//!     with_temp_client(|client| {
//!         let version = client.current_version(None).unwrap();
//!         // ... test operations
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
