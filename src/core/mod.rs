//! Core module for the Scry introspection engine
//!
//! This module contains the wire data model and the file scanner.

pub mod scanner;
mod types;

pub use scanner::{classify_role, scan_files};
pub use types::*;
