// src/lib.rs

//! Gumshield Package Manager
//!
//! Source-based package builder and installer. A package definition
//! (`*.elplan`) describes where to fetch sources and which lifecycle scripts
//! to run; building it produces a portable tar archive that can later be
//! installed into, and uninstalled from, a target root.
//!
//! # Architecture
//!
//! - `definition`: section-based definition format (parse/serialize)
//! - `archive`: two-layer tar archive (manifest + nested payload tar)
//! - `sandbox`, `script`, `fetch`: build/fake-root/temp directories, lifecycle
//!   script execution and source downloads
//! - `index`: installed-package store (flat directory or SQLite)
//! - `ops`: build, install and uninstall pipelines
//! - `show`: read-only reporting over the index and configuration

pub mod archive;
pub mod config;
pub mod definition;
mod error;
pub mod fetch;
pub mod index;
pub mod ops;
pub mod sandbox;
pub mod script;
pub mod show;

pub use config::Config;
pub use definition::PackageDefinition;
pub use error::{Error, Result};
pub use index::PackageIndex;
