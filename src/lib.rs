//! anki-sync - push markdown notes into Anki
//!
//! This crate provides the core functionality for the `anki-sync` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`vault`] - Note loading, frontmatter and inline tags
//! - [`callout`] - Callout block extraction and rendering
//! - [`fields`] - Note to Anki field projection
//! - [`tags`] - Tag filter for bulk sync
//! - [`anki`] - AnkiConnect transport, client and schema reconciliation
//! - [`sync`] - Single-note and bulk sync orchestration
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod anki;
pub mod callout;
pub mod cli;
pub mod config;
pub mod error;
pub mod fields;
pub mod sync;
pub mod tags;
pub mod vault;

pub use error::{Error, Result};
