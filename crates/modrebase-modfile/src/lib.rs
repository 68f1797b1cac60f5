//! `go.mod` manifest model for modrebase.
//!
//! This crate defines the manifest layer: parsing `go.mod` text into a
//! [`Manifest`], canonical formatting, the cleanup normalization applied before
//! writing, atomic file output, and Go module version precedence.

pub mod format;
pub mod manifest;
pub mod normalize;
pub mod parse;
pub mod version;

pub use format::{must_quote, quote};
pub use manifest::{
    Manifest, ModfileError, ModuleVersion, ReplaceTarget, Replacement, Requirement, Retraction,
};
pub use parse::{parse_manifest_file, parse_manifest_str};
