//! Portico Common - Shared types and utilities
//!
//! This crate provides the request context types, error definitions,
//! configuration, and per-request diagnostics used across Portico
//! components.

pub mod config;
pub mod diag;
pub mod error;
pub mod types;

pub use config::Config;
pub use diag::Diagnostics;
pub use error::{Error, ErrorKind, Result};
pub use types::*;
