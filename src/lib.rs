// CertGraph - TLS certificate chain collector
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

//! CertGraph connects to TLS hosts, captures the certificate chain each one
//! presents, and merges those chains into one tree per root authority, so
//! shared intermediates are stored once alongside every branch observed
//! beneath them.

pub mod certificates;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod graph;
pub mod input;
pub mod scanner;
pub mod utils;

// Re-export commonly used types
pub use crate::certificates::{CertificateRecord, ChainExtractor};
pub use crate::cli::Args;
pub use crate::config::IngestConfig;
pub use crate::error::GraphError;
pub use crate::graph::{CertificateTree, ChainMergeEngine, MergeReport, MergeWarning, TreeStore};

/// Result type for CertGraph operations
pub type Result<T> = std::result::Result<T, GraphError>;
