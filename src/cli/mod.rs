// CLI module - Command line interface and argument parsing
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use crate::Result;
use crate::config::IngestConfig;
use crate::error::GraphError;
use clap::Parser;
use std::path::PathBuf;

mod connection_args;
mod output_args;

pub use connection_args::ConnectionArgs;
pub use output_args::OutputArgs;

/// CertGraph - Collect TLS certificate chains into per-root trees
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
#[command(name = "certgraph")]
pub struct Args {
    // ============ Target Specification and Input ============
    /// Single hostname or URI to scan
    #[arg(short = 'n', long = "hostname", value_name = "HOST")]
    pub hostname: Option<String>,

    /// Input file with one hostname per line
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    pub input_file: Option<PathBuf>,

    // ============ Configuration ============
    /// Load settings from a TOML configuration file
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write an example configuration file and exit
    #[arg(long = "config-example", value_name = "FILE")]
    pub config_example: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl Args {
    /// Validate arguments
    pub fn validate(&self) -> Result<()> {
        if self.config_example.is_some() {
            return Ok(());
        }

        if self.hostname.is_none() && self.input_file.is_none() {
            return Err(GraphError::InvalidInput {
                message: "Either --hostname or --input is required".to_string(),
            });
        }

        if let Some(input) = &self.input_file
            && !input.is_file()
        {
            return Err(GraphError::InvalidInput {
                message: format!("File does not exist: {}", input.display()),
            });
        }

        Ok(())
    }

    /// Resolve the effective configuration: file values, then CLI overrides
    pub fn ingest_config(&self) -> Result<IngestConfig> {
        let mut config = match &self.config {
            Some(path) => IngestConfig::from_file(path)?,
            None => IngestConfig::default(),
        };

        if let Some(dir) = &self.output.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(timeout_ms) = self.connection.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if let Some(port) = self.connection.port {
            config.default_port = port;
        }
        if let Some(max_depth) = self.output.max_depth {
            config.max_depth = max_depth;
        }
        config.pretty = config.pretty || self.output.pretty;

        config.validate()?;
        Ok(config)
    }
}
