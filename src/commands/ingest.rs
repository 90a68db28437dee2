// IngestCommand - Scan hostnames and merge their chains into stored trees
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use super::Command;
use crate::certificates::ChainExtractor;
use crate::constants::{PROGRESS_DOT_INTERVAL, PROGRESS_LINE_INTERVAL};
use crate::graph::{ChainMergeEngine, TreeStore};
use crate::input::{load_hostnames, sanitize_hostname};
use crate::scanner::{ChainIngestor, IngestSummary};
use crate::{Args, Result};
use async_trait::async_trait;
use colored::Colorize;
use std::io::Write;
use tracing::info;

/// IngestCommand handles the default mode:
/// - Loading hostnames from `--hostname` or `--input`
/// - Preparing the tree directory
/// - Extracting and merging every chain, one host at a time
/// - Printing progress and a final summary
pub struct IngestCommand {
    args: Args,
}

impl IngestCommand {
    /// Create a new IngestCommand with the given arguments
    pub fn new(args: Args) -> Self {
        Self { args }
    }

    fn hostnames(&self) -> Result<Vec<String>> {
        if let Some(input) = &self.args.input_file {
            info!("Reading {}", input.display());
            return load_hostnames(input);
        }

        Ok(self
            .args
            .hostname
            .as_deref()
            .and_then(sanitize_hostname)
            .into_iter()
            .collect())
    }
}

/// Print a dot every few hosts and a status line every few hundred
fn print_progress(hostname: &str, summary: &IngestSummary) {
    let counter = summary.ingested;
    if counter == 0 || counter % PROGRESS_DOT_INTERVAL != 0 {
        return;
    }

    print!(".");
    if counter % PROGRESS_LINE_INTERVAL == 0 {
        println!(" ({}, {}/{})", hostname, counter, summary.failed);
    }
    let _ = std::io::stdout().flush();
}

#[async_trait]
impl Command for IngestCommand {
    async fn execute(&self) -> Result<()> {
        self.args.validate()?;
        let config = self.args.ingest_config()?;
        let hostnames = self.hostnames()?;

        let store = TreeStore::open(&config.output_dir)?.with_pretty(config.pretty);
        let extractor =
            ChainExtractor::new(config.timeout()).with_default_port(config.default_port);
        let engine = ChainMergeEngine::new(config.max_depth);
        let ingestor = ChainIngestor::new(extractor, engine, store);

        info!(
            "Ingesting {} host(s) into {}",
            hostnames.len(),
            config.output_dir.display()
        );

        let mut last_ingested = 0;
        let summary = ingestor
            .ingest_all(&hostnames, |hostname, counts| {
                if counts.ingested != last_ingested {
                    last_ingested = counts.ingested;
                    print_progress(hostname, counts);
                }
            })
            .await?;

        println!(
            "\n{} {} ingested, {} failed, {} skipped",
            "[+]".green(),
            summary.ingested.to_string().green(),
            summary.failed.to_string().red(),
            summary.skipped
        );
        if summary.collisions > 0 {
            println!(
                "{} {} thumbprint collision(s) detected",
                "[!]".yellow(),
                summary.collisions
            );
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "IngestCommand"
    }
}
