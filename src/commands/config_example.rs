// ConfigExampleCommand - Write a default configuration file
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use super::Command;
use crate::config::IngestConfig;
use crate::error::GraphError;
use crate::{Args, Result};
use async_trait::async_trait;

pub struct ConfigExampleCommand {
    args: Args,
}

impl ConfigExampleCommand {
    pub fn new(args: Args) -> Self {
        Self { args }
    }
}

#[async_trait]
impl Command for ConfigExampleCommand {
    async fn execute(&self) -> Result<()> {
        let path = self
            .args
            .config_example
            .as_ref()
            .ok_or_else(|| GraphError::InvalidInput {
                message: "--config-example requires a file path".to_string(),
            })?;

        IngestConfig::create_example(path)?;
        println!("✓ Example configuration saved to: {}", path.display());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ConfigExampleCommand"
    }
}
