// CommandRouter - Routes CLI arguments to appropriate Command
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use super::{Command, ConfigExampleCommand, IngestCommand};
use crate::Args;

/// CommandRouter determines which Command to execute based on CLI arguments
///
/// Priority:
/// 1. Example configuration generation (--config-example)
/// 2. Chain ingestion (default)
pub struct CommandRouter;

impl CommandRouter {
    /// Route CLI arguments to the appropriate Command
    pub fn route(args: Args) -> Box<dyn Command> {
        if args.config_example.is_some() {
            return Box::new(ConfigExampleCommand::new(args));
        }

        Box::new(IngestCommand::new(args))
    }
}
