// Commands module - Command Pattern implementation
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

mod command;
mod config_example;
mod ingest;
mod router;

pub use command::Command;
pub use config_example::ConfigExampleCommand;
pub use ingest::IngestCommand;
pub use router::CommandRouter;
