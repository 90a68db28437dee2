// Output configuration arguments
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use clap::Args;
use std::path::PathBuf;

/// Tree output and display options
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Directory holding one JSON tree per root certificate thumbprint
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Maximum chain levels stored below a root per merge
    #[arg(long = "max-depth", value_name = "N")]
    pub max_depth: Option<usize>,

    /// Write indented JSON trees
    #[arg(long = "pretty")]
    pub pretty: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}
