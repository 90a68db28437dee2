// Connection and timeout configuration arguments
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use clap::Args;

/// Connection and timeout configuration options
///
/// Values left unset fall back to the configuration file, then to the
/// built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Connect and handshake timeout in milliseconds
    #[arg(short = 't', long = "timeout", value_name = "MSEC")]
    pub timeout_ms: Option<u64>,

    /// Port used for hostnames that do not carry one
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    pub port: Option<u16>,
}
