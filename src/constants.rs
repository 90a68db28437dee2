// CertGraph - TLS certificate chain collector
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

//! Shared defaults for chain extraction and tree merging.

use std::time::Duration;

/// Port used when the target does not carry one
pub const DEFAULT_TLS_PORT: u16 = 443;

/// Scheme prefixed to bare hostnames before URI parsing
pub const HTTPS_PREFIX: &str = "https://";

/// Default connect/handshake timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Default connect/handshake timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(DEFAULT_TIMEOUT_MS);

/// Maximum number of levels attached below a tree root in one merge
///
/// Longer chains are truncated, keeping the part closest to the root.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Default directory holding one `<thumbprint>.json` tree per root
pub const DEFAULT_OUTPUT_DIR: &str = ".tmp/";

/// Extension of persisted tree documents
pub const TREE_FILE_EXTENSION: &str = "json";

/// Probe file written to confirm the output directory is writable
pub const WRITABLE_PROBE_FILE: &str = "writable.txt";

/// Progress dot printed every N ingested hosts
pub const PROGRESS_DOT_INTERVAL: usize = 25;

/// Progress summary line printed every N ingested hosts
pub const PROGRESS_LINE_INTERVAL: usize = 500;
