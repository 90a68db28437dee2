// Input processing module
// Loads and sanitizes the hostnames to scan

use crate::Result;
use crate::error::GraphError;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Sanitize one input line into a hostname.
///
/// Returns `None` for blank lines and `#` comments; hostnames are lowercased.
pub fn sanitize_hostname(line: &str) -> Option<String> {
    let hostname = line.trim();
    if hostname.is_empty() || hostname.starts_with('#') {
        return None;
    }
    Some(hostname.to_lowercase())
}

/// Load hostnames from a file, one per line
///
/// File format:
/// ```text
/// # Comments start with #
/// example.com
/// https://example.org:8443
/// //internal.corp.com
/// ```
pub fn load_hostnames<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = fs::File::open(path).map_err(|source| GraphError::FileSystemError {
        path: path.to_path_buf(),
        source,
    })?;

    let mut hostnames = Vec::new();
    for line in BufReader::new(file).lines() {
        if let Some(hostname) = sanitize_hostname(&line?) {
            hostnames.push(hostname);
        }
    }

    Ok(hostnames)
}
