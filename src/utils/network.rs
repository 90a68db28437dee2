// Network utilities - Target normalization, DNS resolution, socket helpers

use crate::Result;
use crate::constants::HTTPS_PREFIX;
use crate::error::GraphError;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::*;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use url::{Host, Url};

/// Target information
#[derive(Debug, Clone)]
pub struct Target {
    pub hostname: String,
    pub port: u16,
    pub ip_addresses: Vec<IpAddr>,
}

impl Target {
    /// Resolve a hostname (optionally carrying a scheme and port) into a target
    pub async fn parse(input: &str, default_port: u16) -> Result<Self> {
        let (hostname, port) = parse_host_port(input, default_port)?;
        let ip_addresses = resolve_hostname(&hostname).await?;

        Ok(Self {
            hostname,
            port,
            ip_addresses,
        })
    }

    /// Get all socket addresses
    pub fn socket_addrs(&self) -> Vec<SocketAddr> {
        self.ip_addresses
            .iter()
            .map(|ip| SocketAddr::new(*ip, self.port))
            .collect()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

/// Turn a hostname into an absolute URI string.
///
/// Inputs without a leading scheme are treated as HTTPS URLs; a leading `//` is
/// stripped before the prefix is added.
pub fn normalize_uri(input: &str) -> String {
    let input = input.trim();
    if has_scheme(input) {
        return input.to_string();
    }

    let bare = input.strip_prefix("//").unwrap_or(input);
    format!("{}{}", HTTPS_PREFIX, bare)
}

/// Whether `input` starts with `scheme://` (RFC 3986 scheme characters)
fn has_scheme(input: &str) -> bool {
    let Some((scheme, _)) = input.split_once("://") else {
        return false;
    };
    scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Whether the authority of an absolute URI spells out a port.
///
/// `Url::port` hides a port equal to the scheme default, so `host:443` has to
/// be detected from the text.
fn has_explicit_port(uri: &str) -> bool {
    let after_scheme = uri.split_once("://").map_or(uri, |(_, rest)| rest);
    let authority = after_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let after_host = host_port.rsplit_once(']').map_or(host_port, |(_, rest)| rest);
    after_host
        .rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty())
}

/// Extract host and port from a hostname or URI without touching the network
pub fn parse_host_port(input: &str, default_port: u16) -> Result<(String, u16)> {
    let uri = normalize_uri(input);
    let url = Url::parse(&uri).map_err(|e| GraphError::InvalidTarget {
        input: input.to_string(),
        reason: e.to_string(),
    })?;

    let hostname = match url.host() {
        Some(Host::Domain(domain)) => domain.to_string(),
        Some(Host::Ipv4(ip)) => ip.to_string(),
        Some(Host::Ipv6(ip)) => ip.to_string(),
        None => {
            return Err(GraphError::InvalidTarget {
                input: input.to_string(),
                reason: "No hostname in URI".to_string(),
            });
        }
    };

    let port = match url.port() {
        Some(port) => port,
        None if has_explicit_port(&uri) => url.port_or_known_default().unwrap_or(default_port),
        None => default_port,
    };

    Ok((hostname, port))
}

/// Resolve hostname to IP addresses
pub async fn resolve_hostname(hostname: &str) -> Result<Vec<IpAddr>> {
    // Check if it's already an IP address
    if let Ok(ip) = hostname.parse::<IpAddr>() {
        return Ok(vec![ip]);
    }

    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());

    let response = resolver
        .lookup_ip(hostname)
        .await
        .map_err(|e| GraphError::DnsResolutionFailed {
            hostname: hostname.to_string(),
            reason: e.to_string(),
        })?;

    let ips: Vec<IpAddr> = response.iter().collect();

    if ips.is_empty() {
        return Err(GraphError::DnsResolutionFailed {
            hostname: hostname.to_string(),
            reason: "No IP addresses found".to_string(),
        });
    }

    Ok(ips)
}

/// Connect to the first reachable address of `target`.
///
/// `connect_timeout` bounds the whole attempt across every address, not each
/// address separately.
pub async fn connect_with_timeout(target: &Target, connect_timeout: Duration) -> Result<TcpStream> {
    let attempts = async {
        let mut last_error = None;

        for addr in target.socket_addrs() {
            match TcpStream::connect(addr).await {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    tracing::debug!("Connect to {} failed: {}", addr, e);
                    last_error = Some(GraphError::ConnectionFailure {
                        target: target.to_string(),
                        reason: format!("{}: {}", addr, e),
                    });
                }
            }
        }

        Err(last_error.unwrap_or_else(|| GraphError::ConnectionFailure {
            target: target.to_string(),
            reason: "No addresses to connect to".to_string(),
        }))
    };

    match timeout(connect_timeout, attempts).await {
        Ok(result) => result,
        Err(_) => {
            tracing::debug!("Connect to {} timed out", target);
            Err(GraphError::ConnectionTimeout {
                duration: connect_timeout,
                target: target.to_string(),
            })
        }
    }
}
