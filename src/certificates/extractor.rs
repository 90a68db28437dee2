// Chain Extractor - Capture the certificate chain offered by a TLS peer

use crate::Result;
use crate::certificates::record::CertificateRecord;
use crate::constants::{DEFAULT_TIMEOUT, DEFAULT_TLS_PORT};
use crate::error::GraphError;
use crate::utils::network::{Target, connect_with_timeout};
use openssl::hash::MessageDigest;
use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode};
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::{X509, X509Ref, X509StoreContext};
use std::time::Duration;
use tracing::debug;
use x509_parser::prelude::*;

/// Performs one TLS handshake per host and returns the peer's chain,
/// ordered root first and leaf last.
///
/// The server certificate is never validated: the chain is observed, not
/// trusted.
#[derive(Debug, Clone)]
pub struct ChainExtractor {
    timeout: Duration,
    default_port: u16,
}

impl Default for ChainExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ChainExtractor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            default_port: DEFAULT_TLS_PORT,
        }
    }

    /// Port used when the hostname does not specify one
    pub fn with_default_port(mut self, port: u16) -> Self {
        self.default_port = port;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Connect to `hostname` and return its chain as root → … → leaf.
    ///
    /// Resolution, connect and handshake failures are returned as errors; no
    /// retry is attempted. The connection is closed before returning.
    pub async fn extract(&self, hostname: &str) -> Result<Vec<CertificateRecord>> {
        let target = Target::parse(hostname, self.default_port).await?;
        let stream = connect_with_timeout(&target, self.timeout).await?;

        // OpenSSL drives a blocking socket; bound every read and write
        let std_stream = stream.into_std()?;
        std_stream.set_nonblocking(false)?;
        std_stream.set_read_timeout(Some(self.timeout))?;
        std_stream.set_write_timeout(Some(self.timeout))?;

        let sni_host = target.hostname.clone();
        let label = target.to_string();
        let chain = tokio::task::spawn_blocking(move || {
            let presented = handshake(std_stream, &sni_host, &label)?;
            build_chain(&presented)
        })
        .await??;

        let mut records = chain
            .iter()
            .map(|cert| to_record(cert))
            .collect::<Result<Vec<_>>>()?;

        // the chain builder yields leaf → root
        records.reverse();

        debug!("Captured {} certificate(s) from {}", records.len(), target);
        Ok(records)
    }
}

/// Run the client handshake and return the certificates the peer presented,
/// leaf first.
fn handshake(stream: std::net::TcpStream, sni_host: &str, label: &str) -> Result<Vec<X509>> {
    let handshake_error = |details: String| GraphError::HandshakeFailure {
        target: label.to_string(),
        details,
    };

    let mut builder = SslConnector::builder(SslMethod::tls_client())?;
    builder.set_verify(SslVerifyMode::NONE);
    let connector = builder.build();

    let mut config = connector.configure()?;
    config.set_verify_hostname(false);

    let mut ssl_stream = config
        .connect(sni_host, stream)
        .map_err(|e| handshake_error(e.to_string()))?;

    let presented: Vec<X509> = match ssl_stream.ssl().peer_cert_chain() {
        Some(chain) if !chain.is_empty() => chain.iter().map(|cert| cert.to_owned()).collect(),
        _ => ssl_stream.ssl().peer_certificate().into_iter().collect(),
    };

    if let Err(e) = ssl_stream.shutdown() {
        debug!("TLS shutdown with {} failed: {}", label, e);
    }

    if presented.is_empty() {
        return Err(GraphError::NoPeerCertificates {
            target: label.to_string(),
        });
    }

    Ok(presented)
}

/// Let OpenSSL assemble the chain for the presented leaf, using the other
/// presented certificates as untrusted intermediates and the system trust
/// store for anchors. Verification failures are ignored; whatever chain was
/// built is returned, leaf first. When the builder links nothing to the leaf,
/// the presented chain is returned as is.
pub fn build_chain(presented: &[X509]) -> Result<Vec<X509>> {
    let Some((leaf, intermediates)) = presented.split_first() else {
        return Ok(Vec::new());
    };

    let mut store_builder = X509StoreBuilder::new()?;
    store_builder.set_default_paths()?;
    let store = store_builder.build();

    let mut untrusted = Stack::new()?;
    for cert in intermediates {
        untrusted.push(cert.clone())?;
    }

    let mut context = X509StoreContext::new()?;
    let built = context.init(&store, leaf, &untrusted, |ctx| {
        if !ctx.verify_cert()? {
            debug!("Chain does not verify ({}), keeping it anyway", ctx.error());
        }
        Ok(ctx
            .chain()
            .map(|chain| chain.iter().map(|cert| cert.to_owned()).collect::<Vec<_>>())
            .unwrap_or_default())
    })?;

    // nothing linked to the leaf: keep the order the peer sent
    if built.len() <= 1 && presented.len() > 1 {
        return Ok(presented.to_vec());
    }
    Ok(built)
}

/// Reduce a certificate to the fields stored in the tree
pub fn to_record(cert: &X509Ref) -> Result<CertificateRecord> {
    let thumbprint = hex::encode(&*cert.digest(MessageDigest::sha1())?);
    let der = cert.to_der()?;

    let (_, parsed) = X509Certificate::from_der(&der).map_err(|e| GraphError::CertificateParse {
        details: format!("Failed to parse certificate {}: {}", thumbprint, e),
    })?;

    let serial_number = hex::encode(parsed.raw_serial());
    let subject = parsed.subject().to_string();
    let issuer = parsed.issuer().to_string();
    let expiry = parsed.validity().not_after.to_string();

    let mut record = CertificateRecord::new(&thumbprint, &serial_number, &subject)
        .with_issuer(&issuer)
        .with_expiry(&expiry);

    if let Some(cn) = parsed
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
    {
        record = record.with_common_name(cn);
    }

    Ok(record)
}
