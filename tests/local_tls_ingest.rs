// Copyright (c) 2025 Marc Rivero López
// Licensed under GPLv3. See LICENSE file for details.
// This test suite runs against a real TLS listener on the loopback interface.

//! Chain Extraction Integration Tests
//!
//! Starts an OpenSSL server presenting a leaf signed by a private test CA and
//! validates:
//! - The extractor returns the chain root first, leaf last
//! - Certificate fields are normalized
//! - Unreachable hosts fail without panicking
//! - Two hosts sharing the CA end up in one tree file

use certgraph::certificates::ChainExtractor;
use certgraph::certificates::extractor::to_record;
use certgraph::graph::{ChainMergeEngine, TreeStore};
use certgraph::scanner::ChainIngestor;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::ssl::{SslAcceptor, SslMethod};
use openssl::x509::extension::{BasicConstraints, KeyUsage};
use openssl::x509::{X509, X509Builder, X509Name, X509NameBuilder};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

struct Issued {
    cert: X509,
    key: PKey<Private>,
}

fn name(cn: &str) -> X509Name {
    let mut builder = X509NameBuilder::new().unwrap();
    builder.append_entry_by_text("O", "CertGraph Test").unwrap();
    builder.append_entry_by_text("CN", cn).unwrap();
    builder.build()
}

fn issue(cn: &str, serial: u32, issuer: Option<&Issued>) -> Issued {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
    let subject = name(cn);

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(serial).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&subject).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(30).unwrap())
        .unwrap();

    match issuer {
        Some(ca) => {
            builder.set_issuer_name(ca.cert.subject_name()).unwrap();
            builder.sign(&ca.key, MessageDigest::sha256()).unwrap();
        }
        None => {
            builder
                .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
                .unwrap();
            builder
                .append_extension(KeyUsage::new().key_cert_sign().crl_sign().build().unwrap())
                .unwrap();
            builder.set_issuer_name(&subject).unwrap();
            builder.sign(&key, MessageDigest::sha256()).unwrap();
        }
    }

    Issued {
        cert: builder.build(),
        key,
    }
}

/// Serve `connections` TLS handshakes presenting `leaf` followed by `ca`
fn serve(leaf: &Issued, ca: &Issued, connections: usize) -> u16 {
    let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls_server()).unwrap();
    acceptor.set_private_key(&leaf.key).unwrap();
    acceptor.set_certificate(&leaf.cert).unwrap();
    acceptor.add_extra_chain_cert(ca.cert.clone()).unwrap();
    acceptor.check_private_key().unwrap();
    let acceptor = acceptor.build();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    thread::spawn(move || {
        for stream in listener.incoming().take(connections) {
            let Ok(stream) = stream else { continue };
            if let Ok(mut tls) = acceptor.accept(stream) {
                let _ = tls.shutdown();
            }
        }
    });

    port
}

#[tokio::test]
async fn test_extract_orders_root_first() {
    let ca = issue("CertGraph Test Root", 1, None);
    let leaf = issue("localhost", 2, Some(&ca));
    let port = serve(&leaf, &ca, 1);

    let extractor = ChainExtractor::new(Duration::from_secs(5));
    let chain = extractor
        .extract(&format!("127.0.0.1:{}", port))
        .await
        .unwrap();

    let ca_record = to_record(&ca.cert).unwrap();
    let leaf_record = to_record(&leaf.cert).unwrap();

    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0].thumbprint, ca_record.thumbprint);
    assert_eq!(chain[1].thumbprint, leaf_record.thumbprint);
    assert_eq!(chain[1].issuer.as_deref(), Some(chain[0].subject.as_str()));
    assert_eq!(chain[1].common_name.as_deref(), Some("localhost"));
    for record in &chain {
        assert_eq!(record.thumbprint, record.thumbprint.to_lowercase());
        assert_eq!(record.serial_number, record.serial_number.to_lowercase());
    }
}

#[tokio::test]
async fn test_extract_accepts_scheme_prefixed_target() {
    let ca = issue("CertGraph Scheme Root", 3, None);
    let leaf = issue("scheme.local", 4, Some(&ca));
    let port = serve(&leaf, &ca, 1);

    let extractor = ChainExtractor::new(Duration::from_secs(5));
    let chain = extractor
        .extract(&format!("https://127.0.0.1:{}/some/path", port))
        .await
        .unwrap();

    assert_eq!(chain.last().unwrap().common_name.as_deref(), Some("scheme.local"));
}

#[tokio::test]
async fn test_extract_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let extractor = ChainExtractor::new(Duration::from_millis(500));
    let err = extractor
        .extract(&format!("127.0.0.1:{}", port))
        .await
        .unwrap_err();

    assert!(err.is_host_failure());
}

#[tokio::test]
async fn test_extract_plain_tcp_is_handshake_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            drop(stream);
        }
    });

    let extractor = ChainExtractor::new(Duration::from_secs(2));
    let err = extractor
        .extract(&format!("127.0.0.1:{}", port))
        .await
        .unwrap_err();

    assert!(matches!(err, certgraph::GraphError::HandshakeFailure { .. }));
}

#[tokio::test]
async fn test_hosts_sharing_a_root_share_a_tree() {
    let ca = issue("CertGraph Shared Root", 10, None);
    let first = issue("first.local", 11, Some(&ca));
    let second = issue("second.local", 12, Some(&ca));
    let first_port = serve(&first, &ca, 1);
    let second_port = serve(&second, &ca, 1);

    let temp = TempDir::new().unwrap();
    let store = TreeStore::open(temp.path()).unwrap();
    let ingestor = ChainIngestor::new(
        ChainExtractor::new(Duration::from_secs(5)),
        ChainMergeEngine::default(),
        store,
    );

    let hosts = vec![
        format!("127.0.0.1:{}", first_port),
        format!("127.0.0.1:{}", second_port),
    ];
    let summary = ingestor.ingest_all(&hosts, |_, _| {}).await.unwrap();
    assert_eq!(summary.ingested, 2);
    assert_eq!(summary.failed, 0);

    let root_thumb = to_record(&ca.cert).unwrap().thumbprint;
    assert_eq!(ingestor.store().root_thumbprints().unwrap(), vec![root_thumb.clone()]);

    let tree = ingestor.store().load(&root_thumb).unwrap().unwrap();
    assert_eq!(tree.len(), 3);
    assert_eq!(tree.children(tree.root()).len(), 2);
    assert!(tree.root_record().issuer.is_some());
}
