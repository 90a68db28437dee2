// Chain Ingestor - Extract, merge and persist one host at a time

use crate::Result;
use crate::certificates::record::CertificateRecord;
use crate::certificates::extractor::ChainExtractor;
use crate::graph::{ChainMergeEngine, MergeReport, TreeStore};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{info, warn};

/// Anything able to produce a root-to-leaf chain for a hostname
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn fetch_chain(&self, hostname: &str) -> Result<Vec<CertificateRecord>>;
}

#[async_trait]
impl ChainSource for ChainExtractor {
    async fn fetch_chain(&self, hostname: &str) -> Result<Vec<CertificateRecord>> {
        self.extract(hostname).await
    }
}

/// Result of ingesting one host
#[derive(Debug, Clone)]
pub enum HostOutcome {
    /// Chain merged and the tree written to `path`
    Merged {
        root_thumbprint: String,
        path: PathBuf,
        chain_length: usize,
        report: MergeReport,
    },
    /// Handshake succeeded but yielded no certificates
    EmptyChain,
}

/// Counters for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub ingested: usize,
    pub failed: usize,
    pub skipped: usize,
    pub collisions: usize,
}

/// Drives chain extraction and merging against a tree store.
///
/// Hosts are processed strictly one after another, so each tree file sees a
/// single read-modify-write at a time.
pub struct ChainIngestor<S: ChainSource> {
    source: S,
    engine: ChainMergeEngine,
    store: TreeStore,
}

impl<S: ChainSource> ChainIngestor<S> {
    pub fn new(source: S, engine: ChainMergeEngine, store: TreeStore) -> Self {
        Self {
            source,
            engine,
            store,
        }
    }

    pub fn store(&self) -> &TreeStore {
        &self.store
    }

    /// Fetch the chain for `hostname` and fold it into the tree of its root
    pub async fn ingest_host(&self, hostname: &str) -> Result<HostOutcome> {
        let chain = self.source.fetch_chain(hostname).await?;
        let Some(root) = chain.first() else {
            return Ok(HostOutcome::EmptyChain);
        };

        let existing = self.store.load(&root.thumbprint)?;
        let (tree, report) = self.engine.ingest(existing, &chain)?;
        let path = self.store.save(&tree)?;

        info!(
            "{}: merged {} certificate(s) into {} (+{} new)",
            hostname,
            chain.len(),
            path.display(),
            report.added
        );

        Ok(HostOutcome::Merged {
            root_thumbprint: tree.root_thumbprint().to_string(),
            path,
            chain_length: chain.len(),
            report,
        })
    }

    /// Ingest every hostname in order.
    ///
    /// Per-host failures (resolution, connect, handshake, unreadable tree) are
    /// counted and skipped; anything else, such as a failed write, stops the
    /// run. `on_host` is called after every host with the running summary.
    pub async fn ingest_all<F>(&self, hostnames: &[String], mut on_host: F) -> Result<IngestSummary>
    where
        F: FnMut(&str, &IngestSummary),
    {
        let mut summary = IngestSummary::default();

        for hostname in hostnames {
            match self.ingest_host(hostname).await {
                Ok(HostOutcome::Merged { report, .. }) => {
                    summary.ingested += 1;
                    if report.has_collision() {
                        summary.collisions += 1;
                    }
                }
                Ok(HostOutcome::EmptyChain) => summary.skipped += 1,
                Err(e) if e.is_host_failure() => {
                    warn!("Skipping {}: {}", hostname, e);
                    summary.failed += 1;
                }
                Err(e) => return Err(e),
            }
            on_host(hostname, &summary);
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct FixedChains(HashMap<String, Vec<CertificateRecord>>);

    #[async_trait]
    impl ChainSource for FixedChains {
        async fn fetch_chain(&self, hostname: &str) -> Result<Vec<CertificateRecord>> {
            self.0
                .get(hostname)
                .cloned()
                .ok_or_else(|| GraphError::ConnectionFailure {
                    target: hostname.to_string(),
                    reason: "unreachable".to_string(),
                })
        }
    }

    fn cert(thumb: &str) -> CertificateRecord {
        CertificateRecord::new(thumb, "01", &format!("CN={}", thumb)).with_issuer("CN=up")
    }

    fn ingestor(temp: &TempDir) -> ChainIngestor<FixedChains> {
        let mut chains = HashMap::new();
        chains.insert("a.test".to_string(), vec![cert("aa"), cert("bb"), cert("c1")]);
        chains.insert("b.test".to_string(), vec![cert("aa"), cert("bb"), cert("c2")]);
        chains.insert("other.test".to_string(), vec![cert("ff"), cert("c3")]);
        chains.insert("empty.test".to_string(), Vec::new());

        let store = TreeStore::open(temp.path()).unwrap();
        ChainIngestor::new(FixedChains(chains), ChainMergeEngine::default(), store)
    }

    #[tokio::test]
    async fn test_ingest_all_counts_outcomes() {
        let temp = TempDir::new().unwrap();
        let ingestor = ingestor(&temp);
        let hosts: Vec<String> = ["a.test", "b.test", "down.test", "empty.test", "other.test"]
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut seen = 0;
        let summary = ingestor.ingest_all(&hosts, |_, _| seen += 1).await.unwrap();

        assert_eq!(seen, 5);
        assert_eq!(
            summary,
            IngestSummary {
                ingested: 3,
                failed: 1,
                skipped: 1,
                collisions: 0,
            }
        );
        assert_eq!(
            ingestor.store().root_thumbprints().unwrap(),
            vec!["aa".to_string(), "ff".to_string()]
        );

        let tree = ingestor.store().load("aa").unwrap().unwrap();
        let b = tree.find_child(tree.root(), "bb").unwrap();
        assert_eq!(tree.children(b).len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_tree_skips_host() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("aa.json"), "not json").unwrap();
        let ingestor = ingestor(&temp);

        let summary = ingestor
            .ingest_all(&["a.test".to_string()], |_, _| {})
            .await
            .unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.ingested, 0);
    }
}
