// Scanner module - Host-by-host chain ingestion

pub mod ingest;

pub use ingest::{ChainIngestor, ChainSource, HostOutcome, IngestSummary};
