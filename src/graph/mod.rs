// Graph module - Per-root certificate trees and the chain merge engine

pub mod merge;
pub mod store;
pub mod tree;

pub use merge::{ChainMergeEngine, MergeReport, MergeWarning};
pub use store::TreeStore;
pub use tree::{CertificateTree, NodeId, TreeDocument};
