// Chain Merge Engine - Fold root-to-leaf chains into certificate trees

use crate::certificates::record::{CertificateRecord, normalize_hex};
use crate::constants::DEFAULT_MAX_DEPTH;
use crate::error::GraphError;
use crate::graph::tree::{CertificateTree, NodeId};
use crate::Result;
use std::fmt;
use tracing::{debug, warn};

/// Non-fatal findings raised while ingesting a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeWarning {
    /// Stored root and observed root share a thumbprint but not a subject
    ThumbprintCollision {
        thumbprint: String,
        stored_subject: String,
        observed_subject: String,
    },
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeWarning::ThumbprintCollision {
                thumbprint,
                stored_subject,
                observed_subject,
            } => write!(
                f,
                "Collision for {}: stored subject \"{}\", observed \"{}\"",
                thumbprint, stored_subject, observed_subject
            ),
        }
    }
}

/// Outcome of one merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Certificates attached as new nodes
    pub added: usize,
    /// Certificates matched to an already stored node
    pub reused: usize,
    /// Certificates dropped because the chain exceeded the depth bound
    pub truncated: usize,
    /// The tree was created by this merge rather than loaded
    pub created_tree: bool,
    pub warnings: Vec<MergeWarning>,
}

impl MergeReport {
    pub fn has_collision(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, MergeWarning::ThumbprintCollision { .. }))
    }
}

/// Merges observed chains into per-root certificate trees.
///
/// The engine holds no state besides its depth bound; concurrent merges into
/// the same tree must be serialized by the caller.
#[derive(Debug, Clone, Copy)]
pub struct ChainMergeEngine {
    max_depth: usize,
}

impl Default for ChainMergeEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl ChainMergeEngine {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Ingest a full root-to-leaf chain.
    ///
    /// With no `existing` tree a new one is started from `chain[0]`. With an
    /// existing tree, its root must carry the chain's root thumbprint; a subject
    /// mismatch on that root is reported as a collision and the merge proceeds.
    pub fn ingest(
        &self,
        existing: Option<CertificateTree>,
        chain: &[CertificateRecord],
    ) -> Result<(CertificateTree, MergeReport)> {
        let (head, tail) = chain.split_first().ok_or(GraphError::EmptyChain)?;
        let mut head = head.clone();
        head.normalize();

        let mut report = MergeReport::default();
        let mut tree = match existing {
            Some(tree) => {
                if tree.root_thumbprint() != head.thumbprint {
                    return Err(GraphError::RootMismatch {
                        expected: tree.root_thumbprint().to_string(),
                        found: head.thumbprint.clone(),
                    });
                }

                let stored_subject = &tree.root_record().subject;
                if *stored_subject != head.subject {
                    let warning = MergeWarning::ThumbprintCollision {
                        thumbprint: head.thumbprint.clone(),
                        stored_subject: stored_subject.clone(),
                        observed_subject: head.subject.clone(),
                    };
                    warn!("{}", warning);
                    report.warnings.push(warning);
                }
                tree
            }
            None => {
                report.created_tree = true;
                CertificateTree::new(head)
            }
        };

        let root = tree.root();
        let merged = self.merge(&mut tree, root, tail);
        report.added = merged.added;
        report.reused = merged.reused;
        report.truncated = merged.truncated;

        Ok((tree, report))
    }

    /// Attach `chain_tail` below `attach_at`, one level per certificate.
    ///
    /// `attach_at` must already represent the certificate preceding the tail.
    /// A certificate whose thumbprint is already a child of the current node is
    /// not stored again; the existing node (with its descendants) becomes the
    /// next attachment point and moves to the end of its parent's child list.
    /// A certificate repeating the thumbprint of its parent is ignored. At most
    /// `max_depth` levels are attached; the rest of the chain is dropped.
    pub fn merge(
        &self,
        tree: &mut CertificateTree,
        attach_at: NodeId,
        chain_tail: &[CertificateRecord],
    ) -> MergeReport {
        let mut report = MergeReport::default();
        let mut cursor = attach_at;
        let mut levels = 0;

        for (position, certificate) in chain_tail.iter().enumerate() {
            let thumbprint = normalize_hex(&certificate.thumbprint);
            if tree.record(cursor).thumbprint == thumbprint {
                debug!("Ignoring {} listed as its own child", thumbprint);
                continue;
            }

            if levels >= self.max_depth {
                report.truncated = chain_tail.len() - position;
                debug!(
                    "Chain exceeds max depth {}, dropping {} certificate(s)",
                    self.max_depth, report.truncated
                );
                break;
            }
            levels += 1;

            cursor = match tree.find_child(cursor, &thumbprint) {
                Some(existing) => {
                    debug!("Reusing stored node {}", thumbprint);
                    tree.move_child_to_end(cursor, existing);
                    report.reused += 1;
                    existing
                }
                None => {
                    debug!("Attaching new node {}", thumbprint);
                    report.added += 1;
                    tree.push_child(cursor, certificate.clone())
                }
            };
        }

        debug_assert!(tree.has_unique_children());
        report
    }
}
