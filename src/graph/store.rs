// Tree Store - One JSON document per root thumbprint

use crate::Result;
use crate::constants::{TREE_FILE_EXTENSION, WRITABLE_PROBE_FILE};
use crate::error::GraphError;
use crate::graph::tree::{CertificateTree, TreeDocument};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory of persisted certificate trees, keyed by root thumbprint
#[derive(Debug, Clone)]
pub struct TreeStore {
    dir: PathBuf,
    pretty: bool,
}

impl TreeStore {
    /// Open a store, creating the directory when missing.
    ///
    /// An existing directory is probed with a throwaway file to make sure
    /// trees can be written before any host is scanned.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();

        if dir.is_dir() {
            let probe = dir.join(WRITABLE_PROBE_FILE);
            fs::write(&probe, "hello world").map_err(|source| GraphError::FileSystemError {
                path: probe.clone(),
                source,
            })?;
            fs::remove_file(&probe).map_err(|source| GraphError::FileSystemError {
                path: probe.clone(),
                source,
            })?;
        } else {
            fs::create_dir_all(&dir).map_err(|source| GraphError::FileSystemError {
                path: dir.clone(),
                source,
            })?;
        }

        Ok(Self { dir, pretty: false })
    }

    /// Write indented JSON instead of the compact default
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the tree rooted at `thumbprint`
    pub fn path_for(&self, thumbprint: &str) -> Result<PathBuf> {
        if thumbprint.is_empty() || !thumbprint.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(GraphError::InvalidInput {
                message: format!("Thumbprint is not a hex string: {:?}", thumbprint),
            });
        }

        Ok(self
            .dir
            .join(format!("{}.{}", thumbprint.to_lowercase(), TREE_FILE_EXTENSION)))
    }

    /// Load the tree rooted at `thumbprint`, if one was stored
    pub fn load(&self, thumbprint: &str) -> Result<Option<CertificateTree>> {
        let path = self.path_for(thumbprint)?;
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).map_err(|source| GraphError::FileSystemError {
            path: path.clone(),
            source,
        })?;

        let document: TreeDocument = serde_json::from_str(&contents)
            .map_err(|source| GraphError::MalformedPersistedTree {
                path: path.clone(),
                source,
            })?;

        debug!("Loaded tree {}", path.display());
        Ok(Some(CertificateTree::from_document(document)))
    }

    /// Persist `tree` under its root thumbprint, replacing any previous version
    pub fn save(&self, tree: &CertificateTree) -> Result<PathBuf> {
        let path = self.path_for(tree.root_thumbprint())?;
        let document = tree.to_document();

        let json = if self.pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };

        fs::write(&path, json).map_err(|source| GraphError::FileSystemError {
            path: path.clone(),
            source,
        })?;

        debug!("Saved tree {} ({} nodes)", path.display(), tree.len());
        Ok(path)
    }

    /// Thumbprints of every tree currently stored
    pub fn root_thumbprints(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|source| GraphError::FileSystemError {
            path: self.dir.clone(),
            source,
        })?;

        let mut roots = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TREE_FILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && stem.chars().all(|c| c.is_ascii_hexdigit())
            {
                roots.push(stem.to_string());
            }
        }

        roots.sort();
        Ok(roots)
    }
}
