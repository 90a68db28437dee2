// Certificate Tree - Arena-backed forest fragment rooted at one authority

use crate::certificates::record::{CertificateRecord, normalize_hex};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Index of a node inside a [`CertificateTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct TreeNode {
    record: CertificateRecord,
    children: Vec<NodeId>,
}

/// Tree of certificates sharing one root authority.
///
/// Nodes live in a flat arena and reference their children by index. Nodes are
/// only ever appended, so a child always has a higher index than its parent.
#[derive(Debug, Clone)]
pub struct CertificateTree {
    nodes: Vec<TreeNode>,
}

/// Nested on-disk shape of a tree: a record with its `children` inline.
///
/// Empty fields (including an empty `children` list) are omitted on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDocument {
    #[serde(flatten)]
    pub record: CertificateRecord,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeDocument>,
}

impl TreeDocument {
    pub fn leaf(record: CertificateRecord) -> Self {
        Self {
            record,
            children: Vec::new(),
        }
    }
}

impl CertificateTree {
    /// Start a tree from a freshly observed root record.
    ///
    /// The root keeps its `issuer`, since nothing above it records that yet.
    pub fn new(mut root: CertificateRecord) -> Self {
        root.normalize();
        Self {
            nodes: vec![TreeNode {
                record: root,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root_record(&self) -> &CertificateRecord {
        &self.nodes[0].record
    }

    pub fn root_thumbprint(&self) -> &str {
        &self.nodes[0].record.thumbprint
    }

    pub fn record(&self, id: NodeId) -> &CertificateRecord {
        &self.nodes[id.0].record
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Number of certificates stored in the tree, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always holds its root
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over all node ids; parents are always yielded before their children
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Find the direct child of `parent` carrying `thumbprint`, in any case
    pub fn find_child(&self, parent: NodeId, thumbprint: &str) -> Option<NodeId> {
        let thumbprint = normalize_hex(thumbprint);
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|child| self.nodes[child.0].record.thumbprint == thumbprint)
    }

    /// Append `record` as the last child of `parent`, normalizing its identity
    /// and clearing its issuer.
    ///
    /// Callers must check [`find_child`](Self::find_child) first; this does not
    /// deduplicate.
    pub(crate) fn push_child(&mut self, parent: NodeId, mut record: CertificateRecord) -> NodeId {
        record.normalize();
        record.clear_issuer();
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode {
            record,
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Move an existing child to the end of its parent's child list
    pub(crate) fn move_child_to_end(&mut self, parent: NodeId, child: NodeId) {
        let children = &mut self.nodes[parent.0].children;
        if let Some(pos) = children.iter().position(|c| *c == child) {
            let id = children.remove(pos);
            children.push(id);
        }
    }

    /// Number of levels in the tree, counting the root as one
    pub fn depth(&self) -> usize {
        let mut levels = vec![0usize; self.nodes.len()];
        levels[0] = 1;
        let mut deepest = 1;
        for (index, node) in self.nodes.iter().enumerate() {
            for child in &node.children {
                levels[child.0] = levels[index] + 1;
                deepest = deepest.max(levels[child.0]);
            }
        }
        deepest
    }

    /// Whether no node lists two children with the same thumbprint
    pub fn has_unique_children(&self) -> bool {
        self.nodes.iter().all(|node| {
            let mut seen = std::collections::HashSet::new();
            node.children
                .iter()
                .all(|child| seen.insert(self.nodes[child.0].record.thumbprint.as_str()))
        })
    }

    /// Build a tree from its persisted shape.
    ///
    /// Identity fields are normalized by deserialization; children of one node
    /// that share a thumbprint are folded into the first occurrence, and the
    /// issuer is dropped from every non-root record.
    pub fn from_document(document: TreeDocument) -> Self {
        let TreeDocument { record, children } = document;
        let mut tree = Self::new(record);

        let mut pending: VecDeque<(NodeId, TreeDocument)> =
            children.into_iter().map(|child| (NodeId(0), child)).collect();

        while let Some((parent, TreeDocument { mut record, children })) = pending.pop_front() {
            record.normalize();
            let id = match tree.find_child(parent, &record.thumbprint) {
                Some(existing) => {
                    tracing::debug!(
                        "Folding duplicate child {} under {}",
                        record.thumbprint,
                        tree.record(parent).thumbprint
                    );
                    existing
                }
                None => tree.push_child(parent, record),
            };
            pending.extend(children.into_iter().map(|child| (id, child)));
        }

        tree
    }

    /// Convert to the nested persisted shape
    pub fn to_document(&self) -> TreeDocument {
        let mut built: Vec<Option<TreeDocument>> = vec![None; self.nodes.len()];

        // children have higher indices than parents, so a reverse sweep sees
        // every subtree completed before its parent
        for index in (0..self.nodes.len()).rev() {
            let node = &self.nodes[index];
            let children = node
                .children
                .iter()
                .filter_map(|child| built[child.0].take())
                .collect();
            built[index] = Some(TreeDocument {
                record: node.record.clone(),
                children,
            });
        }

        built[0]
            .take()
            .unwrap_or_else(|| TreeDocument::leaf(self.nodes[0].record.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cert(thumb: &str) -> CertificateRecord {
        CertificateRecord::new(thumb, "01", &format!("CN={}", thumb)).with_issuer("CN=Parent")
    }

    #[test]
    fn test_new_tree_keeps_root_issuer() {
        let tree = CertificateTree::new(cert("AA"));
        assert_eq!(tree.root_thumbprint(), "aa");
        assert_eq!(tree.root_record().issuer.as_deref(), Some("CN=Parent"));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_push_child_clears_issuer() {
        let mut tree = CertificateTree::new(cert("aa"));
        let child = tree.push_child(tree.root(), cert("bb"));
        assert!(tree.record(child).issuer.is_none());
        assert_eq!(tree.find_child(tree.root(), "bb"), Some(child));
        assert_eq!(tree.find_child(tree.root(), "cc"), None);
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn test_push_child_normalizes_literal_record() {
        let mut tree = CertificateTree::new(cert("aa"));
        let raw = CertificateRecord {
            thumbprint: "AB:12".to_string(),
            serial_number: "0F".to_string(),
            ..Default::default()
        };
        let child = tree.push_child(tree.root(), raw);

        assert_eq!(tree.record(child).thumbprint, "ab12");
        assert_eq!(tree.record(child).serial_number, "0f");
        assert_eq!(tree.find_child(tree.root(), "AB12"), Some(child));
    }

    #[test]
    fn test_move_child_to_end() {
        let mut tree = CertificateTree::new(cert("aa"));
        let root = tree.root();
        let b = tree.push_child(root, cert("bb"));
        let c = tree.push_child(root, cert("cc"));
        tree.move_child_to_end(root, b);
        assert_eq!(tree.children(root), &[c, b]);
    }

    #[test]
    fn test_document_round_trip() {
        let mut tree = CertificateTree::new(cert("aa"));
        let root = tree.root();
        let b = tree.push_child(root, cert("bb"));
        tree.push_child(b, cert("cc"));
        tree.push_child(root, cert("dd"));

        let document = tree.to_document();
        assert_eq!(document.children.len(), 2);
        assert_eq!(document.children[0].record.thumbprint, "bb");
        assert_eq!(document.children[0].children[0].record.thumbprint, "cc");
        assert_eq!(document.children[1].record.thumbprint, "dd");

        let rebuilt = CertificateTree::from_document(document.clone());
        assert_eq!(rebuilt.to_document(), document);
    }

    #[test]
    fn test_from_document_folds_duplicates() {
        let json = r#"{
            "sub": "CN=Root", "thumb": "AA", "iss": "CN=Root",
            "children": [
                {"sub": "CN=Int", "thumb": "BB", "iss": "CN=Root",
                 "children": [{"sub": "CN=Leaf1", "thumb": "C1"}]},
                {"sub": "CN=Int", "thumb": "bb",
                 "children": [{"sub": "CN=Leaf2", "thumb": "C2"}]}
            ]
        }"#;
        let document: TreeDocument = serde_json::from_str(json).unwrap();
        let tree = CertificateTree::from_document(document);

        assert!(tree.has_unique_children());
        assert_eq!(tree.children(tree.root()).len(), 1);
        let b = tree.find_child(tree.root(), "bb").unwrap();
        assert!(tree.record(b).issuer.is_none());
        assert_eq!(tree.children(b).len(), 2);
        assert_eq!(tree.root_record().issuer.as_deref(), Some("CN=Root"));
    }

    #[test]
    fn test_sparse_document_encoding() {
        let tree = CertificateTree::new(CertificateRecord::new("aa", "", "CN=Root"));
        let json = serde_json::to_string(&tree.to_document()).unwrap();
        assert_eq!(json, r#"{"sub":"CN=Root","thumb":"aa"}"#);
    }
}
