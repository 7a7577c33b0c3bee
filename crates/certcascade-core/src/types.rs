//! Strong type definitions for the signer graph.
//!
//! Nodes reference each other through [`NodeIndex`] rather than pointers, so
//! the graph has no ownership cycles and can be cloned or serialized freely.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a certificate node within a [`SignerGraph`](crate::SignerGraph).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIndex(pub usize);

impl NodeIndex {
    /// The root of every graph.
    pub const ROOT: Self = Self(0);

    /// Get the raw arena position.
    pub const fn get(self) -> usize {
        self.0
    }

    pub const fn is_root(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeIndex({})", self.0)
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<usize> for NodeIndex {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// One certificate credential discovered in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateNode {
    /// Store-assigned credential name or path.
    pub name: String,
    /// The signer this certificate was discovered under (`None` for the root).
    pub parent: Option<NodeIndex>,
    /// Children in the order the store listed them.
    pub children: Vec<NodeIndex>,
    /// Distance from the root (root is 0).
    pub depth: usize,
}

impl CertificateNode {
    pub(crate) fn new(name: String, parent: Option<NodeIndex>, depth: usize) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            depth,
        }
    }

    /// Check if this node has no discovered children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
