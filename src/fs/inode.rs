//! Inode numbering for the path-based node tree
//!
//! Nodes are rebuilt on every lookup; the table keeps one stable inode per
//! path and retains the latest node built for it.

use crate::fs::node::Node;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Inode of the mount root
pub const ROOT_INO: u64 = fuser::FUSE_ROOT_ID;

pub struct InodeTable {
    next_ino: AtomicU64,
    by_path: RwLock<HashMap<String, u64>>,
    nodes: RwLock<HashMap<u64, Arc<Node>>>,
}

impl InodeTable {
    /// Table holding the root node at [`ROOT_INO`]
    pub fn new(root: Node) -> Self {
        let table = InodeTable {
            next_ino: AtomicU64::new(ROOT_INO + 1),
            by_path: RwLock::new(HashMap::new()),
            nodes: RwLock::new(HashMap::new()),
        };
        table.by_path.write().insert(root.path().to_string(), ROOT_INO);
        table.nodes.write().insert(ROOT_INO, Arc::new(root));
        table
    }

    /// Inode for a path, allocating one if the path is new
    pub fn ino_for(&self, path: &str) -> u64 {
        if let Some(ino) = self.by_path.read().get(path) {
            return *ino;
        }
        let mut by_path = self.by_path.write();
        *by_path
            .entry(path.to_string())
            .or_insert_with(|| self.next_ino.fetch_add(1, Ordering::SeqCst))
    }

    /// Register a freshly built node, replacing any older node at its path
    pub fn insert(&self, node: Node) -> (u64, Arc<Node>) {
        let ino = self.ino_for(node.path());
        let node = Arc::new(node);
        self.nodes.write().insert(ino, Arc::clone(&node));
        (ino, node)
    }

    pub fn get(&self, ino: u64) -> Option<Arc<Node>> {
        self.nodes.read().get(&ino).cloned()
    }

    /// Drop the node behind an inode; the number stays reserved for its path
    pub fn forget(&self, ino: u64) {
        if ino != ROOT_INO {
            self.nodes.write().remove(&ino);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }
}
