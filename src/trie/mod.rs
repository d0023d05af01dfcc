//! # Copy-on-Write Trie
//!
//! An immutable map from byte strings to typed values. Every mutation
//! returns a *new* trie that shares all untouched structure with its
//! predecessor, so arbitrarily many versions coexist and readers never
//! synchronize.
//!
//! ## Path Copy
//!
//! A `put` copies only the spine from the root to the affected node;
//! everything off the spine is shared by pointer:
//!
//! ```text
//! version 1:   root ── a ── b ── c*        (* = value node)
//!                     │
//!                     └ x ── y*
//!
//! put(b"abd", v) copies root, a, b and adds d; the x─y* subtree and the
//! c* leaf are the same nodes in both versions:
//!
//! version 2:   root'── a'── b'── c*   (shared)
//!                     │         └ d*  (new)
//!                     └ x ── y*       (shared)
//! ```
//!
//! `remove` path-copies the same way and then prunes: a node left with no
//! value and no children is deleted, cascading toward the root until an
//! ancestor still carries a value or another child. Removing the last key
//! leaves a trie with no root at all.
//!
//! ## Typed Values
//!
//! Payloads are stored type-erased and recovered by downcast:
//! `t.put(b"k", 1u32)` then `t.get::<String>(b"k")` observes absence, not
//! an error. Values are moved into the trie (no `Clone` bound) and `get`
//! hands out a borrow that lives as long as the trie handle.
//!
//! ## Concurrency
//!
//! `Trie` is a value: cloning one is a root pointer bump. Nodes are
//! immutable once published and reference counts are atomic, so any number
//! of threads may read any set of versions concurrently without locks.

mod node;

#[cfg(test)]
mod proptests;

use std::any::Any;
use std::sync::Arc;

use node::Payload;

pub use node::TrieNode;

/// Handle to one immutable trie version. Cheap to clone; never mutated.
#[derive(Clone, Default)]
pub struct Trie {
    root: Option<Arc<TrieNode>>,
}

/// Outcome of removing a key from a subtree.
enum Removal {
    /// The key is not present; the subtree is unchanged.
    NotFound,
    /// The subtree survives with a replacement node.
    Replaced(Arc<TrieNode>),
    /// The subtree vanished entirely; the parent must drop its edge.
    Pruned,
}

impl Trie {
    /// The empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this version holds no keys.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Looks up `key`, downcasting the payload to `T`. Absent keys, bare
    /// branch nodes and mismatched payload types all read as `None`.
    pub fn get<T: Any>(&self, key: &[u8]) -> Option<&T> {
        let mut node = self.root.as_deref()?;
        for &byte in key {
            node = node.child(byte)?;
        }
        node.value_as::<T>()
    }

    /// Returns a new version with `value` installed at `key`, replacing any
    /// prior payload. `self` is unchanged and remains fully observable.
    pub fn put<T: Any + Send + Sync>(&self, key: &[u8], value: T) -> Trie {
        let payload: Payload = Arc::new(value);
        let root = put_node(self.root.as_deref(), key, payload);
        Trie {
            root: Some(Arc::new(root)),
        }
    }

    /// Returns a version without `key`. Removing an absent key yields a
    /// version sharing this one's root; removing the last key yields the
    /// empty trie.
    pub fn remove(&self, key: &[u8]) -> Trie {
        let Some(root) = self.root.as_deref() else {
            return self.clone();
        };
        match remove_node(root, key) {
            Removal::NotFound => self.clone(),
            Removal::Replaced(root) => Trie { root: Some(root) },
            Removal::Pruned => Trie { root: None },
        }
    }
}

/// Path-copies `key` into the subtree at `node`, returning the replacement
/// node. Children off the copied spine are reused by pointer.
fn put_node(node: Option<&TrieNode>, key: &[u8], payload: Payload) -> TrieNode {
    match key.split_first() {
        None => {
            // Terminal position: a value node inheriting whatever children
            // already hang here (a key that prefixes another key).
            let children = node.map(|n| n.children.clone()).unwrap_or_default();
            TrieNode::with_value(children, payload)
        }
        Some((&byte, rest)) => {
            let mut copy = node.cloned().unwrap_or_default();
            let child = put_node(copy.child(byte), rest, payload);
            copy.children.insert(byte, Arc::new(child));
            copy
        }
    }
}

/// Removes `key` from the subtree at `node`, pruning childless non-value
/// nodes on the way back up.
fn remove_node(node: &TrieNode, key: &[u8]) -> Removal {
    match key.split_first() {
        None => {
            if !node.is_value_node() {
                return Removal::NotFound;
            }
            if node.children.is_empty() {
                return Removal::Pruned;
            }
            // The key sits above other keys: keep the branch, drop the value.
            Removal::Replaced(Arc::new(TrieNode::branch(node.children.clone())))
        }
        Some((&byte, rest)) => {
            let Some(child) = node.child(byte) else {
                return Removal::NotFound;
            };
            match remove_node(child, rest) {
                Removal::NotFound => Removal::NotFound,
                Removal::Replaced(child) => {
                    let mut copy = node.clone();
                    copy.children.insert(byte, child);
                    Removal::Replaced(Arc::new(copy))
                }
                Removal::Pruned => {
                    let mut copy = node.clone();
                    copy.children.remove(&byte);
                    if copy.children.is_empty() && !copy.is_value_node() {
                        // The cascade continues: this node is now dangling.
                        Removal::Pruned
                    } else {
                        Removal::Replaced(Arc::new(copy))
                    }
                }
            }
        }
    }
}
