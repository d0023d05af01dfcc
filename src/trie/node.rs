//! # Trie Nodes
//!
//! One node of the copy-on-write trie: an ordered map from edge byte to
//! shared child, plus an optional type-erased value payload.
//!
//! Nodes are deeply immutable once published. A node may be shared by any
//! number of trie versions simultaneously; `Arc` reference counting keeps
//! it alive exactly as long as its longest-living holder. Mutation never
//! touches a published node: the trie operations build fresh nodes and
//! re-point parents at them (see the path-copy discussion in the module
//! docs of [`crate::trie`]).
//!
//! The payload is an `Arc<dyn Any + Send + Sync>`, the tagged-union
//! rendition of a typed value slot: `Trie::get::<T>` recovers the payload
//! by downcast and observes absence on a type mismatch. Because `Clone` on
//! a node clones the child map of `Arc`s and the payload `Arc`, a plain
//! `clone()` is exactly the shallow copy path copying needs: a value node
//! clones as a value node.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Type-erased, shared value payload.
pub(super) type Payload = Arc<dyn Any + Send + Sync>;

/// A trie node: ordered children, optional value.
#[derive(Clone, Default)]
pub struct TrieNode {
    pub(super) children: BTreeMap<u8, Arc<TrieNode>>,
    pub(super) value: Option<Payload>,
}

impl TrieNode {
    /// A value node carrying `payload` above the given children.
    pub(super) fn with_value(children: BTreeMap<u8, Arc<TrieNode>>, payload: Payload) -> Self {
        Self {
            children,
            value: Some(payload),
        }
    }

    /// A non-value node over the given children.
    pub(super) fn branch(children: BTreeMap<u8, Arc<TrieNode>>) -> Self {
        Self {
            children,
            value: None,
        }
    }

    /// Whether this node terminates a key.
    pub fn is_value_node(&self) -> bool {
        self.value.is_some()
    }

    pub(super) fn child(&self, byte: u8) -> Option<&TrieNode> {
        self.children.get(&byte).map(Arc::as_ref)
    }

    /// Downcasts the payload. `None` if this is not a value node or the
    /// payload is of a different type.
    pub(super) fn value_as<T: Any>(&self) -> Option<&T> {
        self.value.as_deref()?.downcast_ref::<T>()
    }
}
