//! Node identity, naming, and the ground set.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::error::{Error, Result};

/// Unique identifier for a node in the circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Create a NodeId from a raw value.
    pub fn new(id: u32) -> Self {
        NodeId(id)
    }

    /// Get the raw id value.
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bidirectional mapping between node names and ids.
///
/// Ground is a *set* of node ids rather than a reserved id: any number of
/// nodes may be marked ground, and all of them read as the common 0 V
/// reference. Ids come from a monotone counter; merging nodes leaves holes
/// behind, so ids are dense only until the first merge.
///
/// After a merge the name→id direction becomes many-to-one: every name that
/// resolved to the merged-away node resolves to the surviving node. The
/// id→name direction keeps one canonical name per live id.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    name_to_id: HashMap<String, NodeId>,
    names: BTreeMap<NodeId, String>,
    grounds: BTreeSet<NodeId>,
    next_id: u32,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a node by name, allocating a fresh id if it is unknown.
    pub fn intern(&mut self, name: &str) -> NodeId {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.name_to_id.insert(name.to_string(), id);
        self.names.insert(id, name.to_string());
        id
    }

    /// Look up a node by name without creating it.
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.name_to_id.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.name_to_id.contains_key(name)
    }

    /// Canonical name of a live node.
    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Whether the id refers to a node that has not been merged away.
    pub fn is_live(&self, id: NodeId) -> bool {
        self.names.contains_key(&id)
    }

    /// Live node ids in ascending order.
    pub fn live_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.names.keys().copied()
    }

    /// Number of live nodes, ground included.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn mark_ground(&mut self, id: NodeId) {
        self.grounds.insert(id);
    }

    /// Remove ground membership; false if the id was not ground.
    pub fn unmark_ground(&mut self, id: NodeId) -> bool {
        self.grounds.remove(&id)
    }

    pub fn is_ground(&self, id: NodeId) -> bool {
        self.grounds.contains(&id)
    }

    pub fn has_ground(&self) -> bool {
        !self.grounds.is_empty()
    }

    /// Retarget a node name without disturbing ids.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        if self.name_to_id.contains_key(new) {
            return Err(Error::DuplicateNode(new.to_string()));
        }
        let id = self
            .name_to_id
            .remove(old)
            .ok_or_else(|| Error::UnknownNode(old.to_string()))?;
        self.name_to_id.insert(new.to_string(), id);
        if self.names.get(&id).is_some_and(|n| n == old) {
            self.names.insert(id, new.to_string());
        }
        Ok(())
    }

    /// Fold `src` into `dst`.
    ///
    /// Every name resolving to `src` resolves to `dst` afterwards, ground
    /// membership migrates, and `src`'s reverse-lookup entry is dropped.
    /// The id counter is never decremented: merged ids stay dead holes.
    pub(crate) fn merge(&mut self, src: NodeId, dst: NodeId) {
        if src == dst {
            return;
        }
        for id in self.name_to_id.values_mut() {
            if *id == src {
                *id = dst;
            }
        }
        if self.grounds.remove(&src) {
            self.grounds.insert(dst);
        }
        self.names.remove(&src);
    }

    pub fn clear(&mut self) {
        self.name_to_id.clear();
        self.names.clear();
        self.grounds.clear();
        self.next_id = 0;
    }
}
