use std::collections::btree_map;
use std::collections::btree_set;
use std::collections::{BTreeMap, BTreeSet};

use super::ModelId;

/// A duplicate-free set of (model, port) pairs, the peers one port is
/// connected to.  The pairs are purely relational: a `ModelPortList` never
/// keeps a model alive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelPortList {
    peers: BTreeSet<(ModelId, String)>,
}

impl ModelPortList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the pair was already in the list.
    pub fn add(&mut self, model: ModelId, port: &str) -> bool {
        self.peers.insert((model, port.to_string()))
    }

    /// Returns false if the pair was not in the list.
    pub fn remove(&mut self, model: ModelId, port: &str) -> bool {
        self.peers.remove(&(model, port.to_string()))
    }

    pub fn exist(&self, model: ModelId, port: &str) -> bool {
        self.peers
            .iter()
            .any(|(peer, peer_port)| *peer == model && peer_port == port)
    }

    /// Number of entries matching the pair.
    pub fn count(&self, model: ModelId, port: &str) -> usize {
        self.peers
            .iter()
            .filter(|(peer, peer_port)| *peer == model && peer_port == port)
            .count()
    }

    /// Removes every pair pointing to `model`.
    pub fn remove_model(&mut self, model: ModelId) {
        self.peers.retain(|(peer, _)| *peer != model);
    }

    pub fn merge(&mut self, other: &ModelPortList) {
        self.peers.extend(other.peers.iter().cloned());
    }

    pub fn clear(&mut self) {
        self.peers.clear();
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, (ModelId, String)> {
        self.peers.iter()
    }
}

impl<'a> IntoIterator for &'a ModelPortList {
    type Item = &'a (ModelId, String);
    type IntoIter = btree_set::Iter<'a, (ModelId, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.peers.iter()
    }
}

/// The ports of one side of a model, each with its list of peers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionList {
    ports: BTreeMap<String, ModelPortList>,
}

impl ConnectionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the port already exists; its peers are kept.
    pub fn add_port(&mut self, port: &str) -> bool {
        if self.ports.contains_key(port) {
            false
        } else {
            self.ports.insert(port.to_string(), ModelPortList::new());
            true
        }
    }

    pub fn remove_port(&mut self, port: &str) -> Option<ModelPortList> {
        self.ports.remove(port)
    }

    pub fn exist(&self, port: &str) -> bool {
        self.ports.contains_key(port)
    }

    pub fn get(&self, port: &str) -> Option<&ModelPortList> {
        self.ports.get(port)
    }

    pub fn get_mut(&mut self, port: &str) -> Option<&mut ModelPortList> {
        self.ports.get_mut(port)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ports.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Empties every port, keeping the port names.
    pub fn clear_connections(&mut self) {
        self.ports.values_mut().for_each(ModelPortList::clear);
    }

    /// A copy holding the same ports, without any peer.
    pub fn without_connections(&self) -> Self {
        Self {
            ports: self
                .ports
                .keys()
                .map(|port| (port.clone(), ModelPortList::new()))
                .collect(),
        }
    }

    /// Total number of (port, peer) entries.
    pub fn connection_count(&self) -> usize {
        self.ports.values().map(ModelPortList::len).sum()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ModelPortList> {
        self.ports.iter()
    }
}

impl<'a> IntoIterator for &'a ConnectionList {
    type Item = (&'a String, &'a ModelPortList);
    type IntoIter = btree_map::Iter<'a, String, ModelPortList>;

    fn into_iter(self) -> Self::IntoIter {
        self.ports.iter()
    }
}
