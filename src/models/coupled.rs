//! Connection management of coupled models.  Every operation validates
//! its arguments before touching the graph, so a rejected operation
//! leaves the graph unchanged.  Operations made of several mutations run
//! inside a transaction restoring the graph on failure.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{ModelGraph, ModelId, PortSide};
use crate::utils::errors::DevsGraphError;

/// Internal connection between two children, by child names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicConnection {
    pub source: String,
    pub source_port: String,
    pub destination: String,
    pub destination_port: String,
}

type SavedConnection = (ModelId, String, ModelId, String);

impl ModelGraph {
    /// Runs `operation`, restoring the graph as it was if it fails.
    pub(crate) fn transaction<T, F>(&mut self, operation: F) -> Result<T, DevsGraphError>
    where
        F: FnOnce(&mut Self) -> Result<T, DevsGraphError>,
    {
        let backup = self.clone();
        let result = operation(self);
        if result.is_err() {
            *self = backup;
            self.touch();
        }
        result
    }

    fn check_endpoint(
        &self,
        coupled: ModelId,
        model: ModelId,
        operation: &'static str,
        endpoint: &'static str,
    ) -> Result<(), DevsGraphError> {
        if model == coupled {
            return Err(DevsGraphError::SelfConnection {
                operation,
                endpoint,
                model: self.describe(coupled),
            });
        }
        self.check_child(coupled, model)
    }

    fn require_port(&self, model: ModelId, side: PortSide, port: &str) -> Result<(), DevsGraphError> {
        if self.port_list(model, side, port).is_some() {
            Ok(())
        } else {
            let direction = match side {
                PortSide::Input | PortSide::InternalInput => "input",
                PortSide::Output | PortSide::InternalOutput => "output",
            };
            Err(self.port_not_found(model, direction, port))
        }
    }

    fn link(&mut self, a: ModelId, side_a: PortSide, port_a: &str, b: ModelId, side_b: PortSide, port_b: &str) {
        if let Some(list) = self.port_list_mut(a, side_a, port_a) {
            list.add(b, port_b);
        }
        if let Some(list) = self.port_list_mut(b, side_b, port_b) {
            list.add(a, port_a);
        }
        self.touch();
    }

    fn unlink(&mut self, a: ModelId, side_a: PortSide, port_a: &str, b: ModelId, side_b: PortSide, port_b: &str) {
        if let Some(list) = self.port_list_mut(a, side_a, port_a) {
            list.remove(b, port_b);
        }
        if let Some(list) = self.port_list_mut(b, side_b, port_b) {
            list.remove(a, port_a);
        }
        self.touch();
    }

    fn paired(&self, a: ModelId, side_a: PortSide, port_a: &str, b: ModelId, side_b: PortSide, port_b: &str) -> usize {
        let forward = self
            .port_list(a, side_a, port_a)
            .map_or(0, |list| list.count(b, port_b));
        let backward = self
            .port_list(b, side_b, port_b)
            .map_or(0, |list| list.count(a, port_a));
        forward.min(backward)
    }

    fn check_internal(
        &self,
        coupled: ModelId,
        operation: &'static str,
        src: ModelId,
        src_port: &str,
        dst: ModelId,
        dst_port: &str,
    ) -> Result<(), DevsGraphError> {
        self.coupled(coupled)?;
        self.check_endpoint(coupled, src, operation, "the source")?;
        self.check_endpoint(coupled, dst, operation, "the destination")?;
        self.require_port(src, PortSide::Output, src_port)?;
        self.require_port(dst, PortSide::Input, dst_port)
    }

    fn check_input(
        &self,
        coupled: ModelId,
        operation: &'static str,
        port: &str,
        dst: ModelId,
        dst_port: &str,
    ) -> Result<(), DevsGraphError> {
        self.coupled(coupled)?;
        self.check_endpoint(coupled, dst, operation, "the destination")?;
        self.require_port(coupled, PortSide::InternalInput, port)?;
        self.require_port(dst, PortSide::Input, dst_port)
    }

    fn check_output(
        &self,
        coupled: ModelId,
        operation: &'static str,
        src: ModelId,
        src_port: &str,
        port: &str,
    ) -> Result<(), DevsGraphError> {
        self.coupled(coupled)?;
        self.check_endpoint(coupled, src, operation, "the source")?;
        self.require_port(src, PortSide::Output, src_port)?;
        self.require_port(coupled, PortSide::InternalOutput, port)
    }

    /// Connects the output port of a child to the input port of a child.
    pub fn add_internal_connection(
        &mut self,
        coupled: ModelId,
        src: ModelId,
        src_port: &str,
        dst: ModelId,
        dst_port: &str,
    ) -> Result<(), DevsGraphError> {
        self.check_internal(coupled, "add an internal connection", src, src_port, dst, dst_port)?;
        self.link(src, PortSide::Output, src_port, dst, PortSide::Input, dst_port);
        Ok(())
    }

    /// Same as [`ModelGraph::add_internal_connection`] with child names.
    pub fn add_internal_connection_by_name(
        &mut self,
        coupled: ModelId,
        src: &str,
        src_port: &str,
        dst: &str,
        dst_port: &str,
    ) -> Result<(), DevsGraphError> {
        let src = self.child_by_name(coupled, src)?;
        let dst = self.child_by_name(coupled, dst)?;
        self.add_internal_connection(coupled, src, src_port, dst, dst_port)
    }

    fn child_by_name(&self, coupled: ModelId, name: &str) -> Result<ModelId, DevsGraphError> {
        self.coupled(coupled)?
            .child(name)
            .ok_or_else(|| DevsGraphError::NotAChild {
                model: name.to_string(),
                parent: self.describe(coupled),
            })
    }

    /// Bridges an input port of the coupled model to an input port of a
    /// child.
    pub fn add_input_connection(
        &mut self,
        coupled: ModelId,
        port: &str,
        dst: ModelId,
        dst_port: &str,
    ) -> Result<(), DevsGraphError> {
        self.check_input(coupled, "add an input connection", port, dst, dst_port)?;
        self.link(coupled, PortSide::InternalInput, port, dst, PortSide::Input, dst_port);
        Ok(())
    }

    /// Bridges an output port of a child to an output port of the coupled
    /// model.
    pub fn add_output_connection(
        &mut self,
        coupled: ModelId,
        src: ModelId,
        src_port: &str,
        port: &str,
    ) -> Result<(), DevsGraphError> {
        self.check_output(coupled, "add an output connection", src, src_port, port)?;
        self.link(src, PortSide::Output, src_port, coupled, PortSide::InternalOutput, port);
        Ok(())
    }

    pub fn del_internal_connection(
        &mut self,
        coupled: ModelId,
        src: ModelId,
        src_port: &str,
        dst: ModelId,
        dst_port: &str,
    ) -> Result<(), DevsGraphError> {
        self.check_internal(coupled, "delete an internal connection", src, src_port, dst, dst_port)?;
        self.unlink(src, PortSide::Output, src_port, dst, PortSide::Input, dst_port);
        Ok(())
    }

    pub fn del_input_connection(
        &mut self,
        coupled: ModelId,
        port: &str,
        dst: ModelId,
        dst_port: &str,
    ) -> Result<(), DevsGraphError> {
        self.check_input(coupled, "delete an input connection", port, dst, dst_port)?;
        self.unlink(coupled, PortSide::InternalInput, port, dst, PortSide::Input, dst_port);
        Ok(())
    }

    pub fn del_output_connection(
        &mut self,
        coupled: ModelId,
        src: ModelId,
        src_port: &str,
        port: &str,
    ) -> Result<(), DevsGraphError> {
        self.check_output(coupled, "delete an output connection", src, src_port, port)?;
        self.unlink(src, PortSide::Output, src_port, coupled, PortSide::InternalOutput, port);
        Ok(())
    }

    /// Removes every connection of a child with its siblings and with the
    /// coupled model.  The internal connections of a coupled child are
    /// kept.
    pub fn del_all_connection(&mut self, coupled: ModelId, model: ModelId) -> Result<(), DevsGraphError> {
        self.check_child(coupled, model)?;
        let node = self.get(model)?;
        let inputs: Vec<(String, ModelId, String)> = flatten(node.input_ports.iter());
        let outputs: Vec<(String, ModelId, String)> = flatten(node.output_ports.iter());
        for (port, peer, peer_port) in &inputs {
            self.unlink_input(model, port, *peer, peer_port);
        }
        for (port, peer, peer_port) in &outputs {
            self.unlink_output(model, port, *peer, peer_port);
        }
        let node = self.get_mut(model)?;
        node.input_ports.clear_connections();
        node.output_ports.clear_connections();
        self.touch();
        Ok(())
    }

    /// True if the internal connection is registered on both sides.
    pub fn exist_internal_connection(
        &self,
        coupled: ModelId,
        src: ModelId,
        src_port: &str,
        dst: ModelId,
        dst_port: &str,
    ) -> bool {
        self.nb_internal_connection(coupled, src, src_port, dst, dst_port) > 0
    }

    pub fn exist_input_connection(&self, coupled: ModelId, port: &str, dst: ModelId, dst_port: &str) -> bool {
        self.nb_input_connection(coupled, port, dst, dst_port) > 0
    }

    pub fn exist_output_connection(&self, coupled: ModelId, src: ModelId, src_port: &str, port: &str) -> bool {
        self.nb_output_connection(coupled, src, src_port, port) > 0
    }

    /// Number of internal connections between the two ports registered on
    /// both sides.  Port lists are sets, so this is 0 or 1.
    pub fn nb_internal_connection(
        &self,
        coupled: ModelId,
        src: ModelId,
        src_port: &str,
        dst: ModelId,
        dst_port: &str,
    ) -> usize {
        if self.check_internal(coupled, "count internal connections", src, src_port, dst, dst_port).is_err() {
            return 0;
        }
        self.paired(src, PortSide::Output, src_port, dst, PortSide::Input, dst_port)
    }

    pub fn nb_input_connection(&self, coupled: ModelId, port: &str, dst: ModelId, dst_port: &str) -> usize {
        if self.check_input(coupled, "count input connections", port, dst, dst_port).is_err() {
            return 0;
        }
        self.paired(coupled, PortSide::InternalInput, port, dst, PortSide::Input, dst_port)
    }

    pub fn nb_output_connection(&self, coupled: ModelId, src: ModelId, src_port: &str, port: &str) -> usize {
        if self.check_output(coupled, "count output connections", src, src_port, port).is_err() {
            return 0;
        }
        self.paired(src, PortSide::Output, src_port, coupled, PortSide::InternalOutput, port)
    }

    /// Internal connections leaving the given children, by names.
    pub fn basic_connections(&self, coupled: ModelId, models: &[ModelId]) -> Result<Vec<BasicConnection>, DevsGraphError> {
        let mut connections = Vec::new();
        for model in models {
            self.check_child(coupled, *model)?;
            let node = self.get(*model)?;
            for (port, peer, peer_port) in flatten(node.output_ports.iter()) {
                if peer == coupled {
                    continue;
                }
                connections.push(BasicConnection {
                    source: node.name().to_string(),
                    source_port: port,
                    destination: self.name(peer)?.to_string(),
                    destination_port: peer_port,
                });
            }
        }
        Ok(connections)
    }

    /// Adds every internal connection of the list, or none of them.
    pub fn set_basic_connections(&mut self, coupled: ModelId, connections: &[BasicConnection]) -> Result<(), DevsGraphError> {
        self.transaction(|graph| {
            for connection in connections {
                graph
                    .add_internal_connection_by_name(
                        coupled,
                        &connection.source,
                        &connection.source_port,
                        &connection.destination,
                        &connection.destination_port,
                    )
                    .map_err(|_| DevsGraphError::BasicConnection {
                        source_model: connection.source.clone(),
                        source_port: connection.source_port.clone(),
                        destination_model: connection.destination.clone(),
                        destination_port: connection.destination_port.clone(),
                    })?;
            }
            Ok(())
        })
    }

    /// Substitutes the detached model `new` for the child `old`: `new`
    /// receives the ports and the connections of `old`, then `old` is
    /// deleted.
    pub fn replace(&mut self, coupled: ModelId, old: ModelId, new: ModelId) -> Result<(), DevsGraphError> {
        self.check_child(coupled, old)?;
        let replacement = self.get(new)?;
        if replacement.parent().is_some() || new == self.root() {
            return Err(DevsGraphError::AlreadyAttached(replacement.name().to_string()));
        }
        let old_node = self.get(old)?;
        if replacement.name() != old_node.name() {
            if let Some(existing) = self.find_model(coupled, replacement.name()) {
                return Err(DevsGraphError::DuplicateModel {
                    model: self.describe(existing),
                    parent: self.describe(coupled),
                });
            }
        }
        let inputs = flatten(old_node.input_ports.iter());
        let outputs = flatten(old_node.output_ports.iter());
        let input_ports: Vec<String> = old_node.input_ports.names().map(String::from).collect();
        let output_ports: Vec<String> = old_node.output_ports.names().map(String::from).collect();

        self.transaction(|graph| {
            for port in &input_ports {
                graph.add_input_port(new, port)?;
            }
            for port in &output_ports {
                graph.add_output_port(new, port)?;
            }
            graph.del_model(coupled, old)?;
            graph.add_model(coupled, new)?;
            for (port, peer, peer_port) in &inputs {
                if *peer == coupled {
                    graph.add_input_connection(coupled, peer_port, new, port)?;
                } else {
                    let peer = if *peer == old { new } else { *peer };
                    graph.add_internal_connection(coupled, peer, peer_port, new, port)?;
                }
            }
            for (port, peer, peer_port) in &outputs {
                if *peer == coupled {
                    graph.add_output_connection(coupled, new, port, peer_port)?;
                } else if *peer != old {
                    graph.add_internal_connection(coupled, new, port, *peer, peer_port)?;
                }
            }
            Ok(())
        })
    }

    /// Moves children of `source` into `destination`.
    ///
    /// Connections between moved models are kept.  A connection with a
    /// model left behind is kept only if `destination` is a child of
    /// `source` and the other end is `source` or one of its children: the
    /// connection is then routed through a new port of `destination`.
    /// Ports are named after the peer port, suffixed `_1`, `_2`, ... on
    /// collision, and a peer port feeding several moved models is bridged
    /// once.  Any other external connection makes the displace fail with
    /// [`DevsGraphError::ConnectionProblem`] and the graph unchanged.
    pub fn displace(&mut self, source: ModelId, models: &[ModelId], destination: ModelId) -> Result<(), DevsGraphError> {
        self.coupled(source)?;
        self.coupled(destination)?;
        let moving: BTreeSet<ModelId> = models.iter().copied().collect();
        for model in &moving {
            self.check_child(source, *model)?;
            if self.is_ancestor(*model, destination) {
                return Err(DevsGraphError::InvalidDestination(self.describe(destination)));
            }
        }
        if destination == source {
            return Err(DevsGraphError::InvalidDestination(self.describe(destination)));
        }
        let destination_node = self.coupled(destination)?;
        for model in &moving {
            let name = self.name(*model)?;
            if destination_node.child(name).is_some() {
                return Err(DevsGraphError::DuplicateModel {
                    model: name.to_string(),
                    parent: self.describe(destination),
                });
            }
        }

        let mut inputs: Vec<SavedConnection> = Vec::new();
        let mut outputs: Vec<SavedConnection> = Vec::new();
        for model in &moving {
            let node = self.get(*model)?;
            for (port, peer, peer_port) in flatten(node.input_ports.iter()) {
                inputs.push((*model, port, peer, peer_port));
            }
            for (port, peer, peer_port) in flatten(node.output_ports.iter()) {
                outputs.push((*model, port, peer, peer_port));
            }
        }
        let nested = self.parent(destination)? == Some(source);
        for (model, port, peer, _) in inputs.iter().chain(outputs.iter()) {
            if moving.contains(peer) {
                continue;
            }
            let promotable = nested
                && *peer != destination
                && (*peer == source || self.parent(*peer)? == Some(source));
            if !promotable {
                return Err(DevsGraphError::ConnectionProblem(format!(
                    "'{}' port '{}' is connected to '{}'",
                    self.describe(*model),
                    port,
                    self.describe(*peer)
                )));
            }
        }

        self.transaction(|graph| {
            for model in &moving {
                graph.detach_model(source, *model)?;
            }
            for model in &moving {
                graph.add_model(destination, *model)?;
            }
            graph.restore_inputs(source, destination, &moving, &inputs)?;
            graph.restore_outputs(source, destination, &moving, &outputs)
        })
    }

    fn free_port_name(&self, model: ModelId, side: PortSide, base: &str) -> String {
        let mut name = base.to_string();
        let mut index = 0;
        while self.port_list(model, side, &name).is_some() {
            index += 1;
            name = format!("{}_{}", base, index);
        }
        name
    }

    fn restore_inputs(
        &mut self,
        source: ModelId,
        destination: ModelId,
        moving: &BTreeSet<ModelId>,
        inputs: &[SavedConnection],
    ) -> Result<(), DevsGraphError> {
        let mut bridges: BTreeMap<(ModelId, String), String> = BTreeMap::new();
        for (model, port, peer, peer_port) in inputs {
            if moving.contains(peer) {
                self.add_internal_connection(destination, *peer, peer_port, *model, port)?;
                continue;
            }
            let bridge = match bridges.get(&(*peer, peer_port.clone())) {
                Some(bridge) => bridge.clone(),
                None => {
                    let bridge = self.free_port_name(destination, PortSide::Input, peer_port);
                    self.add_input_port(destination, &bridge)?;
                    bridges.insert((*peer, peer_port.clone()), bridge.clone());
                    bridge
                }
            };
            self.add_input_connection(destination, &bridge, *model, port)?;
            if *peer == source {
                if !self.exist_input_connection(source, peer_port, destination, &bridge) {
                    self.add_input_connection(source, peer_port, destination, &bridge)?;
                }
            } else if !self.exist_internal_connection(source, *peer, peer_port, destination, &bridge) {
                self.add_internal_connection(source, *peer, peer_port, destination, &bridge)?;
            }
        }
        Ok(())
    }

    fn restore_outputs(
        &mut self,
        source: ModelId,
        destination: ModelId,
        moving: &BTreeSet<ModelId>,
        outputs: &[SavedConnection],
    ) -> Result<(), DevsGraphError> {
        let mut bridges: BTreeMap<(ModelId, String), String> = BTreeMap::new();
        for (model, port, peer, peer_port) in outputs {
            if moving.contains(peer) {
                continue;
            }
            let bridge = match bridges.get(&(*peer, peer_port.clone())) {
                Some(bridge) => bridge.clone(),
                None => {
                    let bridge = self.free_port_name(destination, PortSide::Output, peer_port);
                    self.add_output_port(destination, &bridge)?;
                    bridges.insert((*peer, peer_port.clone()), bridge.clone());
                    bridge
                }
            };
            self.add_output_connection(destination, *model, port, &bridge)?;
            if *peer == source {
                if !self.exist_output_connection(source, destination, &bridge, peer_port) {
                    self.add_output_connection(source, destination, &bridge, peer_port)?;
                }
            } else if !self.exist_internal_connection(source, destination, &bridge, *peer, peer_port) {
                self.add_internal_connection(source, destination, &bridge, *peer, peer_port)?;
            }
        }
        Ok(())
    }

    /// Deep copy of a subtree.  The nodes are copied first, then every
    /// connection whose both ends belong to the subtree is rebuilt between
    /// the copies.  Connections of `model` leaving the subtree are not
    /// copied.  The copy is added to `parent` under `name`, or left
    /// detached.
    pub fn clone_subtree(&mut self, model: ModelId, parent: Option<ModelId>, name: &str) -> Result<ModelId, DevsGraphError> {
        self.get(model)?;
        if let Some(parent) = parent {
            if self.find_model(parent, name).is_some() {
                return Err(DevsGraphError::DuplicateModel {
                    model: name.to_string(),
                    parent: self.describe(parent),
                });
            }
            self.coupled(parent)?;
        }
        let originals = self.subtree(model);
        let mut copies: BTreeMap<ModelId, ModelId> = BTreeMap::new();
        for original in &originals {
            let node = self.get(*original)?;
            let copy = if *original == model {
                node.without_connections(name, None)
            } else {
                node.without_connections(node.name(), None)
            };
            let id = self.alloc(copy);
            copies.insert(*original, id);
        }
        for original in &originals {
            let copy = copies[original];
            let node = self.get(*original)?.clone();
            if let Some(old_parent) = node.parent() {
                if let Some(new_parent) = copies.get(&old_parent) {
                    self.get_mut(copy)?.parent = Some(*new_parent);
                }
            }
            if let Some(coupled) = node.as_coupled() {
                let children = coupled
                    .children
                    .iter()
                    .filter_map(|(child_name, child)| copies.get(child).map(|id| (child_name.clone(), *id)))
                    .collect();
                let target = self.coupled_mut(copy)?;
                target.children = children;
                copy_ports(&coupled.internal_inputs, &mut target.internal_inputs, &copies);
                copy_ports(&coupled.internal_outputs, &mut target.internal_outputs, &copies);
            }
            let target = self.get_mut(copy)?;
            copy_ports(&node.input_ports, &mut target.input_ports, &copies);
            copy_ports(&node.output_ports, &mut target.output_ports, &copies);
        }
        let root_copy = copies[&model];
        if let Some(parent) = parent {
            self.add_model(parent, root_copy)?;
        }
        self.touch();
        Ok(root_copy)
    }
}

fn flatten<'a, I>(ports: I) -> Vec<(String, ModelId, String)>
where
    I: Iterator<Item = (&'a String, &'a super::ModelPortList)>,
{
    ports
        .flat_map(|(port, list)| {
            list.iter()
                .map(move |(peer, peer_port)| (port.clone(), *peer, peer_port.clone()))
        })
        .collect()
}

fn copy_ports(source: &super::ConnectionList, target: &mut super::ConnectionList, copies: &BTreeMap<ModelId, ModelId>) {
    for (port, list) in source.iter() {
        if let Some(target_list) = target.get_mut(port) {
            for (peer, peer_port) in list.iter() {
                if let Some(copy) = copies.get(peer) {
                    target_list.add(*copy, peer_port);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AtomicModel;

    fn leaf(graph: &mut ModelGraph, parent: ModelId, name: &str) -> ModelId {
        let id = graph
            .add_atomic_model(parent, name, AtomicModel::new("dynamics"))
            .unwrap();
        graph.add_input_port(id, "in").unwrap();
        graph.add_output_port(id, "out").unwrap();
        id
    }

    #[test]
    fn internal_connection_needs_children() {
        let mut graph = ModelGraph::new("top");
        let root = graph.root();
        let a = leaf(&mut graph, root, "a");
        graph.add_input_port(root, "in").unwrap();
        assert!(matches!(
            graph.add_internal_connection(root, root, "in", a, "in"),
            Err(DevsGraphError::SelfConnection { .. })
        ));
        assert!(matches!(
            graph.add_internal_connection(root, a, "missing", a, "in"),
            Err(DevsGraphError::PortNotFound { .. })
        ));
        assert!(graph.connections().is_empty());
    }

    #[test]
    fn connection_counts_are_real_counts() {
        let mut graph = ModelGraph::new("top");
        let root = graph.root();
        let a = leaf(&mut graph, root, "a");
        let b = leaf(&mut graph, root, "b");
        assert_eq!(0, graph.nb_internal_connection(root, a, "out", b, "in"));
        graph.add_internal_connection(root, a, "out", b, "in").unwrap();
        graph.add_internal_connection(root, a, "out", b, "in").unwrap();
        assert_eq!(1, graph.nb_internal_connection(root, a, "out", b, "in"));
        graph.add_input_port(root, "x").unwrap();
        graph.add_input_connection(root, "x", a, "in").unwrap();
        assert_eq!(1, graph.nb_input_connection(root, "x", a, "in"));
        assert_eq!(0, graph.nb_input_connection(root, "x", b, "in"));
    }

    #[test]
    fn basic_connections_roll_back() {
        let mut graph = ModelGraph::new("top");
        let root = graph.root();
        leaf(&mut graph, root, "a");
        leaf(&mut graph, root, "b");
        let before = graph.connections();
        let result = graph.set_basic_connections(
            root,
            &[
                BasicConnection {
                    source: "a".into(),
                    source_port: "out".into(),
                    destination: "b".into(),
                    destination_port: "in".into(),
                },
                BasicConnection {
                    source: "b".into(),
                    source_port: "out".into(),
                    destination: "c".into(),
                    destination_port: "in".into(),
                },
            ],
        );
        assert!(matches!(result, Err(DevsGraphError::BasicConnection { .. })));
        assert_eq!(before, graph.connections());
    }

    #[test]
    fn replace_moves_connections() {
        let mut graph = ModelGraph::new("top");
        let root = graph.root();
        let a = leaf(&mut graph, root, "a");
        let b = leaf(&mut graph, root, "b");
        graph.add_internal_connection(root, a, "out", b, "in").unwrap();
        let c = graph.new_atomic_model("c", AtomicModel::new("other"));
        graph.replace(root, b, c).unwrap();
        assert!(!graph.contains(b));
        assert!(graph.exist_internal_connection(root, a, "out", c, "in"));
        assert!(graph.is_consistent());
    }

    #[test]
    fn clone_rebuilds_edges_between_copies() {
        let mut graph = ModelGraph::new("top");
        let root = graph.root();
        let sub = graph.add_coupled_model(root, "sub").unwrap();
        graph.add_input_port(sub, "in").unwrap();
        let a = leaf(&mut graph, sub, "a");
        let b = leaf(&mut graph, sub, "b");
        graph.add_input_connection(sub, "in", a, "in").unwrap();
        graph.add_internal_connection(sub, a, "out", b, "in").unwrap();

        let copy = graph.clone_subtree(sub, Some(root), "copy").unwrap();
        let ca = graph.find_model(copy, "a").unwrap();
        let cb = graph.find_model(copy, "b").unwrap();
        assert_ne!(a, ca);
        assert!(graph.exist_input_connection(copy, "in", ca, "in"));
        assert!(graph.exist_internal_connection(copy, ca, "out", cb, "in"));
        assert!(!graph.exist_internal_connection(copy, a, "out", cb, "in"));
        assert!(graph.is_consistent());
    }
}
