//! The models module holds the model graph: a hierarchy of atomic and
//! coupled models, with their ports and the three classes of connections
//! (internal, input-bridging and output-bridging).  The graph is an arena
//! addressed by generational [`ModelId`]s, so a reference to a deleted
//! model is detected instead of dereferenced.
//!
//! The graph is built before any simulator exists, either through the
//! methods of [`ModelGraph`] or from a serde description ([`ModelRepr`]),
//! and may be mutated during a run through the coordinator.

use std::collections::BTreeSet;
use std::fmt;

use crate::utils::errors::DevsGraphError;

pub mod coupled;
pub mod model;
pub mod model_repr;
pub mod port;
pub mod targets;

pub use self::coupled::BasicConnection;
pub use self::model::{AtomicModel, BaseModel, CoupledModel, ModelKind};
pub use self::model_repr::{
    ExternalInputCoupling, ExternalOutputCoupling, InternalCoupling, ModelRepr, ModelType,
};
pub use self::port::{ConnectionList, ModelPortList};

/// Handle on a model of a [`ModelGraph`].  The generation makes handles on
/// deleted models stale: they never alias a model created afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId {
    index: u32,
    generation: u32,
}

impl ModelId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    model: Option<BaseModel>,
}

/// One entry of a port list, named by complete model names.  A set of
/// records is a comparable snapshot of the whole graph connectivity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ConnectionRecord {
    pub model: String,
    pub side: PortSide,
    pub port: String,
    pub peer: String,
    pub peer_port: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PortSide {
    Input,
    Output,
    InternalInput,
    InternalOutput,
}

/// Arena owning every model of a simulation.  The root is a coupled
/// model; every other model is either reachable from the root or
/// detached (created but not yet added to a coupled model).
#[derive(Debug, Clone)]
pub struct ModelGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: ModelId,
    revision: u64,
}

impl ModelGraph {
    /// Creates a graph holding a single, empty, root coupled model.
    pub fn new(root_name: &str) -> Self {
        let mut graph = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: ModelId::new(0, 0),
            revision: 0,
        };
        graph.root = graph.alloc(BaseModel::new(
            root_name,
            None,
            ModelKind::Coupled(CoupledModel::default()),
        ));
        graph
    }

    pub fn root(&self) -> ModelId {
        self.root
    }

    /// Incremented by every structural mutation.  Caches built on the
    /// graph compare revisions to detect they are stale.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn touch(&mut self) {
        self.revision += 1;
    }

    fn alloc(&mut self, model: BaseModel) -> ModelId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.model = Some(model);
                ModelId::new(index, slot.generation)
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    model: Some(model),
                });
                ModelId::new((self.slots.len() - 1) as u32, 0)
            }
        }
    }

    fn release(&mut self, id: ModelId) {
        if let Some(slot) = self.slots.get_mut(id.index as usize) {
            if slot.generation == id.generation && slot.model.is_some() {
                slot.model = None;
                slot.generation += 1;
                self.free.push(id.index);
            }
        }
    }

    pub fn contains(&self, id: ModelId) -> bool {
        self.slot(id).is_some()
    }

    fn slot(&self, id: ModelId) -> Option<&BaseModel> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.model.as_ref())
    }

    pub fn get(&self, id: ModelId) -> Result<&BaseModel, DevsGraphError> {
        self.slot(id)
            .ok_or_else(|| DevsGraphError::UnknownModel(id.to_string()))
    }

    pub(crate) fn get_mut(&mut self, id: ModelId) -> Result<&mut BaseModel, DevsGraphError> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.model.as_mut())
            .ok_or_else(|| DevsGraphError::UnknownModel(id.to_string()))
    }

    pub fn name(&self, id: ModelId) -> Result<&str, DevsGraphError> {
        Ok(self.get(id)?.name())
    }

    pub fn parent(&self, id: ModelId) -> Result<Option<ModelId>, DevsGraphError> {
        Ok(self.get(id)?.parent())
    }

    pub fn is_atomic(&self, id: ModelId) -> bool {
        self.slot(id).map_or(false, BaseModel::is_atomic)
    }

    pub fn is_coupled(&self, id: ModelId) -> bool {
        self.slot(id).map_or(false, BaseModel::is_coupled)
    }

    pub fn atomic(&self, id: ModelId) -> Result<&AtomicModel, DevsGraphError> {
        let model = self.get(id)?;
        model
            .as_atomic()
            .ok_or_else(|| DevsGraphError::NotAtomic(model.name().to_string()))
    }

    pub fn atomic_mut(&mut self, id: ModelId) -> Result<&mut AtomicModel, DevsGraphError> {
        let model = self.get_mut(id)?;
        let name = model.name.clone();
        model
            .as_atomic_mut()
            .ok_or(DevsGraphError::NotAtomic(name))
    }

    pub fn coupled(&self, id: ModelId) -> Result<&CoupledModel, DevsGraphError> {
        let model = self.get(id)?;
        model
            .as_coupled()
            .ok_or_else(|| DevsGraphError::NotCoupled(model.name().to_string()))
    }

    pub(crate) fn coupled_mut(&mut self, id: ModelId) -> Result<&mut CoupledModel, DevsGraphError> {
        let model = self.get_mut(id)?;
        let name = model.name.clone();
        model
            .as_coupled_mut()
            .ok_or(DevsGraphError::NotCoupled(name))
    }

    /// Name used in error messages: the complete name of a live model, the
    /// handle otherwise.
    pub(crate) fn describe(&self, id: ModelId) -> String {
        if self.contains(id) {
            self.complete_name(id)
        } else {
            id.to_string()
        }
    }

    /// Names of the ancestors, from the root down to the parent, joined
    /// with `:`.  Empty for the root and for detached models.
    pub fn parent_path(&self, id: ModelId) -> String {
        let mut names = Vec::new();
        let mut current = self.slot(id).and_then(BaseModel::parent);
        while let Some(ancestor) = current {
            match self.slot(ancestor) {
                Some(model) => {
                    names.push(model.name().to_string());
                    current = model.parent();
                }
                None => break,
            }
        }
        names.reverse();
        names.join(":")
    }

    /// The parent path followed by the model name.
    pub fn complete_name(&self, id: ModelId) -> String {
        let name = self.slot(id).map(BaseModel::name).unwrap_or_default();
        let path = self.parent_path(id);
        if path.is_empty() {
            name.to_string()
        } else {
            format!("{}:{}", path, name)
        }
    }

    /// Non-failing lookup of a child by name.
    pub fn find_model(&self, coupled: ModelId, name: &str) -> Option<ModelId> {
        self.slot(coupled)
            .and_then(BaseModel::as_coupled)
            .and_then(|coupled| coupled.child(name))
    }

    /// Alias of [`ModelGraph::find_model`].
    pub fn get_model(&self, coupled: ModelId, name: &str) -> Option<ModelId> {
        self.find_model(coupled, name)
    }

    /// Looks a model up from the root, with a `:` separated path of child
    /// names (`"sub:leaf"`).  The empty path is the root.
    pub fn find_path(&self, path: &str) -> Option<ModelId> {
        path.split(':')
            .filter(|name| !name.is_empty())
            .try_fold(self.root, |current, name| self.find_model(current, name))
    }

    /// True if `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor(&self, ancestor: ModelId, id: ModelId) -> bool {
        let mut current = Some(id);
        while let Some(model) = current {
            if model == ancestor {
                return true;
            }
            current = self.slot(model).and_then(BaseModel::parent);
        }
        false
    }

    /// Every model of the subtree, the given one first.
    pub fn subtree(&self, id: ModelId) -> Vec<ModelId> {
        let mut models = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(model) = self.slot(current) {
                models.push(current);
                if let Some(coupled) = model.as_coupled() {
                    stack.extend(coupled.children.values().rev().copied());
                }
            }
        }
        models
    }

    /// The atomic models of the subtree.
    pub fn atomic_models(&self, id: ModelId) -> Vec<ModelId> {
        self.subtree(id)
            .into_iter()
            .filter(|model| self.is_atomic(*model))
            .collect()
    }

    /*  Ports  */

    /// Adds an input port.  On a coupled model the child-facing side is
    /// created too.  Returns false if the port already existed.
    pub fn add_input_port(&mut self, model: ModelId, port: &str) -> Result<bool, DevsGraphError> {
        let node = self.get_mut(model)?;
        let added = node.input_ports.add_port(port);
        if let Some(coupled) = node.as_coupled_mut() {
            coupled.internal_inputs.add_port(port);
        }
        self.touch();
        Ok(added)
    }

    /// Adds an output port.  On a coupled model the child-facing side is
    /// created too.  Returns false if the port already existed.
    pub fn add_output_port(&mut self, model: ModelId, port: &str) -> Result<bool, DevsGraphError> {
        let node = self.get_mut(model)?;
        let added = node.output_ports.add_port(port);
        if let Some(coupled) = node.as_coupled_mut() {
            coupled.internal_outputs.add_port(port);
        }
        self.touch();
        Ok(added)
    }

    pub fn exist_input_port(&self, model: ModelId, port: &str) -> bool {
        self.slot(model)
            .map_or(false, |node| node.input_ports.exist(port))
    }

    pub fn exist_output_port(&self, model: ModelId, port: &str) -> bool {
        self.slot(model)
            .map_or(false, |node| node.output_ports.exist(port))
    }

    /// Removes an input port and every connection through it, on both
    /// sides of a coupled model.
    pub fn del_input_port(&mut self, model: ModelId, port: &str) -> Result<(), DevsGraphError> {
        let node = self.get(model)?;
        let peers = node
            .input_ports
            .get(port)
            .ok_or_else(|| self.port_not_found(model, "input", port))?
            .clone();
        let children = node
            .as_coupled()
            .and_then(|coupled| coupled.internal_inputs.get(port))
            .cloned()
            .unwrap_or_default();
        for (peer, peer_port) in peers.iter() {
            self.unlink_input(model, port, *peer, peer_port);
        }
        for (child, child_port) in children.iter() {
            if let Some(list) = self.port_list_mut(*child, PortSide::Input, child_port) {
                list.remove(model, port);
            }
        }
        let node = self.get_mut(model)?;
        node.input_ports.remove_port(port);
        if let Some(coupled) = node.as_coupled_mut() {
            coupled.internal_inputs.remove_port(port);
        }
        self.touch();
        Ok(())
    }

    /// Removes an output port and every connection through it, on both
    /// sides of a coupled model.
    pub fn del_output_port(&mut self, model: ModelId, port: &str) -> Result<(), DevsGraphError> {
        let node = self.get(model)?;
        let peers = node
            .output_ports
            .get(port)
            .ok_or_else(|| self.port_not_found(model, "output", port))?
            .clone();
        let children = node
            .as_coupled()
            .and_then(|coupled| coupled.internal_outputs.get(port))
            .cloned()
            .unwrap_or_default();
        for (peer, peer_port) in peers.iter() {
            self.unlink_output(model, port, *peer, peer_port);
        }
        for (child, child_port) in children.iter() {
            if let Some(list) = self.port_list_mut(*child, PortSide::Output, child_port) {
                list.remove(model, port);
            }
        }
        let node = self.get_mut(model)?;
        node.output_ports.remove_port(port);
        if let Some(coupled) = node.as_coupled_mut() {
            coupled.internal_outputs.remove_port(port);
        }
        self.touch();
        Ok(())
    }

    pub(crate) fn port_not_found(&self, model: ModelId, direction: &'static str, port: &str) -> DevsGraphError {
        DevsGraphError::PortNotFound {
            model: self.describe(model),
            direction,
            port: port.to_string(),
        }
    }

    pub(crate) fn port_list(&self, model: ModelId, side: PortSide, port: &str) -> Option<&ModelPortList> {
        let node = self.slot(model)?;
        match side {
            PortSide::Input => node.input_ports.get(port),
            PortSide::Output => node.output_ports.get(port),
            PortSide::InternalInput => node.as_coupled()?.internal_inputs.get(port),
            PortSide::InternalOutput => node.as_coupled()?.internal_outputs.get(port),
        }
    }

    pub(crate) fn port_list_mut(&mut self, model: ModelId, side: PortSide, port: &str) -> Option<&mut ModelPortList> {
        let node = self
            .slots
            .get_mut(model.index as usize)
            .filter(|slot| slot.generation == model.generation)
            .and_then(|slot| slot.model.as_mut())?;
        match side {
            PortSide::Input => node.input_ports.get_mut(port),
            PortSide::Output => node.output_ports.get_mut(port),
            PortSide::InternalInput => node.as_coupled_mut()?.internal_inputs.get_mut(port),
            PortSide::InternalOutput => node.as_coupled_mut()?.internal_outputs.get_mut(port),
        }
    }

    /// Removes the reverse entry of the input connection
    /// (`peer`, `peer_port`) -> (`model`, `port`).
    pub(crate) fn unlink_input(&mut self, model: ModelId, port: &str, peer: ModelId, peer_port: &str) {
        let side = if self.slot(model).and_then(BaseModel::parent) == Some(peer) {
            PortSide::InternalInput
        } else {
            PortSide::Output
        };
        if let Some(list) = self.port_list_mut(peer, side, peer_port) {
            list.remove(model, port);
        }
    }

    /// Removes the reverse entry of the output connection
    /// (`model`, `port`) -> (`peer`, `peer_port`).
    pub(crate) fn unlink_output(&mut self, model: ModelId, port: &str, peer: ModelId, peer_port: &str) {
        let side = if self.slot(model).and_then(BaseModel::parent) == Some(peer) {
            PortSide::InternalOutput
        } else {
            PortSide::Input
        };
        if let Some(list) = self.port_list_mut(peer, side, peer_port) {
            list.remove(model, port);
        }
    }

    /*  Models  */

    /// Creates a detached atomic model, to be attached with
    /// [`ModelGraph::add_model`].
    pub fn new_atomic_model(&mut self, name: &str, atomic: AtomicModel) -> ModelId {
        let id = self.alloc(BaseModel::new(name, None, ModelKind::Atomic(atomic)));
        self.touch();
        id
    }

    /// Creates a detached, empty, coupled model.
    pub fn new_coupled_model(&mut self, name: &str) -> ModelId {
        let id = self.alloc(BaseModel::new(
            name,
            None,
            ModelKind::Coupled(CoupledModel::default()),
        ));
        self.touch();
        id
    }

    fn check_free_name(&self, parent: ModelId, name: &str) -> Result<(), DevsGraphError> {
        if self.coupled(parent)?.children.contains_key(name) {
            Err(DevsGraphError::DuplicateModel {
                model: name.to_string(),
                parent: self.describe(parent),
            })
        } else {
            Ok(())
        }
    }

    pub fn add_atomic_model(
        &mut self,
        parent: ModelId,
        name: &str,
        atomic: AtomicModel,
    ) -> Result<ModelId, DevsGraphError> {
        self.check_free_name(parent, name)?;
        let id = self.alloc(BaseModel::new(name, Some(parent), ModelKind::Atomic(atomic)));
        self.coupled_mut(parent)?.children.insert(name.to_string(), id);
        self.touch();
        Ok(id)
    }

    pub fn add_coupled_model(&mut self, parent: ModelId, name: &str) -> Result<ModelId, DevsGraphError> {
        self.check_free_name(parent, name)?;
        let id = self.alloc(BaseModel::new(
            name,
            Some(parent),
            ModelKind::Coupled(CoupledModel::default()),
        ));
        self.coupled_mut(parent)?.children.insert(name.to_string(), id);
        self.touch();
        Ok(id)
    }

    /// Adds a detached model (and its subtree) as child of `parent`.
    pub fn add_model(&mut self, parent: ModelId, model: ModelId) -> Result<(), DevsGraphError> {
        let node = self.get(model)?;
        if node.parent().is_some() || model == self.root {
            return Err(DevsGraphError::AlreadyAttached(node.name().to_string()));
        }
        if self.is_ancestor(model, parent) {
            return Err(DevsGraphError::NotAChild {
                model: self.describe(parent),
                parent: self.describe(model),
            });
        }
        let name = node.name().to_string();
        self.check_free_name(parent, &name)?;
        self.coupled_mut(parent)?.children.insert(name, model);
        self.get_mut(model)?.parent = Some(parent);
        self.touch();
        Ok(())
    }

    /// Checks `model` is a child of `parent`.
    pub(crate) fn check_child(&self, parent: ModelId, model: ModelId) -> Result<(), DevsGraphError> {
        self.coupled(parent)?;
        let node = self.get(model)?;
        if node.parent() == Some(parent) {
            Ok(())
        } else {
            Err(DevsGraphError::NotAChild {
                model: self.describe(model),
                parent: self.describe(parent),
            })
        }
    }

    /// Removes a child: its connections are removed first, then it is
    /// erased from the children of `parent`, then its subtree is freed.
    pub fn del_model(&mut self, parent: ModelId, model: ModelId) -> Result<(), DevsGraphError> {
        self.check_child(parent, model)?;
        self.del_all_connection(parent, model)?;
        let name = self.get(model)?.name().to_string();
        self.coupled_mut(parent)?.children.remove(&name);
        for id in self.subtree(model) {
            self.release(id);
        }
        self.touch();
        Ok(())
    }

    /// Removes every child of `parent`.
    pub fn del_all_model(&mut self, parent: ModelId) -> Result<(), DevsGraphError> {
        let children: Vec<ModelId> = self.coupled(parent)?.children.values().copied().collect();
        for child in children {
            self.del_model(parent, child)?;
        }
        Ok(())
    }

    /// Frees a detached model and its subtree.
    pub fn destroy(&mut self, model: ModelId) -> Result<(), DevsGraphError> {
        let node = self.get(model)?;
        if node.parent().is_some() || model == self.root {
            return Err(DevsGraphError::AlreadyAttached(node.name().to_string()));
        }
        for id in self.subtree(model) {
            self.release(id);
        }
        self.touch();
        Ok(())
    }

    /// Moves a model under `parent`, detaching it first from its current
    /// parent.  Its connections with its former siblings are removed.
    pub fn attach_model(&mut self, parent: ModelId, model: ModelId) -> Result<(), DevsGraphError> {
        let node = self.get(model)?;
        let name = node.name().to_string();
        if self.coupled(parent)?.children.get(&name) == Some(&model) {
            return Err(DevsGraphError::AlreadyAttached(name));
        }
        self.check_free_name(parent, &name)?;
        if self.is_ancestor(model, parent) {
            return Err(DevsGraphError::NotAChild {
                model: self.describe(parent),
                parent: self.describe(model),
            });
        }
        if let Some(current) = node.parent() {
            self.detach_model(current, model)?;
        }
        self.coupled_mut(parent)?.children.insert(name, model);
        self.get_mut(model)?.parent = Some(parent);
        self.touch();
        Ok(())
    }

    pub fn attach_models(&mut self, parent: ModelId, models: &[ModelId]) -> Result<(), DevsGraphError> {
        models
            .iter()
            .try_for_each(|model| self.attach_model(parent, *model))
    }

    /// Detaches a child: its connections are removed, then it is erased
    /// from the children of `parent` and left without parent.
    pub fn detach_model(&mut self, parent: ModelId, model: ModelId) -> Result<(), DevsGraphError> {
        self.check_child(parent, model)?;
        self.del_all_connection(parent, model)?;
        let name = self.get(model)?.name().to_string();
        self.coupled_mut(parent)?.children.remove(&name);
        self.get_mut(model)?.parent = None;
        self.touch();
        Ok(())
    }

    pub fn detach_models(&mut self, parent: ModelId, models: &[ModelId]) -> Result<(), DevsGraphError> {
        models
            .iter()
            .try_for_each(|model| self.detach_model(parent, *model))
    }

    /*  Consistency  */

    /// Lists every half-connection without its reverse entry.  Empty for a
    /// consistent graph.
    pub fn consistency_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            let model = match &slot.model {
                Some(model) => model,
                None => continue,
            };
            let id = ModelId::new(index as u32, slot.generation);
            let mut check = |side: PortSide, port: &str, peer: ModelId, peer_port: &str, reverse: PortSide| {
                let paired = self
                    .port_list(peer, reverse, peer_port)
                    .map_or(false, |list| list.exist(id, port));
                if !paired {
                    errors.push(format!(
                        "{} {:?} {} -> {} {} has no reverse entry",
                        self.describe(id),
                        side,
                        port,
                        self.describe(peer),
                        peer_port
                    ));
                }
            };
            for (port, list) in model.input_ports.iter() {
                for (peer, peer_port) in list.iter() {
                    let reverse = if model.parent() == Some(*peer) {
                        PortSide::InternalInput
                    } else {
                        PortSide::Output
                    };
                    check(PortSide::Input, port, *peer, peer_port, reverse);
                }
            }
            for (port, list) in model.output_ports.iter() {
                for (peer, peer_port) in list.iter() {
                    let reverse = if model.parent() == Some(*peer) {
                        PortSide::InternalOutput
                    } else {
                        PortSide::Input
                    };
                    check(PortSide::Output, port, *peer, peer_port, reverse);
                }
            }
            if let Some(coupled) = model.as_coupled() {
                for (port, list) in coupled.internal_inputs.iter() {
                    for (child, child_port) in list.iter() {
                        check(PortSide::InternalInput, port, *child, child_port, PortSide::Input);
                    }
                }
                for (port, list) in coupled.internal_outputs.iter() {
                    for (child, child_port) in list.iter() {
                        check(PortSide::InternalOutput, port, *child, child_port, PortSide::Output);
                    }
                }
            }
        }
        errors
    }

    pub fn is_consistent(&self) -> bool {
        self.consistency_errors().is_empty()
    }

    /// Snapshot of every port list entry of the graph.
    pub fn connections(&self) -> BTreeSet<ConnectionRecord> {
        let mut records = BTreeSet::new();
        for (index, slot) in self.slots.iter().enumerate() {
            let model = match &slot.model {
                Some(model) => model,
                None => continue,
            };
            let id = ModelId::new(index as u32, slot.generation);
            let mut sides = vec![
                (PortSide::Input, &model.input_ports),
                (PortSide::Output, &model.output_ports),
            ];
            if let Some(coupled) = model.as_coupled() {
                sides.push((PortSide::InternalInput, &coupled.internal_inputs));
                sides.push((PortSide::InternalOutput, &coupled.internal_outputs));
            }
            for (side, ports) in sides {
                for (port, list) in ports.iter() {
                    for (peer, peer_port) in list.iter() {
                        records.insert(ConnectionRecord {
                            model: self.complete_name(id),
                            side,
                            port: port.clone(),
                            peer: self.describe(*peer),
                            peer_port: peer_port.clone(),
                        });
                    }
                }
            }
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deleted_model_handles_are_stale() {
        let mut graph = ModelGraph::new("top");
        let root = graph.root();
        let a = graph
            .add_atomic_model(root, "a", AtomicModel::new("dynamics"))
            .unwrap();
        graph.del_model(root, a).unwrap();
        assert!(!graph.contains(a));
        let b = graph
            .add_atomic_model(root, "b", AtomicModel::new("dynamics"))
            .unwrap();
        assert_ne!(a, b);
        assert!(graph.get(a).is_err());
        assert_eq!("b", graph.name(b).unwrap());
    }

    #[test]
    fn paths_and_names() {
        let mut graph = ModelGraph::new("top");
        let root = graph.root();
        let sub = graph.add_coupled_model(root, "sub").unwrap();
        let leaf = graph
            .add_atomic_model(sub, "leaf", AtomicModel::new("dynamics"))
            .unwrap();
        assert_eq!("top:sub", graph.parent_path(leaf));
        assert_eq!("top:sub:leaf", graph.complete_name(leaf));
        assert_eq!(Some(leaf), graph.find_path("sub:leaf"));
        assert_eq!(Some(root), graph.find_path(""));
        assert_eq!(vec![leaf], graph.atomic_models(root));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut graph = ModelGraph::new("top");
        let root = graph.root();
        graph.add_coupled_model(root, "sub").unwrap();
        assert_eq!(
            Err(DevsGraphError::DuplicateModel {
                model: String::from("sub"),
                parent: String::from("top"),
            }),
            graph.add_coupled_model(root, "sub")
        );
    }
}
