use std::collections::BTreeMap;

use super::port::ConnectionList;
use super::ModelId;

/// A node of the model graph: a name unique within its parent, a
/// non-owning reference to that parent, and the two port lists.
#[derive(Debug, Clone)]
pub struct BaseModel {
    pub(crate) name: String,
    pub(crate) parent: Option<ModelId>,
    pub(crate) input_ports: ConnectionList,
    pub(crate) output_ports: ConnectionList,
    pub(crate) kind: ModelKind,
}

#[derive(Debug, Clone)]
pub enum ModelKind {
    Atomic(AtomicModel),
    Coupled(CoupledModel),
}

/// Leaf of the graph.  The names reference the experiment: the dynamics
/// to build, the conditions giving its initialization events, and the
/// observable attaching its ports to views.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomicModel {
    pub dynamics: String,
    pub conditions: Vec<String>,
    pub observables: String,
    pub debug: bool,
}

/// Structural container.  Children are owned through the graph arena:
/// deleting a coupled model deletes its whole subtree.  The internal
/// lists are the child-facing side of the coupled model's own ports.
#[derive(Debug, Clone, Default)]
pub struct CoupledModel {
    pub(crate) children: BTreeMap<String, ModelId>,
    pub(crate) internal_inputs: ConnectionList,
    pub(crate) internal_outputs: ConnectionList,
}

impl BaseModel {
    pub(crate) fn new(name: &str, parent: Option<ModelId>, kind: ModelKind) -> Self {
        Self {
            name: name.to_string(),
            parent,
            input_ports: ConnectionList::new(),
            output_ports: ConnectionList::new(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<ModelId> {
        self.parent
    }

    pub fn input_ports(&self) -> &ConnectionList {
        &self.input_ports
    }

    pub fn output_ports(&self) -> &ConnectionList {
        &self.output_ports
    }

    pub fn kind(&self) -> &ModelKind {
        &self.kind
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self.kind, ModelKind::Atomic(_))
    }

    pub fn is_coupled(&self) -> bool {
        matches!(self.kind, ModelKind::Coupled(_))
    }

    pub fn as_atomic(&self) -> Option<&AtomicModel> {
        match &self.kind {
            ModelKind::Atomic(atomic) => Some(atomic),
            ModelKind::Coupled(_) => None,
        }
    }

    pub fn as_coupled(&self) -> Option<&CoupledModel> {
        match &self.kind {
            ModelKind::Coupled(coupled) => Some(coupled),
            ModelKind::Atomic(_) => None,
        }
    }

    pub(crate) fn as_atomic_mut(&mut self) -> Option<&mut AtomicModel> {
        match &mut self.kind {
            ModelKind::Atomic(atomic) => Some(atomic),
            ModelKind::Coupled(_) => None,
        }
    }

    pub(crate) fn as_coupled_mut(&mut self) -> Option<&mut CoupledModel> {
        match &mut self.kind {
            ModelKind::Coupled(coupled) => Some(coupled),
            ModelKind::Atomic(_) => None,
        }
    }

    /// Copy of the node with the same ports, no connection, no child.
    pub(crate) fn without_connections(&self, name: &str, parent: Option<ModelId>) -> Self {
        let kind = match &self.kind {
            ModelKind::Atomic(atomic) => ModelKind::Atomic(atomic.clone()),
            ModelKind::Coupled(coupled) => ModelKind::Coupled(CoupledModel {
                children: BTreeMap::new(),
                internal_inputs: coupled.internal_inputs.without_connections(),
                internal_outputs: coupled.internal_outputs.without_connections(),
            }),
        };
        Self {
            name: name.to_string(),
            parent,
            input_ports: self.input_ports.without_connections(),
            output_ports: self.output_ports.without_connections(),
            kind,
        }
    }
}

impl AtomicModel {
    pub fn new(dynamics: &str) -> Self {
        Self {
            dynamics: dynamics.to_string(),
            ..Self::default()
        }
    }
}

impl CoupledModel {
    pub fn children(&self) -> impl Iterator<Item = (&str, ModelId)> {
        self.children
            .iter()
            .map(|(name, model)| (name.as_str(), *model))
    }

    pub fn child(&self, name: &str) -> Option<ModelId> {
        self.children.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn internal_inputs(&self) -> &ConnectionList {
        &self.internal_inputs
    }

    pub fn internal_outputs(&self) -> &ConnectionList {
        &self.internal_outputs
    }
}
