//! Serializable description of a model graph, read from YAML or JSON by
//! the embedding layer.  Couplings name children of the coupled model
//! they are declared in.

use serde::{Deserialize, Serialize};

use super::{AtomicModel, ModelGraph, ModelId};
use crate::utils::errors::{DevsGraphError, SimulationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Atomic,
    Coupled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRepr {
    pub name: String,
    #[serde(rename = "type")]
    pub model_type: ModelType,
    #[serde(default)]
    pub ports_in: Vec<String>,
    #[serde(default)]
    pub ports_out: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamics: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observables: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub debug: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ModelRepr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_input_couplings: Vec<ExternalInputCoupling>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_output_couplings: Vec<ExternalOutputCoupling>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub internal_couplings: Vec<InternalCoupling>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalInputCoupling {
    #[serde(rename = "targetID")]
    pub target_id: String,
    pub source_port: String,
    pub target_port: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalOutputCoupling {
    #[serde(rename = "sourceID")]
    pub source_id: String,
    pub source_port: String,
    pub target_port: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalCoupling {
    #[serde(rename = "sourceID")]
    pub source_id: String,
    #[serde(rename = "targetID")]
    pub target_id: String,
    pub source_port: String,
    pub target_port: String,
}

impl ModelRepr {
    pub fn from_yaml(text: &str) -> Result<Self, SimulationError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json(text: &str) -> Result<Self, SimulationError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Builds the graph described, the top model becoming its root.
    pub fn build(&self) -> Result<ModelGraph, DevsGraphError> {
        if self.model_type != ModelType::Coupled {
            return Err(DevsGraphError::InvalidDescription(format!(
                "the top model '{}' must be coupled",
                self.name
            )));
        }
        let mut graph = ModelGraph::new(&self.name);
        let root = graph.root();
        self.fill(&mut graph, root)?;
        Ok(graph)
    }

    /// Adds the described model as a child of `parent`.
    pub fn add_to(&self, graph: &mut ModelGraph, parent: ModelId) -> Result<ModelId, DevsGraphError> {
        let id = match self.model_type {
            ModelType::Atomic => {
                let dynamics = self.dynamics.as_ref().ok_or_else(|| {
                    DevsGraphError::InvalidDescription(format!(
                        "the atomic model '{}' has no dynamics",
                        self.name
                    ))
                })?;
                let atomic = AtomicModel {
                    dynamics: dynamics.clone(),
                    conditions: self.conditions.clone(),
                    observables: self.observables.clone().unwrap_or_default(),
                    debug: self.debug,
                };
                graph.add_atomic_model(parent, &self.name, atomic)?
            }
            ModelType::Coupled => graph.add_coupled_model(parent, &self.name)?,
        };
        self.fill(graph, id)?;
        Ok(id)
    }

    fn fill(&self, graph: &mut ModelGraph, id: ModelId) -> Result<(), DevsGraphError> {
        for port in &self.ports_in {
            graph.add_input_port(id, port)?;
        }
        for port in &self.ports_out {
            graph.add_output_port(id, port)?;
        }
        if self.model_type == ModelType::Atomic {
            if !self.components.is_empty() {
                return Err(DevsGraphError::InvalidDescription(format!(
                    "the atomic model '{}' has components",
                    self.name
                )));
            }
            return Ok(());
        }
        for component in &self.components {
            component.add_to(graph, id)?;
        }
        for coupling in &self.internal_couplings {
            let source = child(graph, id, &coupling.source_id)?;
            let target = child(graph, id, &coupling.target_id)?;
            graph.add_internal_connection(id, source, &coupling.source_port, target, &coupling.target_port)?;
        }
        for coupling in &self.external_input_couplings {
            let target = child(graph, id, &coupling.target_id)?;
            graph.add_input_connection(id, &coupling.source_port, target, &coupling.target_port)?;
        }
        for coupling in &self.external_output_couplings {
            let source = child(graph, id, &coupling.source_id)?;
            graph.add_output_connection(id, source, &coupling.source_port, &coupling.target_port)?;
        }
        Ok(())
    }

    /// Describes the subtree rooted at `model`.
    pub fn describe(graph: &ModelGraph, model: ModelId) -> Result<Self, DevsGraphError> {
        let node = graph.get(model)?;
        let mut repr = ModelRepr {
            name: node.name().to_string(),
            model_type: if node.is_atomic() {
                ModelType::Atomic
            } else {
                ModelType::Coupled
            },
            ports_in: node.input_ports().names().map(String::from).collect(),
            ports_out: node.output_ports().names().map(String::from).collect(),
            dynamics: None,
            conditions: Vec::new(),
            observables: None,
            debug: false,
            components: Vec::new(),
            external_input_couplings: Vec::new(),
            external_output_couplings: Vec::new(),
            internal_couplings: Vec::new(),
        };
        if let Some(atomic) = node.as_atomic() {
            repr.dynamics = Some(atomic.dynamics.clone());
            repr.conditions = atomic.conditions.clone();
            repr.observables = Some(atomic.observables.clone()).filter(|name| !name.is_empty());
            repr.debug = atomic.debug;
            return Ok(repr);
        }
        let coupled = graph.coupled(model)?;
        for (_, child) in coupled.children() {
            repr.components.push(Self::describe(graph, child)?);
            let child_node = graph.get(child)?;
            for (port, list) in child_node.output_ports() {
                for (peer, peer_port) in list {
                    if *peer == model {
                        continue;
                    }
                    repr.internal_couplings.push(InternalCoupling {
                        source_id: child_node.name().to_string(),
                        target_id: graph.name(*peer)?.to_string(),
                        source_port: port.clone(),
                        target_port: peer_port.clone(),
                    });
                }
            }
        }
        for (port, list) in coupled.internal_inputs() {
            for (child, child_port) in list {
                repr.external_input_couplings.push(ExternalInputCoupling {
                    target_id: graph.name(*child)?.to_string(),
                    source_port: port.clone(),
                    target_port: child_port.clone(),
                });
            }
        }
        for (port, list) in coupled.internal_outputs() {
            for (child, child_port) in list {
                repr.external_output_couplings.push(ExternalOutputCoupling {
                    source_id: graph.name(*child)?.to_string(),
                    source_port: child_port.clone(),
                    target_port: port.clone(),
                });
            }
        }
        Ok(repr)
    }
}

fn child(graph: &ModelGraph, parent: ModelId, name: &str) -> Result<ModelId, DevsGraphError> {
    graph
        .find_model(parent, name)
        .ok_or_else(|| DevsGraphError::NotAChild {
            model: name.to_string(),
            parent: graph.complete_name(parent),
        })
}
