//! The simulator module drives the simulation.  A [`Simulator`] binds one
//! atomic model to its dynamics and executes the DEVS transition
//! protocol; the [`Coordinator`] schedules the simulators and routes
//! their outputs through the model graph; the [`RootCoordinator`] owns a
//! whole run, from loading an experiment to closing its outputs.

use std::collections::HashMap;

use crate::dynamics::{
    Dynamics, ExternalEvent, ExternalEventList, ObservationEvent, Time, NEGATIVE_INFINITY,
};
use crate::models::{ModelGraph, ModelId};
use crate::utils::errors::{InternalError, ModellingError, SimulationError};
use crate::Value;

pub mod coordinator;
pub mod event_table;
pub mod root;
pub mod view;

pub use self::coordinator::Coordinator;
pub use self::event_table::EventTable;
pub use self::root::{Progress, RootCoordinator, SimulationControl};
pub use self::view::{View, ViewKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorState {
    Uninitialized,
    Active,
    Finished,
}

/// Resolution of one output port.  A port resolving to nothing is cached
/// too, so it is not resolved again on every output.
#[derive(Debug, Clone, PartialEq)]
enum TargetCache {
    NoTarget,
    Targets(Vec<(ModelId, String)>),
}

/// Runtime wrapper of an atomic model.
///
/// The simulator owns the dynamics.  The model is referenced by its
/// handle in the graph, and forgotten by [`Simulator::clear`] when the
/// model is removed: a cleared simulator cannot be named nor transitioned.
pub struct Simulator {
    model: Option<ModelId>,
    name: String,
    parent: String,
    dynamics: Option<Box<dyn Dynamics>>,
    tn: Time,
    state: SimulatorState,
    have_internal: bool,
    external_events: ExternalEventList,
    targets: HashMap<String, TargetCache>,
    revision: u64,
}

impl Simulator {
    pub fn new(model: ModelId, name: &str, parent: &str, dynamics: Box<dyn Dynamics>) -> Self {
        Self {
            model: Some(model),
            name: name.to_string(),
            parent: parent.to_string(),
            dynamics: Some(dynamics),
            tn: NEGATIVE_INFINITY,
            state: SimulatorState::Uninitialized,
            have_internal: false,
            external_events: Vec::new(),
            targets: HashMap::new(),
            revision: 0,
        }
    }

    /// Builds the simulator of an atomic model of the graph.
    pub fn from_graph(graph: &ModelGraph, model: ModelId, dynamics: Box<dyn Dynamics>) -> Result<Self, SimulationError> {
        graph.atomic(model)?;
        Ok(Self::new(
            model,
            graph.name(model)?,
            &graph.parent_path(model),
            dynamics,
        ))
    }

    pub fn model(&self) -> Option<ModelId> {
        self.model
    }

    pub fn name(&self) -> Result<&str, InternalError> {
        match self.model {
            Some(_) => Ok(&self.name),
            None => Err(InternalError::SimulatorDestroyed),
        }
    }

    /// Path of the parent coupled models, `:` separated.
    pub fn parent(&self) -> Result<&str, InternalError> {
        match self.model {
            Some(_) => Ok(&self.parent),
            None => Err(InternalError::SimulatorDestroyed),
        }
    }

    pub fn tn(&self) -> Time {
        self.tn
    }

    pub fn state(&self) -> SimulatorState {
        self.state
    }

    pub fn is_cleared(&self) -> bool {
        self.model.is_none()
    }

    pub fn have_internal(&self) -> bool {
        self.have_internal
    }

    pub fn have_external(&self) -> bool {
        !self.external_events.is_empty()
    }

    pub fn external_events(&self) -> &[ExternalEvent] {
        &self.external_events
    }

    /// Marks the internal event due: the simulator is imminent.
    pub fn set_internal_event(&mut self) {
        self.have_internal = true;
    }

    pub fn add_external_event(&mut self, event: ExternalEvent) {
        self.external_events.push(event);
    }

    pub fn dynamics(&self) -> Option<&dyn Dynamics> {
        self.dynamics.as_deref()
    }

    fn active_dynamics(&mut self, transition: &str) -> &mut Box<dyn Dynamics> {
        assert!(
            self.state == SimulatorState::Active,
            "Simulator {}: {} outside of the active state",
            self.name,
            transition
        );
        match self.dynamics.as_mut() {
            Some(dynamics) => dynamics,
            None => panic!("Simulator {}: {} after clear", self.name, transition),
        }
    }

    /// Initializes the dynamics: tn becomes `time` plus the first delay.
    pub fn init(&mut self, time: Time) -> Result<Time, SimulationError> {
        assert!(
            self.state == SimulatorState::Uninitialized,
            "Simulator {}: init called twice",
            self.name
        );
        let dynamics = match self.dynamics.as_mut() {
            Some(dynamics) => dynamics,
            None => return Err(InternalError::SimulatorDestroyed.into()),
        };
        let delay = dynamics.init(time)?;
        if delay < 0.0 || delay.is_nan() {
            return Err(ModellingError::NegativeInit {
                model: self.name.clone(),
                time: delay,
            }
            .into());
        }
        self.state = SimulatorState::Active;
        self.tn = time + delay;
        Ok(self.tn)
    }

    /// Delay until the next internal event.  A negative delay is a
    /// modelling error, never clamped.
    pub fn time_advance(&self) -> Result<Time, SimulationError> {
        let dynamics = self
            .dynamics
            .as_ref()
            .ok_or(InternalError::SimulatorDestroyed)?;
        let delay = dynamics.time_advance();
        if delay < 0.0 || delay.is_nan() {
            return Err(ModellingError::NegativeTimeAdvance {
                model: self.name.clone(),
                time: delay,
            }
            .into());
        }
        Ok(delay)
    }

    pub fn internal_transition(&mut self, time: Time) -> Result<Time, SimulationError> {
        assert!(self.have_internal, "Simulator {}: d-int error", self.name);
        self.active_dynamics("internal transition")
            .internal_transition(time)?;
        self.have_internal = false;
        self.tn = time + self.time_advance()?;
        Ok(self.tn)
    }

    pub fn external_transition(&mut self, time: Time) -> Result<Time, SimulationError> {
        assert!(
            !self.external_events.is_empty(),
            "Simulator {}: d-ext error",
            self.name
        );
        let events = std::mem::take(&mut self.external_events);
        self.active_dynamics("external transition")
            .external_transition(&events, time)?;
        self.tn = time + self.time_advance()?;
        Ok(self.tn)
    }

    pub fn confluent_transitions(&mut self, time: Time) -> Result<Time, SimulationError> {
        assert!(self.have_internal, "Simulator {}: d-conf error", self.name);
        assert!(
            !self.external_events.is_empty(),
            "Simulator {}: d-conf error",
            self.name
        );
        let events = std::mem::take(&mut self.external_events);
        self.active_dynamics("confluent transitions")
            .confluent_transitions(time, &events)?;
        self.have_internal = false;
        self.tn = time + self.time_advance()?;
        Ok(self.tn)
    }

    pub fn output(&self, time: Time) -> Result<ExternalEventList, SimulationError> {
        let mut output = Vec::new();
        if let Some(dynamics) = &self.dynamics {
            dynamics.output(time, &mut output)?;
        }
        Ok(output)
    }

    pub fn observation(&self, event: &ObservationEvent) -> Option<Value> {
        self.dynamics
            .as_ref()
            .and_then(|dynamics| dynamics.observation(event))
    }

    pub fn finish(&mut self) {
        let dynamics = self.active_dynamics("finish");
        dynamics.finish();
        self.state = SimulatorState::Finished;
    }

    /// Forgets the model and drops the dynamics.  The simulator is then
    /// kept only until the end of the current step.
    pub fn clear(&mut self) {
        self.dynamics = None;
        self.model = None;
        self.have_internal = false;
        self.external_events.clear();
        self.targets.clear();
    }

    /// Atomic receivers of the output port `port`.  The resolution is
    /// cached per port until the graph changes.  If a receiver has no
    /// simulator yet, nothing is returned and nothing is cached.
    pub fn targets<F>(&mut self, port: &str, graph: &ModelGraph, has_simulator: F) -> &[(ModelId, String)]
    where
        F: Fn(ModelId) -> bool,
    {
        if self.revision != graph.revision() {
            self.targets.clear();
            self.revision = graph.revision();
        }
        let model = match self.model {
            Some(model) => model,
            None => return &[],
        };
        if !self.targets.contains_key(port) {
            let resolved = graph.atomic_targets(model, port);
            if !resolved.iter().all(|(target, _)| has_simulator(*target)) {
                return &[];
            }
            let entry = if resolved.is_empty() {
                TargetCache::NoTarget
            } else {
                TargetCache::Targets(resolved)
            };
            self.targets.insert(port.to_string(), entry);
        }
        match self.targets.get(port) {
            Some(TargetCache::Targets(targets)) => targets.as_slice(),
            _ => &[],
        }
    }

    /// True if the port was resolved since the last graph change, even to
    /// no target.
    pub fn is_resolved(&self, port: &str) -> bool {
        self.targets.contains_key(port)
    }

    pub fn invalidate_targets(&mut self) {
        self.targets.clear();
    }

    pub fn remove_target_port(&mut self, port: &str) {
        self.targets.remove(port);
    }
}
