use std::collections::{BTreeMap, BTreeSet};

use super::Simulator;
use crate::dynamics::{ObservationEvent, Time, INFINITY};
use crate::models::ModelId;
use crate::output::{Matrix, StreamWriter};
use crate::utils::errors::{InternalError, SimulationError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewKind {
    /// Observes every observable at each multiple of the timestep.
    Timed(Time),
    /// Observes a model after each of its transitions.
    Event,
    /// Observes every observable once, at the end of the simulation.
    Finish,
}

/// A named set of observed (model, port) pairs, written to one stream.
#[derive(Debug)]
pub struct View {
    name: String,
    kind: ViewKind,
    stream: StreamWriter,
    observables: BTreeMap<ModelId, BTreeSet<String>>,
    next_time: Time,
}

impl View {
    pub fn new(name: &str, kind: ViewKind, stream: StreamWriter) -> Self {
        Self {
            name: name.to_string(),
            kind,
            stream,
            observables: BTreeMap::new(),
            next_time: INFINITY,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn stream(&self) -> &StreamWriter {
        &self.stream
    }

    /// Next observation time of a timed view.
    pub fn next_time(&self) -> Time {
        self.next_time
    }

    pub(crate) fn start(&mut self, time: Time) {
        if let ViewKind::Timed(_) = self.kind {
            self.next_time = time;
        }
    }

    pub fn exist(&self, model: ModelId, port: &str) -> bool {
        self.observables
            .get(&model)
            .map_or(false, |ports| ports.contains(port))
    }

    pub fn observes(&self, model: ModelId) -> bool {
        self.observables.contains_key(&model)
    }

    pub fn add_observable(&mut self, simulator: &Simulator, port: &str, time: Time) -> Result<(), SimulationError> {
        let model = simulator
            .model()
            .ok_or(InternalError::SimulatorDestroyed)?;
        if self.exist(model, port) {
            return Ok(());
        }
        self.observables
            .entry(model)
            .or_default()
            .insert(port.to_string());
        self.stream
            .process_new_observable(simulator, port, time, &self.name)
    }

    /// Stops observing the model, before its simulator is cleared.
    pub fn remove_observable(&mut self, simulator: &Simulator, time: Time) -> Result<(), SimulationError> {
        let model = simulator
            .model()
            .ok_or(InternalError::SimulatorDestroyed)?;
        if let Some(ports) = self.observables.remove(&model) {
            for port in ports {
                self.stream
                    .process_remove_observable(simulator, &port, time, &self.name)?;
            }
        }
        Ok(())
    }

    /// Observes every port of one model.
    pub fn observe(&mut self, simulator: &Simulator, time: Time) -> Result<(), SimulationError> {
        let model = match simulator.model() {
            Some(model) => model,
            None => return Ok(()),
        };
        if let Some(ports) = self.observables.get(&model) {
            for port in ports {
                let event = ObservationEvent::new(time, &self.name, port);
                self.stream
                    .process(Some(simulator), port, time, &self.name, simulator.observation(&event))?;
            }
        }
        Ok(())
    }

    /// Observes every observable.  A view left without observable still
    /// emits an empty value, so its output keeps the observation times.
    pub fn run(&mut self, simulators: &BTreeMap<ModelId, Simulator>, time: Time) -> Result<(), SimulationError> {
        if self.observables.is_empty() {
            self.stream.process(None, "", time, &self.name, None)?;
        }
        for (model, ports) in &self.observables {
            let simulator = simulators.get(model);
            for port in ports {
                let value = simulator.and_then(|simulator| {
                    simulator.observation(&ObservationEvent::new(time, &self.name, port))
                });
                self.stream
                    .process(simulator, port, time, &self.name, value)?;
            }
        }
        if let ViewKind::Timed(timestep) = self.kind {
            self.next_time = time + timestep;
        }
        Ok(())
    }

    pub fn close(&mut self, time: Time) -> Result<(), SimulationError> {
        self.next_time = INFINITY;
        self.stream.close(time)
    }

    pub fn matrix(&self) -> Option<Matrix> {
        self.stream.matrix()
    }
}
