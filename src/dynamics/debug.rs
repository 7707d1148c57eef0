use tracing::trace;

use super::{Dynamics, ExternalEvent, ExternalEventList, ObservationEvent, SerializableDynamics, Time};
use crate::utils::errors::SimulationError;
use crate::Value;

/// Wraps a dynamics and traces every call with the state it leaves.
/// Enabled by the `debug` flag of an atomic model.
pub struct DebugDynamics {
    model: String,
    inner: Box<dyn Dynamics>,
}

impl DebugDynamics {
    pub fn new(model: &str, inner: Box<dyn Dynamics>) -> Self {
        Self {
            model: model.to_string(),
            inner,
        }
    }
}

impl SerializableDynamics for DebugDynamics {
    fn get_type(&self) -> &'static str {
        self.inner.get_type()
    }

    fn serialize(&self) -> Value {
        self.inner.serialize()
    }
}

impl Dynamics for DebugDynamics {
    fn init(&mut self, time: Time) -> Result<Time, SimulationError> {
        let delay = self.inner.init(time)?;
        trace!(model = %self.model, time, delay, state = %self.inner.serialize(), "init");
        Ok(delay)
    }

    fn time_advance(&self) -> Time {
        let delay = self.inner.time_advance();
        trace!(model = %self.model, delay, "time advance");
        delay
    }

    fn internal_transition(&mut self, time: Time) -> Result<(), SimulationError> {
        self.inner.internal_transition(time)?;
        trace!(model = %self.model, time, state = %self.inner.serialize(), "internal transition");
        Ok(())
    }

    fn external_transition(&mut self, events: &[ExternalEvent], time: Time) -> Result<(), SimulationError> {
        self.inner.external_transition(events, time)?;
        trace!(
            model = %self.model,
            time,
            events = events.len(),
            state = %self.inner.serialize(),
            "external transition"
        );
        Ok(())
    }

    fn confluent_transitions(&mut self, time: Time, events: &[ExternalEvent]) -> Result<(), SimulationError> {
        self.inner.confluent_transitions(time, events)?;
        trace!(
            model = %self.model,
            time,
            events = events.len(),
            state = %self.inner.serialize(),
            "confluent transitions"
        );
        Ok(())
    }

    fn output(&self, time: Time, output: &mut ExternalEventList) -> Result<(), SimulationError> {
        let before = output.len();
        self.inner.output(time, output)?;
        trace!(model = %self.model, time, events = output.len() - before, "output");
        Ok(())
    }

    fn observation(&self, event: &ObservationEvent) -> Option<Value> {
        let value = self.inner.observation(event);
        trace!(model = %self.model, view = %event.view, port = %event.port, "observation");
        value
    }

    fn finish(&mut self) {
        trace!(model = %self.model, "finish");
        self.inner.finish();
    }
}
