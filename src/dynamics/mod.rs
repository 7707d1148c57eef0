//! The dynamics module defines the behavior contract of atomic models,
//! and the events exchanged between them.  A simulator owns exactly one
//! `Dynamics` and drives it through the DEVS transition protocol.

use std::collections::BTreeMap;
use std::iter::FromIterator;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::utils::errors::SimulationError;
use crate::Value;

pub mod debug;
pub mod factory;

pub use self::debug::DebugDynamics;
pub use self::factory::{DynamicsConstructor, DynamicsFactory};

/// Simulation time.  Finite values are absolute dates or delays;
/// [`INFINITY`] means no further autonomous event.
pub type Time = f64;

pub const INFINITY: Time = f64::INFINITY;
pub const NEGATIVE_INFINITY: Time = f64::NEG_INFINITY;

/// An event sent on an output port.  Once routed, the attributes are
/// shared by every receiver of the fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalEvent {
    port: String,
    attributes: Option<Arc<Value>>,
}

impl ExternalEvent {
    pub fn new(port: &str) -> Self {
        Self {
            port: port.to_string(),
            attributes: None,
        }
    }

    pub fn with_attributes(port: &str, attributes: Value) -> Self {
        Self {
            port: port.to_string(),
            attributes: Some(Arc::new(attributes)),
        }
    }

    /// Copy of the event addressed to another port, sharing the
    /// attributes.
    pub(crate) fn redirect(&self, port: &str) -> Self {
        Self {
            port: port.to_string(),
            attributes: self.attributes.clone(),
        }
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn attributes(&self) -> Option<&Value> {
        self.attributes.as_deref()
    }

    pub fn on_port(&self, port: &str) -> bool {
        self.port == port
    }
}

pub type ExternalEventList = Vec<ExternalEvent>;

/// Query of an observable value of a model, for one view and one port.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationEvent {
    pub time: Time,
    pub view: String,
    pub port: String,
}

impl ObservationEvent {
    pub fn new(time: Time, view: &str, port: &str) -> Self {
        Self {
            time,
            view: view.to_string(),
            port: port.to_string(),
        }
    }

    pub fn on_port(&self, port: &str) -> bool {
        self.port == port
    }
}

/// Initialization events of an atomic model: the merged ports of its
/// conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitEventList {
    events: BTreeMap<String, Value>,
}

impl InitEventList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an event; a later condition overrides an earlier one.
    pub fn insert(&mut self, name: &str, value: Value) {
        self.events.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.events.get(name)
    }

    pub fn exist(&self, name: &str) -> bool {
        self.events.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.events.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// The events as a JSON object, ready to deserialize a dynamics from.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.events
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        )
    }
}

impl<'a> FromIterator<(&'a str, Value)> for InitEventList {
    fn from_iter<I: IntoIterator<Item = (&'a str, Value)>>(iter: I) -> Self {
        let mut events = Self::new();
        for (name, value) in iter {
            events.insert(name, value);
        }
        events
    }
}

/// Identity of the atomic model a dynamics is built for.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicsInit {
    pub model: String,
    pub parent: String,
    pub dynamics: String,
}

pub trait SerializableDynamics {
    fn get_type(&self) -> &'static str {
        "Dynamics"
    }
    fn serialize(&self) -> Value {
        Value::Null
    }
}

/// The `Dynamics` trait is the behavior of an atomic model.  Times given
/// to the transitions are absolute; `init` and `time_advance` return
/// delays, which must not be negative.  `output` and `observation` are
/// queries and must leave the state untouched.
///
/// `confluent_transitions` handles an internal event and external events
/// due at the same time.  The default applies the internal transition
/// then the external one.
pub trait Dynamics: SerializableDynamics + Send {
    fn init(&mut self, _time: Time) -> Result<Time, SimulationError> {
        Ok(INFINITY)
    }

    fn time_advance(&self) -> Time {
        INFINITY
    }

    fn internal_transition(&mut self, _time: Time) -> Result<(), SimulationError> {
        Ok(())
    }

    fn external_transition(&mut self, _events: &[ExternalEvent], _time: Time) -> Result<(), SimulationError> {
        Ok(())
    }

    fn confluent_transitions(&mut self, time: Time, events: &[ExternalEvent]) -> Result<(), SimulationError> {
        self.internal_transition(time)?;
        self.external_transition(events, time)
    }

    fn output(&self, _time: Time, _output: &mut ExternalEventList) -> Result<(), SimulationError> {
        Ok(())
    }

    fn observation(&self, _event: &ObservationEvent) -> Option<Value> {
        None
    }

    fn finish(&mut self) {}
}

/// Builds a dynamics from the initialization events, each event filling
/// the field of the same name.  Used by the `SerializableDynamics` derive.
pub fn from_init_events<T: DeserializeOwned>(events: &InitEventList) -> Option<T> {
    serde_json::from_value(events.to_value()).ok()
}

/// Serializes the state of a dynamics, or `Null` if it cannot be.
pub fn snapshot<T: Serialize>(dynamics: &T) -> Value {
    serde_json::to_value(dynamics).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Period {
        period: f64,
        #[serde(default)]
        label: String,
    }

    #[test]
    fn init_events_fill_fields() {
        let events: InitEventList = vec![("period", json!(2.5))].into_iter().collect();
        assert_eq!(
            Some(Period {
                period: 2.5,
                label: String::new()
            }),
            from_init_events::<Period>(&events)
        );
        assert_eq!(None, from_init_events::<Period>(&InitEventList::new()));
    }

    #[test]
    fn redirected_events_share_attributes() {
        let event = ExternalEvent::with_attributes("out", json!({"count": 3}));
        let routed = event.redirect("in");
        assert!(routed.on_port("in"));
        assert_eq!(Some(&json!({"count": 3})), routed.attributes());
        assert!(std::ptr::eq(
            event.attributes().unwrap(),
            routed.attributes().unwrap()
        ));
    }
}
