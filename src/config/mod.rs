//! Experiment configuration: the simulated period, the conditions giving
//! the initialization events of the atomic models, the views with their
//! outputs, and the observables attaching model ports to views.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dynamics::{InitEventList, Time};
use crate::models::AtomicModel;
use crate::utils::errors::{ModellingError, SimulationError};
use crate::Value;

/// Ports of a condition, each giving an initialization event.
pub type Condition = BTreeMap<String, Value>;

/// Ports of an observable, each observed by a list of views.
pub type Observable = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    Timed,
    Event,
    Finish,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewConfig {
    #[serde(rename = "type")]
    pub view_type: ViewType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestep: Option<Time>,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    pub plugin: String,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    pub name: String,
    #[serde(default)]
    pub begin: Time,
    pub duration: Time,
    #[serde(default)]
    pub conditions: BTreeMap<String, Condition>,
    #[serde(default)]
    pub views: BTreeMap<String, ViewConfig>,
    #[serde(default)]
    pub outputs: BTreeMap<String, OutputConfig>,
    #[serde(default)]
    pub observables: BTreeMap<String, Observable>,
}

impl Experiment {
    pub fn new(name: &str, begin: Time, duration: Time) -> Self {
        Self {
            name: name.to_string(),
            begin,
            duration,
            conditions: BTreeMap::new(),
            views: BTreeMap::new(),
            outputs: BTreeMap::new(),
            observables: BTreeMap::new(),
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self, SimulationError> {
        let experiment: Self = serde_yaml::from_str(text)?;
        experiment.validate()?;
        Ok(experiment)
    }

    pub fn from_json(text: &str) -> Result<Self, SimulationError> {
        let experiment: Self = serde_json::from_str(text)?;
        experiment.validate()?;
        Ok(experiment)
    }

    pub fn end(&self) -> Time {
        self.begin + self.duration
    }

    /// Checks the period, the view timesteps and every name reference.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let invalid = |message: String| Err(SimulationError::InvalidExperiment(message));
        if self.duration < 0.0 || self.duration.is_nan() {
            return invalid(format!("bad duration {}", self.duration));
        }
        for (name, view) in &self.views {
            if view.view_type == ViewType::Timed && !view.timestep.map_or(false, |step| step > 0.0) {
                return invalid(format!("the timed view '{}' needs a positive timestep", name));
            }
            if !self.outputs.contains_key(&view.output) {
                return invalid(format!("the view '{}' uses the unknown output '{}'", name, view.output));
            }
        }
        for (name, observable) in &self.observables {
            for views in observable.values() {
                if let Some(view) = views.iter().find(|view| !self.views.contains_key(*view)) {
                    return invalid(format!("the observable '{}' uses the unknown view '{}'", name, view));
                }
            }
        }
        Ok(())
    }

    pub fn with_condition(mut self, name: &str, ports: Vec<(&str, Value)>) -> Self {
        self.conditions.insert(
            name.to_string(),
            ports
                .into_iter()
                .map(|(port, value)| (port.to_string(), value))
                .collect(),
        );
        self
    }

    pub fn with_view(mut self, name: &str, view_type: ViewType, timestep: Option<Time>, output: &str) -> Self {
        self.views.insert(
            name.to_string(),
            ViewConfig {
                view_type,
                timestep,
                output: output.to_string(),
            },
        );
        self
    }

    pub fn with_output(mut self, name: &str, plugin: &str, package: &str) -> Self {
        self.outputs.insert(
            name.to_string(),
            OutputConfig {
                plugin: plugin.to_string(),
                package: package.to_string(),
                location: String::new(),
                file: String::new(),
                parameters: Value::Null,
            },
        );
        self
    }

    pub fn with_observable(mut self, name: &str, ports: Vec<(&str, Vec<&str>)>) -> Self {
        self.observables.insert(
            name.to_string(),
            ports
                .into_iter()
                .map(|(port, views)| (port.to_string(), views.into_iter().map(String::from).collect()))
                .collect(),
        );
        self
    }

    /// Initialization events of an atomic model: the ports of its
    /// conditions, a later condition overriding an earlier one.
    pub fn init_events(&self, model: &str, atomic: &AtomicModel) -> Result<InitEventList, ModellingError> {
        let mut events = InitEventList::new();
        for name in &atomic.conditions {
            let condition = self
                .conditions
                .get(name)
                .ok_or_else(|| ModellingError::UnknownCondition {
                    model: model.to_string(),
                    condition: name.clone(),
                })?;
            for (port, value) in condition {
                events.insert(port, value.clone());
            }
        }
        Ok(events)
    }

    /// Observed ports of an atomic model, none if it has no observable.
    pub fn observable(&self, model: &str, atomic: &AtomicModel) -> Result<Option<&Observable>, ModellingError> {
        if atomic.observables.is_empty() {
            return Ok(None);
        }
        self.observables
            .get(&atomic.observables)
            .map(Some)
            .ok_or_else(|| ModellingError::UnknownObservable {
                model: model.to_string(),
                observable: atomic.observables.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const EXPERIMENT: &str = r#"
name: chain
begin: 0.0
duration: 10.0
conditions:
  generator:
    period: 1.0
  override:
    period: 2.0
    label: fast
views:
  counts:
    type: timed
    timestep: 1.0
    output: memory
outputs:
  memory:
    plugin: storage
observables:
  counter:
    count: [counts]
"#;

    #[test]
    fn conditions_merge_in_order() {
        let experiment = Experiment::from_yaml(EXPERIMENT).unwrap();
        let atomic = AtomicModel {
            conditions: vec![String::from("generator"), String::from("override")],
            ..AtomicModel::new("Generator")
        };
        let events = experiment.init_events("a", &atomic).unwrap();
        assert_eq!(Some(&json!(2.0)), events.get("period"));
        assert_eq!(Some(&json!("fast")), events.get("label"));
        assert_eq!(10.0, experiment.end());
    }

    #[test]
    fn references_are_checked() {
        let experiment = Experiment::from_yaml(EXPERIMENT).unwrap();
        let atomic = AtomicModel {
            conditions: vec![String::from("missing")],
            observables: String::from("missing"),
            ..AtomicModel::new("Generator")
        };
        assert!(matches!(
            experiment.init_events("a", &atomic),
            Err(ModellingError::UnknownCondition { .. })
        ));
        assert!(matches!(
            experiment.observable("a", &atomic),
            Err(ModellingError::UnknownObservable { .. })
        ));
        let timed_without_step = experiment.with_view("bad", ViewType::Timed, None, "memory");
        assert!(matches!(
            timed_without_step.validate(),
            Err(SimulationError::InvalidExperiment(_))
        ));
    }
}
