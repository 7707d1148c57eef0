use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use lazy_static::lazy_static;

use super::{Dynamics, DynamicsInit, InitEventList};
use crate::utils::errors::ModellingError;

pub type DynamicsConstructor = fn(&DynamicsInit, &InitEventList) -> Option<Box<dyn Dynamics>>;

type SharedConstructor = Arc<dyn Fn(&DynamicsInit, &InitEventList) -> Option<Box<dyn Dynamics>> + Send + Sync>;

lazy_static! {
    static ref CONSTRUCTORS: Mutex<HashMap<String, DynamicsConstructor>> = Mutex::new(HashMap::new());
}

/// Adds a dynamics to the process-wide registry, replacing any previous
/// constructor of the same name.
pub fn register(dynamics: &str, constructor: DynamicsConstructor) {
    CONSTRUCTORS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(dynamics.to_string(), constructor);
}

pub fn registered(dynamics: &str) -> bool {
    CONSTRUCTORS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .contains_key(dynamics)
}

pub fn variants() -> Vec<String> {
    let mut names: Vec<String> = CONSTRUCTORS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .keys()
        .cloned()
        .collect();
    names.sort();
    names
}

/// Builds a dynamics from the process-wide registry.
pub fn create(init: &DynamicsInit, events: &InitEventList) -> Result<Box<dyn Dynamics>, ModellingError> {
    let constructor = CONSTRUCTORS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&init.dynamics)
        .copied();
    match constructor {
        Some(constructor) => constructor(init, events).ok_or_else(|| ModellingError::DynamicsConstruction {
            model: init.model.clone(),
            dynamics: init.dynamics.clone(),
        }),
        None => Err(ModellingError::UnknownDynamics {
            model: init.model.clone(),
            dynamics: init.dynamics.clone(),
        }),
    }
}

/// Constructors local to a simulation, looked up before the process-wide
/// registry.  Closures may capture state shared with the embedding code.
#[derive(Clone, Default)]
pub struct DynamicsFactory {
    constructors: HashMap<String, SharedConstructor>,
}

impl DynamicsFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, dynamics: &str, constructor: F) -> Self
    where
        F: Fn(&DynamicsInit, &InitEventList) -> Option<Box<dyn Dynamics>> + Send + Sync + 'static,
    {
        self.insert(dynamics, constructor);
        self
    }

    pub fn insert<F>(&mut self, dynamics: &str, constructor: F)
    where
        F: Fn(&DynamicsInit, &InitEventList) -> Option<Box<dyn Dynamics>> + Send + Sync + 'static,
    {
        self.constructors
            .insert(dynamics.to_string(), Arc::new(constructor));
    }

    pub fn create(&self, init: &DynamicsInit, events: &InitEventList) -> Result<Box<dyn Dynamics>, ModellingError> {
        match self.constructors.get(&init.dynamics) {
            Some(constructor) => constructor(init, events).ok_or_else(|| ModellingError::DynamicsConstruction {
                model: init.model.clone(),
                dynamics: init.dynamics.clone(),
            }),
            None => create(init, events),
        }
    }
}

impl fmt::Debug for DynamicsFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.constructors.keys().collect();
        names.sort();
        f.debug_struct("DynamicsFactory")
            .field("constructors", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::SerializableDynamics;

    struct Passive;

    impl SerializableDynamics for Passive {}
    impl Dynamics for Passive {}

    fn passive(_: &DynamicsInit, _: &InitEventList) -> Option<Box<dyn Dynamics>> {
        Some(Box::new(Passive))
    }

    fn init(dynamics: &str) -> DynamicsInit {
        DynamicsInit {
            model: String::from("a"),
            parent: String::from("top"),
            dynamics: dynamics.to_string(),
        }
    }

    #[test]
    fn registry_lookup() {
        register("factory_tests_passive", passive);
        assert!(registered("factory_tests_passive"));
        assert!(create(&init("factory_tests_passive"), &InitEventList::new()).is_ok());
        assert!(matches!(
            create(&init("factory_tests_missing"), &InitEventList::new()),
            Err(ModellingError::UnknownDynamics { .. })
        ));
    }

    #[test]
    fn local_constructors_come_first() {
        let factory = DynamicsFactory::new().with("factory_tests_local", |_, _| None);
        assert!(matches!(
            factory.create(&init("factory_tests_local"), &InitEventList::new()),
            Err(ModellingError::DynamicsConstruction { .. })
        ));
    }
}
