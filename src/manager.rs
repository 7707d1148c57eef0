//! Runs a whole experiment, in the calling thread or in a worker.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::dispatcher::{self, Dispatch};

use crate::config::Experiment;
use crate::dynamics::DynamicsFactory;
use crate::models::ModelGraph;
use crate::output::{Matrix, PluginRegistry};
use crate::simulator::{Progress, RootCoordinator, SimulationControl};
use crate::utils::errors::{InternalError, SimulationError};

/// Builder of simulation runs sharing the same dynamics, plug-ins and
/// log destination.
#[derive(Clone)]
pub struct Simulation {
    factory: DynamicsFactory,
    plugins: PluginRegistry,
    dispatch: Dispatch,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    /// Logs to the default dispatcher of the calling thread.
    pub fn new() -> Self {
        Self {
            factory: DynamicsFactory::new(),
            plugins: PluginRegistry::new(),
            dispatch: dispatcher::get_default(Dispatch::clone),
        }
    }

    pub fn with_factory(mut self, factory: DynamicsFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_plugins(mut self, plugins: PluginRegistry) -> Self {
        self.plugins = plugins;
        self
    }

    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    fn root(&self, control: Arc<SimulationControl>) -> RootCoordinator {
        RootCoordinator::new(self.dispatch.clone())
            .with_factory(self.factory.clone())
            .with_plugins(self.plugins.clone())
            .with_control(control)
    }

    /// Runs the experiment to its end and returns the matrices of the
    /// views whose plug-in keeps its observations.
    pub fn run(&self, graph: ModelGraph, experiment: Experiment) -> Result<BTreeMap<String, Matrix>, SimulationError> {
        let root = self.root(Arc::new(SimulationControl::new()));
        execute(root, graph, experiment)
    }

    /// Runs the experiment in a worker thread, controlled through the
    /// returned handle.
    pub fn spawn(&self, graph: ModelGraph, experiment: Experiment) -> SimulationHandle {
        let control = Arc::new(SimulationControl::new());
        let root = self.root(control.clone());
        let worker = thread::spawn(move || execute(root, graph, experiment));
        SimulationHandle { control, worker }
    }
}

fn execute(
    mut root: RootCoordinator,
    graph: ModelGraph,
    experiment: Experiment,
) -> Result<BTreeMap<String, Matrix>, SimulationError> {
    root.load(graph, experiment)?;
    root.init()?;
    while root.run()? {}
    root.finish()?;
    Ok(root.outputs())
}

pub struct SimulationHandle {
    control: Arc<SimulationControl>,
    worker: JoinHandle<Result<BTreeMap<String, Matrix>, SimulationError>>,
}

impl SimulationHandle {
    pub fn control(&self) -> &SimulationControl {
        &self.control
    }

    pub fn progress(&self) -> Progress {
        self.control.progress()
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    pub fn stop(&self) {
        self.control.stop();
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Waits for the end of the run.
    pub fn join(self) -> Result<BTreeMap<String, Matrix>, SimulationError> {
        self.worker.join().unwrap_or_else(|panic| {
            let message = panic
                .downcast_ref::<&str>()
                .map(|message| message.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_default();
            Err(InternalError::WorkerPanicked(message).into())
        })
    }
}
