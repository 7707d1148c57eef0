use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use tracing::dispatcher::{self, Dispatch};
use tracing::info;

use super::Coordinator;
use crate::config::Experiment;
use crate::dynamics::{DynamicsFactory, Time, INFINITY};
use crate::models::ModelGraph;
use crate::output::{Matrix, PluginRegistry};
use crate::utils::errors::{InternalError, SimulationError};

/// Snapshot of a running simulation, published after every step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Progress {
    pub time: Time,
    pub steps: u64,
    pub finished: bool,
}

/// Cooperative control of a simulation run from another thread.  The
/// flags are checked between two steps: a step in progress is never
/// interrupted.
#[derive(Debug, Default)]
pub struct SimulationControl {
    paused: Mutex<bool>,
    resumed: Condvar,
    stopped: AtomicBool,
    progress: Mutex<Progress>,
}

impl SimulationControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        *self.paused.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }

    pub fn resume(&self) {
        *self.paused.lock().unwrap_or_else(PoisonError::into_inner) = false;
        self.resumed.notify_all();
    }

    /// Stops the run before its next step.  A paused run is woken up.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.resume();
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn progress(&self) -> Progress {
        *self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, progress: Progress) {
        *self.progress.lock().unwrap_or_else(PoisonError::into_inner) = progress;
    }

    pub(crate) fn wait_while_paused(&self) {
        let mut paused = self.paused.lock().unwrap_or_else(PoisonError::into_inner);
        while *paused && !self.is_stopped() {
            paused = self
                .resumed
                .wait(paused)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Owner of a simulation run: loads a graph and an experiment, then
/// drives the coordinator until the end of the experiment.  Every call
/// logs to the dispatch given at construction.
pub struct RootCoordinator {
    dispatch: Dispatch,
    factory: DynamicsFactory,
    plugins: PluginRegistry,
    control: Arc<SimulationControl>,
    coordinator: Option<Coordinator>,
    end: Time,
}

impl RootCoordinator {
    pub fn new(dispatch: Dispatch) -> Self {
        Self {
            dispatch,
            factory: DynamicsFactory::new(),
            plugins: PluginRegistry::new(),
            control: Arc::new(SimulationControl::new()),
            coordinator: None,
            end: 0.0,
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

    pub fn with_control(mut self, control: Arc<SimulationControl>) -> Self {
        self.control = control;
        self
    }

    pub fn control(&self) -> Arc<SimulationControl> {
        self.control.clone()
    }

    pub fn coordinator(&self) -> Option<&Coordinator> {
        self.coordinator.as_ref()
    }

    pub fn coordinator_mut(&mut self) -> Option<&mut Coordinator> {
        self.coordinator.as_mut()
    }

    fn loaded(&mut self) -> Result<&mut Coordinator, InternalError> {
        self.coordinator.as_mut().ok_or(InternalError::NotLoaded)
    }

    /// Builds the coordinator and opens the outputs of the experiment.
    pub fn load(&mut self, graph: ModelGraph, experiment: Experiment) -> Result<(), SimulationError> {
        let dispatch = self.dispatch.clone();
        dispatcher::with_default(&dispatch, || {
            info!(experiment = %experiment.name, begin = experiment.begin, duration = experiment.duration, "load");
            self.end = experiment.end();
            let coordinator = Coordinator::new(graph, experiment, self.factory.clone(), &self.plugins)?;
            self.coordinator = Some(coordinator);
            Ok(())
        })
    }

    pub fn init(&mut self) -> Result<(), SimulationError> {
        let dispatch = self.dispatch.clone();
        dispatcher::with_default(&dispatch, || {
            let coordinator = self.loaded()?;
            coordinator.init()?;
            let progress = Progress {
                time: coordinator.current_time(),
                steps: 0,
                finished: false,
            };
            self.control.publish(progress);
            Ok(())
        })
    }

    /// Runs one step.  Returns false, without running it, once the next
    /// step is past the end of the experiment, nothing is left to run or
    /// the run was stopped.
    pub fn run(&mut self) -> Result<bool, SimulationError> {
        let dispatch = self.dispatch.clone();
        dispatcher::with_default(&dispatch, || {
            let control = self.control.clone();
            control.wait_while_paused();
            if control.is_stopped() {
                info!("simulation stopped");
                return Ok(false);
            }
            let end = self.end;
            let coordinator = self.loaded()?;
            let next = coordinator.next_time();
            if next == INFINITY || next > end {
                return Ok(false);
            }
            coordinator.run()?;
            control.publish(Progress {
                time: coordinator.current_time(),
                steps: coordinator.steps(),
                finished: false,
            });
            Ok(true)
        })
    }

    /// Finishes the run at the end of the experiment, or at the current
    /// time if it was stopped.
    pub fn finish(&mut self) -> Result<(), SimulationError> {
        let dispatch = self.dispatch.clone();
        dispatcher::with_default(&dispatch, || {
            let stopped = self.control.is_stopped();
            let end = self.end;
            let coordinator = self.loaded()?;
            let time = if stopped || !end.is_finite() {
                coordinator.current_time()
            } else {
                end
            };
            coordinator.finish(time)?;
            let progress = Progress {
                time,
                steps: coordinator.steps(),
                finished: true,
            };
            self.control.publish(progress);
            info!(time, "simulation finished");
            Ok(())
        })
    }

    pub fn outputs(&self) -> BTreeMap<String, Matrix> {
        self.coordinator
            .as_ref()
            .map(Coordinator::outputs)
            .unwrap_or_default()
    }

    pub fn current_time(&self) -> Time {
        self.coordinator
            .as_ref()
            .map_or(0.0, Coordinator::current_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn stop_wakes_a_paused_run() {
        let control = Arc::new(SimulationControl::new());
        control.pause();
        let waiter = {
            let control = control.clone();
            thread::spawn(move || {
                control.wait_while_paused();
                control.is_stopped()
            })
        };
        thread::sleep(Duration::from_millis(20));
        control.stop();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn unloaded_root_reports_it() {
        let mut root = RootCoordinator::new(Dispatch::none());
        assert!(matches!(
            root.init(),
            Err(SimulationError::Internal(InternalError::NotLoaded))
        ));
        assert!(root.outputs().is_empty());
    }
}
