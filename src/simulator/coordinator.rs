use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use super::{EventTable, Simulator, View, ViewKind};
use crate::config::{Experiment, ViewType};
use crate::dynamics::{DebugDynamics, DynamicsFactory, DynamicsInit, ExternalEvent, Time, INFINITY};
use crate::models::{ModelGraph, ModelId, ModelRepr};
use crate::output::{Matrix, PluginRegistry, StreamWriter};
use crate::utils::errors::{DevsGraphError, InternalError, ModellingError, SimulationError};

/// Schedules the simulators of a model graph and routes their outputs.
///
/// Each call to [`Coordinator::run`] processes one time: either the
/// timed observations due strictly before the next internal event, or
/// every simulator whose internal event is due at that time together
/// with the receivers of their outputs.  Simulators reaching a zero time
/// advance are processed by the next call, at the same time.
pub struct Coordinator {
    graph: ModelGraph,
    experiment: Experiment,
    factory: DynamicsFactory,
    simulators: BTreeMap<ModelId, Simulator>,
    event_table: EventTable,
    views: BTreeMap<String, View>,
    deleted: Vec<Simulator>,
    current_time: Time,
    steps: u64,
}

impl Coordinator {
    /// Opens the output of every view of the experiment.  No simulator
    /// exists before [`Coordinator::init`].
    pub fn new(
        graph: ModelGraph,
        experiment: Experiment,
        factory: DynamicsFactory,
        plugins: &PluginRegistry,
    ) -> Result<Self, SimulationError> {
        experiment.validate()?;
        let mut views = BTreeMap::new();
        for (name, config) in &experiment.views {
            let output = experiment
                .outputs
                .get(&config.output)
                .ok_or_else(|| InternalError::UnknownOutput(config.output.clone()))?;
            let mut stream = StreamWriter::new();
            stream.open(
                plugins,
                &output.plugin,
                &output.package,
                &output.location,
                &output.file,
                output.parameters.clone(),
                experiment.begin,
            )?;
            let kind = match config.view_type {
                ViewType::Timed => ViewKind::Timed(config.timestep.unwrap_or(INFINITY)),
                ViewType::Event => ViewKind::Event,
                ViewType::Finish => ViewKind::Finish,
            };
            views.insert(name.clone(), View::new(name, kind, stream));
        }
        Ok(Self {
            graph,
            current_time: experiment.begin,
            experiment,
            factory,
            simulators: BTreeMap::new(),
            event_table: EventTable::new(),
            views,
            deleted: Vec::new(),
            steps: 0,
        })
    }

    pub fn graph(&self) -> &ModelGraph {
        &self.graph
    }

    /// Structural changes made through the returned graph are seen by the
    /// target caches of the simulators.  Atomic models added this way get
    /// a simulator through [`Coordinator::create_simulators`].
    pub fn graph_mut(&mut self) -> &mut ModelGraph {
        &mut self.graph
    }

    pub fn experiment(&self) -> &Experiment {
        &self.experiment
    }

    pub fn current_time(&self) -> Time {
        self.current_time
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn simulator(&self, model: ModelId) -> Option<&Simulator> {
        self.simulators.get(&model)
    }

    pub fn simulators(&self) -> &BTreeMap<ModelId, Simulator> {
        &self.simulators
    }

    /// Simulator of the model at the `:` separated path from the root.
    pub fn simulator_by_path(&self, path: &str) -> Option<&Simulator> {
        self.graph
            .find_path(path)
            .and_then(|model| self.simulators.get(&model))
    }

    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.get(name)
    }

    /// Creates and initializes the simulators of every atomic model.
    pub fn init(&mut self) -> Result<(), SimulationError> {
        self.current_time = self.experiment.begin;
        for view in self.views.values_mut() {
            view.start(self.current_time);
        }
        let root = self.graph.root();
        self.create_simulators(root)?;
        info!(
            simulators = self.simulators.len(),
            views = self.views.len(),
            time = self.current_time,
            "coordinator initialized"
        );
        Ok(())
    }

    /// Creates the simulators of the atomic models of a subtree which
    /// have none, initialized at the current time.
    pub fn create_simulators(&mut self, model: ModelId) -> Result<(), SimulationError> {
        for atomic in self.graph.atomic_models(model) {
            if !self.simulators.contains_key(&atomic) {
                self.create_simulator(atomic)?;
            }
        }
        Ok(())
    }

    fn create_simulator(&mut self, model: ModelId) -> Result<(), SimulationError> {
        let atomic = self.graph.atomic(model)?;
        let name = self.graph.name(model)?.to_string();
        if self.simulators.contains_key(&model) {
            return Err(InternalError::DuplicateSimulator(name).into());
        }
        let init = DynamicsInit {
            model: name.clone(),
            parent: self.graph.parent_path(model),
            dynamics: atomic.dynamics.clone(),
        };
        let events = self.experiment.init_events(&name, atomic)?;
        let mut dynamics = self.factory.create(&init, &events)?;
        if atomic.debug {
            dynamics = Box::new(DebugDynamics::new(&self.graph.complete_name(model), dynamics));
        }
        let observable = self.experiment.observable(&name, atomic)?.cloned();

        let mut simulator = Simulator::from_graph(&self.graph, model, dynamics)?;
        let tn = simulator.init(self.current_time)?;
        self.event_table.schedule(model, tn);
        let simulator = self.simulators.entry(model).or_insert(simulator);
        for (port, views) in observable.iter().flatten() {
            for view in views {
                self.views
                    .get_mut(view)
                    .ok_or_else(|| InternalError::UnknownView(view.clone()))?
                    .add_observable(simulator, port, self.current_time)?;
            }
        }
        debug!(model = %self.graph.complete_name(model), tn, "simulator created");
        Ok(())
    }

    /// Adds the described model under `parent` and creates its simulators.
    /// On error the graph and the simulators are left as they were.
    pub fn add_model(&mut self, parent: ModelId, repr: &ModelRepr) -> Result<ModelId, SimulationError> {
        let model = self.graph.transaction(|graph| repr.add_to(graph, parent))?;
        if let Err(error) = self.create_simulators(model) {
            self.discard_simulators(model)?;
            self.graph.del_model(parent, model)?;
            self.invalidate_targets();
            return Err(error);
        }
        self.invalidate_targets();
        Ok(model)
    }

    /// Drops the simulators already created in the subtree of `model`.
    fn discard_simulators(&mut self, model: ModelId) -> Result<(), SimulationError> {
        let time = self.current_time;
        for atomic in self.graph.atomic_models(model) {
            if let Some(simulator) = self.simulators.remove(&atomic) {
                for view in self.views.values_mut() {
                    view.remove_observable(&simulator, time)?;
                }
                self.event_table.unschedule(atomic);
                debug!(model = %self.graph.complete_name(atomic), "simulator discarded");
            }
        }
        Ok(())
    }

    /// Removes the child `name` of `parent`.  Its simulators stop being
    /// observed, are unscheduled and cleared, then dropped at the end of
    /// the next step.
    pub fn del_model(&mut self, parent: ModelId, name: &str) -> Result<(), SimulationError> {
        let model = self
            .graph
            .find_model(parent, name)
            .ok_or_else(|| DevsGraphError::UnknownModel(name.to_string()))?;
        let atomics = self.graph.atomic_models(model);
        if let Some(&missing) = atomics.iter().find(|atomic| !self.simulators.contains_key(atomic)) {
            return Err(ModellingError::UnknownAtomicModel(self.graph.complete_name(missing)).into());
        }
        for atomic in atomics {
            self.del_simulator(atomic)?;
        }
        self.graph.del_model(parent, model)?;
        self.invalidate_targets();
        Ok(())
    }

    fn del_simulator(&mut self, model: ModelId) -> Result<(), SimulationError> {
        let mut simulator = self.simulators.remove(&model).ok_or_else(|| {
            ModellingError::UnknownAtomicModel(self.graph.complete_name(model))
        })?;
        for view in self.views.values_mut() {
            view.remove_observable(&simulator, self.current_time)?;
        }
        self.event_table.unschedule(model);
        debug!(model = %self.graph.complete_name(model), "simulator cleared");
        simulator.clear();
        self.deleted.push(simulator);
        Ok(())
    }

    fn invalidate_targets(&mut self) {
        for simulator in self.simulators.values_mut() {
            simulator.invalidate_targets();
        }
    }

    fn next_observation_time(&self) -> Time {
        self.views
            .values()
            .map(View::next_time)
            .fold(INFINITY, Time::min)
    }

    /// Time of the next call to [`Coordinator::run`].
    pub fn next_time(&mut self) -> Time {
        self.event_table
            .next_time()
            .min(self.next_observation_time())
    }

    pub fn run(&mut self) -> Result<(), SimulationError> {
        let event_time = self.event_table.next_time();
        let observation_time = self.next_observation_time();

        if observation_time < event_time {
            self.current_time = observation_time;
            self.run_timed_views(observation_time)?;
        } else if event_time < INFINITY {
            self.current_time = event_time;
            self.run_events(event_time)?;
        }
        self.deleted.clear();
        self.steps += 1;
        Ok(())
    }

    fn run_timed_views(&mut self, time: Time) -> Result<(), SimulationError> {
        let simulators = &self.simulators;
        for view in self.views.values_mut() {
            if view.next_time() == time {
                view.run(simulators, time)?;
            }
        }
        Ok(())
    }

    fn run_events(&mut self, time: Time) -> Result<(), SimulationError> {
        let (_, imminent) = self.event_table.pop_imminent();
        debug!(time, imminent = imminent.len(), "bag");

        let mut bag: BTreeSet<ModelId> = BTreeSet::new();
        for model in &imminent {
            if let Some(simulator) = self.simulators.get_mut(model) {
                simulator.set_internal_event();
                bag.insert(*model);
            }
        }
        for model in &imminent {
            self.dispatch(*model, time, &mut bag)?;
        }

        for model in &bag {
            let simulator = match self.simulators.get_mut(model) {
                Some(simulator) => simulator,
                None => continue,
            };
            let tn = match (simulator.have_internal(), simulator.have_external()) {
                (true, true) => simulator.confluent_transitions(time)?,
                (true, false) => simulator.internal_transition(time)?,
                (false, true) => simulator.external_transition(time)?,
                (false, false) => continue,
            };
            self.event_table.schedule(*model, tn);
        }

        for model in &bag {
            if let Some(simulator) = self.simulators.get(model) {
                for view in self.views.values_mut() {
                    if view.kind() == ViewKind::Event && view.observes(*model) {
                        view.observe(simulator, time)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Routes the outputs of `source` into the external event buffers of
    /// their receivers, which join the bag.
    fn dispatch(&mut self, source: ModelId, time: Time, bag: &mut BTreeSet<ModelId>) -> Result<(), SimulationError> {
        let mut simulator = match self.simulators.remove(&source) {
            Some(simulator) => simulator,
            None => return Ok(()),
        };
        let result = simulator.output(time);
        let mut deliveries: Vec<(ModelId, ExternalEvent)> = Vec::new();
        if let Ok(outputs) = &result {
            let simulators = &self.simulators;
            for event in outputs {
                let targets = simulator.targets(event.port(), &self.graph, |model| {
                    model == source || simulators.contains_key(&model)
                });
                for (target, port) in targets {
                    deliveries.push((*target, event.redirect(port)));
                }
            }
        }
        self.simulators.insert(source, simulator);
        result?;

        for (target, event) in deliveries {
            if let Some(receiver) = self.simulators.get_mut(&target) {
                receiver.add_external_event(event);
                bag.insert(target);
            }
        }
        Ok(())
    }

    /// Runs the finish views, finishes the simulators, then closes every
    /// view at `time`.
    pub fn finish(&mut self, time: Time) -> Result<(), SimulationError> {
        self.current_time = time;
        let simulators = &self.simulators;
        for view in self.views.values_mut() {
            if view.kind() == ViewKind::Finish {
                view.run(simulators, time)?;
            }
        }
        for simulator in self.simulators.values_mut() {
            simulator.finish();
        }
        for view in self.views.values_mut() {
            view.close(time)?;
        }
        info!(time, steps = self.steps, "coordinator finished");
        Ok(())
    }

    /// Matrices of the views whose plugin keeps its observations.
    pub fn outputs(&self) -> BTreeMap<String, Matrix> {
        self.views
            .iter()
            .filter_map(|(name, view)| view.matrix().map(|matrix| (name.clone(), matrix)))
            .collect()
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("current_time", &self.current_time)
            .field("simulators", &self.simulators.len())
            .field("views", &self.views.keys().collect::<Vec<_>>())
            .field("steps", &self.steps)
            .finish()
    }
}
