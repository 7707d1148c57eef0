use std::sync::{Arc, Mutex};

use devsim::dynamics::{Dynamics, SerializableDynamics};
use devsim::models::{AtomicModel, ModelGraph};
use devsim::output::{OutputPlugin, PluginRegistry, StreamWriter};
use devsim::simulator::Simulator;
use devsim::utils::errors::{InternalError, SimulationError};
use devsim::Value;
use serde_json::json;

struct Idle;

impl SerializableDynamics for Idle {}

impl Dynamics for Idle {}

/// Logs each call as a line, shared with the test.
struct Mock {
    log: Arc<Mutex<Vec<String>>>,
}

impl Mock {
    fn push(&self, line: String) {
        self.log.lock().unwrap().push(line);
    }
}

impl OutputPlugin for Mock {
    fn on_parameter(&mut self, plugin: &str, _: &str, _: &str, parameters: Value, time: f64) -> Result<(), SimulationError> {
        self.push(format!("parameter {} {} {}", plugin, parameters, time));
        Ok(())
    }

    fn on_new_observable(&mut self, simulator: &str, parent: &str, port: &str, view: &str, time: f64) -> Result<(), SimulationError> {
        self.push(format!("new {}:{}.{} {} {}", parent, simulator, port, view, time));
        Ok(())
    }

    fn on_del_observable(&mut self, simulator: &str, parent: &str, port: &str, view: &str, time: f64) -> Result<(), SimulationError> {
        self.push(format!("del {}:{}.{} {} {}", parent, simulator, port, view, time));
        Ok(())
    }

    fn on_value(
        &mut self,
        simulator: &str,
        parent: &str,
        port: &str,
        view: &str,
        time: f64,
        value: Option<Value>,
    ) -> Result<(), SimulationError> {
        let value = value.map_or_else(|| String::from("-"), |value| value.to_string());
        self.push(format!("value {}:{}.{} {} {} {}", parent, simulator, port, view, time, value));
        Ok(())
    }

    fn close(&mut self, time: f64) -> Result<(), SimulationError> {
        self.push(format!("close {}", time));
        Ok(())
    }
}

fn simulator() -> Simulator {
    let mut graph = ModelGraph::new("top");
    let top = graph.root();
    let model = graph
        .add_atomic_model(top, "counter", AtomicModel::new("idle"))
        .unwrap();
    Simulator::from_graph(&graph, model, Box::new(Idle)).unwrap()
}

fn registry(log: Arc<Mutex<Vec<String>>>) -> PluginRegistry {
    PluginRegistry::new().with("test", "mock", move |_| {
        Ok(Box::new(Mock { log: log.clone() }) as Box<dyn OutputPlugin>)
    })
}

#[test]
fn calls_reach_the_plugin_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut stream = StreamWriter::new();
    stream
        .open(&registry(log.clone()), "mock", "test", "", "", json!({"header": true}), 0.0)
        .unwrap();
    assert!(stream.is_opened());

    let mut simulator = simulator();
    stream.process_new_observable(&simulator, "n", 0.0, "view").unwrap();
    stream.process(Some(&simulator), "n", 1.0, "view", Some(json!(3))).unwrap();
    stream.process_remove_observable(&simulator, "n", 2.0, "view").unwrap();
    simulator.clear();
    stream.process(None, "n", 3.0, "view", None).unwrap();
    stream.close(4.0).unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            String::from("parameter mock {\"header\":true} 0"),
            String::from("new top:counter.n view 0"),
            String::from("value top:counter.n view 1 3"),
            String::from("del top:counter.n view 2"),
            String::from("value :.n view 3 -"),
            String::from("close 4"),
        ]
    );
}

#[test]
fn unopened_stream_is_an_internal_error() {
    let mut stream = StreamWriter::new();
    let simulator = simulator();
    assert!(!stream.is_opened());
    assert!(matches!(
        stream.process(Some(&simulator), "n", 0.0, "view", None),
        Err(SimulationError::Internal(InternalError::StreamWriterNotOpened))
    ));
    assert!(matches!(
        stream.process_new_observable(&simulator, "n", 0.0, "view"),
        Err(SimulationError::Internal(InternalError::StreamWriterNotOpened))
    ));
    assert!(matches!(
        stream.close(0.0),
        Err(SimulationError::Internal(InternalError::StreamWriterNotOpened))
    ));
}

#[test]
fn closed_stream_rejects_further_calls() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut stream = StreamWriter::new();
    stream
        .open(&registry(log.clone()), "mock", "test", "", "", Value::Null, 0.0)
        .unwrap();
    let simulator = simulator();
    stream.close(1.0).unwrap();
    assert!(stream.is_closed());
    assert!(!stream.is_opened());

    assert!(matches!(
        stream.process(Some(&simulator), "n", 2.0, "view", Some(json!(1))),
        Err(SimulationError::Internal(InternalError::StreamWriterClosed(_)))
    ));
    assert!(matches!(
        stream.process_new_observable(&simulator, "n", 2.0, "view"),
        Err(SimulationError::Internal(InternalError::StreamWriterClosed(_)))
    ));
    assert!(matches!(
        stream.process_remove_observable(&simulator, "n", 2.0, "view"),
        Err(SimulationError::Internal(InternalError::StreamWriterClosed(_)))
    ));
    assert!(matches!(
        stream.close(3.0),
        Err(SimulationError::Internal(InternalError::StreamWriterClosed(_)))
    ));
    assert_eq!(
        *log.lock().unwrap(),
        vec![String::from("parameter mock null 0"), String::from("close 1")]
    );
}

#[test]
fn closed_storage_still_gives_its_matrix() {
    let mut stream = StreamWriter::new();
    stream
        .open(&PluginRegistry::new(), "storage", "", "", "", Value::Null, 0.0)
        .unwrap();
    let simulator = simulator();
    stream.process_new_observable(&simulator, "n", 0.0, "view").unwrap();
    stream.process(Some(&simulator), "n", 0.0, "view", Some(json!(7))).unwrap();
    stream.close(1.0).unwrap();

    let matrix = stream.matrix().unwrap();
    assert_eq!(matrix.get(0, "top:counter.n"), Some(&json!(7)));
}

#[test]
fn cleared_simulator_cannot_be_named() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut stream = StreamWriter::new();
    stream
        .open(&registry(log.clone()), "mock", "test", "", "", Value::Null, 0.0)
        .unwrap();
    let mut simulator = simulator();
    simulator.clear();
    assert!(matches!(
        stream.process(Some(&simulator), "n", 1.0, "view", None),
        Err(SimulationError::Internal(InternalError::SimulatorDestroyed))
    ));
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[test]
fn unknown_plugin_fails_to_load() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let registry = registry(log.clone()).with("test", "broken", |_| Err(String::from("missing library")));

    let mut stream = StreamWriter::new();
    match stream.open(&registry, "nowhere", "test", "", "", Value::Null, 0.0) {
        Err(SimulationError::Internal(InternalError::PluginLoad { plugin, .. })) => assert_eq!(plugin, "nowhere"),
        other => panic!("unexpected result: {:?}", other),
    }
    match stream.open(&registry, "broken", "test", "", "", Value::Null, 0.0) {
        Err(SimulationError::Internal(InternalError::PluginLoad { cause, .. })) => assert_eq!(cause, "missing library"),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(matches!(
        stream.open(&registry, "mock", "", "", "", Value::Null, 0.0),
        Err(SimulationError::Internal(InternalError::PluginLoad { .. }))
    ));
    assert!(!stream.is_opened());
    assert!(log.lock().unwrap().is_empty());
}
