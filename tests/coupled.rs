use devsim::dynamics::{Dynamics, SerializableDynamics};
use devsim::models::{AtomicModel, BasicConnection, ModelGraph, ModelId};
use devsim::simulator::Simulator;
use devsim::utils::errors::DevsGraphError;

struct Idle;

impl SerializableDynamics for Idle {}

impl Dynamics for Idle {}

fn atomic(graph: &mut ModelGraph, parent: ModelId, name: &str, inputs: &[&str], outputs: &[&str]) -> ModelId {
    let id = graph
        .add_atomic_model(parent, name, AtomicModel::new("idle"))
        .unwrap();
    for port in inputs {
        graph.add_input_port(id, port).unwrap();
    }
    for port in outputs {
        graph.add_output_port(id, port).unwrap();
    }
    id
}

#[test]
fn connections_are_symmetric() {
    let mut graph = ModelGraph::new("top");
    let top = graph.root();
    graph.add_input_port(top, "in").unwrap();
    graph.add_output_port(top, "out").unwrap();
    let a = atomic(&mut graph, top, "a", &["in"], &["out"]);
    let b = atomic(&mut graph, top, "b", &["in"], &["out"]);
    let c = atomic(&mut graph, top, "c", &["in"], &[]);

    graph.add_input_connection(top, "in", a, "in").unwrap();
    graph.add_internal_connection(top, a, "out", b, "in").unwrap();
    graph.add_internal_connection(top, a, "out", c, "in").unwrap();
    graph.add_output_connection(top, b, "out", "out").unwrap();
    assert!(graph.is_consistent(), "{:?}", graph.consistency_errors());

    assert!(graph.exist_input_connection(top, "in", a, "in"));
    assert!(graph.exist_internal_connection(top, a, "out", b, "in"));
    assert!(graph.exist_internal_connection(top, a, "out", c, "in"));
    assert!(graph.exist_output_connection(top, b, "out", "out"));
    assert_eq!(graph.nb_internal_connection(top, a, "out", b, "in"), 1);
    assert_eq!(graph.nb_input_connection(top, "in", a, "in"), 1);

    graph.del_internal_connection(top, a, "out", c, "in").unwrap();
    assert!(!graph.exist_internal_connection(top, a, "out", c, "in"));
    assert_eq!(graph.nb_internal_connection(top, a, "out", c, "in"), 0);
    assert!(graph.exist_internal_connection(top, a, "out", b, "in"));

    graph.del_model(top, b).unwrap();
    assert!(!graph.exist_output_connection(top, b, "out", "out"));
    assert!(graph.coupled(top).unwrap().internal_outputs().get("out").unwrap().is_empty());
    assert!(graph.is_consistent(), "{:?}", graph.consistency_errors());
}

#[test]
fn invalid_connections_leave_the_graph_unchanged() {
    let mut graph = ModelGraph::new("top");
    let top = graph.root();
    let a = atomic(&mut graph, top, "a", &["in"], &["out"]);
    let sub = graph.add_coupled_model(top, "sub").unwrap();
    let inner = atomic(&mut graph, sub, "inner", &["in"], &[]);
    let before = graph.connections();

    assert!(matches!(
        graph.add_internal_connection(top, top, "out", a, "in"),
        Err(DevsGraphError::SelfConnection { .. })
    ));
    assert!(matches!(
        graph.add_internal_connection(top, a, "out", inner, "in"),
        Err(DevsGraphError::NotAChild { .. })
    ));
    assert!(matches!(
        graph.add_internal_connection(top, a, "missing", a, "in"),
        Err(DevsGraphError::PortNotFound { .. })
    ));
    assert_eq!(before, graph.connections());
}

#[test]
fn basic_connections_are_all_or_nothing() {
    let mut graph = ModelGraph::new("top");
    let top = graph.root();
    let a = atomic(&mut graph, top, "a", &[], &["out"]);
    atomic(&mut graph, top, "b", &["in"], &[]);
    let connections = vec![
        BasicConnection {
            source: String::from("a"),
            source_port: String::from("out"),
            destination: String::from("b"),
            destination_port: String::from("in"),
        },
        BasicConnection {
            source: String::from("a"),
            source_port: String::from("out"),
            destination: String::from("nobody"),
            destination_port: String::from("in"),
        },
    ];
    let result = graph.set_basic_connections(top, &connections);
    assert!(matches!(result, Err(DevsGraphError::BasicConnection { .. })));
    assert!(graph.basic_connections(top, &[a]).unwrap().is_empty());

    graph.set_basic_connections(top, &connections[..1]).unwrap();
    assert_eq!(graph.basic_connections(top, &[a]).unwrap(), connections[..1].to_vec());
}

#[test]
fn displace_bridges_connections_through_the_destination() {
    let mut graph = ModelGraph::new("top");
    let top = graph.root();
    graph.add_input_port(top, "start").unwrap();
    let a = atomic(&mut graph, top, "a", &["in"], &["out"]);
    let b = atomic(&mut graph, top, "b", &["in"], &[]);
    let c = atomic(&mut graph, top, "c", &["in"], &[]);
    let sub = graph.add_coupled_model(top, "sub").unwrap();
    graph.add_input_connection(top, "start", a, "in").unwrap();
    graph.add_internal_connection(top, a, "out", b, "in").unwrap();
    graph.add_internal_connection(top, a, "out", c, "in").unwrap();

    graph.displace(top, &[a, b], sub).unwrap();

    assert_eq!(graph.parent(a).unwrap(), Some(sub));
    assert_eq!(graph.parent(b).unwrap(), Some(sub));
    assert!(graph.exist_internal_connection(sub, a, "out", b, "in"));
    assert!(graph.exist_output_port(sub, "in"));
    assert!(graph.exist_output_connection(sub, a, "out", "in"));
    assert!(graph.exist_internal_connection(top, sub, "in", c, "in"));
    assert!(graph.exist_input_port(sub, "start"));
    assert!(graph.exist_input_connection(sub, "start", a, "in"));
    assert!(graph.exist_input_connection(top, "start", sub, "start"));
    assert!(graph.is_consistent(), "{:?}", graph.consistency_errors());

    let targets = graph.atomic_targets(a, "out");
    assert_eq!(targets, vec![(b, String::from("in")), (c, String::from("in"))]);
}

#[test]
fn displace_names_bridges_after_free_ports() {
    let mut graph = ModelGraph::new("top");
    let top = graph.root();
    let a = atomic(&mut graph, top, "a", &[], &["out"]);
    let b = atomic(&mut graph, top, "b", &["in"], &[]);
    let sub = graph.add_coupled_model(top, "sub").unwrap();
    graph.add_input_port(sub, "in").unwrap();
    graph.add_output_port(sub, "in").unwrap();
    graph.add_internal_connection(top, a, "out", b, "in").unwrap();

    graph.displace(top, &[a], sub).unwrap();

    assert!(graph.exist_output_port(sub, "in_1"));
    assert!(graph.exist_internal_connection(top, sub, "in_1", b, "in"));
    assert_eq!(graph.atomic_targets(a, "out"), vec![(b, String::from("in"))]);
}

#[test]
fn failed_displace_changes_nothing() {
    let mut graph = ModelGraph::new("top");
    let top = graph.root();
    let a = atomic(&mut graph, top, "a", &[], &["out"]);
    let b = atomic(&mut graph, top, "b", &["in"], &[]);
    let sub = graph.add_coupled_model(top, "sub").unwrap();
    let inner = graph.add_coupled_model(sub, "inner").unwrap();
    graph.add_internal_connection(top, a, "out", b, "in").unwrap();
    let before = graph.connections();

    assert!(matches!(
        graph.displace(top, &[a], inner),
        Err(DevsGraphError::ConnectionProblem(_))
    ));
    assert!(matches!(
        graph.displace(top, &[sub], inner),
        Err(DevsGraphError::InvalidDestination(_))
    ));
    assert_eq!(graph.parent(a).unwrap(), Some(top));
    assert_eq!(before, graph.connections());
    assert!(graph.is_consistent());
}

#[test]
fn displace_into_a_foreign_model_fails_on_external_connections() {
    let mut graph = ModelGraph::new("top");
    let top = graph.root();
    let left = graph.add_coupled_model(top, "left").unwrap();
    let right = graph.add_coupled_model(top, "right").unwrap();
    let a = atomic(&mut graph, left, "a", &[], &["out"]);
    let b = atomic(&mut graph, left, "b", &["in"], &[]);
    graph.add_internal_connection(left, a, "out", b, "in").unwrap();
    let before = graph.connections();

    let result = graph.displace(left, &[a], right);
    assert!(matches!(result, Err(DevsGraphError::ConnectionProblem(_))));
    assert_eq!(graph.parent(a).unwrap(), Some(left));
    assert_eq!(before, graph.connections());

    graph.displace(left, &[a, b], right).unwrap();
    assert!(graph.exist_internal_connection(right, a, "out", b, "in"));
    assert!(graph.coupled(left).unwrap().is_empty());
}

#[test]
fn target_cache_follows_the_graph() {
    let mut graph = ModelGraph::new("top");
    let top = graph.root();
    let a = atomic(&mut graph, top, "a", &[], &["out"]);
    let b = atomic(&mut graph, top, "b", &["in"], &[]);
    let c = atomic(&mut graph, top, "c", &["in"], &[]);
    graph.add_internal_connection(top, a, "out", b, "in").unwrap();
    graph.add_internal_connection(top, a, "out", c, "in").unwrap();

    let mut simulator = Simulator::from_graph(&graph, a, Box::new(Idle)).unwrap();
    let first = simulator.targets("out", &graph, |_| true).to_vec();
    let second = simulator.targets("out", &graph, |_| true).to_vec();
    assert_eq!(first, vec![(b, String::from("in")), (c, String::from("in"))]);
    assert_eq!(first, second);
    assert!(simulator.is_resolved("out"));

    graph.del_internal_connection(top, a, "out", c, "in").unwrap();
    assert_eq!(simulator.targets("out", &graph, |_| true), &[(b, String::from("in"))][..]);

    graph.del_internal_connection(top, a, "out", b, "in").unwrap();
    assert!(simulator.targets("out", &graph, |_| true).is_empty());
    assert!(simulator.is_resolved("out"));
}

#[test]
fn targets_wait_for_every_simulator() {
    let mut graph = ModelGraph::new("top");
    let top = graph.root();
    let a = atomic(&mut graph, top, "a", &[], &["out"]);
    let b = atomic(&mut graph, top, "b", &["in"], &[]);
    graph.add_internal_connection(top, a, "out", b, "in").unwrap();

    let mut simulator = Simulator::from_graph(&graph, a, Box::new(Idle)).unwrap();
    assert!(simulator.targets("out", &graph, |model| model != b).is_empty());
    assert!(!simulator.is_resolved("out"));
    assert_eq!(simulator.targets("out", &graph, |_| true).len(), 1);
}

#[test]
fn replace_keeps_the_connections() {
    let mut graph = ModelGraph::new("top");
    let top = graph.root();
    let a = atomic(&mut graph, top, "a", &[], &["out"]);
    let b = atomic(&mut graph, top, "b", &["in"], &[]);
    graph.add_internal_connection(top, a, "out", b, "in").unwrap();

    let fresh = graph.new_atomic_model("b", AtomicModel::new("other"));
    graph.replace(top, b, fresh).unwrap();

    assert!(!graph.contains(b));
    assert_eq!(graph.find_model(top, "b"), Some(fresh));
    assert!(graph.exist_internal_connection(top, a, "out", fresh, "in"));
    assert_eq!(graph.atomic(fresh).unwrap().dynamics, "other");
    assert!(graph.is_consistent(), "{:?}", graph.consistency_errors());
}
