//! Resolution of the atomic endpoints of a port.  Bridging connections
//! are followed through any depth of coupled models, so only atomic
//! models are returned.

use std::collections::BTreeSet;

use super::{BaseModel, ModelGraph, ModelId, PortSide};

impl ModelGraph {
    /// Atomic input ports reached by the output port `port` of `model`.
    /// An unknown model or port has no target.
    pub fn atomic_targets(&self, model: ModelId, port: &str) -> Vec<(ModelId, String)> {
        let mut targets = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut stack = vec![(PortSide::Output, model, port.to_string())];

        while let Some((side, current, current_port)) = stack.pop() {
            if !visited.insert((side, current, current_port.clone())) {
                continue;
            }
            match side {
                // Output side of `current`: siblings receive on their input
                // side, the parent forwards on its own output side.
                PortSide::Output => {
                    let parent = self.slot(current).and_then(BaseModel::parent);
                    if let Some(list) = self.port_list(current, PortSide::Output, &current_port) {
                        for (peer, peer_port) in list {
                            let next = if Some(*peer) == parent {
                                PortSide::Output
                            } else {
                                PortSide::Input
                            };
                            stack.push((next, *peer, peer_port.clone()));
                        }
                    }
                }
                _ => match self.slot(current) {
                    Some(node) if node.is_atomic() => {
                        targets.insert((current, current_port));
                    }
                    Some(node) => {
                        if let Some(list) = node
                            .as_coupled()
                            .and_then(|coupled| coupled.internal_inputs.get(&current_port))
                        {
                            for (child, child_port) in list {
                                stack.push((PortSide::Input, *child, child_port.clone()));
                            }
                        }
                    }
                    None => {}
                },
            }
        }
        targets.into_iter().collect()
    }

    /// Atomic output ports feeding the input port `port` of `model`.
    pub fn atomic_sources(&self, model: ModelId, port: &str) -> Vec<(ModelId, String)> {
        let mut sources = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut stack = vec![(PortSide::Input, model, port.to_string())];

        while let Some((side, current, current_port)) = stack.pop() {
            if !visited.insert((side, current, current_port.clone())) {
                continue;
            }
            match side {
                PortSide::Input => {
                    let parent = self.slot(current).and_then(BaseModel::parent);
                    if let Some(list) = self.port_list(current, PortSide::Input, &current_port) {
                        for (peer, peer_port) in list {
                            let next = if Some(*peer) == parent {
                                PortSide::Input
                            } else {
                                PortSide::Output
                            };
                            stack.push((next, *peer, peer_port.clone()));
                        }
                    }
                }
                _ => match self.slot(current) {
                    Some(node) if node.is_atomic() => {
                        sources.insert((current, current_port));
                    }
                    Some(node) => {
                        if let Some(list) = node
                            .as_coupled()
                            .and_then(|coupled| coupled.internal_outputs.get(&current_port))
                        {
                            for (child, child_port) in list {
                                stack.push((PortSide::Output, *child, child_port.clone()));
                            }
                        }
                    }
                    None => {}
                },
            }
        }
        sources.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{AtomicModel, ModelGraph};

    #[test]
    fn targets_cross_coupled_boundaries() {
        let mut graph = ModelGraph::new("top");
        let root = graph.root();
        let a = graph.add_atomic_model(root, "a", AtomicModel::new("d")).unwrap();
        graph.add_output_port(a, "out").unwrap();
        let left = graph.add_coupled_model(root, "left").unwrap();
        let right = graph.add_coupled_model(root, "right").unwrap();
        let b = graph.add_atomic_model(left, "b", AtomicModel::new("d")).unwrap();
        let c = graph.add_atomic_model(right, "c", AtomicModel::new("d")).unwrap();
        graph.add_output_port(b, "out").unwrap();
        graph.add_input_port(c, "in").unwrap();
        graph.add_input_port(c, "other").unwrap();
        graph.add_output_port(left, "out").unwrap();
        graph.add_input_port(right, "in").unwrap();

        graph.add_output_connection(left, b, "out", "out").unwrap();
        graph.add_internal_connection(root, left, "out", right, "in").unwrap();
        graph.add_input_connection(right, "in", c, "in").unwrap();
        graph.add_input_connection(right, "in", c, "other").unwrap();

        assert_eq!(
            vec![(c, String::from("in")), (c, String::from("other"))],
            graph.atomic_targets(b, "out")
        );
        assert_eq!(vec![(b, String::from("out"))], graph.atomic_sources(c, "in"));
        assert!(graph.atomic_targets(a, "out").is_empty());
        assert!(graph.atomic_targets(a, "unknown").is_empty());
    }
}
