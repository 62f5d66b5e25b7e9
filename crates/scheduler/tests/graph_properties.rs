use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use soultest_scheduler::{DependencyGraph, GraphError};

/// Random DAG: edges only go from earlier to later positions of a shuffled order.
fn random_dag(rng: &mut StdRng, size: usize, density: f64) -> (DependencyGraph<usize>, Vec<(String, String)>) {
    let mut ids: Vec<String> = (0..size).map(|i| format!("n{i}")).collect();
    ids.shuffle(rng);

    let mut graph = DependencyGraph::new();
    for (index, id) in ids.iter().enumerate() {
        graph.add_node(id.clone(), index).unwrap();
    }

    let mut edges = Vec::new();
    for i in 0..size {
        for j in (i + 1)..size {
            if rng.gen_bool(density) {
                graph.add_edge(&ids[i], &ids[j]).unwrap();
                edges.push((ids[i].clone(), ids[j].clone()));
            }
        }
    }
    (graph, edges)
}

#[test]
fn topological_sort_respects_every_edge() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let size = rng.gen_range(0..25);
        let (graph, edges) = random_dag(&mut rng, size, 0.2);

        let order = graph.topological_sort();
        assert_eq!(order.len(), size);
        let position: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(index, id)| (id.as_str(), index))
            .collect();
        assert_eq!(position.len(), size);
        for (from, to) in &edges {
            assert!(position[from.as_str()] < position[to.as_str()]);
        }
        assert!(!graph.has_cycle());
    }
}

#[test]
fn cycle_creating_edges_leave_graph_unchanged() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..30 {
        let size = rng.gen_range(2..20);
        let (mut graph, edges) = random_dag(&mut rng, size, 0.3);
        if edges.is_empty() {
            continue;
        }

        let before = graph.clone();
        let (from, to) = edges[rng.gen_range(0..edges.len())].clone();
        let err = graph.add_edge(&to, &from).unwrap_err();
        assert_eq!(
            err,
            GraphError::CycleDetected {
                from: to.clone(),
                to: from.clone()
            }
        );
        assert_eq!(graph, before);
    }
}

#[test]
fn frontier_is_exactly_the_ready_set() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..50 {
        let size = rng.gen_range(1..20);
        let (graph, _) = random_dag(&mut rng, size, 0.25);
        let ids: Vec<String> = graph.node_ids().map(str::to_string).collect();
        let completed: HashSet<String> = ids
            .iter()
            .filter(|_| rng.gen_bool(0.4))
            .cloned()
            .collect();

        let frontier: HashSet<String> = graph.get_executable_nodes(&completed).into_iter().collect();
        let expected: HashSet<String> = ids
            .iter()
            .filter(|id| !completed.contains(*id))
            .filter(|id| {
                graph
                    .get_dependencies(id)
                    .unwrap()
                    .iter()
                    .all(|dep| completed.contains(dep))
            })
            .cloned()
            .collect();
        assert_eq!(frontier, expected);
    }
}
