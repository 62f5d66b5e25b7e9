//! Dependency graph over units of work
//!
//! Nodes live in a flat id-keyed map with explicit adjacency id-sets. The
//! edge relation is kept acyclic at insertion time: every new edge is checked
//! for a path back to its source before anything is recorded.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::error::GraphError;

#[derive(Clone, Debug, PartialEq)]
struct Node<P> {
    payload: P,
    /// Position in insertion order
    index: usize,
    incoming: BTreeSet<String>,
    outgoing: BTreeSet<String>,
}

/// Acyclic dependency graph; an edge `from -> to` means `to` depends on `from`
#[derive(Clone, Debug, PartialEq)]
pub struct DependencyGraph<P> {
    nodes: HashMap<String, Node<P>>,
    /// Insertion order, used to keep every traversal deterministic
    order: Vec<String>,
}

impl<P> Default for DependencyGraph<P> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<P> DependencyGraph<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: impl Into<String>, payload: P) -> Result<(), GraphError> {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.nodes.insert(
            id.clone(),
            Node {
                payload,
                index: self.order.len(),
                incoming: BTreeSet::new(),
                outgoing: BTreeSet::new(),
            },
        );
        self.order.push(id);
        Ok(())
    }

    /// Record that `to` depends on `from`
    ///
    /// Adding an edge that already exists is a no-op.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        for id in [from, to] {
            if !self.nodes.contains_key(id) {
                return Err(GraphError::UnknownNode(id.to_string()));
            }
        }
        if from == to || self.reaches(to, from) {
            return Err(GraphError::CycleDetected {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        if let Some(node) = self.nodes.get_mut(from) {
            node.outgoing.insert(to.to_string());
        }
        if let Some(node) = self.nodes.get_mut(to) {
            node.incoming.insert(from.to_string());
        }
        debug!(from, to, "edge added");
        Ok(())
    }

    /// Breadth-first reachability probe along outgoing edges
    fn reaches(&self, start: &str, target: &str) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if current == target {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(node) = self.nodes.get(current) {
                queue.extend(
                    node.outgoing
                        .iter()
                        .map(String::as_str)
                        .filter(|next| !visited.contains(next)),
                );
            }
        }
        false
    }

    /// Kahn's algorithm; ties are broken by insertion order
    pub fn topological_sort(&self) -> Vec<String> {
        let mut in_degree: HashMap<&str, usize> = self
            .nodes
            .iter()
            .map(|(id, node)| (id.as_str(), node.incoming.len()))
            .collect();
        let mut queue: VecDeque<&str> = self
            .order
            .iter()
            .map(String::as_str)
            .filter(|id| in_degree.get(id) == Some(&0))
            .collect();
        let mut sorted = Vec::with_capacity(self.nodes.len());

        while let Some(id) = queue.pop_front() {
            sorted.push(id.to_string());
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            let mut ready: Vec<(usize, &str)> = Vec::new();
            for next in &node.outgoing {
                if let Some(degree) = in_degree.get_mut(next.as_str()) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push((self.position(next), next.as_str()));
                    }
                }
            }
            ready.sort_unstable_by_key(|(index, _)| *index);
            queue.extend(ready.into_iter().map(|(_, id)| id));
        }

        sorted
    }

    /// Non-completed nodes whose every dependency is in `completed`
    ///
    /// Pure; dispatch policy belongs to the caller.
    pub fn get_executable_nodes(&self, completed: &HashSet<String>) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| !completed.contains(*id))
            .filter(|id| {
                self.nodes
                    .get(*id)
                    .map(|node| node.incoming.iter().all(|dep| completed.contains(dep)))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Standalone depth-first cycle check
    pub fn has_cycle(&self) -> bool {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        self.order
            .iter()
            .any(|id| !visited.contains(id.as_str()) && self.dfs_cycle(id, &mut visited, &mut rec_stack))
    }

    fn dfs_cycle<'a>(
        &'a self,
        id: &'a str,
        visited: &mut HashSet<&'a str>,
        rec_stack: &mut HashSet<&'a str>,
    ) -> bool {
        visited.insert(id);
        rec_stack.insert(id);

        if let Some(node) = self.nodes.get(id) {
            for next in &node.outgoing {
                if rec_stack.contains(next.as_str()) {
                    return true;
                }
                if !visited.contains(next.as_str()) && self.dfs_cycle(next, visited, rec_stack) {
                    return true;
                }
            }
        }

        rec_stack.remove(id);
        false
    }

    /// Ids `id` depends on
    pub fn get_dependencies(&self, id: &str) -> Result<Vec<String>, GraphError> {
        self.node(id)
            .map(|node| node.incoming.iter().cloned().collect())
    }

    /// Ids depending on `id`
    pub fn get_dependents(&self, id: &str) -> Result<Vec<String>, GraphError> {
        self.node(id)
            .map(|node| node.outgoing.iter().cloned().collect())
    }

    pub fn payload(&self, id: &str) -> Option<&P> {
        self.nodes.get(id).map(|node| &node.payload)
    }

    pub fn payload_mut(&mut self, id: &str) -> Option<&mut P> {
        self.nodes.get_mut(id).map(|node| &mut node.payload)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Node ids in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|node| node.outgoing.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, id: &str) -> Result<&Node<P>, GraphError> {
        self.nodes
            .get(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))
    }

    fn position(&self, id: &str) -> usize {
        self.nodes.get(id).map_or(usize::MAX, |node| node.index)
    }

    /// Bypasses the cycle check so `has_cycle` can be exercised
    #[cfg(test)]
    fn force_edge(&mut self, from: &str, to: &str) {
        if let Some(node) = self.nodes.get_mut(from) {
            node.outgoing.insert(to.to_string());
        }
        if let Some(node) = self.nodes.get_mut(to) {
            node.incoming.insert(from.to_string());
        }
    }
}
