//! Per-batch dependency graph.
//!
//! Built fresh for every refresh batch and never persisted. Nodes are the
//! entries being refreshed; edges point from a dependency to its dependents,
//! so a topological pass emits dependencies first. Dependency keys that
//! reference entries outside the batch are treated as already satisfied and
//! impose no ordering constraint.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::entry::{Entry, EntryKey};
use crate::error::RefreshError;

/// Explicit node/edge arena over one batch of entries.
pub struct DependencyGraph<V> {
    nodes: Vec<Entry<V>>,
    /// Dependents of each node, as indices into `nodes`.
    dependents: Vec<Vec<usize>>,
    /// In-batch dependency count per node.
    in_degree: Vec<usize>,
}

impl<V> DependencyGraph<V> {
    /// Build the graph restricted to the given entries.
    ///
    /// Duplicate keys in the input are deduplicated; the last occurrence
    /// wins, on the grounds that the latest submission carries the freshest
    /// metadata. Node order follows first appearance in the input, which is
    /// what makes the sort deterministic.
    pub fn build(entries: Vec<Entry<V>>) -> Self {
        let mut nodes: Vec<Entry<V>> = Vec::with_capacity(entries.len());
        let mut index: HashMap<EntryKey, usize> = HashMap::with_capacity(entries.len());

        for entry in entries {
            match index.get(&entry.key) {
                Some(&slot) => nodes[slot] = entry,
                None => {
                    index.insert(entry.key.clone(), nodes.len());
                    nodes.push(entry);
                }
            }
        }

        let mut dependents = vec![Vec::new(); nodes.len()];
        let mut in_degree = vec![0usize; nodes.len()];
        for (dependent, entry) in nodes.iter().enumerate() {
            for dep_key in &entry.dependency_keys {
                if let Some(&dependency) = index.get(dep_key) {
                    dependents[dependency].push(dependent);
                    in_degree[dependent] += 1;
                }
            }
        }

        Self {
            nodes,
            dependents,
            in_degree,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Produce a refresh order in which every in-batch dependency precedes
    /// its dependents.
    ///
    /// Kahn's algorithm with a min-heap over node indices: among ready nodes
    /// the earliest-submitted one is emitted first, so the output is
    /// reproducible for identical input. If no ready node remains while
    /// unvisited nodes exist, those nodes form at least one cycle (a
    /// self-dependency included) and the sort fails without returning a
    /// partial order.
    pub fn sort_topologically(self) -> Result<Vec<Entry<V>>, RefreshError> {
        let node_count = self.nodes.len();
        let mut in_degree = self.in_degree;
        let mut visited = vec![false; node_count];

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(node, _)| Reverse(node))
            .collect();

        let mut emitted: Vec<usize> = Vec::with_capacity(node_count);
        while let Some(Reverse(node)) = ready.pop() {
            visited[node] = true;
            emitted.push(node);
            for &dependent in &self.dependents[node] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }

        if emitted.len() < node_count {
            let keys = self
                .nodes
                .iter()
                .enumerate()
                .filter(|&(node, _)| !visited[node])
                .map(|(_, entry)| entry.key.clone())
                .collect();
            return Err(RefreshError::cycle_detected(keys));
        }

        let mut rank = vec![0usize; node_count];
        for (position, &node) in emitted.iter().enumerate() {
            rank[node] = position;
        }
        let mut ordered: Vec<(usize, Entry<V>)> = self
            .nodes
            .into_iter()
            .enumerate()
            .map(|(node, entry)| (rank[node], entry))
            .collect();
        ordered.sort_by_key(|&(position, _)| position);
        Ok(ordered.into_iter().map(|(_, entry)| entry).collect())
    }
}
