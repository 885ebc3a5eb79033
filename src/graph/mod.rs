//! Package-import and symbol dependency graphs.
//!
//! Both graphs share one representation: an arena of nodes addressed by a
//! small integer id, with edges stored as `(from, to)` pairs rather than
//! nodes holding pointers/references to each other. This is the same
//! ownership discipline as [`crate::model`]'s symbol arena, applied to
//! graph structure specifically because Rust can't express a cyclic
//! pointer graph without `Rc`/`RefCell` or unsafe, and the import/symbol
//! graphs are expected to contain cycles (that's the thing
//! [`PackageGraph::cycles`] exists to find).

use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

/// A directed graph over package import paths. Edges are "imports",
/// pointing from importer to imported; test-only imports are tracked
/// separately so cycle detection can exclude them per §4.3's "test imports
/// don't count toward production cycles" rule.
#[derive(Debug, Clone, Default)]
pub struct PackageGraph {
    nodes: Vec<String>,
    index: FxHashMap<String, NodeId>,
    edges: Vec<(NodeId, NodeId)>,
    test_only_edges: FxHashSet<(NodeId, NodeId)>,
}

impl PackageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&mut self, import_path: &str) -> NodeId {
        if let Some(id) = self.index.get(import_path) {
            return *id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(import_path.to_string());
        self.index.insert(import_path.to_string(), id);
        id
    }

    pub fn find(&self, import_path: &str) -> Option<NodeId> {
        self.index.get(import_path).copied()
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0 as usize]
    }

    pub fn add_edge(&mut self, from: &str, to: &str, test_only: bool) {
        let from_id = self.node(from);
        let to_id = self.node(to);
        if !self.edges.contains(&(from_id, to_id)) {
            self.edges.push((from_id, to_id));
        }
        if test_only {
            self.test_only_edges.insert((from_id, to_id));
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.edges.clear();
        self.test_only_edges.clear();
    }

    fn production_edges(&self) -> impl Iterator<Item = &(NodeId, NodeId)> {
        self.edges.iter().filter(|e| !self.test_only_edges.contains(e))
    }

    fn adjacency(&self, include_test_only: bool) -> FxHashMap<NodeId, Vec<NodeId>> {
        let mut adj: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
        let edges: Box<dyn Iterator<Item = &(NodeId, NodeId)>> = if include_test_only {
            Box::new(self.edges.iter())
        } else {
            Box::new(self.production_edges())
        };
        for &(from, to) in edges {
            adj.entry(from).or_default().push(to);
        }
        adj
    }

    /// Finds every elementary cycle among production (non-test-only)
    /// import edges, each reported as the ordered list of import paths
    /// forming the cycle.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let adj = self.adjacency(false);
        let mut found = Vec::new();
        let mut visited = FxHashSet::default();

        for start in 0..self.nodes.len() {
            let start = NodeId(start as u32);
            if visited.contains(&start) {
                continue;
            }
            let mut stack = Vec::new();
            let mut on_stack = FxHashSet::default();
            self.dfs_cycles(start, &adj, &mut stack, &mut on_stack, &mut visited, &mut found);
        }

        found
    }

    #[allow(clippy::too_many_arguments)]
    fn dfs_cycles(
        &self,
        node: NodeId,
        adj: &FxHashMap<NodeId, Vec<NodeId>>,
        stack: &mut Vec<NodeId>,
        on_stack: &mut FxHashSet<NodeId>,
        visited: &mut FxHashSet<NodeId>,
        found: &mut Vec<Vec<String>>,
    ) {
        visited.insert(node);
        stack.push(node);
        on_stack.insert(node);

        if let Some(next_nodes) = adj.get(&node) {
            for &next in next_nodes {
                if on_stack.contains(&next) {
                    let start_pos = stack.iter().position(|&n| n == next).unwrap();
                    let cycle = stack[start_pos..]
                        .iter()
                        .map(|&id| self.name(id).to_string())
                        .collect();
                    found.push(cycle);
                } else if !visited.contains(&next) {
                    self.dfs_cycles(next, adj, stack, on_stack, visited, found);
                }
            }
        }

        stack.pop();
        on_stack.remove(&node);
    }

    pub fn has_cycles(&self) -> bool {
        !self.cycles().is_empty()
    }

    /// Kahn's algorithm over production edges. Returns `None` if a cycle
    /// makes a total order impossible.
    pub fn topological_order(&self) -> Option<Vec<String>> {
        let adj = self.adjacency(false);
        let mut in_degree: FxHashMap<NodeId, usize> = FxHashMap::default();
        for id in 0..self.nodes.len() {
            in_degree.insert(NodeId(id as u32), 0);
        }
        for targets in adj.values() {
            for &t in targets {
                *in_degree.entry(t).or_insert(0) += 1;
            }
        }

        let mut queue: Vec<NodeId> = in_degree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(id, _)| *id)
            .collect();
        queue.sort();

        let mut order = Vec::new();
        while let Some(node) = queue.pop() {
            order.push(node);
            if let Some(targets) = adj.get(&node) {
                let mut newly_free = Vec::new();
                for &t in targets {
                    let deg = in_degree.get_mut(&t).unwrap();
                    *deg -= 1;
                    if *deg == 0 {
                        newly_free.push(t);
                    }
                }
                newly_free.sort();
                queue.extend(newly_free);
            }
        }

        if order.len() != self.nodes.len() {
            return None;
        }
        Some(order.into_iter().map(|id| self.name(id).to_string()).collect())
    }

    /// Assigns each node a level: 0 for a leaf/external package (no
    /// outgoing production edges), otherwise `1 + max(level(dependency))`.
    /// Returns `None` if the graph has a cycle.
    pub fn levels(&self) -> Option<FxHashMap<String, u32>> {
        let order = self.topological_order()?;
        let adj = self.adjacency(false);
        let mut levels: FxHashMap<NodeId, u32> = FxHashMap::default();

        for name in order.iter().rev() {
            let id = self.find(name).unwrap();
            let level = adj
                .get(&id)
                .map(|deps| deps.iter().map(|d| levels.get(d).copied().unwrap_or(0) + 1).max().unwrap_or(0))
                .unwrap_or(0);
            levels.insert(id, level);
        }

        Some(
            levels
                .into_iter()
                .map(|(id, lvl)| (self.name(id).to_string(), lvl))
                .collect(),
        )
    }

    /// Every import path reachable from `from` via production edges.
    pub fn transitive_dependencies(&self, from: &str) -> FxHashSet<String> {
        let adj = self.adjacency(false);
        let mut seen = FxHashSet::default();
        let mut stack = Vec::new();
        if let Some(start) = self.find(from) {
            stack.push(start);
        }
        while let Some(node) = stack.pop() {
            if let Some(targets) = adj.get(&node) {
                for &t in targets {
                    if seen.insert(self.name(t).to_string()) {
                        stack.push(t);
                    }
                }
            }
        }
        seen
    }

    /// Whether adding an edge `from -> to` would create a new cycle,
    /// without mutating the graph. Used by move/extract operations to
    /// reject a destination that would introduce a cyclic import.
    pub fn would_create_cycle(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }
        self.transitive_dependencies(to).contains(from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_a_simple_cycle() {
        let mut g = PackageGraph::new();
        g.add_edge("a", "b", false);
        g.add_edge("b", "a", false);
        assert!(g.has_cycles());
        let cycles = g.cycles();
        assert_eq!(cycles.len(), 1);
    }

    #[test]
    fn test_only_edges_excluded_from_cycles() {
        let mut g = PackageGraph::new();
        g.add_edge("a", "b", false);
        g.add_edge("b", "a", true);
        assert!(!g.has_cycles());
    }

    #[test]
    fn topological_order_respects_edges() {
        let mut g = PackageGraph::new();
        g.add_edge("app", "lib", false);
        g.add_edge("lib", "base", false);
        let order = g.topological_order().unwrap();
        let pos = |n: &str| order.iter().position(|x| x == n).unwrap();
        assert!(pos("base") < pos("lib"));
        assert!(pos("lib") < pos("app"));
    }

    #[test]
    fn levels_increase_with_depth() {
        let mut g = PackageGraph::new();
        g.add_edge("app", "lib", false);
        g.add_edge("lib", "base", false);
        let levels = g.levels().unwrap();
        assert_eq!(levels["base"], 0);
        assert_eq!(levels["lib"], 1);
        assert_eq!(levels["app"], 2);
    }

    #[test]
    fn detects_would_create_cycle() {
        let mut g = PackageGraph::new();
        g.add_edge("app", "lib", false);
        assert!(g.would_create_cycle("lib", "app"));
        assert!(!g.would_create_cycle("app", "lib"));
    }

    #[test]
    fn transitive_dependencies_include_indirect() {
        let mut g = PackageGraph::new();
        g.add_edge("app", "lib", false);
        g.add_edge("lib", "base", false);
        let deps = g.transitive_dependencies("app");
        assert!(deps.contains("lib"));
        assert!(deps.contains("base"));
    }
}
