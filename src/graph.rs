use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

static EMPTY: BTreeSet<String> = BTreeSet::new();

/// Directed graph over condition ids. An edge `a -> b` means "a depends on b".
///
/// Edges form a set, so adding one twice is a no-op. Self-loops are accepted
/// here; the engine is responsible for rejecting them for conditions.
#[derive(Debug, Clone, Default)]
pub struct ConditionGraph {
    adjacency: BTreeMap<String, BTreeSet<String>>,
}

impl ConditionGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, vertex: &str) {
        if !self.adjacency.contains_key(vertex) {
            self.adjacency.insert(vertex.to_owned(), BTreeSet::new());
        }
    }

    /// Record `from -> to`, inserting either vertex if absent.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.add_vertex(to);
        self.add_vertex(from);
        if let Some(targets) = self.adjacency.get_mut(from) {
            targets.insert(to.to_owned());
        }
    }

    /// Direct successors of `vertex`; empty for an unknown vertex.
    #[must_use]
    pub fn adjacent_to(&self, vertex: &str) -> &BTreeSet<String> {
        self.adjacency.get(vertex).unwrap_or(&EMPTY)
    }

    #[must_use]
    pub fn contains(&self, vertex: &str) -> bool {
        self.adjacency.contains_key(vertex)
    }

    pub fn vertices(&self) -> impl Iterator<Item = &str> {
        self.adjacency.keys().map(String::as_str)
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum()
    }

    /// Breadth-first traversal from `start`, including `start` itself.
    /// An unknown start vertex yields nothing.
    #[must_use]
    pub fn bfs<'g>(&'g self, start: &str) -> BreadthFirst<'g> {
        BreadthFirst::new(self, start)
    }

    /// Whether `to` can be reached from `from` by following at least zero edges.
    #[must_use]
    pub fn reaches(&self, from: &str, to: &str) -> bool {
        self.bfs(from).any(|v| v == to)
    }

    /// Shortest path `from .. to` (both ends included), if one exists.
    #[must_use]
    pub fn path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let (start, _) = self.adjacency.get_key_value(from)?;
        let mut parent: HashMap<&str, &str> = HashMap::new();
        let mut visited: HashSet<&str> = HashSet::from([start.as_str()]);
        let mut queue: VecDeque<&str> = VecDeque::from([start.as_str()]);

        while let Some(vertex) = queue.pop_front() {
            if vertex == to {
                let mut path = vec![vertex.to_owned()];
                let mut cursor = vertex;
                while let Some(&prev) = parent.get(cursor) {
                    path.push(prev.to_owned());
                    cursor = prev;
                }
                path.reverse();
                return Some(path);
            }
            for next in self.adjacent_to(vertex) {
                if visited.insert(next.as_str()) {
                    parent.insert(next.as_str(), vertex);
                    queue.push_back(next.as_str());
                }
            }
        }
        None
    }

    /// Kahn's algorithm. Returns vertices with every dependency ahead of its
    /// dependents, or a cycle path (first vertex repeated at the end).
    ///
    /// # Errors
    ///
    /// Returns the offending cycle when the graph is not acyclic.
    pub fn topological_order(&self) -> Result<Vec<String>, Vec<String>> {
        // remaining[v] = number of v's dependencies not yet emitted
        let mut remaining: BTreeMap<&str, usize> = self
            .adjacency
            .iter()
            .map(|(v, deps)| (v.as_str(), deps.len()))
            .collect();

        // dependents[x] = vertices that depend on x
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
        for (vertex, deps) in &self.adjacency {
            for dep in deps {
                dependents.entry(dep.as_str()).or_default().push(vertex.as_str());
            }
        }

        let mut queue: VecDeque<&str> = remaining
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(v, _)| *v)
            .collect();

        let mut sorted = Vec::with_capacity(self.adjacency.len());
        while let Some(vertex) = queue.pop_front() {
            if let Some(waiting) = dependents.get(vertex) {
                for &dependent in waiting {
                    if let Some(deg) = remaining.get_mut(dependent) {
                        *deg -= 1;
                        if *deg == 0 {
                            queue.push_back(dependent);
                        }
                    }
                }
            }
            sorted.push(vertex.to_owned());
        }

        if sorted.len() == self.adjacency.len() {
            Ok(sorted)
        } else {
            Err(self.find_cycle().unwrap_or_default())
        }
    }

    /// DFS cycle finder for error reporting. The returned path starts and
    /// ends with the same vertex.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut state: HashMap<&str, DfsState> = HashMap::new();
        let mut stack: Vec<&str> = Vec::new();

        for vertex in self.adjacency.keys() {
            if !state.contains_key(vertex.as_str()) {
                if let Some(cycle) = self.dfs(vertex, &mut state, &mut stack) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn dfs<'g>(
        &'g self,
        node: &'g str,
        state: &mut HashMap<&'g str, DfsState>,
        stack: &mut Vec<&'g str>,
    ) -> Option<Vec<String>> {
        state.insert(node, DfsState::InStack);
        stack.push(node);

        for neighbor in self.adjacent_to(node) {
            match state.get(neighbor.as_str()) {
                Some(DfsState::InStack) => {
                    let pos = stack.iter().position(|&n| n == neighbor.as_str())?;
                    let mut cycle: Vec<String> =
                        stack[pos..].iter().map(|&s| s.to_owned()).collect();
                    cycle.push(neighbor.clone());
                    return Some(cycle);
                }
                None => {
                    if let Some(cycle) = self.dfs(neighbor, state, stack) {
                        return Some(cycle);
                    }
                }
                Some(DfsState::Done) => {}
            }
        }

        stack.pop();
        state.insert(node, DfsState::Done);
        None
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DfsState {
    InStack,
    Done,
}

/// Breadth-first iterator over a [`ConditionGraph`].
///
/// Owns its visited set and queue; once advanced it cannot be rewound.
#[derive(Debug)]
pub struct BreadthFirst<'g> {
    graph: &'g ConditionGraph,
    visited: HashSet<&'g str>,
    queue: VecDeque<&'g str>,
}

impl<'g> BreadthFirst<'g> {
    fn new(graph: &'g ConditionGraph, start: &str) -> Self {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        if let Some((key, _)) = graph.adjacency.get_key_value(start) {
            visited.insert(key.as_str());
            queue.push_back(key.as_str());
        }
        Self {
            graph,
            visited,
            queue,
        }
    }
}

impl<'g> Iterator for BreadthFirst<'g> {
    type Item = &'g str;

    fn next(&mut self) -> Option<&'g str> {
        let vertex = self.queue.pop_front()?;
        for next in self.graph.adjacent_to(vertex) {
            if self.visited.insert(next.as_str()) {
                self.queue.push_back(next.as_str());
            }
        }
        Some(vertex)
    }
}
