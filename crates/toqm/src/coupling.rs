//! Device coupling map.
//!
//! The [`CouplingMap`] describes which pairs of physical qubits may take part
//! in a two-qubit operation. It is immutable after construction and shared
//! by reference for the whole duration of a search.
//!
//! # Example
//!
//! ```
//! use toqm::CouplingMap;
//!
//! let map = CouplingMap::new(3, [(0, 1), (1, 2)]).unwrap();
//! assert!(map.is_adjacent(1, 0));
//! assert!(!map.is_adjacent(0, 2));
//! assert_eq!(map.distance(0, 2), Some(2));
//! ```

use std::collections::{BTreeSet, VecDeque};

use petgraph::algo::connected_components;
use petgraph::graph::UnGraph;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{MapperError, MapperResult};

const UNREACHABLE: u32 = u32::MAX;

/// Serialized form of a coupling map, validated on conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawCouplingMap {
    num_physical_qubits: u32,
    edges: Vec<(u32, u32)>,
}

/// Target device coupling map.
///
/// Edges are undirected and stored normalized as `(low, high)` pairs in
/// ascending order, so iteration over [`edges`](Self::edges) is deterministic
/// regardless of the order the caller supplied them in.
///
/// ## Performance
///
/// On construction, an all-pairs distance matrix is precomputed using BFS
/// from each node. Distance and adjacency checks are O(1) afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCouplingMap", into = "RawCouplingMap")]
pub struct CouplingMap {
    num_qubits: u32,
    edges: Vec<(u32, u32)>,
    adjacency: Vec<Vec<u32>>,
    /// `dist_matrix[from][to]` is the shortest-path distance, or
    /// `UNREACHABLE` when no path exists.
    dist_matrix: Vec<Vec<u32>>,
}

impl CouplingMap {
    /// Create a coupling map from a qubit count and a set of undirected edges.
    ///
    /// Duplicate edges (including reversed pairs) are merged.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::PhysicalQubitOutOfRange`] if an edge references
    /// a qubit `>= num_qubits`, and [`MapperError::SelfLoopEdge`] for an edge
    /// from a qubit to itself.
    pub fn new(
        num_qubits: u32,
        edges: impl IntoIterator<Item = (u32, u32)>,
    ) -> MapperResult<Self> {
        let mut normalized = BTreeSet::new();
        for (a, b) in edges {
            for q in [a, b] {
                if q >= num_qubits {
                    return Err(MapperError::PhysicalQubitOutOfRange {
                        qubit: q,
                        num_physical: num_qubits,
                    });
                }
            }
            if a == b {
                return Err(MapperError::SelfLoopEdge(a));
            }
            normalized.insert((a.min(b), a.max(b)));
        }
        Ok(Self::from_normalized(num_qubits, normalized))
    }

    fn from_normalized(num_qubits: u32, edges: BTreeSet<(u32, u32)>) -> Self {
        let n = num_qubits as usize;
        let mut adjacency = vec![Vec::new(); n];
        for &(a, b) in &edges {
            adjacency[a as usize].push(b);
            adjacency[b as usize].push(a);
        }
        for neighbors in &mut adjacency {
            neighbors.sort_unstable();
        }

        let mut map = Self {
            num_qubits,
            edges: edges.into_iter().collect(),
            adjacency,
            dist_matrix: Vec::new(),
        };
        map.precompute_distances();
        map
    }

    /// Precompute all-pairs shortest paths using BFS from each node.
    fn precompute_distances(&mut self) {
        let n = self.num_qubits as usize;
        self.dist_matrix = vec![vec![UNREACHABLE; n]; n];

        for src in 0..n {
            self.dist_matrix[src][src] = 0;
            let mut queue = VecDeque::new();
            queue.push_back(src);

            while let Some(current) = queue.pop_front() {
                for &neighbor in &self.adjacency[current] {
                    let nb = neighbor as usize;
                    if self.dist_matrix[src][nb] == UNREACHABLE {
                        self.dist_matrix[src][nb] = self.dist_matrix[src][current] + 1;
                        queue.push_back(nb);
                    }
                }
            }
        }
    }

    /// Create a linear coupling map (0-1-2-3-...).
    pub fn linear(n: u32) -> Self {
        Self::from_normalized(n, (1..n).map(|i| (i - 1, i)).collect())
    }

    /// Create a ring coupling map (a linear chain closed back onto qubit 0).
    pub fn ring(n: u32) -> Self {
        let mut edges: BTreeSet<_> = (1..n).map(|i| (i - 1, i)).collect();
        if n > 2 {
            edges.insert((0, n - 1));
        }
        Self::from_normalized(n, edges)
    }

    /// Create a `rows x cols` grid with nearest-neighbour connectivity.
    pub fn grid(rows: u32, cols: u32) -> Self {
        let mut edges = BTreeSet::new();
        for r in 0..rows {
            for c in 0..cols {
                let q = r * cols + c;
                if c + 1 < cols {
                    edges.insert((q, q + 1));
                }
                if r + 1 < rows {
                    edges.insert((q, q + cols));
                }
            }
        }
        Self::from_normalized(rows * cols, edges)
    }

    /// Create a fully connected coupling map.
    pub fn full(n: u32) -> Self {
        let edges = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();
        Self::from_normalized(n, edges)
    }

    /// Create a star topology (center qubit connected to all others).
    pub fn star(n: u32) -> Self {
        Self::from_normalized(n, (1..n).map(|i| (0, i)).collect())
    }

    /// Get the number of physical qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Get the normalized coupling edges in ascending order.
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Get the sorted neighbours of a qubit.
    pub fn neighbors(&self, qubit: u32) -> &[u32] {
        self.adjacency
            .get(qubit as usize)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Check if two distinct qubits are directly connected.
    #[inline]
    pub fn is_adjacent(&self, q1: u32, q2: u32) -> bool {
        q1 != q2 && self.raw_distance(q1, q2) == 1
    }

    /// Shortest-path distance, or `None` if the qubits are disconnected.
    #[inline]
    pub fn distance(&self, from: u32, to: u32) -> Option<u32> {
        match self.raw_distance(from, to) {
            UNREACHABLE => None,
            d => Some(d),
        }
    }

    #[inline]
    fn raw_distance(&self, from: u32, to: u32) -> u32 {
        self.dist_matrix
            .get(from as usize)
            .and_then(|row| row.get(to as usize))
            .copied()
            .unwrap_or(UNREACHABLE)
    }

    /// Build a map over the same qubit indices that keeps only the edges
    /// whose endpoints both lie in `subset`.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::PhysicalQubitOutOfRange`] if the subset names a
    /// qubit the device does not have.
    pub fn restricted(&self, subset: &[u32]) -> MapperResult<Self> {
        let mut keep = vec![false; self.num_qubits as usize];
        for &q in subset {
            let slot = keep
                .get_mut(q as usize)
                .ok_or(MapperError::PhysicalQubitOutOfRange {
                    qubit: q,
                    num_physical: self.num_qubits,
                })?;
            *slot = true;
        }
        let edges = self
            .edges
            .iter()
            .copied()
            .filter(|&(a, b)| keep[a as usize] && keep[b as usize])
            .collect();
        Ok(Self::from_normalized(self.num_qubits, edges))
    }

    /// Number of connected components among the given qubits, counting only
    /// edges whose endpoints are both in the set.
    pub fn components_among(&self, qubits: &[u32]) -> usize {
        let mut graph = UnGraph::<u32, ()>::with_capacity(qubits.len(), self.edges.len());
        let mut index = FxHashMap::default();
        for &q in qubits {
            index
                .entry(q)
                .or_insert_with(|| graph.add_node(q));
        }
        for &(a, b) in &self.edges {
            if let (Some(&na), Some(&nb)) = (index.get(&a), index.get(&b)) {
                graph.add_edge(na, nb, ());
            }
        }
        connected_components(&graph)
    }

    /// Whether every physical qubit can reach every other one.
    pub fn is_connected(&self) -> bool {
        let all: Vec<u32> = (0..self.num_qubits).collect();
        self.components_among(&all) <= 1
    }
}

impl TryFrom<RawCouplingMap> for CouplingMap {
    type Error = MapperError;

    fn try_from(raw: RawCouplingMap) -> MapperResult<Self> {
        Self::new(raw.num_physical_qubits, raw.edges)
    }
}

impl From<CouplingMap> for RawCouplingMap {
    fn from(map: CouplingMap) -> Self {
        Self {
            num_physical_qubits: map.num_qubits,
            edges: map.edges,
        }
    }
}
