//! Node, wire, and branch identifiers, and the union-find topology builder.
//!
//! A [`Circuit`](crate::circuit::Circuit) stores nodes as opaque ids
//! assigned by an external caller (an editor placing terminals at world
//! coordinates). [`NodeManager`] merges nodes that are transitively
//! connected by wires into a single compact matrix index, with index 0
//! reserved for ground.

use std::collections::HashMap;

/// Identifier for an electrical node, assigned by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The distinguished ground node id.
    pub const GROUND: NodeId = NodeId(0);

    /// Whether this is the ground node.
    pub fn is_ground(&self) -> bool {
        *self == Self::GROUND
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_ground() {
            write!(f, "GND")
        } else {
            write!(f, "N{}", self.0)
        }
    }
}

/// Identifier for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub usize);

/// Identifier for a wire connecting two node ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WireId(pub usize);

/// Identifier for a branch-current unknown (owned by a voltage-defining
/// device).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchId(pub usize);

/// A wire: an ideal zero-resistance connection between two node ids.
#[derive(Debug, Clone, Copy)]
pub struct Wire {
    pub id: WireId,
    pub a: NodeId,
    pub b: NodeId,
}

/// Union-find over node ids, producing a compact matrix index per
/// equivalence class.
#[derive(Debug, Default)]
struct UnionFind {
    parent: HashMap<NodeId, NodeId>,
}

impl UnionFind {
    fn find(&mut self, x: NodeId) -> NodeId {
        let parent = *self.parent.entry(x).or_insert(x);
        if parent == x {
            x
        } else {
            let root = self.find(parent);
            self.parent.insert(x, root);
            root
        }
    }

    fn union(&mut self, a: NodeId, b: NodeId) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            // Keep the ground class (containing NodeId(0)) as the
            // canonical root whenever either side already merged into it.
            if ra == NodeId::GROUND {
                self.parent.insert(rb, ra);
            } else {
                self.parent.insert(ra, rb);
            }
        }
    }
}

/// The result of building the topology: a map from raw node id to compact
/// matrix index (0 = ground) and the count of non-ground matrix nodes.
#[derive(Debug, Clone, Default)]
pub struct NodeMap {
    index_of: HashMap<NodeId, usize>,
    pub num_matrix_nodes: usize,
}

impl NodeMap {
    /// Compact matrix index for a node id, or `None` if it is ground.
    pub fn index(&self, node: NodeId) -> Option<usize> {
        match self.index_of.get(&node) {
            Some(&0) => None,
            Some(&i) => Some(i - 1),
            None => None,
        }
    }

    /// Raw compact index including the ground slot (0 = ground), primarily
    /// useful for diagnostics that need to compare node identity.
    pub fn raw_index(&self, node: NodeId) -> usize {
        *self.index_of.get(&node).unwrap_or(&0)
    }
}

/// Build the node map for a set of raw node ids connected by wires. Any
/// node id not mentioned by a wire is still assigned its own matrix index
/// (a node may be used by exactly one device terminal and no wire).
pub fn build_node_map(all_nodes: &[NodeId], wires: &[Wire]) -> NodeMap {
    let mut uf = UnionFind::default();
    uf.find(NodeId::GROUND);
    for &n in all_nodes {
        uf.find(n);
    }
    for w in wires {
        uf.union(w.a, w.b);
    }

    let mut roots: Vec<NodeId> = all_nodes.iter().map(|&n| uf.find(n)).collect();
    roots.sort();
    roots.dedup();

    let mut index_of = HashMap::new();
    let ground_root = uf.find(NodeId::GROUND);
    let mut next = 1usize;
    for &n in all_nodes {
        let root = uf.find(n);
        if root == ground_root {
            index_of.insert(n, 0);
            continue;
        }
        let idx = *index_of.entry(root).or_insert_with(|| {
            let i = next;
            next += 1;
            i
        });
        index_of.insert(n, idx);
    }
    // ensure every original node id also has an entry (not just roots)
    for &n in all_nodes {
        index_of.entry(n).or_insert(0);
    }

    NodeMap {
        index_of,
        num_matrix_nodes: next - 1,
    }
}

/// Snap-to-existing-point lookup used by an external editor: returns the
/// id of a previously registered terminal position within `radius` of
/// `(x, y)`, or allocates a fresh node id.
#[derive(Debug, Default)]
pub struct NodeManager {
    positions: Vec<(f64, f64, NodeId)>,
    next_id: usize,
}

impl NodeManager {
    pub fn new() -> Self {
        // id 0 is reserved for ground.
        Self {
            positions: Vec::new(),
            next_id: 1,
        }
    }

    /// Find an existing node within `radius` of `(x, y)`, or create a new
    /// one and register its position.
    pub fn find_or_create_node(&mut self, x: f64, y: f64, radius: f64) -> NodeId {
        for &(px, py, id) in &self.positions {
            let dx = px - x;
            let dy = py - y;
            if (dx * dx + dy * dy).sqrt() <= radius {
                return id;
            }
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.positions.push((x, y, id));
        id
    }

    /// Register the ground node at a position without allocating a new id.
    pub fn register_ground(&mut self, x: f64, y: f64) {
        self.positions.push((x, y, NodeId::GROUND));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_nodes_get_distinct_indices() {
        let nodes = [NodeId(1), NodeId(2), NodeId(3)];
        let map = build_node_map(&nodes, &[]);
        assert_eq!(map.num_matrix_nodes, 3);
        assert_ne!(map.index(NodeId(1)), map.index(NodeId(2)));
    }

    #[test]
    fn wired_nodes_share_an_index() {
        let nodes = [NodeId(1), NodeId(2)];
        let wires = [Wire {
            id: WireId(0),
            a: NodeId(1),
            b: NodeId(2),
        }];
        let map = build_node_map(&nodes, &wires);
        assert_eq!(map.num_matrix_nodes, 1);
        assert_eq!(map.index(NodeId(1)), map.index(NodeId(2)));
    }

    #[test]
    fn ground_wired_node_has_no_index() {
        let nodes = [NodeId::GROUND, NodeId(5)];
        let wires = [Wire {
            id: WireId(0),
            a: NodeId::GROUND,
            b: NodeId(5),
        }];
        let map = build_node_map(&nodes, &wires);
        assert_eq!(map.num_matrix_nodes, 0);
        assert_eq!(map.index(NodeId(5)), None);
    }

    #[test]
    fn node_manager_snaps_within_radius() {
        let mut mgr = NodeManager::new();
        let a = mgr.find_or_create_node(0.0, 0.0, 1.0);
        let b = mgr.find_or_create_node(0.5, 0.5, 1.0);
        let c = mgr.find_or_create_node(10.0, 10.0, 1.0);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
