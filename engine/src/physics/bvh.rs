//! Bounding volume hierarchy over baked mesh triangles
//!
//! Built once when a mesh collider is baked and immutable afterwards. Nodes
//! live in a flat arena; the root is node 0.
//!
//! # Build
//!
//! Each node splits its triangles at the mean centroid along the longest
//! axis of its bounds. A node becomes a leaf when it holds
//! [`MAX_LEAF_TRIANGLES`] or fewer triangles, when it sits deeper than
//! [`MAX_DEPTH`], or when the split puts everything on one side (coincident
//! centroids). The depth cap guarantees termination on degenerate input.

use super::aabb::Aabb;
use super::triangle::Triangle;

/// Leaf size threshold.
pub const MAX_LEAF_TRIANGLES: usize = 4;

/// Hard recursion cap.
pub const MAX_DEPTH: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub enum BvhContent {
    Leaf(Vec<usize>),
    Branch { left: usize, right: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BvhNode {
    pub bounds: Aabb,
    pub content: BvhContent,
}

#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
}

impl Bvh {
    /// Builds a hierarchy over `triangles`. Empty input gives an empty tree.
    pub fn build(triangles: &[Triangle]) -> Self {
        let mut bvh = Bvh { nodes: Vec::new() };
        if !triangles.is_empty() {
            let indices: Vec<usize> = (0..triangles.len()).collect();
            bvh.build_node(triangles, indices, 0);
        }
        bvh
    }

    fn build_node(&mut self, triangles: &[Triangle], indices: Vec<usize>, depth: usize) -> usize {
        let mut bounds = Aabb::empty();
        for &i in &indices {
            bounds = bounds.union(&triangles[i].bounds());
        }

        let slot = self.nodes.len();
        self.nodes.push(BvhNode {
            bounds,
            content: BvhContent::Leaf(Vec::new()),
        });

        if indices.len() <= MAX_LEAF_TRIANGLES || depth > MAX_DEPTH {
            self.nodes[slot].content = BvhContent::Leaf(indices);
            return slot;
        }

        let size = bounds.size();
        let axis = if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        };

        let split = indices
            .iter()
            .map(|&i| triangles[i].centroid()[axis])
            .sum::<f32>()
            / indices.len() as f32;

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| triangles[i].centroid()[axis] < split);

        if left.is_empty() || right.is_empty() {
            self.nodes[slot].content = BvhContent::Leaf(indices);
            return slot;
        }

        let left = self.build_node(triangles, left, depth + 1);
        let right = self.build_node(triangles, right, depth + 1);
        self.nodes[slot].content = BvhContent::Branch { left, right };
        slot
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<&BvhNode> {
        self.nodes.first()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest leaf (root is depth 0).
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[BvhNode], index: usize) -> usize {
            match &nodes[index].content {
                BvhContent::Leaf(_) => 0,
                BvhContent::Branch { left, right } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() { 0 } else { walk(&self.nodes, 0) }
    }

    /// Appends every triangle index held by a leaf whose bounds overlap `query`.
    pub fn query(&self, query: &Aabb, out: &mut Vec<usize>) {
        if self.nodes.is_empty() {
            return;
        }
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !node.bounds.intersects(query) {
                continue;
            }
            match &node.content {
                BvhContent::Leaf(tris) => out.extend_from_slice(tris),
                BvhContent::Branch { left, right } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }
    }
}
