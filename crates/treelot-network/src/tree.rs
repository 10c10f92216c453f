//! Local topology provider.
//!
//! Node ids are roster indices `0..n`. The tree is fixed once built and
//! shared with instances through [`TreePosition`].

use std::fmt::Write;
use std::sync::Arc;

use treelot_protocol::{NodeId, TreePosition};

use crate::NetworkError;

/// One node of a [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    id: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl TreePosition for TreeNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A rooted spanning tree over a roster of `len()` nodes.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Arc<TreeNode>>,
    root: NodeId,
}

impl Tree {
    /// Complete `branching_factor`-ary tree over `n` nodes with node 0 as root.
    ///
    /// Node `i > 0` hangs under `(i - 1) / branching_factor`, so children are
    /// listed in ascending id order.
    pub fn generate(n: usize, branching_factor: usize) -> Result<Self, NetworkError> {
        if n == 0 {
            return Err(NetworkError::InvalidTopology("a tree needs at least one node".into()));
        }
        if branching_factor == 0 {
            return Err(NetworkError::InvalidTopology("branching factor must be at least 1".into()));
        }
        let parents: Vec<Option<u32>> = (0..n)
            .map(|i| match i {
                0 => None,
                _ => Some(((i - 1) / branching_factor) as u32),
            })
            .collect();
        Self::from_parents(&parents)
    }

    /// Build a tree from a parent table: `parents[i]` is the parent of node `i`.
    ///
    /// Exactly one entry must be `None`, and every node must reach it.
    pub fn from_parents(parents: &[Option<u32>]) -> Result<Self, NetworkError> {
        let n = parents.len();
        if n == 0 {
            return Err(NetworkError::InvalidTopology("a tree needs at least one node".into()));
        }

        let mut root = None;
        let mut children: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        for (i, parent) in parents.iter().enumerate() {
            match parent {
                None if root.is_some() => {
                    return Err(NetworkError::InvalidTopology(format!(
                        "more than one root: {} and {}",
                        root.unwrap_or_default(),
                        i
                    )));
                }
                None => root = Some(i),
                Some(p) if *p as usize >= n => {
                    return Err(NetworkError::InvalidTopology(format!(
                        "node {i} has unknown parent {p}"
                    )));
                }
                Some(p) if *p as usize == i => {
                    return Err(NetworkError::InvalidTopology(format!(
                        "node {i} is its own parent"
                    )));
                }
                Some(p) => children[*p as usize].push(NodeId(i as u32)),
            }
        }
        let root = root.ok_or_else(|| NetworkError::InvalidTopology("no root".into()))?;

        // Every node must reach the root in fewer than n hops.
        for start in 0..n {
            let mut current = start;
            let mut hops = 0;
            while let Some(p) = parents[current] {
                current = p as usize;
                hops += 1;
                if hops >= n {
                    return Err(NetworkError::InvalidTopology(format!(
                        "node {start} is on a cycle"
                    )));
                }
            }
        }

        let nodes = children
            .into_iter()
            .enumerate()
            .map(|(i, children)| {
                Arc::new(TreeNode {
                    id: NodeId(i as u32),
                    parent: parents[i].map(NodeId),
                    children,
                })
            })
            .collect();

        Ok(Self {
            nodes,
            root: NodeId(root as u32),
        })
    }

    pub fn root(&self) -> &Arc<TreeNode> {
        &self.nodes[self.root.index()]
    }

    pub fn node(&self, id: NodeId) -> Option<&Arc<TreeNode>> {
        self.nodes.get(id.index())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Arc<TreeNode>> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: both constructors reject an empty tree. Present to pair
    /// with [`Tree::len`].
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            for child in self.nodes[id.index()].children() {
                stack.push((*child, depth + 1));
            }
        }
        deepest
    }

    /// Indented rendering of the tree, one node per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = &self.nodes[id.index()];
            let _ = writeln!(out, "{:indent$}{} ({})", "", id, node.role(), indent = depth * 2);
            for child in node.children().iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        out
    }
}
