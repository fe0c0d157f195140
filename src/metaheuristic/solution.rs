use crate::graph::Edge;

use std::collections::HashSet;
use std::hash::Hash;

/// An ordered walk through a graph, stored as the list of visited nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<IndexType> {
    node_list: Vec<IndexType>,
}

impl<IndexType> Solution<IndexType>
where
    IndexType: PartialEq + Clone,
{
    pub fn from_nodes(nodes: Vec<IndexType>) -> Self {
        Solution { node_list: nodes }
    }

    pub fn iter_edges(&self) -> impl Iterator<Item = Edge<&IndexType>> + '_ {
        self.node_list.iter().zip(self.node_list.iter().skip(1))
    }

    pub fn iter_nodes(&self) -> impl Iterator<Item = &IndexType> + '_ {
        self.node_list.iter()
    }

    pub fn edges(&self) -> Vec<Edge<IndexType>> {
        self.iter_edges()
            .map(|(from, to)| (from.clone(), to.clone()))
            .collect()
    }

    pub fn nodes(&self) -> &[IndexType] {
        &self.node_list
    }

    pub fn first(&self) -> Option<&IndexType> {
        self.node_list.first()
    }

    pub fn last(&self) -> Option<&IndexType> {
        self.node_list.last()
    }

    /// Amount of nodes on the walk, counting repeated visits.
    pub fn node_count(&self) -> usize {
        self.node_list.len()
    }

    /// Amount of edges traversed by the walk.
    pub fn length(&self) -> usize {
        self.node_list.len().saturating_sub(1)
    }
}

impl<IndexType> Solution<IndexType>
where
    IndexType: Eq + Hash + Clone,
{
    /// Edges in order of their first traversal, each reported once.
    pub fn unique_edges(&self) -> Vec<Edge<IndexType>> {
        let mut seen = HashSet::new();
        self.edges()
            .into_iter()
            .filter(|edge| seen.insert(edge.clone()))
            .collect()
    }
}

/// Outcome of a path search.
#[derive(Debug, Clone, PartialEq)]
pub enum PathResult<Node> {
    /// `path` starts at the source and ends at the destination,
    /// `length` is the amount of edges on it.
    Found { path: Solution<Node>, length: usize },
    NotFound,
}

impl<Node> PathResult<Node> {
    pub fn is_found(&self) -> bool {
        matches!(self, PathResult::Found { .. })
    }

    pub fn path(&self) -> Option<&Solution<Node>> {
        match self {
            PathResult::Found { path, .. } => Some(path),
            PathResult::NotFound => None,
        }
    }

    pub fn length(&self) -> Option<usize> {
        match self {
            PathResult::Found { length, .. } => Some(*length),
            PathResult::NotFound => None,
        }
    }
}
