use decorum::R64;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::graph::{Edge, GraphError, PheromoneGraph, Vertex};

/// Implements a weighted, directed graph using an adjacency matrix as datastructure.
///
/// Nodes are identified by arbitrary labels, internally every label is mapped to a
/// dense index given out in insertion order. Neighbors are always enumerated by
/// ascending internal index.
#[derive(Debug, Clone)]
pub struct MatrixGraph<IndexType, Ew> {
    adjacency_matrix: Vec<Vec<Option<Ew>>>,
    order: usize,
    node_map: HashMap<IndexType, usize>,
    inv_node_map: Vec<IndexType>,
}

impl<IndexType, Ew> MatrixGraph<IndexType, Ew>
where
    IndexType: Hash + Eq + Clone + Debug,
    Ew: Clone,
{
    /// Creates a new Graph instance using the given list of nodes and weighted edges.
    /// Node at nodes[i] gets the internal index i.
    /// If any of the edges reference nodes not in the list an error is returned.
    pub fn new(
        nodes: Vec<IndexType>,
        edges: Vec<(Edge<IndexType>, Ew)>,
    ) -> Result<Self, GraphError<IndexType>> {
        let mut graph = MatrixGraph::with_size(nodes.len());
        for node in nodes.into_iter() {
            graph.add_node(node)?;
        }

        for (edge, weight) in edges.into_iter() {
            graph.add_edge(edge, weight)?;
        }

        Ok(graph)
    }

    /// Constructs an empty MatrixGraph with capacity for at least the given amount of nodes.
    pub fn with_size(size: usize) -> Self {
        MatrixGraph {
            adjacency_matrix: Vec::with_capacity(size),
            order: 0,
            node_map: HashMap::with_capacity(size),
            inv_node_map: Vec::with_capacity(size),
        }
    }

    /// Adds a new node to the graph.
    /// Returns an error if a node with the same id already exists.
    pub fn add_node(&mut self, id: IndexType) -> Result<(), GraphError<IndexType>> {
        if self.node_map.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }

        let inner_id = self._add_node();
        self.node_map.insert(id.clone(), inner_id);
        self.inv_node_map.push(id);
        Ok(())
    }

    /// Adds a new weighted edge to the graph.
    /// Returns an error if the edge already exists or one of the nodes is missing.
    pub fn add_edge(
        &mut self,
        edge: Edge<IndexType>,
        weight: Ew,
    ) -> Result<(), GraphError<IndexType>> {
        let inner = self.inner_edge(&edge)?;
        let res = self._add_edge(inner, weight);
        self.mapped_result(res)
    }

    fn mapped_result<CorrectType>(
        &self,
        result: Result<CorrectType, GraphError<usize>>,
    ) -> Result<CorrectType, GraphError<IndexType>> {
        result.map_err(|error| match error {
            GraphError::MissingNode(node) => GraphError::MissingNode(self.label(node)),
            GraphError::DuplicateNode(node) => GraphError::DuplicateNode(self.label(node)),
            GraphError::MissingEdge(edge) => {
                GraphError::MissingEdge((self.label(edge.0), self.label(edge.1)))
            }
            GraphError::DuplicateEdge(edge) => {
                GraphError::DuplicateEdge((self.label(edge.0), self.label(edge.1)))
            }
        })
    }

    /// Internal errors only ever carry indices that were looked up before.
    fn label(&self, id: usize) -> IndexType {
        self.inv_node_map[id].clone()
    }

    fn inner_edge(&self, edge: &Edge<IndexType>) -> Result<Edge<usize>, GraphError<IndexType>> {
        match (self.node_map.get(&edge.0), self.node_map.get(&edge.1)) {
            (Some(&from), Some(&to)) => Ok((from, to)),
            (None, _) => Err(GraphError::MissingNode(edge.0.clone())),
            (_, None) => Err(GraphError::MissingNode(edge.1.clone())),
        }
    }

    fn _has_node(&self, id: usize) -> bool {
        id < self.order
    }

    fn _add_node(&mut self) -> usize {
        let id = self.order;
        for edge_weights in self.adjacency_matrix.iter_mut() {
            edge_weights.push(None);
        }
        self.adjacency_matrix.push(vec![None; id + 1]);

        // Adding a node increases order by one.
        self.order += 1;
        id
    }

    fn _iter_neighbors(
        &self,
        id: usize,
    ) -> Result<Box<dyn Iterator<Item = (usize, &Ew)> + '_>, GraphError<usize>> {
        if !self._has_node(id) {
            return Err(GraphError::MissingNode(id));
        }

        // Get the ids of nodes to which a weighted edge from id exists.
        Ok(Box::new(
            self.adjacency_matrix[id]
                .iter()
                .enumerate()
                .filter_map(|(i, weight)| weight.as_ref().map(|weight| (i, weight))),
        ))
    }

    fn _iter_edge_ids(&self) -> Box<dyn Iterator<Item = Edge<usize>> + '_> {
        Box::new(
            self.adjacency_matrix
                .iter()
                .enumerate()
                .flat_map(|(i, edges)| {
                    edges
                        .iter()
                        .enumerate()
                        .filter_map(move |(j, weight)| weight.as_ref().map(|_| (i, j)))
                }),
        )
    }

    fn _edge_weight(&self, edge: Edge<usize>) -> Result<&Ew, GraphError<usize>> {
        let (start_node, end_node) = edge;
        if !self._has_node(start_node) {
            return Err(GraphError::MissingNode(start_node));
        } else if !self._has_node(end_node) {
            return Err(GraphError::MissingNode(end_node));
        }

        self.adjacency_matrix[start_node][end_node]
            .as_ref()
            .ok_or(GraphError::MissingEdge(edge))
    }

    fn _add_edge(&mut self, edge: Edge<usize>, weight: Ew) -> Result<(), GraphError<usize>> {
        let (start_node, end_node) = edge;
        if self._edge_weight(edge).is_ok() {
            return Err(GraphError::DuplicateEdge(edge));
        } else if !self._has_node(start_node) {
            return Err(GraphError::MissingNode(start_node));
        } else if !self._has_node(end_node) {
            return Err(GraphError::MissingNode(end_node));
        }

        self.adjacency_matrix[start_node][end_node] = Some(weight);
        Ok(())
    }
}

impl<IndexType, Ew> Default for MatrixGraph<IndexType, Ew>
where
    IndexType: Hash + Eq + Clone + Debug,
    Ew: Clone,
{
    /// Default constructor for an empty MatrixGraph.
    /// If the amount of nodes is known beforehand use MatrixGraph::with_size() instead.
    fn default() -> Self {
        MatrixGraph::with_size(0)
    }
}

impl<IndexType> PheromoneGraph for MatrixGraph<IndexType, R64>
where
    IndexType: Hash + Eq + Clone + Debug,
{
    type Node = IndexType;

    fn vertex(&self, node: &IndexType) -> Option<Vertex> {
        self.node_map.get(node).copied()
    }

    fn node(&self, vertex: Vertex) -> Option<&IndexType> {
        self.inv_node_map.get(vertex)
    }

    fn iter_edge_ids(&self) -> Box<dyn Iterator<Item = Edge<Vertex>> + '_> {
        self._iter_edge_ids()
    }

    fn iter_out_edges(
        &self,
        vertex: Vertex,
    ) -> Result<Box<dyn Iterator<Item = (Vertex, R64)> + '_>, GraphError<Vertex>> {
        let neighbors = self._iter_neighbors(vertex)?;
        Ok(Box::new(neighbors.map(|(to, &pheromone)| (to, pheromone))))
    }

    fn pheromone(&self, edge: Edge<Vertex>) -> Result<R64, GraphError<Vertex>> {
        self._edge_weight(edge).map(|&pheromone| pheromone)
    }

    /// Overwrites the pheromone of an existing edge, never adds one.
    fn set_pheromone(&mut self, edge: Edge<Vertex>, pheromone: R64) -> Result<(), GraphError<Vertex>> {
        self._edge_weight(edge)?;
        self.adjacency_matrix[edge.0][edge.1] = Some(pheromone);
        Ok(())
    }
}
