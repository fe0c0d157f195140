mod error;
mod matrix_graph;

pub use error::GraphError;
pub use matrix_graph::MatrixGraph;

use decorum::R64;

pub type Edge<IndexType> = (IndexType, IndexType);

/// Dense internal id of a node, as handed out by a `PheromoneGraph`.
pub type Vertex = usize;

/// The view of a graph the path search works on.
///
/// Nodes are addressed through dense `Vertex` ids, every edge carries a pheromone
/// intensity that is read and written in place. Implementations have to enumerate
/// out-edges in a stable order, since ties in the search are broken by it.
pub trait PheromoneGraph {
    type Node;

    /// Resolves a domain node to its vertex id.
    fn vertex(&self, node: &Self::Node) -> Option<Vertex>;

    /// Resolves a vertex id back to its domain node.
    fn node(&self, vertex: Vertex) -> Option<&Self::Node>;

    /// Returns an iterator over all edges as (from, to) vertex pairs.
    fn iter_edge_ids(&self) -> Box<dyn Iterator<Item = Edge<Vertex>> + '_>;

    fn edge_ids(&self) -> Vec<Edge<Vertex>> {
        self.iter_edge_ids().collect()
    }

    /// Returns the targets of all edges leaving vertex together with their pheromone.
    /// Returns an error if vertex is not in the graph.
    #[allow(clippy::type_complexity)]
    fn iter_out_edges(
        &self,
        vertex: Vertex,
    ) -> Result<Box<dyn Iterator<Item = (Vertex, R64)> + '_>, GraphError<Vertex>>;

    fn pheromone(&self, edge: Edge<Vertex>) -> Result<R64, GraphError<Vertex>>;

    fn set_pheromone(
        &mut self,
        edge: Edge<Vertex>,
        pheromone: R64,
    ) -> Result<(), GraphError<Vertex>>;
}
