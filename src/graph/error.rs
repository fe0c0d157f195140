use std::fmt::Debug;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum GraphError<IndexType: Debug> {
    #[error("edge {0:?} is not in the graph")]
    MissingEdge((IndexType, IndexType)),
    #[error("edge {0:?} is already in the graph")]
    DuplicateEdge((IndexType, IndexType)),
    #[error("node {0:?} is not in the graph")]
    MissingNode(IndexType),
    #[error("node {0:?} is already in the graph")]
    DuplicateNode(IndexType),
}
