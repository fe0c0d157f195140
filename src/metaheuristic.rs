pub mod acs;
mod observer;
mod solution;

pub use acs::{find_path, PathSearchEngine, SearchReport};
pub use observer::{CsvObserver, Observer, Snapshot, VisitHeatmap};
pub use solution::{PathResult, Solution};
