pub mod config;
pub mod graph;
pub mod metaheuristic;
pub mod rng;
