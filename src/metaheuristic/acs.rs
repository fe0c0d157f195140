mod ant;
mod group;
mod params;

pub use ant::Ant;
pub use group::{entropy, group_sizes, repartition};
pub use params::{ExploitationParams, Params, PheromoneParams};

use crate::config::ConfigError;
use crate::graph::{GraphError, PheromoneGraph, Vertex};
use crate::metaheuristic::observer::{Observer, Snapshot};
use crate::metaheuristic::solution::{PathResult, Solution};
use crate::rng::RandomSource;

use decorum::R64;
use log::{debug, error, info, warn};
use std::fmt::Debug;

/// Outcome of a search together with the statistics of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport<Node> {
    pub result: PathResult<Node>,
    pub iterations: usize,
    pub entropy: f64,
    pub satisfactory_change_its: usize,
    pub converged: bool,
    pub aborted: bool,
}

impl<Node> SearchReport<Node> {
    fn immediate(result: PathResult<Node>) -> Self {
        SearchReport {
            result,
            iterations: 0,
            entropy: 0.0,
            satisfactory_change_its: 0,
            converged: false,
            aborted: false,
        }
    }
}

/// Shortest walk to the destination seen so far.
#[derive(Debug, Default)]
struct BestPath {
    path: Option<Solution<Vertex>>,
}

impl BestPath {
    /// Offers a walk that reached the destination.
    /// Returns true if it is at least as short as the best one, replaces it if shorter.
    fn offer(&mut self, walk: &[Vertex]) -> bool {
        match self.node_count() {
            Some(count) if walk.len() > count => false,
            Some(count) if walk.len() == count => true,
            _ => {
                self.path = Some(Solution::from_nodes(walk.to_vec()));
                true
            }
        }
    }

    fn node_count(&self) -> Option<usize> {
        self.path.as_ref().map(Solution::node_count)
    }

    fn convergence_length(&self) -> f64 {
        self.node_count().map_or(f64::INFINITY, |count| count as f64)
    }
}

enum IterationEnd {
    Completed { found_this_it: bool, entropy: f64 },
    DeadEnd,
}

/// Ant Colony System search for short paths between two nodes.
///
/// The engine borrows the graph for its whole lifetime and leaves the pheromone
/// it deposited on the edges, so later searches on the same graph start biased.
pub struct PathSearchEngine<'a, G, R>
where
    G: PheromoneGraph + ?Sized,
    R: RandomSource,
{
    graph: &'a mut G,
    params: Params,
    rng: R,
    observer: Option<&'a mut dyn Observer<G>>,
}

impl<'a, G, R> PathSearchEngine<'a, G, R>
where
    G: PheromoneGraph + ?Sized,
    G::Node: Clone + PartialEq + Debug,
    R: RandomSource,
{
    pub fn new(graph: &'a mut G, params: Params, rng: R) -> Result<Self, ConfigError> {
        params.validate()?;

        Ok(PathSearchEngine {
            graph,
            params,
            rng,
            observer: None,
        })
    }

    pub fn with_observer(mut self, observer: &'a mut dyn Observer<G>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Searches a path and reports the statistics of the run.
    ///
    /// Only inconsistencies of the graph itself are returned as errors. Unknown nodes
    /// and a source without any way out end the search with `NotFound`.
    pub fn run(
        &mut self,
        source: &G::Node,
        destination: &G::Node,
    ) -> Result<SearchReport<G::Node>, GraphError<Vertex>> {
        let (from, to) = match (self.graph.vertex(source), self.graph.vertex(destination)) {
            (Some(from), Some(to)) => (from, to),
            _ => {
                warn!(
                    "cannot search from {:?} to {:?}, node is not in the graph",
                    source, destination
                );
                return Ok(SearchReport::immediate(PathResult::NotFound));
            }
        };

        if from == to {
            return Ok(SearchReport::immediate(PathResult::Found {
                path: Solution::from_nodes(vec![source.clone()]),
                length: 0,
            }));
        }

        self.seed_pheromones()?;

        let mut best = BestPath::default();
        let mut entropy = 0.0;
        let mut previous_best = f64::INFINITY;
        let mut satisfactory_change_its = 0;
        let mut iterations = 0;
        let mut converged = false;
        let mut aborted = false;

        for iteration in 0..self.params.max_iterations {
            iterations = iteration + 1;
            let factor = self.params.exploitation.factor(entropy);

            let found_this_it = match self.single_iteration(iteration, from, to, factor, &mut best)? {
                IterationEnd::Completed {
                    found_this_it,
                    entropy: new_entropy,
                } => {
                    entropy = new_entropy;
                    found_this_it
                }
                IterationEnd::DeadEnd => {
                    error!(
                        "no way out of {:?}, aborting search in iteration {}",
                        source, iteration
                    );
                    aborted = true;
                    break;
                }
            };

            self.global_update(&best)?;

            let new_best = best.convergence_length();
            if found_this_it && previous_best - new_best <= self.params.break_on_path_change {
                satisfactory_change_its += 1;
            } else {
                satisfactory_change_its = 0;
            }
            previous_best = new_best;

            debug!(
                "iteration {}: best {:?} nodes, entropy {:.4}, exploitation {:.4}",
                iteration,
                best.node_count(),
                entropy,
                factor
            );

            if satisfactory_change_its >= self.params.break_on_iterations {
                info!(
                    "search converged after {} iterations on {:?} nodes",
                    iterations,
                    best.node_count()
                );
                converged = true;
                break;
            }
        }

        let result = if aborted {
            PathResult::NotFound
        } else {
            self.translate(&best)?
        };
        info!(
            "search from {:?} to {:?} finished after {} iterations, path length {:?}",
            source,
            destination,
            iterations,
            result.length()
        );

        Ok(SearchReport {
            result,
            iterations,
            entropy,
            satisfactory_change_its,
            converged,
            aborted,
        })
    }

    /// Searches a path from source to destination.
    pub fn find_path(&mut self, source: &G::Node, destination: &G::Node) -> PathResult<G::Node> {
        match self.run(source, destination) {
            Ok(report) => report.result,
            Err(err) => {
                error!(
                    "search from {:?} to {:?} failed: {}",
                    source, destination, err
                );
                PathResult::NotFound
            }
        }
    }

    fn seed_pheromones(&mut self) -> Result<(), GraphError<Vertex>> {
        let increment = R64::from_inner(self.params.local.increment);
        for edge in self.graph.edge_ids() {
            let pheromone = self.graph.pheromone(edge)?;
            self.graph.set_pheromone(edge, pheromone + increment)?;
        }

        Ok(())
    }

    fn single_iteration(
        &mut self,
        iteration: usize,
        source: Vertex,
        destination: Vertex,
        exploitation_factor: f64,
        best: &mut BestPath,
    ) -> Result<IterationEnd, GraphError<Vertex>> {
        let mut ants: Vec<Ant> = (0..self.params.ant_count)
            .map(|_| Ant::new(source, self.params.max_steps))
            .collect();
        let mut found_this_it = false;
        let mut ants_reached = 0;

        for step in 0..self.params.max_steps {
            for ant in ants.iter_mut().filter(|ant| !ant.found_food()) {
                let r = self.rng.next_float();
                match ant.choose_next(&*self.graph, r, exploitation_factor)? {
                    Some(next) => ant.advance(&mut *self.graph, next, &self.params.local)?,
                    None => {
                        if !ant.backstep() {
                            return Ok(IterationEnd::DeadEnd);
                        }
                    }
                }
            }

            repartition(&mut ants);

            for ant in ants
                .iter_mut()
                .filter(|ant| !ant.found_food() && ant.current_vertex() == destination)
            {
                ant.mark_found_food();
                ants_reached += 1;
                if best.offer(ant.path()) {
                    found_this_it = true;
                }
            }

            if let Some(observer) = self.observer.as_mut() {
                let snapshot = Snapshot {
                    iteration,
                    step,
                    ants: &ants,
                };
                observer.observe(&snapshot, &*self.graph);
            }

            if ants_reached == ants.len() {
                break;
            }
        }

        Ok(IterationEnd::Completed {
            found_this_it,
            entropy: entropy(&group_sizes(&ants)),
        })
    }

    fn global_update(&mut self, best: &BestPath) -> Result<(), GraphError<Vertex>> {
        let global = self.params.global;

        // pheromone decay
        for edge in self.graph.edge_ids() {
            let pheromone = self.graph.pheromone(edge)?;
            self.graph.set_pheromone(edge, global.decay(pheromone))?;
        }

        // reinforcing the best path
        if let Some(path) = &best.path {
            let deposit = global.reinforcement(path.node_count());
            for edge in path.unique_edges() {
                let pheromone = self.graph.pheromone(edge)?;
                self.graph.set_pheromone(edge, pheromone + deposit)?;
            }
        }

        Ok(())
    }

    fn translate(&self, best: &BestPath) -> Result<PathResult<G::Node>, GraphError<Vertex>> {
        let path = match &best.path {
            Some(path) => path,
            None => return Ok(PathResult::NotFound),
        };

        let nodes = path
            .iter_nodes()
            .map(|&vertex| {
                self.graph
                    .node(vertex)
                    .cloned()
                    .ok_or(GraphError::MissingNode(vertex))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PathResult::Found {
            path: Solution::from_nodes(nodes),
            length: path.length(),
        })
    }
}

/// Runs a single search with a fresh engine.
///
/// Returns an error only if the parameters are invalid.
pub fn find_path<'a, G, R>(
    graph: &'a mut G,
    source: &G::Node,
    destination: &G::Node,
    params: Params,
    rng: R,
    observer: Option<&'a mut dyn Observer<G>>,
) -> Result<PathResult<G::Node>, ConfigError>
where
    G: PheromoneGraph + ?Sized,
    G::Node: Clone + PartialEq + Debug,
    R: RandomSource,
{
    let engine = PathSearchEngine::new(graph, params, rng)?;
    let mut engine = match observer {
        Some(observer) => engine.with_observer(observer),
        None => engine,
    };

    Ok(engine.find_path(source, destination))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, MatrixGraph};
    use crate::metaheuristic::VisitHeatmap;
    use crate::rng::{rng64, SequenceSource};
    use float_cmp::approx_eq;
    use num_traits::identities::{One, Zero};
    use std::hash::Hash;

    fn params(ant_count: usize, max_steps: usize, max_iterations: usize) -> Params {
        Params::new(
            ant_count,
            max_steps,
            max_iterations,
            ExploitationParams {
                base: 0.3,
                coeff: 0.5,
                exp: 1.0,
            },
            PheromoneParams {
                increment: 1.0,
                evaporation: 0.1,
            },
            PheromoneParams {
                increment: 1.0,
                evaporation: 0.1,
            },
            0.0,
            max_iterations,
        )
    }

    fn graph<I>(nodes: Vec<I>, edges: Vec<Edge<I>>, bidirectional: bool) -> MatrixGraph<I, R64>
    where
        I: Hash + Eq + Clone + Debug,
    {
        let mut weighted = Vec::new();
        for (from, to) in edges {
            if bidirectional {
                weighted.push(((to.clone(), from.clone()), R64::zero()));
            }
            weighted.push(((from, to), R64::zero()));
        }

        MatrixGraph::new(nodes, weighted).unwrap()
    }

    fn grid(width: usize) -> MatrixGraph<(usize, usize), R64> {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        for x in 0..width {
            for y in 0..width {
                nodes.push((x, y));
                if x + 1 < width {
                    edges.push(((x, y), (x + 1, y)));
                }
                if y + 1 < width {
                    edges.push(((x, y), (x, y + 1)));
                }
            }
        }

        graph(nodes, edges, true)
    }

    fn pheromones<I>(graph: &MatrixGraph<I, R64>) -> Vec<f64>
    where
        I: Hash + Eq + Clone + Debug,
    {
        graph.edge_ids()
            .into_iter()
            .map(|edge| graph.pheromone(edge).unwrap().into_inner())
            .collect()
    }

    #[test]
    fn only_route_is_found() {
        let mut graph = graph(vec![1, 2, 3, 4], vec![(1, 2), (2, 3), (1, 4)], true);
        let mut engine = PathSearchEngine::new(&mut graph, params(5, 4, 10), rng64(42)).unwrap();

        let result = engine.find_path(&1, &3);

        assert_eq!(
            result,
            PathResult::Found {
                path: Solution::from_nodes(vec![1, 2, 3]),
                length: 2
            }
        );
    }

    #[test]
    fn unreachable_destination_exhausts_iterations() {
        let mut graph = graph(vec![1, 2, 3, 4], vec![(1, 2), (2, 4), (4, 1)], true);
        let mut engine = PathSearchEngine::new(&mut graph, params(4, 6, 5), rng64(3)).unwrap();

        let report = engine.run(&1, &3).unwrap();

        assert_eq!(report.result, PathResult::NotFound);
        assert_eq!(report.iterations, 5, "All iterations should have been used.");
        assert!(!report.aborted);
        assert!(!report.converged);
    }

    #[test]
    fn source_without_edges_aborts() {
        let mut graph = graph(vec![1, 2], vec![(2, 1)], false);
        let mut engine = PathSearchEngine::new(&mut graph, params(3, 4, 5), rng64(1)).unwrap();

        let report = engine.run(&1, &2).unwrap();

        assert_eq!(report.result, PathResult::NotFound);
        assert!(report.aborted);
        assert_eq!(report.iterations, 1);
    }

    #[test]
    fn source_is_destination() {
        let mut graph = graph(vec![1, 2], vec![(1, 2)], false);
        let mut isolated = graph_without_edges();

        let result = find_path(&mut graph, &1, &1, params(3, 4, 5), rng64(1), None).unwrap();
        let isolated_result =
            find_path(&mut isolated, &7, &7, params(3, 4, 5), rng64(1), None).unwrap();

        assert_eq!(result.path().map(|path| path.nodes().to_vec()), Some(vec![1]));
        assert_eq!(result.length(), Some(0));
        assert_eq!(isolated_result.length(), Some(0));
        assert_eq!(pheromones(&graph), vec![0.0], "No pheromone should be laid.");
    }

    fn graph_without_edges() -> MatrixGraph<usize, R64> {
        graph(vec![7], vec![], false)
    }

    #[test]
    fn unknown_nodes_are_not_found() {
        let mut graph = graph(vec![1, 2], vec![(1, 2)], false);
        {
            let mut engine =
                PathSearchEngine::new(&mut graph, params(3, 4, 5), rng64(1)).unwrap();
            assert_eq!(engine.find_path(&1, &9), PathResult::NotFound);
            assert_eq!(engine.find_path(&9, &1), PathResult::NotFound);
        }

        assert_eq!(pheromones(&graph), vec![0.0]);
    }

    #[test]
    fn invalid_params_are_rejected() {
        let mut graph = graph(vec![1, 2], vec![(1, 2)], false);
        let mut invalid = params(3, 4, 5);
        invalid.local.evaporation = -0.5;

        assert!(matches!(
            PathSearchEngine::new(&mut graph, invalid, rng64(1)),
            Err(ConfigError::InvalidParameter { name: "local", .. })
        ));
    }

    #[test]
    fn found_path_follows_edges() {
        let mut graph = grid(3);
        let result = find_path(&mut graph, &(0, 0), &(2, 2), params(8, 20, 30), rng64(7), None)
            .unwrap();

        let path = result.path().expect("A path through the grid should be found.");
        assert_eq!(path.first(), Some(&(0, 0)));
        assert_eq!(path.last(), Some(&(2, 2)));
        assert_eq!(result.length(), Some(path.length()));
        for (from, to) in path.iter_edges() {
            let edge = (graph.vertex(from).unwrap(), graph.vertex(to).unwrap());
            assert!(
                graph.pheromone(edge).is_ok(),
                "{:?} -> {:?} is not an edge.",
                from,
                to
            );
        }
    }

    #[test]
    fn seeded_runs_are_deterministic() {
        let mut first = grid(3);
        let mut second = grid(3);

        let first_result =
            find_path(&mut first, &(0, 0), &(2, 2), params(8, 20, 30), rng64(11), None).unwrap();
        let second_result =
            find_path(&mut second, &(0, 0), &(2, 2), params(8, 20, 30), rng64(11), None).unwrap();

        assert_eq!(first_result, second_result);
        assert_eq!(pheromones(&first), pheromones(&second));
    }

    #[test]
    fn one_draw_per_active_ant_and_step() {
        let mut graph = graph(vec![1, 2, 3], vec![(1, 2), (2, 3)], false);
        let mut source = SequenceSource::new(vec![0.1, 0.7, 0.4]);
        {
            let mut engine = PathSearchEngine::new(&mut graph, params(2, 5, 1), &mut source).unwrap();
            assert!(engine.find_path(&1, &3).is_found());
        }

        // two ants need two steps each, then both rest at the destination
        assert_eq!(source.consumed(), 4);
    }

    #[test]
    fn pheromone_only_decays_without_reinforcement() {
        let mut graph = graph(vec![1, 2, 3], vec![(1, 2), (2, 3)], false);
        let mut search = params(3, 4, 4);
        search.local.evaporation = 0.0;
        search.global.increment = 0.0;
        search.global.evaporation = 0.5;
        search.break_on_iterations = 10;

        let mut trace: Vec<(usize, f64)> = Vec::new();
        {
            let mut observer = |snapshot: &Snapshot<'_>, graph: &MatrixGraph<usize, R64>| {
                let total: f64 = pheromones(graph).iter().sum();
                trace.push((snapshot.iteration, total));
            };
            let mut engine = PathSearchEngine::new(&mut graph, search, rng64(5))
                .unwrap()
                .with_observer(&mut observer);
            assert!(engine.find_path(&1, &3).is_found());
        }

        assert!(!trace.is_empty());
        for window in trace.windows(2) {
            let ((previous_it, previous), (it, current)) = (window[0], window[1]);
            if previous_it == it {
                assert!(approx_eq!(f64, previous, current, epsilon = 1e-12));
            } else {
                assert!(current < previous, "Pheromone grew from {} to {}.", previous, current);
            }
        }
        for value in pheromones(&graph) {
            assert!(approx_eq!(f64, value, 0.5f64.powi(4), epsilon = 1e-12));
        }
    }

    #[test]
    fn stable_best_path_converges() {
        let mut graph = graph(vec![1, 2, 3], vec![(1, 2), (2, 3)], false);
        let mut search = params(4, 5, 50);
        search.break_on_iterations = 3;
        let mut engine = PathSearchEngine::new(&mut graph, search, rng64(9)).unwrap();

        let report = engine.run(&1, &3).unwrap();

        assert!(report.converged);
        assert_eq!(report.satisfactory_change_its, 3);
        assert_eq!(
            report.iterations, 4,
            "The first iteration improves on nothing, three stable ones follow."
        );
        assert_eq!(report.result.length(), Some(2));
    }

    #[test]
    fn best_path_is_reinforced_after_decay() {
        let mut graph = graph(vec![1, 2, 3], vec![(1, 2), (2, 3), (3, 1)], false);
        let report = {
            let mut engine =
                PathSearchEngine::new(&mut graph, params(1, 4, 1), rng64(4)).unwrap();
            engine.run(&1, &3).unwrap()
        };

        assert_eq!(report.result.length(), Some(2));
        // seeded to 1.0, the local update keeps it there, then decay and 0.1 * 1 / 3 nodes
        let on_path = 0.9 * 1.0 + 0.1 * (1.0 / 3.0);
        for edge in [(0, 1), (1, 2)].iter() {
            let value = graph.pheromone(*edge).unwrap().into_inner();
            assert!(
                approx_eq!(f64, value, on_path, epsilon = 1e-12),
                "Edge {:?} carries {} instead of {}.",
                edge,
                value,
                on_path
            );
        }
        assert!(
            approx_eq!(f64, graph.pheromone((2, 0)).unwrap().into_inner(), 0.9, epsilon = 1e-12),
            "The edge off the best path should only decay."
        );
    }

    #[test]
    fn looping_best_path_is_reinforced_once_per_edge() {
        let mut graph = graph(vec![1, 2, 3], vec![(1, 2), (2, 1), (2, 3)], false);
        for edge in graph.edge_ids() {
            graph.set_pheromone(edge, R64::one()).unwrap();
        }
        let best = BestPath {
            path: Some(Solution::from_nodes(vec![0, 1, 0, 1, 2])),
        };
        {
            let mut engine =
                PathSearchEngine::new(&mut graph, params(1, 4, 1), rng64(4)).unwrap();
            engine.global_update(&best).unwrap();
        }

        // five nodes on the walk, 0.1 * 1 / 5 per distinct edge
        for value in pheromones(&graph) {
            assert!(approx_eq!(f64, value, 0.9 + 0.02, epsilon = 1e-12));
        }
    }

    #[test]
    fn large_improvement_resets_convergence() {
        // 1 -> 3 directly or around through 4 and 5
        let mut graph = graph(
            vec![1, 3, 4, 5],
            vec![(1, 3), (1, 4), (4, 5), (5, 3)],
            false,
        );
        let mut search = params(1, 5, 20);
        search.exploitation = ExploitationParams {
            base: 0.0,
            coeff: 0.0,
            exp: 1.0,
        };
        search.break_on_path_change = 0.5;
        search.break_on_iterations = 2;
        // two detours, then the direct edge three times
        let mut source =
            SequenceSource::new(vec![0.9, 0.5, 0.5, 0.9, 0.5, 0.5, 0.1, 0.1, 0.1]);

        let report = {
            let mut engine = PathSearchEngine::new(&mut graph, search, &mut source).unwrap();
            engine.run(&1, &3).unwrap()
        };

        assert!(report.converged);
        assert_eq!(
            report.iterations, 5,
            "Shortening the path by two nodes should restart the count."
        );
        assert_eq!(report.satisfactory_change_its, 2);
        assert_eq!(
            report.result.path().map(|path| path.nodes().to_vec()),
            Some(vec![1, 3])
        );
        assert_eq!(source.consumed(), 9);
    }

    #[test]
    fn backstep_onto_source_with_single_exit_aborts() {
        let mut graph = graph(vec![1, 2, 3], vec![(1, 2)], true);
        let mut engine = PathSearchEngine::new(&mut graph, params(2, 4, 5), rng64(8)).unwrap();

        let report = engine.run(&1, &3).unwrap();

        assert_eq!(report.result, PathResult::NotFound);
        assert!(
            report.aborted,
            "Coming back from 2 leaves no unexcluded edge at the source."
        );
        assert_eq!(report.iterations, 1);
    }

    #[test]
    fn entropy_of_converged_colony_is_zero() {
        let mut graph = graph(vec![1, 2, 3], vec![(1, 2), (2, 3)], false);
        let mut engine = PathSearchEngine::new(&mut graph, params(4, 5, 2), rng64(9)).unwrap();

        let report = engine.run(&1, &3).unwrap();

        assert!(approx_eq!(f64, report.entropy, 0.0, epsilon = 1e-12));
    }

    #[test]
    fn dispersed_colony_has_bounded_entropy() {
        let mut graph = grid(4);
        let mut engine = PathSearchEngine::new(&mut graph, params(6, 3, 3), rng64(21)).unwrap();

        let report = engine.run(&(0, 0), &(3, 3)).unwrap();

        assert!((0.0..=1.0).contains(&report.entropy));
    }

    #[test]
    fn observer_sees_every_step() {
        let mut graph = graph(vec![1, 2, 3], vec![(1, 2), (2, 3)], false);
        let mut heatmap = VisitHeatmap::new();
        {
            let mut engine = PathSearchEngine::new(&mut graph, params(2, 5, 1), rng64(2))
                .unwrap()
                .with_observer(&mut heatmap);
            engine.find_path(&1, &3);
        }

        // both ants stand on vertex 1 after the first step and on 2 after the second
        assert_eq!(heatmap.visits(0), 0);
        assert_eq!(heatmap.visits(1), 2);
        assert_eq!(heatmap.visits(2), 2);
        assert_eq!(heatmap.total(), 4);
    }
}
