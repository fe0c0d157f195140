use crate::graph::{GraphError, PheromoneGraph, Vertex};
use crate::metaheuristic::acs::params::PheromoneParams;

use decorum::R64;
use num_traits::identities::Zero;

/// A single walker of the colony.
///
/// The history keeps every vertex visited on the current walk. After a backstep the
/// abandoned vertex stays in the history one slot past `steps_taken`, so it can be
/// excluded from the next choice.
#[derive(Debug, Clone, PartialEq)]
pub struct Ant {
    current_vertex: Vertex,
    steps_taken: usize,
    history: Vec<Vertex>,
    found_food: bool,
    did_backstep: bool,
    group: usize,
}

impl Ant {
    pub fn new(source: Vertex, max_steps: usize) -> Self {
        let mut history = Vec::with_capacity(max_steps + 1);
        history.push(source);

        Ant {
            current_vertex: source,
            steps_taken: 0,
            history,
            found_food: false,
            did_backstep: false,
            group: 0,
        }
    }

    pub fn current_vertex(&self) -> Vertex {
        self.current_vertex
    }

    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    pub fn found_food(&self) -> bool {
        self.found_food
    }

    pub fn did_backstep(&self) -> bool {
        self.did_backstep
    }

    pub fn group(&self) -> usize {
        self.group
    }

    /// The walk from the source to the current vertex.
    pub fn path(&self) -> &[Vertex] {
        &self.history[..=self.steps_taken]
    }

    pub(crate) fn set_group(&mut self, group: usize) {
        self.group = group;
    }

    pub(crate) fn mark_found_food(&mut self) {
        self.found_food = true;
    }

    fn is_excluded(&self, to: Vertex) -> bool {
        let previous = self
            .steps_taken
            .checked_sub(1)
            .map(|idx| self.history[idx]);
        let abandoned = if self.did_backstep {
            self.history.get(self.steps_taken + 1).copied()
        } else {
            None
        };

        previous == Some(to) || abandoned == Some(to)
    }

    /// Picks the next vertex for the draw `r`.
    ///
    /// Draws below `exploitation_factor` follow the strongest eligible trail, all
    /// others spin the roulette over the eligible pheromone.
    pub fn choose_next<G>(
        &self,
        graph: &G,
        r: f64,
        exploitation_factor: f64,
    ) -> Result<Option<Vertex>, GraphError<Vertex>>
    where
        G: PheromoneGraph + ?Sized,
    {
        let eligible: Vec<(Vertex, R64)> = graph
            .iter_out_edges(self.current_vertex)?
            .filter(|&(to, _)| !self.is_excluded(to))
            .collect();

        if r < exploitation_factor {
            Ok(strongest(&eligible))
        } else {
            Ok(roulette(&eligible, r - exploitation_factor))
        }
    }

    /// Moves along the edge to `to`, applying the local pheromone rule on it.
    pub fn advance<G>(
        &mut self,
        graph: &mut G,
        to: Vertex,
        local: &PheromoneParams,
    ) -> Result<(), GraphError<Vertex>>
    where
        G: PheromoneGraph + ?Sized,
    {
        let edge = (self.current_vertex, to);
        let pheromone = graph.pheromone(edge)?;
        graph.set_pheromone(edge, local.local_update(pheromone))?;

        self.steps_taken += 1;
        self.did_backstep = false;
        self.history.truncate(self.steps_taken);
        self.history.push(to);
        self.current_vertex = to;

        Ok(())
    }

    /// Retreats to the previous vertex. Returns false if the ant is still at its source.
    pub fn backstep(&mut self) -> bool {
        if self.steps_taken == 0 {
            return false;
        }

        self.steps_taken -= 1;
        self.did_backstep = true;
        self.current_vertex = self.history[self.steps_taken];
        true
    }
}

/// First edge with maximal pheromone, in enumeration order.
fn strongest(edges: &[(Vertex, R64)]) -> Option<Vertex> {
    let mut best: Option<(Vertex, R64)> = None;
    for &(to, pheromone) in edges {
        match best {
            Some((_, best_pheromone)) if best_pheromone >= pheromone => {}
            _ => best = Some((to, pheromone)),
        }
    }

    best.map(|(to, _)| to)
}

/// Roulette selection with the target `scale * total`.
///
/// The draw is not renormalized after subtracting the exploitation factor, so edges
/// late in the enumeration are reached less often than their share of the pheromone.
fn roulette(edges: &[(Vertex, R64)], scale: f64) -> Option<Vertex> {
    let total = edges
        .iter()
        .fold(R64::zero(), |acc, &(_, pheromone)| acc + pheromone);
    if total.is_zero() {
        return None;
    }

    let mut remaining = scale * total.into_inner();
    for &(to, pheromone) in edges {
        remaining -= pheromone.into_inner();
        if remaining <= 0.0 {
            return Some(to);
        }
    }

    // only reachable through rounding
    edges.last().map(|&(to, _)| to)
}
