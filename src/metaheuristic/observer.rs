use crate::graph::Vertex;
use crate::metaheuristic::acs::Ant;

use csv::Writer;
use log::warn;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io;
use std::io::{stderr, Stderr, Write};

/// State of the colony at the end of a step.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub iteration: usize,
    pub step: usize,
    pub ants: &'a [Ant],
}

/// Receives a snapshot after every step of a search.
pub trait Observer<G: ?Sized> {
    fn observe(&mut self, snapshot: &Snapshot<'_>, graph: &G);
}

impl<G, F> Observer<G> for F
where
    G: ?Sized,
    F: FnMut(&Snapshot<'_>, &G),
{
    fn observe(&mut self, snapshot: &Snapshot<'_>, graph: &G) {
        self(snapshot, graph)
    }
}

#[derive(Debug, Serialize)]
struct AntRecord {
    iteration: usize,
    step: usize,
    ant: usize,
    vertex: Vertex,
    steps_taken: usize,
    group: usize,
    found_food: bool,
}

/// Writes the position of every ant as CSV, once every `aggregation_rate` steps.
pub struct CsvObserver<W: Write> {
    aggregation_rate: usize,
    writer: Writer<W>,
}

impl<W: Write> CsvObserver<W> {
    pub fn new(aggregation_rate: usize, writer: Writer<W>) -> Self {
        CsvObserver {
            aggregation_rate: aggregation_rate.max(1),
            writer,
        }
    }

    /// Flushes all records and hands back the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|err| err.into_error())
    }

    fn write_snapshot(&mut self, snapshot: &Snapshot<'_>) -> csv::Result<()> {
        for (id, ant) in snapshot.ants.iter().enumerate() {
            self.writer.serialize(AntRecord {
                iteration: snapshot.iteration,
                step: snapshot.step,
                ant: id,
                vertex: ant.current_vertex(),
                steps_taken: ant.steps_taken(),
                group: ant.group(),
                found_food: ant.found_food(),
            })?;
        }

        Ok(())
    }
}

impl<G: ?Sized, W: Write> Observer<G> for CsvObserver<W> {
    fn observe(&mut self, snapshot: &Snapshot<'_>, _graph: &G) {
        if snapshot.step % self.aggregation_rate != 0 {
            return;
        }

        if let Err(err) = self.write_snapshot(snapshot) {
            warn!(
                "could not record step {} of iteration {}: {}",
                snapshot.step, snapshot.iteration, err
            );
        }
    }
}

impl Default for CsvObserver<Stderr> {
    fn default() -> Self {
        CsvObserver::new(1, Writer::from_writer(stderr()))
    }
}

/// Counts how many ant-steps ended on each vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitHeatmap {
    visits: BTreeMap<Vertex, usize>,
}

impl VisitHeatmap {
    pub fn new() -> Self {
        VisitHeatmap::default()
    }

    pub fn visits(&self, vertex: Vertex) -> usize {
        self.visits.get(&vertex).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.visits.values().sum()
    }

    /// Vertex with the most visits, the lowest one on ties.
    pub fn hottest(&self) -> Option<(Vertex, usize)> {
        self.visits
            .iter()
            .fold(None, |best, (&vertex, &count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((vertex, count)),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (Vertex, usize)> + '_ {
        self.visits.iter().map(|(&vertex, &count)| (vertex, count))
    }
}

impl<G: ?Sized> Observer<G> for VisitHeatmap {
    fn observe(&mut self, snapshot: &Snapshot<'_>, _graph: &G) {
        for ant in snapshot.ants {
            *self.visits.entry(ant.current_vertex()).or_insert(0) += 1;
        }
    }
}
