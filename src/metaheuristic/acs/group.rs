use crate::graph::Vertex;
use crate::metaheuristic::acs::Ant;

use std::collections::{BTreeMap, HashMap, HashSet};

/// Regroups the colony by position after a step.
///
/// Ants standing on the same vertex share a group. The first ant to reach a vertex
/// keeps its previous group id unless an earlier ant already carried that id
/// elsewhere, in which case a fresh id is handed out.
pub fn repartition(ants: &mut [Ant]) {
    let mut by_vertex: HashMap<Vertex, usize> = HashMap::with_capacity(ants.len());
    let mut claimed: HashSet<usize> = HashSet::with_capacity(ants.len());
    let mut next_id = ants.iter().map(Ant::group).max().map_or(0, |id| id + 1);

    for ant in ants.iter_mut() {
        let group = match by_vertex.get(&ant.current_vertex()) {
            Some(&group) => group,
            None => {
                let group = if claimed.insert(ant.group()) {
                    ant.group()
                } else {
                    next_id += 1;
                    claimed.insert(next_id - 1);
                    next_id - 1
                };
                by_vertex.insert(ant.current_vertex(), group);
                group
            }
        };
        ant.set_group(group);
    }
}

/// Sizes of all non-empty groups, ordered by group id.
pub fn group_sizes(ants: &[Ant]) -> Vec<usize> {
    let mut sizes: BTreeMap<usize, usize> = BTreeMap::new();
    for ant in ants {
        *sizes.entry(ant.group()).or_insert(0) += 1;
    }

    sizes.into_iter().map(|(_, size)| size).collect()
}

/// Shannon entropy of the partition, normalized to [0, 1].
///
/// 0 means all ants share one group, 1 means every ant is on its own.
pub fn entropy(sizes: &[usize]) -> f64 {
    let total: usize = sizes.iter().sum();
    if total <= 1 {
        return 0.0;
    }

    let n = total as f64;
    let weighted_sum: f64 = sizes
        .iter()
        .filter(|&&size| size > 0)
        .map(|&size| {
            let p = size as f64 / n;
            p * p.ln()
        })
        .sum();

    (weighted_sum / (1.0 / n).ln()).max(0.0).min(1.0)
}
