//! Topological ordering of the equation graph.
//!
//! Strongly connected components are collapsed into single nodes and the
//! resulting acyclic graph is sorted with Kahn's algorithm. Among the
//! components that are ready at a given point, the one holding the earliest
//! declared equation goes first, so the same model always yields the same
//! order.

use super::dependency_graph::DependencyGraph;
use std::collections::BTreeSet;

/// Execution plan of the equations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    /// Equation indices in execution order
    pub order: Vec<usize>,
    /// Order slot of each equation; members of a cycle group share one
    pub slot: Vec<usize>,
    /// Cycle groups in execution order, members ascending
    pub groups: Vec<Vec<usize>>,
    /// Cycle group of each equation
    pub group_of: Vec<Option<usize>>,
}

impl Schedule {
    pub fn in_cycle(&self) -> Vec<bool> {
        self.group_of.iter().map(Option::is_some).collect()
    }
}

/// Order the equations of `graph`. `implicit` flags equations that need a
/// simultaneous solve on their own.
pub fn schedule(graph: &DependencyGraph, implicit: &[bool]) -> Schedule {
    let n = graph.equation_count();
    let components = graph.strongly_connected_components();

    let mut component_of = vec![0; n];
    for (c, members) in components.iter().enumerate() {
        for &e in members {
            component_of[e] = c;
        }
    }

    let mut successors: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); components.len()];
    let mut in_degree = vec![0usize; components.len()];
    for e in 0..n {
        for d in graph.dependencies(e) {
            let (from, to) = (component_of[d], component_of[e]);
            if from != to && successors[from].insert(to) {
                in_degree[to] += 1;
            }
        }
    }

    // keyed by earliest member, which is unique per component
    let mut ready: BTreeSet<(usize, usize)> = components
        .iter()
        .enumerate()
        .filter(|(c, _)| in_degree[*c] == 0)
        .map(|(c, members)| (members[0], c))
        .collect();

    let mut order = Vec::with_capacity(n);
    let mut slot = vec![0; n];
    let mut groups = Vec::new();
    let mut group_of = vec![None; n];
    let mut next_slot = 0;

    while let Some((_, c)) = ready.pop_first() {
        let members = &components[c];
        let is_group = members.len() > 1 || members.iter().any(|e| implicit[*e]);
        if is_group {
            for &e in members {
                group_of[e] = Some(groups.len());
            }
            groups.push(members.clone());
        }
        for &e in members {
            slot[e] = next_slot;
            order.push(e);
        }
        next_slot += 1;

        for &s in &successors[c] {
            in_degree[s] -= 1;
            if in_degree[s] == 0 {
                ready.insert((components[s][0], s));
            }
        }
    }

    log::debug!(
        "scheduled {} equations in {} slots, {} cycle groups",
        order.len(),
        next_slot,
        groups.len()
    );

    Schedule {
        order,
        slot,
        groups,
        group_of,
    }
}
