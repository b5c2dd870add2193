//! Resolving and validating the system execution order.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::{SimError, SimResult};
use crate::system::System;

/// Compute the execution order of `systems` as indices into the slice.
///
/// Dependencies always run first; among systems that are ready at the same
/// time the lower priority runs first, then the earlier registration. The
/// set is rejected if names repeat, a dependency is unknown, dependencies
/// form a cycle, or two systems write the same component kind without a
/// dependency path between them.
pub fn resolve_order(systems: &[Box<dyn System>]) -> SimResult<Vec<usize>> {
    let mut by_name: HashMap<&str, usize> = HashMap::new();
    for (index, system) in systems.iter().enumerate() {
        if by_name.insert(system.name(), index).is_some() {
            return Err(SimError::DuplicateSystem(system.name().to_string()));
        }
    }

    // dependents[i] lists the systems that must run after i.
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); systems.len()];
    let mut in_degree = vec![0usize; systems.len()];
    for (index, system) in systems.iter().enumerate() {
        for dependency in system.depends_on() {
            let Some(&before) = by_name.get(dependency) else {
                return Err(SimError::UnknownDependency {
                    system: system.name().to_string(),
                    dependency: (*dependency).to_string(),
                });
            };
            dependents[before].push(index);
            in_degree[index] += 1;
        }
    }

    let mut ready: BTreeSet<(i32, usize)> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(index, _)| (systems[index].priority(), index))
        .collect();
    let mut order = Vec::with_capacity(systems.len());
    while let Some((_, index)) = ready.pop_first() {
        order.push(index);
        for &next in &dependents[index] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.insert((systems[next].priority(), next));
            }
        }
    }

    if order.len() < systems.len() {
        let placed: HashSet<usize> = order.iter().copied().collect();
        let stuck = (0..systems.len())
            .filter(|index| !placed.contains(index))
            .map(|index| systems[index].name().to_string())
            .collect();
        return Err(SimError::DependencyCycle(stuck));
    }

    check_write_conflicts(systems, &dependents)?;
    Ok(order)
}

fn check_write_conflicts(systems: &[Box<dyn System>], dependents: &[Vec<usize>]) -> SimResult<()> {
    let reachable: Vec<HashSet<usize>> = (0..systems.len())
        .map(|start| reachable_from(start, dependents))
        .collect();

    for first in 0..systems.len() {
        for second in (first + 1)..systems.len() {
            let shared = systems[first].writes().iter().find(|kind| {
                systems[second].writes().contains(*kind)
            });
            let Some(kind) = shared else {
                continue;
            };
            let ordered = reachable[first].contains(&second) || reachable[second].contains(&first);
            if !ordered {
                return Err(SimError::WriteConflict {
                    first: systems[first].name().to_string(),
                    second: systems[second].name().to_string(),
                    kind,
                });
            }
        }
    }
    Ok(())
}

fn reachable_from(start: usize, dependents: &[Vec<usize>]) -> HashSet<usize> {
    let mut seen = HashSet::new();
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        for &next in &dependents[node] {
            if seen.insert(next) {
                stack.push(next);
            }
        }
    }
    seen
}
