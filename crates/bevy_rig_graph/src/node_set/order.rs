use std::collections::VecDeque;

use bevy_rig_graph_core::errors::{GraphError, GraphResult};

/// Orders `node_count` nodes so that every edge `(from, to)` has `from` first.
///
/// Ties keep index order, so the same graph always evaluates in the same order.
pub fn topological_order(
    node_count: usize,
    edges: impl IntoIterator<Item = (usize, usize)>,
) -> GraphResult<Vec<usize>> {
    let mut in_degree = vec![0_usize; node_count];
    let mut adjacent = vec![Vec::new(); node_count];
    for (from, to) in edges {
        adjacent[from].push(to);
        in_degree[to] += 1;
    }

    let mut queue: VecDeque<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(index, _)| index)
        .collect();

    let mut order = Vec::with_capacity(node_count);
    while let Some(node) = queue.pop_front() {
        order.push(node);
        for next in &adjacent[node] {
            in_degree[*next] -= 1;
            if in_degree[*next] == 0 {
                queue.push_back(*next);
            }
        }
    }

    if order.len() == node_count {
        Ok(order)
    } else {
        Err(GraphError::CyclicGraph)
    }
}
