// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structural checks run on every submitted expression before anything is built.

use crate::expression::node::ExpressionNode;

/// Nodes without incoming dependencies.
pub fn find_start_nodes(nodes: &[ExpressionNode]) -> Vec<usize> {
    nodes
        .iter()
        .filter(|node| node.prev().is_empty())
        .map(ExpressionNode::idx)
        .collect()
}

/// Nodes without outgoing dependencies.
pub fn find_end_nodes(nodes: &[ExpressionNode]) -> Vec<usize> {
    nodes
        .iter()
        .filter(|node| node.next().is_empty())
        .map(ExpressionNode::idx)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// Not reached yet
    White,
    /// On the current walk's stack
    Gray,
    /// Fully explored
    Black,
}

/// Find a dependency cycle, returned as a closed path `[a, b, ..., a]`.
///
/// Walks `next` edges depth-first from every start node with an explicit stack.
/// Meeting a node that is still on the stack is a cycle; meeting a fully explored
/// node is ordinary reconvergence. Nodes the walks never reach can only sit on or
/// below a cycle with no start node upstream, so that cycle is recovered by
/// walking `prev` edges backwards.
pub fn find_cycle(nodes: &[ExpressionNode], start_nodes: &[usize]) -> Option<Vec<usize>> {
    let mut marks = vec![Mark::White; nodes.len()];

    for &start in start_nodes {
        if marks[start] != Mark::White {
            continue;
        }

        // (node, index of the next child to visit)
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        marks[start] = Mark::Gray;

        while let Some(&(idx, cursor)) = stack.last() {
            match nodes[idx].next().get(cursor) {
                Some(&child) => {
                    if let Some(top) = stack.last_mut() {
                        top.1 += 1;
                    }
                    match marks[child] {
                        Mark::White => {
                            marks[child] = Mark::Gray;
                            stack.push((child, 0));
                        }
                        Mark::Gray => {
                            let from = stack.iter().position(|&(n, _)| n == child).unwrap_or(0);
                            let mut cycle: Vec<usize> = stack[from..].iter().map(|&(n, _)| n).collect();
                            cycle.push(child);
                            return Some(cycle);
                        }
                        Mark::Black => {}
                    }
                }
                None => {
                    marks[idx] = Mark::Black;
                    stack.pop();
                }
            }
        }
    }

    let unreachable = marks.iter().position(|&mark| mark == Mark::White)?;
    Some(cycle_upstream_of(nodes, unreachable))
}

/// Follow `prev` edges from a node no start node reaches until a node repeats.
fn cycle_upstream_of(nodes: &[ExpressionNode], from: usize) -> Vec<usize> {
    let mut seen_at = vec![None; nodes.len()];
    let mut walk = Vec::new();
    let mut current = from;

    loop {
        if let Some(position) = seen_at[current] {
            // walk[position..] is the cycle in reverse edge order
            let mut cycle: Vec<usize> = walk[position..].iter().rev().copied().collect();
            cycle.push(cycle[0]);
            return cycle;
        }
        seen_at[current] = Some(walk.len());
        walk.push(current);

        match nodes[current].prev().first() {
            Some(&prev) => current = prev,
            // Unreachable nodes always have a predecessor
            None => return walk,
        }
    }
}
