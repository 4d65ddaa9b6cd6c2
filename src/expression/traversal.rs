// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::expression::node::ExpressionNode;

/// Depth-first finish rank of every node reachable from `start_nodes`.
///
/// A shared counter ticks once when a node is entered and once when all of its
/// successors are done; the second value is the node's rank. Nodes are entered at
/// most once, so reconvergent branches are ranked by their first visit. Unreached
/// nodes keep rank 0.
pub fn finish_ranks(nodes: &[ExpressionNode], start_nodes: &[usize]) -> Vec<usize> {
    let mut ranks = vec![0usize; nodes.len()];
    let mut entered = vec![false; nodes.len()];
    let mut t = 0usize;

    for &start in start_nodes {
        if entered[start] {
            continue;
        }

        entered[start] = true;
        t += 1;
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

        while let Some(&(idx, cursor)) = stack.last() {
            match nodes[idx].next().get(cursor) {
                Some(&child) => {
                    if let Some(top) = stack.last_mut() {
                        top.1 += 1;
                    }
                    if !entered[child] {
                        entered[child] = true;
                        t += 1;
                        stack.push((child, 0));
                    }
                }
                None => {
                    t += 1;
                    ranks[idx] = t;
                    stack.pop();
                }
            }
        }
    }

    ranks
}

/// Global processing order: nodes by descending finish rank.
///
/// For every edge `u -> v` the rank of `u` is greater than the rank of `v`, so
/// producers always come before their consumers.
pub fn define_traversal_path(nodes: &[ExpressionNode], start_nodes: &[usize]) -> Vec<usize> {
    let ranks = finish_ranks(nodes, start_nodes);
    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by(|&a, &b| ranks[b].cmp(&ranks[a]));
    order
}
