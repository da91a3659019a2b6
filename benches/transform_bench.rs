// Transform benchmark - measures backlog resolution and the memo cache.

use std::time::Instant;

use coedit::ot::engine::OperationEngine;
use coedit::ot::op::OpKind;
use coedit::ot::op::Operation;

const DOC: &str = "document";

/// Push one remote operation authored at the empty state into a server
/// that already holds `backlog` sequential operations from another site.
fn resolve_against_backlog(backlog: usize) -> std::time::Duration {
    let mut server = OperationEngine::new(0);
    let mut author = OperationEngine::new(1);

    for i in 0..backlog {
        let op = author
            .push(true, DOC, "x", OpKind::Insert, i, 0, &[], None)
            .unwrap()
            .unwrap();
        let mut state = op.to_state();
        state.order = Some(i as u64);
        server.push_remote(Operation::from_state(state)).unwrap();
    }

    // a site that saw none of it inserts at the front
    let mut late = OperationEngine::new(2);
    let op = late
        .push(true, DOC, "y", OpKind::Insert, 0, 0, &[], None)
        .unwrap()
        .unwrap();
    let mut state = op.to_state();
    state.order = Some(backlog as u64);

    let start = Instant::now();
    server.push_remote(Operation::from_state(state)).unwrap();
    return start.elapsed();
}

/// Interleave two long concurrent runs at the server. Each push resolves
/// against a growing backlog and leans on the transform cache.
fn interleaved_concurrent_runs(per_site: usize) -> std::time::Duration {
    let mut server = OperationEngine::new(0);
    let mut left = OperationEngine::new(1);
    let mut right = OperationEngine::new(2);

    let left_ops: Vec<Operation> = (0..per_site)
        .map(|i| {
            left.push(true, DOC, "l", OpKind::Insert, i, 0, &[], None)
                .unwrap()
                .unwrap()
        })
        .collect();
    let right_ops: Vec<Operation> = (0..per_site)
        .map(|i| {
            right
                .push(true, DOC, "r", OpKind::Insert, i, 0, &[], None)
                .unwrap()
                .unwrap()
        })
        .collect();

    let start = Instant::now();
    let mut order = 0u64;
    for i in 0..per_site {
        for op in [&left_ops[i], &right_ops[i]] {
            let mut state = op.to_state();
            state.order = Some(order);
            order += 1;
            server.push_remote(Operation::from_state(state)).unwrap();
        }
    }
    return start.elapsed();
}

fn main() {
    println!("=== backlog resolution ===");
    for backlog in [10, 100, 1000] {
        let elapsed = resolve_against_backlog(backlog);
        println!("  backlog {:>5}: {:?}", backlog, elapsed);
    }

    println!("\n=== interleaved concurrent runs ===");
    for per_site in [8, 16, 32] {
        let elapsed = interleaved_concurrent_runs(per_site);
        println!(
            "  {:>3} ops per site ({} pushes): {:?}",
            per_site,
            per_site * 2,
            elapsed
        );
    }
}
