//! Property-based tests for the connectivity invariants in spec.md §8,
//! cross-checked against an independent reference model built on
//! `petgraph::UnGraph` rather than re-deriving the crate's own union-find
//! logic.

use std::collections::HashSet;

use petgraph::algo::connected_components;
use petgraph::graphmap::UnGraphMap;
use proptest::prelude::*;

use meshlock::{Resource, ResourceGroup, World};

#[derive(Debug, Clone)]
enum Op {
    Connect(usize, usize),
    Disconnect(usize, usize),
}

fn op_strategy(n: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..n, 0..n).prop_map(|(a, b)| Op::Connect(a, b)),
        (0..n, 0..n).prop_map(|(a, b)| Op::Disconnect(a, b)),
    ]
}

proptest! {
    /// Invariants 1, 6, 7, 8: symmetric adjacency, idempotent connect,
    /// disconnect-without-split preserves the class, disconnect-with-split
    /// matches an independently computed connected-components model.
    #[test]
    fn class_membership_matches_reference_model(
        n in 2usize..8,
        ops in prop::collection::vec(op_strategy(8), 0..40),
    ) {
        let world = World::new();
        let mut group = ResourceGroup::<()>::create_empty_in(&world);
        let resources: Vec<Resource<()>> = (0..n)
            .map(|_| group.create_and_acquire_resource().unwrap())
            .collect();

        let mut model: UnGraphMap<usize, ()> = UnGraphMap::new();
        for i in 0..n {
            model.add_node(i);
        }

        for op in &ops {
            match *op {
                Op::Connect(a, b) if a < n && b < n => {
                    group.connect(&resources[a], &resources[b]).unwrap();
                    if a != b {
                        model.add_edge(a, b, ());
                    }
                }
                Op::Disconnect(a, b) if a < n && b < n && a != b => {
                    // Only disconnect pairs that are actually directly
                    // adjacent in our model to match the crate's own
                    // precondition-free no-op-on-absent-edge behavior.
                    let _ = group.disconnect(&resources[a], &resources[b]);
                    model.remove_edge(a, b);
                }
                _ => {}
            }
        }

        // Cross-check: two resources are in the same class in the crate
        // iff they are in the same connected component of the model.
        for i in 0..n {
            for j in 0..n {
                let same_in_crate = reachable_via_crate(&group, &resources, i, j);
                let same_in_model = same_component(&model, i, j);
                prop_assert_eq!(
                    same_in_crate, same_in_model,
                    "resource {} and {} disagree on class membership", i, j
                );
            }
        }

        group.free().unwrap();
    }
}

fn reachable_via_crate(
    group: &ResourceGroup<'_, ()>,
    resources: &[Resource<()>],
    start: usize,
    target: usize,
) -> bool {
    let mut seen: HashSet<usize> = HashSet::new();
    let mut frontier = vec![start];
    seen.insert(start);
    while let Some(cur) = frontier.pop() {
        if cur == target {
            return true;
        }
        let neighbors = group.directly_connected_to(&resources[cur]).unwrap();
        for (idx, r) in resources.iter().enumerate() {
            if neighbors.contains(r) && seen.insert(idx) {
                frontier.push(idx);
            }
        }
    }
    seen.contains(&target)
}

fn same_component(model: &UnGraphMap<usize, ()>, a: usize, b: usize) -> bool {
    if a == b {
        return true;
    }
    // `connected_components` only counts components; walk explicitly
    // instead so we get an a-vs-b answer cheaply for small n.
    let mut seen: HashSet<usize> = HashSet::new();
    let mut frontier = vec![a];
    seen.insert(a);
    while let Some(cur) = frontier.pop() {
        for next in model.neighbors(cur) {
            if seen.insert(next) {
                frontier.push(next);
            }
        }
    }
    seen.contains(&b)
}

proptest! {
    /// Invariant 4: keys are strictly monotonic in creation order.
    #[test]
    fn keys_strictly_increase(n in 1usize..50) {
        let world = World::new();
        let mut group = ResourceGroup::<()>::create_empty_in(&world);
        let mut last = None;
        for _ in 0..n {
            let r = group.create_and_acquire_resource().unwrap();
            if let Some(prev) = last {
                prop_assert!(r.id() > prev);
            }
            last = Some(r.id());
        }
        group.free().unwrap();
    }

    /// Invariant 5: after any lookup, the node's parent is its root
    /// directly — checked indirectly via stable `directly_connected_to`
    /// results across repeated reads after churn.
    #[test]
    fn repeated_reads_are_stable(ops in prop::collection::vec(0usize..4, 1..20)) {
        let world = World::new();
        let mut group = ResourceGroup::<()>::create_empty_in(&world);
        let resources: Vec<_> = (0..4)
            .map(|_| group.create_and_acquire_resource().unwrap())
            .collect();
        for w in ops.windows(2) {
            let (a, b) = (w[0], w[1]);
            if a != b {
                let _ = group.connect(&resources[a], &resources[b]);
            }
        }
        let first = group.directly_connected_to(&resources[0]).unwrap();
        let second = group.directly_connected_to(&resources[0]).unwrap();
        prop_assert_eq!(first, second);
        group.free().unwrap();
    }
}

#[test]
fn connected_components_smoke() {
    // Sanity check that the petgraph reference model itself behaves as
    // expected, independent of the crate under test.
    let mut g: UnGraphMap<usize, ()> = UnGraphMap::new();
    for i in 0..4 {
        g.add_node(i);
    }
    g.add_edge(0, 1, ());
    g.add_edge(2, 3, ());
    assert_eq!(connected_components(&g), 2);
}
