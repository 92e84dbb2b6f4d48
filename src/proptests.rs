use super::*;

use crate::arena::NodeId;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};

type Model = BTreeMap<LocationKey, BTreeSet<EndpointId>>;

/// Check every structural invariant of `t` and its agreement with the array form.
fn validate_tree(t: &TopologyTree) {
    let arena = t.arena();
    let index = t.leaf_index();
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut leaves = 0usize;

    fn visit_chain(
        t: &TopologyTree,
        head: NodeId,
        depth: usize,
        codes: &mut [u8; 3],
        visited: &mut HashSet<NodeId>,
        leaves: &mut usize,
    ) {
        let arena = t.arena();
        assert!(!head.is_null(), "empty chain below an interior node at depth {depth}");
        let mut seen_codes = HashSet::new();
        for (id, node) in arena.chain(head) {
            assert!(visited.insert(id), "node {id:?} reachable twice (cycle or shared link)");
            assert!(!arena.is_free(id), "freed node {id:?} still linked");
            assert!(
                Tier::ALL[depth].is_valid_code(node.code),
                "invalid code {} at depth {depth}",
                node.code
            );
            assert!(seen_codes.insert(node.code), "duplicate sibling code {}", node.code);
            codes[depth] = node.code;

            if depth == Tier::Subzone.depth() {
                assert!(node.first_child.is_null(), "subzone node with children");
                let key = LocationKey::from_codes(*codes).expect("codes validated above");
                assert!(
                    t.leaf_index().get(&key).is_some_and(|set| !set.is_empty()),
                    "leaf {key} has no endpoints"
                );
                *leaves += 1;
            } else {
                visit_chain(t, node.first_child, depth + 1, codes, visited, leaves);
            }
        }
    }

    if !t.head().is_null() {
        visit_chain(t, t.head(), 0, &mut [0; 3], &mut visited, &mut leaves);
    }

    assert_eq!(leaves, index.occupied(), "leaf nodes must match occupied keys");
    assert_eq!(visited.len(), arena.live(), "every live node must be reachable");
    assert_eq!(index.keys().map(|k| index.get(k).map_or(0, <[_]>::len)).sum::<usize>(), t.len());

    let array = t.flatten();
    assert_eq!(array, t.flatten(), "flatten must be deterministic");
    assert_eq!(array.locations().expect("flattened array is well formed"), t.locations());
    assert_eq!(t.head().is_null(), array.is_empty());
}

fn assert_matches_model(t: &TopologyTree, m: &Model) {
    assert_eq!(t.locations().into_iter().collect::<BTreeSet<_>>(), m.keys().copied().collect());
    for (key, ids) in m {
        let got: BTreeSet<EndpointId> = t
            .candidates(key)
            .expect("occupied key")
            .iter()
            .map(Endpoint::id)
            .collect();
        assert_eq!(&got, ids);
    }
}

#[derive(Clone, Debug)]
enum Op {
    Insert(LocationKey),
    /// Delete the live endpoint at this position (mod live count).
    Delete(usize),
    /// Delete an endpoint that was never inserted.
    DeleteStranger(LocationKey),
    Resolve(LocationKey),
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        50 => any::<LocationKey>().prop_map(Op::Insert),
        30 => any::<usize>().prop_map(Op::Delete),
        5 => any::<LocationKey>().prop_map(Op::DeleteStranger),
        15 => any::<LocationKey>().prop_map(Op::Resolve),
    ];
    prop::collection::vec(op, 0..=400)
}

/// Expected degraded tier for `target` given occupancy `m`.
fn expected_degradation(target: &LocationKey, m: &Model) -> Option<Tier> {
    if !m.keys().any(|k| k.region == target.region) {
        Some(Tier::Region)
    } else if !m.keys().any(|k| k.region == target.region && k.zone == target.zone) {
        Some(Tier::Zone)
    } else if !m.contains_key(target) {
        Some(Tier::Subzone)
    } else {
        None
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_with_model(ops in ops_strategy(), seed in any::<u64>()) {
        let mut t = TopologyTree::new();
        let mut m: Model = BTreeMap::new();
        let mut live: Vec<Endpoint> = Vec::new();
        let mut selector = LocalitySelector::seeded(seed);

        for op in ops {
            match op {
                Op::Insert(key) => {
                    let ep = Endpoint::new(key);
                    prop_assert_eq!(t.insert(ep.clone()), Ok(()));
                    m.entry(key).or_default().insert(ep.id());
                    live.push(ep);
                }
                Op::Delete(pos) => {
                    if live.is_empty() {
                        continue;
                    }
                    let ep = live.swap_remove(pos % live.len());
                    prop_assert_eq!(t.delete(&ep), Ok(ep.clone()));
                    let ids = m.get_mut(&ep.location()).expect("model tracks key");
                    ids.remove(&ep.id());
                    if ids.is_empty() {
                        m.remove(&ep.location());
                    }
                }
                Op::DeleteStranger(key) => {
                    let stranger = Endpoint::new(key);
                    let expected = if m.contains_key(&key) {
                        LocalityError::UnknownEndpoint(stranger.id())
                    } else {
                        LocalityError::UnknownLocationKey(key)
                    };
                    prop_assert_eq!(t.delete(&stranger), Err(expected));
                }
                Op::Resolve(target) => {
                    let array = t.flatten();
                    if m.is_empty() {
                        prop_assert!(selector.resolve(&target, &array).is_err());
                        continue;
                    }
                    let resolution = selector.resolve(&target, &array).expect("populated array");
                    prop_assert!(m.contains_key(&resolution.key));
                    let degraded = expected_degradation(&target, &m);
                    prop_assert_eq!(resolution.degraded, degraded);
                    match degraded {
                        None => {
                            prop_assert_eq!(resolution.key, target);
                        }
                        Some(Tier::Subzone) => {
                            prop_assert_eq!(resolution.key.region, target.region);
                            prop_assert_eq!(resolution.key.zone, target.zone);
                        }
                        Some(Tier::Zone) => {
                            prop_assert_eq!(resolution.key.region, target.region);
                        }
                        Some(Tier::Region) => {}
                    }
                }
            }
            prop_assert_eq!(t.len(), live.len());
        }

        validate_tree(&t);
        assert_matches_model(&t, &m);
    }

    #[test]
    fn prop_insert_then_delete_is_identity(
        keys in prop::collection::vec(any::<LocationKey>(), 0..=40),
        extra in any::<LocationKey>(),
    ) {
        let mut t = TopologyTree::new();
        for key in keys {
            t.insert(Endpoint::new(key)).unwrap();
        }
        let dump = t.debug_dump();
        let array = t.flatten();
        let nodes = t.node_count();

        let ep = Endpoint::new(extra);
        t.insert(ep.clone()).unwrap();
        validate_tree(&t);
        t.delete(&ep).unwrap();

        prop_assert_eq!(t.debug_dump(), dump);
        prop_assert_eq!(t.flatten(), array);
        prop_assert_eq!(t.node_count(), nodes);
        validate_tree(&t);
    }

    #[test]
    fn prop_wire_bytes_roundtrip(keys in prop::collection::vec(any::<LocationKey>(), 0..=40)) {
        let mut t = TopologyTree::new();
        for key in keys {
            t.insert(Endpoint::new(key)).unwrap();
        }
        let array = t.flatten();
        let restored = SerializedArray::from_bytes(array.as_bytes().to_vec());
        prop_assert_eq!(restored.locations().unwrap(), t.locations());
        prop_assert!(array.as_bytes().last() != Some(&EMPTY_MARKER));
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

fn small_fixture() -> Vec<Endpoint> {
    [
        (Region::Asia, Zone::Zone1, Subzone::Subzone1),
        (Region::Asia, Zone::Zone2, Subzone::Subzone1),
        (Region::Europe, Zone::Zone1, Subzone::Subzone2),
        (Region::Europe, Zone::Zone1, Subzone::Subzone1),
        (Region::Europe, Zone::Zone2, Subzone::Subzone1),
        (Region::NorthAmerica, Zone::Zone1, Subzone::Subzone1),
    ]
    .into_iter()
    .map(|(r, z, s)| Endpoint::new(LocationKey::new(r, z, s)))
    .collect()
}

#[test]
fn exhaustive_insert_order_small_set() {
    let eps = small_fixture();
    let mut expected: Option<BTreeSet<LocationKey>> = None;

    for_each_permutation(&eps, |perm| {
        let mut t = TopologyTree::new();
        for ep in perm {
            t.insert(ep).unwrap();
        }
        validate_tree(&t);
        assert_eq!(t.node_count(), 14);
        let keys: BTreeSet<LocationKey> = t.locations().into_iter().collect();
        match &expected {
            Some(e) => assert_eq!(&keys, e),
            None => expected = Some(keys),
        }
    });
}

#[test]
fn exhaustive_delete_order_small_set() {
    let eps = small_fixture();

    // Insert in a fixed order, then delete in all permutations.
    let mut base = TopologyTree::new();
    for ep in &eps {
        base.insert(ep.clone()).unwrap();
    }

    for_each_permutation(&eps, |perm| {
        let mut t = base.clone();
        let mut remaining = eps.len();
        for ep in perm {
            assert_eq!(t.delete(&ep), Ok(ep.clone()));
            remaining -= 1;
            assert_eq!(t.len(), remaining);
            validate_tree(&t);
        }
        assert_eq!(t.node_count(), 0);
        assert!(t.head().is_null());
        assert!(t.flatten().is_empty());
    });
}
