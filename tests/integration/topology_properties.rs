#![allow(missing_docs)]

use std::collections::HashSet;

use hopbench::progress::{percent_boundary, Silent};
use hopbench::{
    build_bipartite, build_ring, BipartiteLayout, Dir, Distribution, FavoriteWalk, NodeId,
    RecordStore, RelType, StorageAdapter, StoreOptions,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

fn arb_distribution() -> impl Strategy<Value = Distribution> {
    prop_oneof![Just(Distribution::Optimistic), Just(Distribution::Scattered)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn ring_walk_returns_after_length_hops(length in 1u64..200, start_seed in any::<u64>()) {
        let dir = TempDir::new().unwrap();
        let mut store = RecordStore::open(dir.path().join("ring"), &StoreOptions::for_insert()).unwrap();
        build_ring(&mut store, length as i64).unwrap();
        prop_assert_eq!(store.node_count(), length);
        prop_assert_eq!(store.relationship_count(), length);

        let start = NodeId(start_seed % length);
        let mut node = start;
        let mut seen = HashSet::new();
        for _ in 0..length {
            prop_assert!(seen.insert(node));
            node = store.single_relationship(node, RelType::Next, Dir::Out).unwrap().dst;
        }
        prop_assert_eq!(node, start);
    }

    #[test]
    fn bipartite_walk_counts_match_layout(
        books in 1u64..8,
        users_per_book in 1u64..8,
        mode in arb_distribution(),
        seed in any::<u64>(),
    ) {
        let dir = TempDir::new().unwrap();
        let layout = BipartiteLayout::new(books, users_per_book).unwrap();
        let mut store = RecordStore::open(dir.path().join("books"), &StoreOptions::for_insert()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let stats = build_bipartite(&mut store, layout, mode, &mut rng, Silent).unwrap();

        prop_assert_eq!(stats.nodes, books * (1 + users_per_book));
        prop_assert_eq!(stats.relationships, books * (1 + users_per_book));
        prop_assert_eq!(store.node_count(), 1 + books * (1 + users_per_book));

        let mut walk = FavoriteWalk::new(&store, NodeId(0)).unwrap();
        let users: Vec<_> = walk.by_ref().map(Result::unwrap).collect();
        prop_assert_eq!(users.len() as u64, layout.total_users());
        prop_assert_eq!(walk.books_visited(), books);
        prop_assert_eq!(walk.roots_skipped(), books);
        prop_assert!(!users.contains(&NodeId(0)));
        let distinct: HashSet<_> = users.iter().collect();
        prop_assert_eq!(distinct.len(), users.len());
    }

    #[test]
    fn progress_percentages_rise_within_range(total in 0u64..5_000) {
        let fired: Vec<_> = (0..total).filter_map(|i| percent_boundary(i, total)).collect();
        if total < 100 {
            prop_assert!(fired.is_empty());
        } else {
            prop_assert!(fired.len() as u64 >= 100);
            prop_assert!(fired.windows(2).all(|w| w[0] <= w[1]));
            prop_assert!(fired.iter().all(|&p| (1..=100).contains(&p)));
        }
    }
}
