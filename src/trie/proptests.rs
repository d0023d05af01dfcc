//! Model-based property tests: random action sequences applied to both the
//! trie and a `BTreeMap` must stay observationally equal, across versions.

use std::collections::BTreeMap;

use proptest::prelude::*;

use super::Trie;

#[derive(Debug, Clone)]
enum Action {
    Put(Vec<u8>, u64),
    Remove(Vec<u8>),
    Get(Vec<u8>),
}

/// Short keys over a tiny alphabet, so sequences collide, share prefixes
/// and exercise the pruning cascade.
fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..4, 0..6)
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        (key_strategy(), any::<u64>()).prop_map(|(k, v)| Action::Put(k, v)),
        key_strategy().prop_map(Action::Remove),
        key_strategy().prop_map(Action::Get),
    ]
}

proptest! {
    #[test]
    fn trie_matches_btreemap_model(actions in prop::collection::vec(action_strategy(), 1..64)) {
        let mut model: BTreeMap<Vec<u8>, u64> = BTreeMap::new();
        let mut trie = Trie::new();

        for action in actions {
            match action {
                Action::Put(key, value) => {
                    model.insert(key.clone(), value);
                    trie = trie.put(&key, value);
                }
                Action::Remove(key) => {
                    model.remove(&key);
                    trie = trie.remove(&key);
                }
                Action::Get(key) => {
                    prop_assert_eq!(trie.get::<u64>(&key), model.get(&key));
                }
            }
        }

        for (key, value) in &model {
            prop_assert_eq!(trie.get::<u64>(key), Some(value));
        }
        prop_assert_eq!(trie.is_empty(), model.is_empty());
    }

    #[test]
    fn older_versions_survive_later_mutations(
        keys in prop::collection::vec(key_strategy(), 1..16),
        extra in key_strategy(),
    ) {
        let mut versions: Vec<(Trie, BTreeMap<Vec<u8>, u64>)> = Vec::new();
        let mut model: BTreeMap<Vec<u8>, u64> = BTreeMap::new();
        let mut trie = Trie::new();

        for (i, key) in keys.iter().enumerate() {
            model.insert(key.clone(), i as u64);
            trie = trie.put(key, i as u64);
            versions.push((trie.clone(), model.clone()));
        }

        // Mutate the newest version; every snapshot must be unaffected.
        let _mutated = trie.put(&extra, u64::MAX).remove(keys.last().unwrap());

        for (snapshot, expected) in &versions {
            for (key, value) in expected {
                prop_assert_eq!(snapshot.get::<u64>(key), Some(value));
            }
        }
    }
}
