//! Property-based test generators using proptest.
//!
//! Row lists produced here are identity-unique, which is what the
//! synchronizer guarantees for its own rows.

use proptest::prelude::*;
use rowsync_engine::{CrudEvent, LoadIntent, Record};

/// Strategy for row identities drawn from a small pool, so lists overlap.
pub fn id_strategy() -> impl Strategy<Value = String> {
    (0u8..32).prop_map(|n| format!("r{n}"))
}

/// Strategy for a single record with a small revision range.
pub fn record_strategy() -> impl Strategy<Value = Record> {
    (id_strategy(), 0i64..3).prop_map(|(id, rev)| Record::new(id, rev))
}

/// Strategy for identity-unique record lists of up to `max_len` rows.
pub fn unique_rows_strategy(max_len: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::hash_set(0u8..32, 0..=max_len)
        .prop_flat_map(|ids| {
            let ids: Vec<u8> = ids.into_iter().collect();
            let len = ids.len();
            (Just(ids), prop::collection::vec(0i64..3, len))
        })
        .prop_map(|(ids, revs)| {
            ids.into_iter()
                .zip(revs)
                .map(|(id, rev)| Record::new(format!("r{id}"), rev))
                .collect::<Vec<_>>()
        })
        .prop_shuffle()
}

/// Strategy for record lists that may repeat identities.
pub fn noisy_rows_strategy(max_len: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(record_strategy(), 0..=max_len)
}

/// Strategy for load intents.
pub fn intent_strategy() -> impl Strategy<Value = LoadIntent> {
    prop_oneof![
        Just(LoadIntent::Initial),
        Just(LoadIntent::More),
        Just(LoadIntent::Replace),
        Just(LoadIntent::ClearAndReplace),
        Just(LoadIntent::NewRows),
    ]
}

/// Strategy for CRUD events over the shared identity pool.
pub fn crud_event_strategy() -> impl Strategy<Value = CrudEvent<Record>> {
    prop_oneof![
        record_strategy().prop_map(CrudEvent::Create),
        record_strategy().prop_map(CrudEvent::Update),
        record_strategy().prop_map(CrudEvent::Delete),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    proptest! {
        #[test]
        fn unique_rows_are_unique(rows in unique_rows_strategy(20)) {
            let ids: HashSet<_> = rows.iter().map(|r| r.id.clone()).collect();
            prop_assert_eq!(ids.len(), rows.len());
        }
    }
}
