//! Property-based round-trip law for the lid table: whatever the
//! append/remove sequence, `values()` agrees with the live item count and
//! the live lids are exactly those of the never-removed uids.

use proptest::prelude::*;
use std::collections::HashSet;

use mesh_props::DebugInvariants;
use mesh_props::ids::lids::ItemLidsProperty;
use mesh_props::ids::{NULL_LOCAL_ID, UniqueId};

#[derive(Clone, Debug)]
enum Op {
    Append(Vec<UniqueId>),
    Remove(Vec<UniqueId>),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        prop::collection::vec(0u64..32, 1..8).prop_map(Op::Append),
        prop::collection::vec(0u64..32, 1..8).prop_map(Op::Remove),
    ]
}

proptest! {
    #[test]
    fn values_track_live_items(ops in prop::collection::vec(op_strategy(), 1..32)) {
        let mut table = ItemLidsProperty::new("proptest_lids");
        let mut live: HashSet<UniqueId> = HashSet::new();

        for op in ops {
            match op {
                Op::Append(uids) => {
                    let range = table.append(&uids);
                    prop_assert_eq!(range.len(), uids.len());
                    live.extend(uids);
                }
                Op::Remove(uids) => {
                    // only remove currently-live uids, each at most once
                    let mut to_remove = Vec::new();
                    for uid in uids {
                        if live.remove(&uid) {
                            to_remove.push(uid);
                        }
                    }
                    let removed = table.remove(&to_remove).unwrap();
                    prop_assert_eq!(removed.len(), to_remove.len());
                }
            }

            // round-trip law, after every operation
            prop_assert_eq!(table.len(), live.len());
            prop_assert_eq!(table.values().len(), table.len());
            let live_uids: Vec<UniqueId> = live.iter().copied().collect();
            let mut mapped = table.lids(&live_uids);
            prop_assert!(!mapped.contains(&NULL_LOCAL_ID));
            let mut from_values = table.values().local_ids();
            mapped.sort_unstable();
            from_values.sort_unstable();
            prop_assert_eq!(mapped, from_values);
            table.validate_invariants().unwrap();
        }
    }

    #[test]
    fn append_is_stable_for_mapped_uids(uids in prop::collection::vec(0u64..16, 1..12)) {
        let mut table = ItemLidsProperty::new("proptest_lids");
        let first = table.append(&uids).local_ids();
        // re-appending the same uids returns the same lids
        let second = table.append(&uids).local_ids();
        prop_assert_eq!(first, second);
    }
}
