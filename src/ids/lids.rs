//! The lids property: bidirectional unique-id ↔ local-id mapping.
//!
//! [`ItemLidsProperty`] is the allocator every other property of a family
//! hangs off: appending unique ids hands out dense local ids, removal
//! releases them onto a free list for O(1) reuse. The reverse mapping is an
//! arena (a dense array indexed by lid), never a hash map keyed by lid.

use hashbrown::HashMap;
use itertools::Itertools;

use crate::debug_invariants::DebugInvariants;
use crate::ids::range::{ItemRange, LocalIdSet};
use crate::ids::{LocalId, NULL_LOCAL_ID, NULL_UNIQUE_ID, UniqueId};
use crate::mesh_error::MeshPropsError;

/// Recyclable local-id table of one family.
#[derive(Clone, Debug, Default)]
pub struct ItemLidsProperty {
    name: String,
    uid_to_lid: HashMap<UniqueId, LocalId>,
    /// Reverse arena indexed by lid; holes carry [`NULL_UNIQUE_ID`].
    lid_to_uid: Vec<UniqueId>,
    /// Released lids, reused LIFO before fresh integers are handed out.
    free_lids: Vec<LocalId>,
}

impl ItemLidsProperty {
    /// Create an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Property name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of live items.
    #[inline]
    pub fn len(&self) -> usize {
        self.uid_to_lid.len()
    }

    /// Whether no item is live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.uid_to_lid.is_empty()
    }

    /// Map unique ids to local ids, allocating where needed.
    ///
    /// A uid already mapped keeps its existing lid (idempotent, no
    /// reassignment). Unmapped uids take a lid from the free list when one is
    /// available, else the next unused integer. The returned range carries
    /// the per-uid resulting lids in input order, position for position —
    /// duplicates within the call resolve to the same lid at distinct
    /// positions.
    pub fn append(&mut self, uids: &[UniqueId]) -> ItemRange {
        let mut lids = Vec::with_capacity(uids.len());
        for &uid in uids {
            let lid = match self.uid_to_lid.entry(uid) {
                hashbrown::hash_map::Entry::Occupied(entry) => *entry.get(),
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    let lid = match self.free_lids.pop() {
                        Some(recycled) => {
                            self.lid_to_uid[recycled as usize] = uid;
                            recycled
                        }
                        None => {
                            let fresh = self.lid_to_uid.len() as LocalId;
                            self.lid_to_uid.push(uid);
                            fresh
                        }
                    };
                    entry.insert(lid);
                    lid
                }
            };
            lids.push(lid);
        }
        self.debug_assert_invariants();
        range_from_ordered_lids(lids)
    }

    /// Release the lids of the given unique ids onto the free list.
    ///
    /// Returns the removed lids in input order.
    ///
    /// # Errors
    /// [`MeshPropsError::UnknownUniqueId`] when a uid has no live mapping; the
    /// uids preceding it in the call have already been released (the error
    /// aborts the update mid-way, like any failing algorithm).
    pub fn remove(&mut self, uids: &[UniqueId]) -> Result<Vec<LocalId>, MeshPropsError> {
        let mut removed = Vec::with_capacity(uids.len());
        for &uid in uids {
            let lid = self
                .uid_to_lid
                .remove(&uid)
                .ok_or(MeshPropsError::UnknownUniqueId(uid))?;
            self.lid_to_uid[lid as usize] = NULL_UNIQUE_ID;
            self.free_lids.push(lid);
            removed.push(lid);
        }
        self.debug_assert_invariants();
        Ok(removed)
    }

    /// Range over all currently live lids.
    ///
    /// The order is ascending by lid, which is **not** stable across
    /// recycling — callers needing a canonical order must sort by uid.
    pub fn values(&self) -> ItemRange {
        let live = self
            .lid_to_uid
            .iter()
            .enumerate()
            .filter(|(_, uid)| **uid != NULL_UNIQUE_ID)
            .map(|(lid, _)| lid as LocalId)
            .collect();
        range_from_ordered_lids(live)
    }

    /// Pure lookup: local ids in input order, [`NULL_LOCAL_ID`] for uids
    /// without a live mapping.
    pub fn lids(&self, uids: &[UniqueId]) -> Vec<LocalId> {
        uids.iter()
            .map(|uid| self.uid_to_lid.get(uid).copied().unwrap_or(NULL_LOCAL_ID))
            .collect()
    }

    /// Output-parameter variant of [`lids`](Self::lids).
    pub fn lids_into(&self, uids: &[UniqueId], out: &mut Vec<LocalId>) {
        out.clear();
        out.extend(
            uids.iter()
                .map(|uid| self.uid_to_lid.get(uid).copied().unwrap_or(NULL_LOCAL_ID)),
        );
    }

    /// Route the dump through the `log` facade.
    pub fn debug_print(&self) {
        log::debug!("{self}");
    }
}

/// Snapshot an input-order lid list, storing a single ascending run
/// compactly.
fn range_from_ordered_lids(lids: Vec<LocalId>) -> ItemRange {
    let is_run = !lids.is_empty() && lids.windows(2).all(|pair| pair[1] == pair[0] + 1);
    let ids = if is_run {
        LocalIdSet::contiguous(lids[0], lids.len())
    } else {
        LocalIdSet::from_ids(lids)
    };
    ItemRange::new(ids)
}

impl std::fmt::Display for ItemLidsProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pairs = self
            .lid_to_uid
            .iter()
            .enumerate()
            .filter(|(_, uid)| **uid != NULL_UNIQUE_ID)
            .map(|(lid, uid)| format!("{uid}:{lid}"))
            .join(" ");
        write!(f, "ItemLidsProperty `{}` uid:lid [{}]", self.name, pairs)
    }
}

impl DebugInvariants for ItemLidsProperty {
    fn debug_assert_invariants(&self) {
        crate::props_debug_assert_ok!(self.validate_invariants(), "ItemLidsProperty invalid");
    }

    fn validate_invariants(&self) -> Result<(), MeshPropsError> {
        let violation = |detail: String| MeshPropsError::InvariantViolation {
            name: self.name.clone(),
            detail,
        };
        // forward and reverse mappings agree
        for (&uid, &lid) in &self.uid_to_lid {
            match self.lid_to_uid.get(lid as usize) {
                Some(&reverse) if reverse == uid => {}
                Some(&reverse) => {
                    return Err(violation(format!(
                        "lid {lid} maps back to uid {reverse}, expected {uid}"
                    )));
                }
                None => {
                    return Err(violation(format!("lid {lid} outside the reverse arena")));
                }
            }
        }
        // every arena hole is on the free list, exactly once
        let holes = self
            .lid_to_uid
            .iter()
            .enumerate()
            .filter(|(_, uid)| **uid == NULL_UNIQUE_ID)
            .count();
        if holes != self.free_lids.len() {
            return Err(violation(format!(
                "{holes} arena holes but {} free lids",
                self.free_lids.len()
            )));
        }
        if self.free_lids.iter().duplicates().next().is_some() {
            return Err(violation("duplicate lid on the free list".into()));
        }
        for &lid in &self.free_lids {
            if self.lid_to_uid.get(lid as usize) != Some(&NULL_UNIQUE_ID) {
                return Err(violation(format!("free lid {lid} is not an arena hole")));
            }
        }
        // live count is consistent
        if self.uid_to_lid.len() + holes != self.lid_to_uid.len() {
            return Err(violation("live count + holes != arena length".into()));
        }
        Ok(())
    }
}
