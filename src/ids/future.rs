//! Deferred item ranges.
//!
//! A [`FutureItemRange`] lets a consumer be wired to a producer before the
//! producer has run: the producing algorithm assigns into a shared slot
//! during a scheduling round, and the consumer can only read the slot once
//! the round's [`MeshUpdated`] token exists. This is deferred evaluation,
//! not concurrency — the handles are deliberately single-threaded
//! (`Rc<RefCell<..>>`) and nothing ever blocks.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::ids::LocalId;
use crate::ids::range::{ItemRange, LocalIdSet};
use crate::mesh_error::MeshPropsError;

/// Capability proving a scheduling round has finished.
///
/// Only [`crate::graph::AlgorithmGraph`] constructs one, when a round of
/// algorithms has run to completion. Requiring it at
/// [`FutureItemRange::try_get`] makes reading a future before its producer
/// executed a compile-time error rather than a runtime race.
#[derive(Debug)]
pub struct MeshUpdated(pub(crate) ());

#[derive(Debug, Default)]
struct FutureState {
    new_items: ItemRange,
    consumed: bool,
}

/// Placeholder for an [`ItemRange`] produced by a not-yet-run algorithm.
///
/// Cloning yields another handle on the same slot, so a producing algorithm
/// can capture one clone and [`assign`](Self::assign) into it while the
/// scheduling caller keeps the other for readback. Consumption through
/// [`try_get`](Self::try_get) is one-shot per underlying slot: a second call
/// fails, modeling single-reader semantics that prevent stale reads after a
/// mesh-update barrier.
#[derive(Clone, Debug, Default)]
pub struct FutureItemRange {
    state: Rc<RefCell<FutureState>>,
}

impl FutureItemRange {
    /// Create an empty, unresolved future.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the internal slot (producer side).
    ///
    /// Assigning twice is allowed before consumption; the last assignment
    /// wins.
    pub fn assign(&self, items: ItemRange) {
        self.state.borrow_mut().new_items = items;
    }

    /// Snapshot of the current slot contents, without consuming.
    ///
    /// Algorithms scheduled after the producer inside the same round use this
    /// to read the range the producer filled.
    pub fn peek(&self) -> ItemRange {
        self.state.borrow().new_items.clone()
    }

    /// Consume the resolved range.
    ///
    /// # Errors
    /// [`MeshPropsError::FutureAlreadyConsumed`] on a second call against the
    /// same slot.
    pub fn try_get(&self, _proof: &MeshUpdated) -> Result<ItemRange, MeshPropsError> {
        let mut state = self.state.borrow_mut();
        if state.consumed {
            return Err(MeshPropsError::FutureAlreadyConsumed);
        }
        state.consumed = true;
        Ok(state.new_items.clone())
    }
}

#[derive(Clone, Debug)]
enum RangeFilter {
    /// Positions into the base range.
    ByIndices(Vec<usize>),
    /// Ordered subset of values drawn from a known superset parallel to the
    /// base range.
    ByValues {
        superset: Vec<LocalId>,
        subset: Vec<LocalId>,
    },
}

/// A future derived from a [`FutureItemRange`] through a filter.
///
/// Resolution projects the base slot through the filter; it does not consume
/// the base, and each derived instance enforces its own one-shot consumption.
#[derive(Clone, Debug)]
pub struct FilteredItemRange {
    base: FutureItemRange,
    filter: RangeFilter,
    consumed: Cell<bool>,
}

impl FilteredItemRange {
    /// Derive a future selecting the base lids at the given positions.
    ///
    /// On resolution the result is `[base[i0], base[i1], ...]` for the filter
    /// `[i0, i1, ...]`.
    pub fn by_indices(base: &FutureItemRange, indices: Vec<usize>) -> Self {
        Self {
            base: base.clone(),
            filter: RangeFilter::ByIndices(indices),
            consumed: Cell::new(false),
        }
    }

    /// Derive a future selecting the base lids whose parallel value in
    /// `superset` appears in `subset`, preserving `subset`'s order.
    pub fn by_values(
        base: &FutureItemRange,
        superset: Vec<LocalId>,
        subset: Vec<LocalId>,
    ) -> Self {
        Self {
            base: base.clone(),
            filter: RangeFilter::ByValues { superset, subset },
            consumed: Cell::new(false),
        }
    }

    /// Resolve and consume the filtered range.
    ///
    /// # Errors
    /// [`MeshPropsError::FutureAlreadyConsumed`] on a second call against this
    /// instance.
    pub fn try_get(&self, _proof: &MeshUpdated) -> Result<ItemRange, MeshPropsError> {
        if self.consumed.get() {
            return Err(MeshPropsError::FutureAlreadyConsumed);
        }
        self.consumed.set(true);
        let base_lids = self.base.peek().local_ids();
        let filtered = match &self.filter {
            RangeFilter::ByIndices(indices) => {
                indices.iter().map(|&i| base_lids[i]).collect::<Vec<_>>()
            }
            RangeFilter::ByValues { superset, subset } => subset
                .iter()
                .filter_map(|value| {
                    superset
                        .iter()
                        .position(|candidate| candidate == value)
                        .map(|pos| base_lids[pos])
                })
                .collect(),
        };
        Ok(ItemRange::new(LocalIdSet::from_ids(filtered)))
    }
}
