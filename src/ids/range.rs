//! Immutable local-id snapshots: [`LocalIdSet`] and [`ItemRange`].
//!
//! A `LocalIdSet` concatenates an explicit list of non-contiguous lids with a
//! contiguous run `[first, first+count)`. It is the storage format every
//! range-addressed property operation consumes: compact when items were
//! allocated densely, still exact when recycling has punched holes.

use serde::{Deserialize, Serialize};

use crate::ids::{LocalId, NULL_LOCAL_ID};

/// Ordered set of local ids: explicit entries first, then a contiguous run.
///
/// # Invariants
///
/// - `len()` equals `explicit.len() + contiguous_count`.
/// - Iteration yields every lid exactly once, explicit entries in their given
///   order followed by the ascending contiguous run.
///
/// Construction is the sole way to build a set; it is immutable once built.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalIdSet {
    explicit_ids: Vec<LocalId>,
    first_contiguous: LocalId,
    contiguous_count: usize,
}

impl LocalIdSet {
    /// Build from an explicit lid list plus a contiguous run.
    pub fn new(explicit_ids: Vec<LocalId>, first_contiguous: LocalId, contiguous_count: usize) -> Self {
        Self {
            explicit_ids,
            first_contiguous,
            contiguous_count,
        }
    }

    /// Build from a bare list (no contiguous part).
    pub fn from_ids(explicit_ids: Vec<LocalId>) -> Self {
        Self::new(explicit_ids, 0, 0)
    }

    /// Build a purely contiguous run `[first, first+count)`.
    pub fn contiguous(first: LocalId, count: usize) -> Self {
        Self::new(Vec::new(), first, count)
    }

    /// Number of lids in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.explicit_ids.len() + self.contiguous_count
    }

    /// Whether the set holds no lid at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Explicit (non-contiguous) part of the set.
    #[inline]
    pub fn explicit_ids(&self) -> &[LocalId] {
        &self.explicit_ids
    }

    /// First lid of the contiguous run.
    #[inline]
    pub fn first_contiguous(&self) -> LocalId {
        self.first_contiguous
    }

    /// Length of the contiguous run.
    #[inline]
    pub fn contiguous_count(&self) -> usize {
        self.contiguous_count
    }

    /// Whether the set is a single run starting at lid 0.
    ///
    /// Ranges of this shape allow properties to take initial values without
    /// scattering.
    #[inline]
    pub fn is_dense_from_zero(&self) -> bool {
        self.explicit_ids.is_empty() && self.first_contiguous == 0
    }

    /// Largest lid present, `None` when both parts are empty.
    pub fn max_local_id(&self) -> Option<LocalId> {
        let explicit_max = self.explicit_ids.iter().copied().max();
        let contiguous_max = (self.contiguous_count > 0)
            .then(|| self.first_contiguous + (self.contiguous_count - 1) as LocalId);
        explicit_max.max(contiguous_max)
    }

    /// The `index`-th lid in concatenation order.
    ///
    /// Asserts in debug builds when `index` is out of range; release builds
    /// return [`NULL_LOCAL_ID`]. (The bounds check is always performed — this
    /// deliberately tightens the original release-mode contract from
    /// "unspecified value" to the null sentinel.)
    pub fn at(&self, index: usize) -> LocalId {
        debug_assert!(
            index < self.len(),
            "lid index {index} out of range (size {})",
            self.len()
        );
        if index < self.explicit_ids.len() {
            return self.explicit_ids[index];
        }
        let offset = index - self.explicit_ids.len();
        if offset < self.contiguous_count {
            self.first_contiguous + offset as LocalId
        } else {
            NULL_LOCAL_ID
        }
    }

    /// Iterate every lid in concatenation order.
    #[inline]
    pub fn iter(&self) -> LocalIdIter<'_> {
        LocalIdIter { ids: self, cursor: 0 }
    }
}

/// Iterator over a [`LocalIdSet`] in concatenation order.
#[derive(Clone, Debug)]
pub struct LocalIdIter<'a> {
    ids: &'a LocalIdSet,
    cursor: usize,
}

impl Iterator for LocalIdIter<'_> {
    type Item = LocalId;

    fn next(&mut self) -> Option<LocalId> {
        if self.cursor >= self.ids.len() {
            return None;
        }
        let lid = self.ids.at(self.cursor);
        self.cursor += 1;
        Some(lid)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.ids.len() - self.cursor;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for LocalIdIter<'_> {}

impl<'a> IntoIterator for &'a LocalIdSet {
    type Item = LocalId;
    type IntoIter = LocalIdIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Immutable snapshot of a set of local ids.
///
/// An `ItemRange` owns one [`LocalIdSet`]; it does not own any property
/// storage and is cheap to clone. Ranges are how every bulk property
/// operation (`init`, `append`, views, gathers) addresses its items.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRange {
    ids: LocalIdSet,
}

impl ItemRange {
    /// Wrap a [`LocalIdSet`] snapshot.
    pub fn new(ids: LocalIdSet) -> Self {
        Self { ids }
    }

    /// Underlying id set.
    #[inline]
    pub fn ids(&self) -> &LocalIdSet {
        &self.ids
    }

    /// Number of items in the range.
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the range addresses no item.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Largest lid present, `None` when the range is empty.
    #[inline]
    pub fn max_local_id(&self) -> Option<LocalId> {
        self.ids.max_local_id()
    }

    /// The `index`-th lid in storage order; see [`LocalIdSet::at`].
    #[inline]
    pub fn at(&self, index: usize) -> LocalId {
        self.ids.at(index)
    }

    /// Iterate lids in storage order (explicit entries, then the run).
    #[inline]
    pub fn iter(&self) -> LocalIdIter<'_> {
        self.ids.iter()
    }

    /// Materialized lid list in iteration order.
    pub fn local_ids(&self) -> Vec<LocalId> {
        self.iter().collect()
    }
}

impl From<LocalIdSet> for ItemRange {
    fn from(ids: LocalIdSet) -> Self {
        Self::new(ids)
    }
}

impl<'a> IntoIterator for &'a ItemRange {
    type Item = LocalId;
    type IntoIter = LocalIdIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

impl std::fmt::Display for ItemRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use itertools::Itertools;
        write!(f, "ItemRange [{}]", self.iter().map(|lid| lid.to_string()).join(" "))
    }
}
