//! Per-item ragged-array property storage.
//!
//! A [`MeshArrayProperty`] stores a variable-length array per item in one
//! flat backing store, with a parallel sizes table and its exclusive prefix
//! sum. Appends may both add items and re-specify an existing item's element
//! count; the flat store is then rebuilt in lid order with untouched items
//! preserved verbatim.

use std::ops::{Index, IndexMut};

use itertools::Itertools;

use crate::debug_invariants::DebugInvariants;
use crate::ids::LocalId;
use crate::ids::range::ItemRange;
use crate::mesh_error::MeshPropsError;

/// Per-item ragged-array storage, indexed by local id.
#[derive(Clone, Debug, Default)]
pub struct MeshArrayProperty<T> {
    name: String,
    /// Element count of each item's array.
    sizes: Vec<usize>,
    /// Exclusive prefix sum of `sizes`.
    offsets: Vec<usize>,
    data: Vec<T>,
}

impl<T: Clone + Default> MeshArrayProperty<T> {
    /// Create an empty property.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sizes: Vec::new(),
            offsets: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Property name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of items.
    #[inline]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Whether the property holds no item.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Sum of all item sizes.
    pub fn cumulated_size(&self) -> usize {
        self.sizes.iter().sum()
    }

    /// Per-item element counts.
    #[inline]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Per-item starting offsets into the flat store.
    #[inline]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// True exactly when the property is empty, whatever `range` holds.
    #[inline]
    pub fn is_initializable_from(&self, _range: &ItemRange) -> bool {
        self.data.is_empty()
    }

    /// (Re)establish the sizes/offsets table, to be followed by
    /// [`try_init`](Self::try_init).
    pub fn resize(&mut self, sizes: Vec<usize>) {
        self.sizes = sizes;
        self.rebuild_offsets();
    }

    /// [`resize`](Self::resize) and allocate the flat store to the cumulated
    /// size, default-filled, for callers writing item slices directly.
    pub fn resize_and_fill(&mut self, sizes: Vec<usize>) {
        self.resize(sizes);
        self.data = vec![T::default(); self.cumulated_size()];
        self.debug_assert_invariants();
    }

    /// Distribute `flat_values` into the item slices declared by a prior
    /// [`resize`](Self::resize), following `range`'s iteration order.
    ///
    /// Range entries beyond the sizes table are skipped; surplus values are
    /// ignored.
    ///
    /// # Errors
    /// - [`MeshPropsError::ResizeBeforeInit`] without a prior `resize`.
    /// - [`MeshPropsError::PropertyAlreadyInitialized`] when values are
    ///   already stored ([`clear`](Self::clear) re-arms).
    /// - [`MeshPropsError::ValueCountMismatch`] when `flat_values` runs dry
    ///   before the addressed items are served.
    pub fn try_init(&mut self, range: &ItemRange, flat_values: Vec<T>) -> Result<(), MeshPropsError> {
        if self.sizes.is_empty() {
            return Err(MeshPropsError::ResizeBeforeInit(self.name.clone()));
        }
        if !self.data.is_empty() {
            return Err(MeshPropsError::PropertyAlreadyInitialized(self.name.clone()));
        }
        self.data = vec![T::default(); self.cumulated_size()];
        let mut cursor = 0usize;
        for lid in range.iter() {
            let item = lid as usize;
            let Some(&size) = self.sizes.get(item) else {
                continue;
            };
            if cursor + size > flat_values.len() {
                self.data.clear();
                return Err(MeshPropsError::ValueCountMismatch {
                    name: self.name.clone(),
                    expected: cursor + size,
                    found: flat_values.len(),
                });
            }
            let offset = self.offsets[item];
            self.data[offset..offset + size].clone_from_slice(&flat_values[cursor..cursor + size]);
            cursor += size;
        }
        self.debug_assert_invariants();
        Ok(())
    }

    /// Write item arrays for the items of `range`, resizing them as declared.
    ///
    /// `sizes_per_item[i]` is the new element count of item `range.at(i)`;
    /// `values` holds the concatenated arrays in range iteration order. New
    /// items extend the sizes table (intermediate never-written items get
    /// size 0); an existing item re-specified to a different size has its
    /// slice rewritten in place by lid order, shifting every later item while
    /// preserving their values verbatim.
    pub fn append(&mut self, range: &ItemRange, values: &[T], sizes_per_item: &[usize]) {
        debug_assert_eq!(
            range.len(),
            sizes_per_item.len(),
            "one size per item of the range"
        );
        debug_assert_eq!(
            values.len(),
            sizes_per_item.iter().sum::<usize>(),
            "values must concatenate exactly the declared item arrays"
        );
        let old_len = self.sizes.len();
        let new_len = range
            .max_local_id()
            .map_or(old_len, |max| old_len.max(max as usize + 1));

        // slice of `values` each touched item receives
        let mut incoming: Vec<Option<(usize, usize)>> = vec![None; new_len];
        let mut cursor = 0usize;
        for (lid, &size) in range.iter().zip(sizes_per_item) {
            incoming[lid as usize] = Some((cursor, size));
            cursor += size;
        }

        let mut new_sizes = self.sizes.clone();
        new_sizes.resize(new_len, 0);
        for (item, slot) in incoming.iter().enumerate() {
            if let Some(&(_, size)) = slot.as_ref() {
                new_sizes[item] = size;
            }
        }

        let mut new_data = Vec::with_capacity(new_sizes.iter().sum());
        for (item, slot) in incoming.iter().enumerate() {
            match slot.as_ref() {
                Some(&(start, size)) => new_data.extend_from_slice(&values[start..start + size]),
                None if item < old_len => {
                    let offset = self.offsets[item];
                    new_data.extend_from_slice(&self.data[offset..offset + self.sizes[item]]);
                }
                None => {}
            }
        }

        self.sizes = new_sizes;
        self.data = new_data;
        self.rebuild_offsets();
        self.debug_assert_invariants();
    }

    /// Flat storage in lid order.
    #[inline]
    pub fn values(&self) -> &[T] {
        &self.data
    }

    /// Iterate the flat storage in lid order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Iterate item slices in lid order.
    pub fn iter_items(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.offsets
            .iter()
            .zip(&self.sizes)
            .map(|(&offset, &size)| &self.data[offset..offset + size])
    }

    /// Reset to empty; `resize` + `init` may follow.
    pub fn clear(&mut self) {
        self.sizes.clear();
        self.offsets.clear();
        self.data.clear();
    }

    /// Read-only per-item view over the items of `range` (positional
    /// indexing `0..range.len()`).
    pub fn range_view(&self, range: &ItemRange) -> MeshArrayPropertyConstView<'_, T> {
        MeshArrayPropertyConstView {
            lids: range.local_ids(),
            prop: self,
        }
    }

    /// Mutable per-item view over the items of `range`.
    pub fn range_view_mut(&mut self, range: &ItemRange) -> MeshArrayPropertyView<'_, T> {
        MeshArrayPropertyView {
            lids: range.local_ids(),
            prop: self,
        }
    }

    /// Route the dump through the `log` facade.
    pub fn debug_print(&self)
    where
        T: std::fmt::Debug,
    {
        log::debug!("{self}");
    }

    fn rebuild_offsets(&mut self) {
        self.offsets.clear();
        self.offsets.reserve(self.sizes.len());
        let mut offset = 0usize;
        for &size in &self.sizes {
            self.offsets.push(offset);
            offset += size;
        }
    }
}

impl<T> Index<LocalId> for MeshArrayProperty<T> {
    type Output = [T];

    fn index(&self, lid: LocalId) -> &[T] {
        let item = lid as usize;
        assert!(
            item < self.sizes.len(),
            "item local id {lid} must be < item count {}",
            self.sizes.len()
        );
        let offset = self.offsets[item];
        &self.data[offset..offset + self.sizes[item]]
    }
}

impl<T> IndexMut<LocalId> for MeshArrayProperty<T> {
    fn index_mut(&mut self, lid: LocalId) -> &mut [T] {
        let item = lid as usize;
        assert!(
            item < self.sizes.len(),
            "item local id {lid} must be < item count {}",
            self.sizes.len()
        );
        let offset = self.offsets[item];
        &mut self.data[offset..offset + self.sizes[item]]
    }
}

impl<T: std::fmt::Debug> std::fmt::Display for MeshArrayProperty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let items = self
            .offsets
            .iter()
            .zip(&self.sizes)
            .map(|(&offset, &size)| {
                let slice = &self.data[offset..offset + size];
                format!("[{}]", slice.iter().map(|v| format!("{v:?}")).join(" "))
            })
            .join(" ");
        write!(f, "MeshArrayProperty `{}` {items}", self.name)
    }
}

impl<T> DebugInvariants for MeshArrayProperty<T> {
    fn debug_assert_invariants(&self) {
        crate::props_debug_assert_ok!(self.validate_invariants(), "MeshArrayProperty invalid");
    }

    fn validate_invariants(&self) -> Result<(), MeshPropsError> {
        let violation = |detail: String| MeshPropsError::InvariantViolation {
            name: self.name.clone(),
            detail,
        };
        if self.offsets.len() != self.sizes.len() {
            return Err(violation(format!(
                "{} offsets for {} sizes",
                self.offsets.len(),
                self.sizes.len()
            )));
        }
        let mut expected = 0usize;
        for (item, (&offset, &size)) in self.offsets.iter().zip(&self.sizes).enumerate() {
            if offset != expected {
                return Err(violation(format!(
                    "item {item} offset {offset}, expected {expected}"
                )));
            }
            expected += size;
        }
        // the flat store is either unallocated (declared sizes only) or full
        if !self.data.is_empty() && self.data.len() != expected {
            return Err(violation(format!(
                "flat store holds {} values for a cumulated size of {expected}",
                self.data.len()
            )));
        }
        Ok(())
    }
}

/// Read-only per-item view over a subset of items.
#[derive(Clone, Debug)]
pub struct MeshArrayPropertyConstView<'a, T> {
    lids: Vec<LocalId>,
    prop: &'a MeshArrayProperty<T>,
}

impl<'a, T> MeshArrayPropertyConstView<'a, T> {
    /// Number of viewed items.
    #[inline]
    pub fn len(&self) -> usize {
        self.lids.len()
    }

    /// Whether the view addresses nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lids.is_empty()
    }

    /// Iterate the viewed item slices.
    pub fn iter(&self) -> impl Iterator<Item = &'a [T]> + '_ {
        self.lids.iter().map(|&lid| {
            let item = lid as usize;
            let offset = self.prop.offsets[item];
            &self.prop.data[offset..offset + self.prop.sizes[item]]
        })
    }
}

impl<T> Index<usize> for MeshArrayPropertyConstView<'_, T> {
    type Output = [T];

    fn index(&self, index: usize) -> &[T] {
        assert!(
            index < self.lids.len(),
            "index {index} exceeds property view size {}",
            self.lids.len()
        );
        &self.prop[self.lids[index]]
    }
}

/// Mutable per-item view over a subset of items.
#[derive(Debug)]
pub struct MeshArrayPropertyView<'a, T> {
    lids: Vec<LocalId>,
    prop: &'a mut MeshArrayProperty<T>,
}

impl<T> MeshArrayPropertyView<'_, T> {
    /// Number of viewed items.
    #[inline]
    pub fn len(&self) -> usize {
        self.lids.len()
    }

    /// Whether the view addresses nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lids.is_empty()
    }

    /// Item slice at view position `index`.
    pub fn item(&self, index: usize) -> &[T] {
        assert!(
            index < self.lids.len(),
            "index {index} exceeds property view size {}",
            self.lids.len()
        );
        &self.prop[self.lids[index]]
    }

    /// Mutable item slice at view position `index`.
    pub fn item_mut(&mut self, index: usize) -> &mut [T] {
        assert!(
            index < self.lids.len(),
            "index {index} exceeds property view size {}",
            self.lids.len()
        );
        &mut self.prop[self.lids[index]]
    }
}

/// Raw access to a [`MeshArrayProperty`] for bulk external consumers.
///
/// Exposes the flat data, the per-item sizes, and the per-item starting
/// offsets as plain slices, bypassing per-item indexing — the shape
/// collective synchronization layers consume.
#[derive(Clone, Copy, Debug)]
pub struct MeshArrayPropertyProxy<'a, T> {
    data: &'a [T],
    sizes: &'a [usize],
    offsets: &'a [usize],
}

impl<'a, T> MeshArrayPropertyProxy<'a, T> {
    /// Borrow the raw parts of `prop`.
    pub fn new(prop: &'a MeshArrayProperty<T>) -> Self {
        Self {
            data: &prop.data,
            sizes: &prop.sizes,
            offsets: &prop.offsets,
        }
    }

    /// Flat value buffer.
    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    /// Length of the flat value buffer.
    #[inline]
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// Per-item element counts.
    #[inline]
    pub fn item_sizes(&self) -> &'a [usize] {
        self.sizes
    }

    /// Per-item starting offsets into [`data`](Self::data).
    #[inline]
    pub fn item_offsets(&self) -> &'a [usize] {
        self.offsets
    }

    /// Number of items.
    #[inline]
    pub fn nb_items(&self) -> usize {
        self.sizes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::range::LocalIdSet;

    fn range(explicit: Vec<LocalId>, first: LocalId, count: usize) -> ItemRange {
        ItemRange::new(LocalIdSet::new(explicit, first, count))
    }

    fn gather_items(prop: &MeshArrayProperty<i32>, items: &ItemRange) -> Vec<i32> {
        items
            .iter()
            .flat_map(|lid| prop[lid].iter().copied().collect::<Vec<_>>())
            .collect()
    }

    #[test]
    fn resize_declares_sizes() {
        let mut prop = MeshArrayProperty::<i32>::new("cell2nodes");
        prop.resize_and_fill(vec![1, 2, 3]);
        assert_eq!(prop.sizes(), &[1, 2, 3]);
        assert_eq!(prop.len(), 3);
        assert_eq!(prop.cumulated_size(), 6);
        prop.clear();
        assert_eq!(prop.len(), 0);
    }

    #[test]
    fn init_requires_resize() {
        let mut prop = MeshArrayProperty::<i32>::new("cell2nodes");
        let items = range(vec![], 0, 5);
        assert!(matches!(
            prop.try_init(&items, vec![0, 1, 2, 3, 4]),
            Err(MeshPropsError::ResizeBeforeInit(_))
        ));
        prop.resize(vec![1, 1, 1, 1, 1]);
        prop.try_init(&items, vec![0, 1, 2, 3, 4]).unwrap();
        assert_eq!(prop.len(), 5);
        assert_eq!(prop.cumulated_size(), 5);
        assert_eq!(prop.values(), &[0, 1, 2, 3, 4]);
        for lid in items.iter() {
            assert_eq!(prop[lid], [lid as i32]);
        }
    }

    #[test]
    fn append_new_items_then_rewrite_existing() {
        let mut prop = MeshArrayProperty::<i32>::new("cell2nodes");
        prop.resize(vec![1, 1, 1, 1, 1]);
        prop.try_init(&range(vec![], 0, 5), vec![0, 1, 2, 3, 4])
            .unwrap();
        // add 3 items, one of them empty
        let added = range(vec![5, 6, 7], 0, 0);
        prop.append(&added, &[6, 6, 6, 7], &[0, 3, 1]);
        assert_eq!(prop.len(), 8);
        assert_eq!(prop.cumulated_size(), 9);
        assert_eq!(prop.values(), &[0, 1, 2, 3, 4, 6, 6, 6, 7]);
        assert_eq!(gather_items(&prop, &added), vec![6, 6, 6, 7]);
        // three more, contiguous
        let added = range(vec![], 8, 3);
        prop.append(&added, &[8, 8, 8, 9], &[0, 3, 1]);
        assert_eq!(prop.values(), &[0, 1, 2, 3, 4, 6, 6, 6, 7, 8, 8, 8, 9]);
        // rewrite existing items 0, 8, 5 and add lid 11 in one call
        let touched = range(vec![0, 8, 5], 11, 1);
        prop.append(&touched, &[10, 10, 10, 11, 11, 11, 12, 12, 13], &[3, 3, 2, 1]);
        assert_eq!(prop.cumulated_size(), 21);
        assert_eq!(
            prop.values(),
            &[10, 10, 10, 1, 2, 3, 4, 12, 12, 6, 6, 6, 7, 11, 11, 11, 8, 8, 8, 9, 13]
        );
        assert_eq!(
            gather_items(&prop, &touched),
            vec![10, 10, 10, 11, 11, 11, 12, 12, 13]
        );
        prop.validate_invariants().unwrap();
    }

    #[test]
    fn append_into_empty_property_contiguous() {
        let mut prop = MeshArrayProperty::<i32>::new("p2");
        // non-0-starting contiguous range: lids 0..3 stay empty
        let items = range(vec![], 3, 4);
        prop.append(&items, &[3, 4, 4, 5, 6, 6], &[1, 2, 1, 2]);
        assert_eq!(gather_items(&prop, &items), vec![3, 4, 4, 5, 6, 6]);
        // fill the first items
        let items = range(vec![], 0, 2);
        prop.append(&items, &[0, 1, 1], &[1, 2]);
        assert_eq!(gather_items(&prop, &items), vec![0, 1, 1]);
        // whole-range readback interleaves correctly
        let all = range(vec![], 0, 7);
        assert_eq!(gather_items(&prop, &all), vec![0, 1, 1, 3, 4, 4, 5, 6, 6]);
        // insertion past the last element
        let items = range(vec![], 8, 3);
        prop.append(&items, &[8, 9, 9, 10], &[1, 2, 1]);
        assert_eq!(gather_items(&prop, &items), vec![8, 9, 9, 10]);
    }

    #[test]
    fn append_into_empty_property_discontiguous() {
        let mut prop = MeshArrayProperty::<i32>::new("p3");
        let items = range(vec![3, 5, 6], 0, 0);
        prop.append(&items, &[3, 3, 5, 6, 6], &[2, 1, 2]);
        assert_eq!(gather_items(&prop, &items), vec![3, 3, 5, 6, 6]);
        let items = range(vec![0, 2], 0, 0);
        prop.append(&items, &[0, 2, 2], &[1, 2]);
        let all = range(vec![], 0, 7);
        assert_eq!(gather_items(&prop, &all), vec![0, 2, 2, 3, 3, 5, 6, 6]);
        let items = range(vec![8, 10, 12], 0, 0);
        prop.append(&items, &[8, 10, 10, 12], &[1, 2, 1]);
        let all = range(vec![], 0, 13);
        assert_eq!(
            gather_items(&prop, &all),
            vec![0, 2, 2, 3, 3, 5, 6, 6, 8, 10, 10, 12]
        );
    }

    #[test]
    fn append_into_empty_property_mixed() {
        let mut prop = MeshArrayProperty::<i32>::new("p4");
        let items = range(vec![4, 6, 7], 8, 3);
        prop.append(&items, &[4, 4, 6, 7, 7, 8, 9, 10, 10], &[2, 1, 2, 1, 1, 2]);
        assert_eq!(
            gather_items(&prop, &items),
            vec![4, 4, 6, 7, 7, 8, 9, 10, 10]
        );
        let items = range(vec![2, 3], 0, 2);
        prop.append(&items, &[2, 2, 3, 0, 0, 1], &[2, 1, 2, 1]);
        assert_eq!(gather_items(&prop, &items), vec![2, 2, 3, 0, 0, 1]);
        let all = range(vec![], 0, 11);
        assert_eq!(
            gather_items(&prop, &all),
            vec![0, 0, 1, 2, 2, 3, 4, 4, 6, 7, 7, 8, 9, 10, 10]
        );
    }

    #[test]
    fn clear_then_resize_and_init_again() {
        let mut prop = MeshArrayProperty::<i32>::new("cell2nodes");
        prop.resize(vec![1, 1, 1]);
        prop.try_init(&range(vec![], 0, 3), vec![0, 1, 2]).unwrap();
        prop.clear();
        assert_eq!(prop.len(), 0);
        prop.resize(vec![1, 1, 1, 2, 2]);
        // surplus flat values beyond the declared sizes are ignored
        prop.try_init(&range(vec![], 0, 11), vec![0, 0, 1, 2, 2, 3, 4, 4, 6, 7, 7, 8, 9, 10, 10])
            .unwrap();
        assert_eq!(prop.len(), 5);
        assert_eq!(prop.cumulated_size(), 7);
        assert_eq!(prop.values(), &[0, 0, 1, 2, 2, 3, 4]);
    }

    #[test]
    fn item_slices_are_mutable() {
        let mut prop = MeshArrayProperty::<i32>::new("node2cells");
        prop.resize_and_fill(vec![1, 2, 3, 4, 5]);
        for (fill, lid) in range(vec![], 0, 5).iter().enumerate() {
            prop[lid].fill(fill as i32);
        }
        assert_eq!(prop.values(), &[0, 1, 1, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 4]);
    }

    #[test]
    fn range_views_are_positional() {
        let mut prop = MeshArrayProperty::<i32>::new("node2cells");
        prop.resize_and_fill(vec![1, 2, 3, 4, 5]);
        for (fill, lid) in range(vec![], 0, 5).iter().enumerate() {
            prop[lid].fill(fill as i32);
        }
        let sub = range(vec![], 0, 2);
        let view = prop.range_view(&sub);
        assert_eq!(view.len(), 2);
        assert_eq!(&view[0], &[0]);
        assert_eq!(&view[1], &[1, 1]);
        let flattened: Vec<i32> = view.iter().flatten().copied().collect();
        assert_eq!(flattened, vec![0, 1, 1]);
        assert!(std::panic::catch_unwind(|| view[2].len()).is_err());
        let mut view = prop.range_view_mut(&sub);
        view.item_mut(1).fill(9);
        assert_eq!(&prop[1], &[9, 9]);
    }

    #[test]
    fn proxy_exposes_raw_parts() {
        let mut prop = MeshArrayProperty::<i32>::new("node2cells");
        prop.resize(vec![1, 2, 3]);
        prop.try_init(&range(vec![], 0, 3), vec![1, 2, 2, 3, 3, 3])
            .unwrap();
        let proxy = MeshArrayPropertyProxy::new(&prop);
        assert_eq!(proxy.data(), prop.values());
        assert_eq!(proxy.data_len(), prop.values().len());
        assert_eq!(proxy.item_sizes(), prop.sizes());
        assert_eq!(proxy.nb_items(), prop.len());
        // offsets index the start of each item's slice
        assert_eq!(proxy.item_offsets(), &[0, 1, 3]);
        for (item, &offset) in proxy.item_offsets().iter().enumerate() {
            let size = proxy.item_sizes()[item];
            assert_eq!(&proxy.data()[offset..offset + size], &prop[item as LocalId]);
        }
    }
}
