//! Per-item scalar property storage.
//!
//! A [`MeshScalarProperty`] stores one value per item, addressed by local id
//! over the extent `0..len()`. Sparse appends fill the positions a range
//! skips with a null value, so recycled or not-yet-created lids always read
//! back as the fill.

use std::ops::{Index, IndexMut};

use itertools::Itertools;

use crate::data::view::{PropertyConstView, PropertyView};
use crate::ids::LocalId;
use crate::ids::range::ItemRange;
use crate::mesh_error::MeshPropsError;

/// Per-item single-value storage, indexed by local id.
#[derive(Clone, Debug, Default)]
pub struct MeshScalarProperty<T> {
    name: String,
    data: Vec<T>,
}

impl<T: Clone + Default> MeshScalarProperty<T> {
    /// Create an empty property.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Vec::new(),
        }
    }

    /// Property name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current extent (largest initialized lid + 1, holes included).
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the property is empty (uninitialized).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True exactly when the property is empty, whatever `range` holds.
    #[inline]
    pub fn is_initializable_from(&self, _range: &ItemRange) -> bool {
        self.data.is_empty()
    }

    /// Take initial values for the items of `range`.
    ///
    /// Storage is sized to `range.max_local_id() + 1`; `values[i]` lands at
    /// lid `range.at(i)` and every position the range skips is left at
    /// `T::default()`.
    ///
    /// # Errors
    /// - [`MeshPropsError::PropertyAlreadyInitialized`] unless the property is
    ///   empty ([`clear`](Self::clear) re-arms it).
    /// - [`MeshPropsError::ValueCountMismatch`] when `values` and `range`
    ///   disagree on length.
    pub fn try_init(&mut self, range: &ItemRange, values: Vec<T>) -> Result<(), MeshPropsError> {
        if !self.data.is_empty() {
            return Err(MeshPropsError::PropertyAlreadyInitialized(self.name.clone()));
        }
        if values.len() != range.len() {
            return Err(MeshPropsError::ValueCountMismatch {
                name: self.name.clone(),
                expected: range.len(),
                found: values.len(),
            });
        }
        if range.ids().is_dense_from_zero() {
            // dense init can take the input values as-is
            self.data = values;
            return Ok(());
        }
        self.scatter(range, &values, T::default());
        Ok(())
    }

    /// Write `values` at the lids of `range`, filling new holes with
    /// `T::default()`.
    ///
    /// Grows storage when the range reaches past the current extent;
    /// re-appending over an already-populated lid overwrites its value.
    pub fn append(&mut self, range: &ItemRange, values: &[T]) {
        self.append_filled(range, values, T::default());
    }

    /// [`append`](Self::append) with an explicit null value for the holes.
    pub fn append_filled(&mut self, range: &ItemRange, values: &[T], null_value: T) {
        debug_assert_eq!(
            range.len(),
            values.len(),
            "value count must match the item range"
        );
        self.scatter(range, values, null_value);
    }

    fn scatter(&mut self, range: &ItemRange, values: &[T], null_value: T) {
        if let Some(max_lid) = range.max_local_id() {
            let extent = max_lid as usize + 1;
            if extent > self.data.len() {
                self.data.resize(extent, null_value);
            }
        }
        for (lid, value) in range.iter().zip(values) {
            self.data[lid as usize] = value.clone();
        }
    }

    /// Ordered values for the given lids, one per input.
    ///
    /// Lids never written read back as the null value their hole was filled
    /// with. Every lid must be below the current extent.
    pub fn gather(&self, lids: &[LocalId]) -> Vec<T> {
        if let Some(&max) = lids.iter().max() {
            assert!(
                (max as usize) < self.data.len(),
                "max input lid {max} must be < property extent {}",
                self.data.len()
            );
        }
        lids.iter().map(|&lid| self.data[lid as usize].clone()).collect()
    }

    /// Flat storage in lid order, `0..len()`.
    #[inline]
    pub fn values(&self) -> &[T] {
        &self.data
    }

    /// Iterate the full storage in lid order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Reset to empty, permitting a subsequent `init`.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Read-only view over the whole extent.
    pub fn view(&self) -> PropertyConstView<'_, T> {
        PropertyConstView::new((0..self.data.len()).collect(), &self.data)
    }

    /// Mutable view over the whole extent.
    pub fn view_mut(&mut self) -> PropertyView<'_, T> {
        PropertyView::new((0..self.data.len()).collect(), &mut self.data)
    }

    /// Read-only view over exactly the lids of `range`.
    pub fn range_view(&self, range: &ItemRange) -> PropertyConstView<'_, T> {
        PropertyConstView::new(
            range.iter().map(|lid| lid as usize).collect(),
            &self.data,
        )
    }

    /// Mutable view over exactly the lids of `range`.
    pub fn range_view_mut(&mut self, range: &ItemRange) -> PropertyView<'_, T> {
        PropertyView::new(
            range.iter().map(|lid| lid as usize).collect(),
            &mut self.data,
        )
    }

    /// Route the dump through the `log` facade.
    pub fn debug_print(&self)
    where
        T: std::fmt::Debug,
    {
        log::debug!("{self}");
    }
}

impl<T> Index<LocalId> for MeshScalarProperty<T> {
    type Output = T;

    #[inline]
    fn index(&self, lid: LocalId) -> &T {
        assert!(
            (lid as usize) < self.data.len(),
            "item local id {lid} must be < property extent {}",
            self.data.len()
        );
        &self.data[lid as usize]
    }
}

impl<T> IndexMut<LocalId> for MeshScalarProperty<T> {
    #[inline]
    fn index_mut(&mut self, lid: LocalId) -> &mut T {
        assert!(
            (lid as usize) < self.data.len(),
            "item local id {lid} must be < property extent {}",
            self.data.len()
        );
        &mut self.data[lid as usize]
    }
}

impl<'a, T> IntoIterator for &'a MeshScalarProperty<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl<T: std::fmt::Debug> std::fmt::Display for MeshScalarProperty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MeshScalarProperty `{}` [{}]",
            self.name,
            self.data.iter().map(|v| format!("{v:?}")).join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::NULL_LOCAL_ID;
    use crate::ids::range::LocalIdSet;

    const NULL: i32 = -1;

    fn range(explicit: Vec<LocalId>, first: LocalId, count: usize) -> ItemRange {
        ItemRange::new(LocalIdSet::new(explicit, first, count))
    }

    #[test]
    fn init_then_append_contiguous() {
        let mut prop = MeshScalarProperty::<i32>::new("cell_tag");
        let first = range(vec![], 0, 3);
        assert!(prop.is_initializable_from(&first));
        prop.try_init(&first, vec![1, 2, 3]).unwrap();
        assert_eq!(prop.len(), 3);
        prop.append(&range(vec![], 3, 3), &[4, 5, 6]);
        assert_eq!(prop.values(), &[1, 2, 3, 4, 5, 6]);
        // lid-order iteration covers the full extent
        let collected: Vec<i32> = prop.iter().copied().collect();
        assert_eq!(collected, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(prop[4], 5);
    }

    #[test]
    fn double_init_fails_until_cleared() {
        let mut prop = MeshScalarProperty::<i32>::new("cell_tag");
        let items = range(vec![], 0, 3);
        prop.try_init(&items, vec![1, 2, 3]).unwrap();
        assert!(matches!(
            prop.try_init(&items, vec![1, 2, 3]),
            Err(MeshPropsError::PropertyAlreadyInitialized(_))
        ));
        prop.clear();
        assert_eq!(prop.len(), 0);
        prop.try_init(&items, vec![1, 2, 3]).unwrap();
        assert_eq!(prop.values(), &[1, 2, 3]);
    }

    #[test]
    fn append_with_holes_contiguous() {
        let mut prop = MeshScalarProperty::<i32>::new("cell_tag");
        prop.try_init(&range(vec![], 0, 3), vec![1, 2, 3]).unwrap();
        prop.append_filled(&range(vec![], 8, 2), &[8, 9], NULL);
        assert_eq!(prop.gather(&[8, 9]), vec![8, 9]);
        // skipped positions read back as the fill
        assert_eq!(prop.gather(&[6, 7]), vec![NULL, NULL]);
    }

    #[test]
    fn append_into_empty_property() {
        // contiguous range not starting at 0
        let mut prop = MeshScalarProperty::<i32>::new("p2");
        prop.append_filled(&range(vec![], 2, 3), &[2, 3, 4], NULL);
        assert_eq!(prop.gather(&[2, 3, 4]), vec![2, 3, 4]);
        assert_eq!(prop.gather(&[0, 1]), vec![NULL, NULL]);
        // then holes punched by a discontiguous append
        prop.append_filled(&range(vec![0, 1, 4], 0, 0), &[0, 1, 8], NULL);
        assert_eq!(prop.gather(&[0, 1, 4]), vec![0, 1, 8]);
        // mixed range: explicit lids first, then the run
        prop.append_filled(&range(vec![4], 0, 2), &[10, 11, 18], NULL);
        assert_eq!(prop.gather(&[4, 0, 1]), vec![10, 11, 18]);
    }

    #[test]
    fn append_mixed_range_into_empty_property() {
        let mut prop = MeshScalarProperty::<i32>::new("p4");
        prop.append_filled(&range(vec![1, 3, 5], 7, 3), &[1, 3, 5, 7, 8, 9], NULL);
        assert_eq!(prop.gather(&[1, 3, 5, 7, 8, 9]), vec![1, 3, 5, 7, 8, 9]);
        assert_eq!(prop.gather(&[0, 2]), vec![NULL, NULL]);
    }

    #[test]
    fn gather_follows_input_order() {
        let mut prop = MeshScalarProperty::<i32>::new("cell_tag");
        prop.try_init(&range(vec![], 0, 6), vec![1, 2, 3, 10, 100, 1000])
            .unwrap();
        assert_eq!(prop.gather(&[0, 3, 4, 5]), vec![1, 10, 100, 1000]);
    }

    #[test]
    fn views_follow_ranges() {
        let mut prop = MeshScalarProperty::<i32>::new("node_flag");
        prop.try_init(&range(vec![], 0, 6), vec![1, 2, 3, 10, 100, 1000])
            .unwrap();
        let full = prop.view();
        assert_eq!(full.len(), 6);
        assert!(full.iter().copied().eq([1, 2, 3, 10, 100, 1000]));
        let partial_range = range(vec![1, 3, 5], 0, 0);
        let partial = prop.range_view(&partial_range);
        assert_eq!(partial.len(), 3);
        assert!(partial.iter().copied().eq([2, 10, 1000]));
        // writes through a view land at the viewed lid
        let mut partial_mut = prop.range_view_mut(&partial_range);
        partial_mut[2] = 50;
        assert_eq!(prop[5], 50);
        let mut full_mut = prop.view_mut();
        full_mut[2] = 51;
        assert_eq!(prop[2], 51);
    }

    #[test]
    fn null_lid_values_pass_through() {
        // connectivity-style payload: lids with null entries are plain values
        let mut prop = MeshScalarProperty::<LocalId>::new("remap");
        prop.append_filled(&range(vec![], 0, 2), &[NULL_LOCAL_ID, 3], NULL_LOCAL_ID);
        assert_eq!(prop[0], NULL_LOCAL_ID);
        assert_eq!(prop[1], 3);
    }
}
