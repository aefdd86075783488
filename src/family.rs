//! Families: named collections of same-kind items.
//!
//! A [`Family`] owns the lid table of its items plus a registry of named
//! properties, each exclusively owned by the family and handed out as shared
//! single-threaded handles. The registry stores type-erased slots and
//! recovers the concrete property type on access, so families can hold
//! scalar and array properties of arbitrary element types side by side.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::data::array::MeshArrayProperty;
use crate::data::scalar::MeshScalarProperty;
use crate::ids::lids::ItemLidsProperty;
use crate::ids::range::ItemRange;
use crate::ids::{LocalId, UniqueId};
use crate::mesh_error::MeshPropsError;

/// Kind of mesh item a family collects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Mesh vertices.
    Node,
    /// 1-D mesh entities.
    Edge,
    /// Codimension-1 mesh entities.
    Face,
    /// Full-dimension mesh entities.
    Cell,
    /// Degrees of freedom attached to other items.
    Dof,
    /// Tracked particles.
    Particle,
}

/// What a registry slot holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyKind {
    /// One value per item.
    Scalar,
    /// A variable-length array per item.
    Array,
    /// The family's lid table.
    Lids,
}

/// Shared handle on a [`MeshScalarProperty`].
pub type ScalarPropertyRef<T> = Rc<RefCell<MeshScalarProperty<T>>>;
/// Shared handle on a [`MeshArrayProperty`].
pub type ArrayPropertyRef<T> = Rc<RefCell<MeshArrayProperty<T>>>;
/// Shared handle on a family's [`ItemLidsProperty`].
pub type LidsPropertyRef = Rc<RefCell<ItemLidsProperty>>;

/// Process-unique family identity, used as the graph node key component.
pub type FamilyId = u64;

static NEXT_FAMILY_ID: AtomicU64 = AtomicU64::new(0);

struct PropertySlot {
    kind: PropertyKind,
    handle: Box<dyn Any>,
}

struct FamilyCore {
    id: FamilyId,
    kind: ItemKind,
    name: String,
    lid_prop_name: String,
    lids: LidsPropertyRef,
    properties: RefCell<HashMap<String, PropertySlot>>,
}

/// Named collection of items of one kind.
///
/// `Family` is a cheap shared handle: clones refer to the same item set and
/// registry, which is what lets algorithm closures capture the families they
/// operate on while the caller keeps its own handle.
#[derive(Clone)]
pub struct Family {
    core: Rc<FamilyCore>,
}

impl Family {
    /// Create an empty family.
    pub fn new(kind: ItemKind, name: impl Into<String>) -> Self {
        let name = name.into();
        let lid_prop_name = format!("{name}_lids");
        Self {
            core: Rc::new(FamilyCore {
                id: NEXT_FAMILY_ID.fetch_add(1, Ordering::Relaxed),
                kind,
                lids: Rc::new(RefCell::new(ItemLidsProperty::new(lid_prop_name.clone()))),
                lid_prop_name,
                name,
                properties: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Process-unique identity of this family.
    #[inline]
    pub fn id(&self) -> FamilyId {
        self.core.id
    }

    /// Kind of item collected.
    #[inline]
    pub fn item_kind(&self) -> ItemKind {
        self.core.kind
    }

    /// Family name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Name under which the lid table is addressed by algorithms.
    #[inline]
    pub fn lid_prop_name(&self) -> &str {
        &self.core.lid_prop_name
    }

    /// Shared handle on the lid table.
    pub fn lids_property(&self) -> LidsPropertyRef {
        Rc::clone(&self.core.lids)
    }

    /// Create and register a scalar property, or return the existing one.
    ///
    /// Re-adding a registered name is idempotent.
    ///
    /// # Errors
    /// [`MeshPropsError::PropertyTypeMismatch`] when `name` is registered
    /// with a different element type or as an array property.
    pub fn add_mesh_scalar_property<T: Clone + Default + 'static>(
        &self,
        name: &str,
    ) -> Result<ScalarPropertyRef<T>, MeshPropsError> {
        let mut properties = self.core.properties.borrow_mut();
        if let Some(slot) = properties.get(name) {
            return downcast_slot::<ScalarPropertyRef<T>>(slot, name);
        }
        let handle: ScalarPropertyRef<T> = Rc::new(RefCell::new(MeshScalarProperty::new(name)));
        properties.insert(
            name.to_owned(),
            PropertySlot {
                kind: PropertyKind::Scalar,
                handle: Box::new(Rc::clone(&handle)),
            },
        );
        log::trace!("family `{}`: added scalar property `{name}`", self.core.name);
        Ok(handle)
    }

    /// Create and register an array property, or return the existing one.
    ///
    /// Re-adding a registered name is idempotent.
    ///
    /// # Errors
    /// [`MeshPropsError::PropertyTypeMismatch`] when `name` is registered
    /// with a different element type or as a scalar property.
    pub fn add_mesh_array_property<T: Clone + Default + 'static>(
        &self,
        name: &str,
    ) -> Result<ArrayPropertyRef<T>, MeshPropsError> {
        let mut properties = self.core.properties.borrow_mut();
        if let Some(slot) = properties.get(name) {
            return downcast_slot::<ArrayPropertyRef<T>>(slot, name);
        }
        let handle: ArrayPropertyRef<T> = Rc::new(RefCell::new(MeshArrayProperty::new(name)));
        properties.insert(
            name.to_owned(),
            PropertySlot {
                kind: PropertyKind::Array,
                handle: Box::new(Rc::clone(&handle)),
            },
        );
        log::trace!("family `{}`: added array property `{name}`", self.core.name);
        Ok(handle)
    }

    /// Typed accessor for a registered scalar property.
    ///
    /// # Errors
    /// [`MeshPropsError::UnknownProperty`] when `name` was never registered,
    /// [`MeshPropsError::PropertyTypeMismatch`] when the slot holds another
    /// type.
    pub fn mesh_scalar_property<T: Clone + Default + 'static>(
        &self,
        name: &str,
    ) -> Result<ScalarPropertyRef<T>, MeshPropsError> {
        let properties = self.core.properties.borrow();
        let slot = properties.get(name).ok_or_else(|| self.unknown(name))?;
        downcast_slot::<ScalarPropertyRef<T>>(slot, name)
    }

    /// Typed accessor for a registered array property.
    ///
    /// # Errors
    /// Same conditions as [`mesh_scalar_property`](Self::mesh_scalar_property).
    pub fn mesh_array_property<T: Clone + Default + 'static>(
        &self,
        name: &str,
    ) -> Result<ArrayPropertyRef<T>, MeshPropsError> {
        let properties = self.core.properties.borrow();
        let slot = properties.get(name).ok_or_else(|| self.unknown(name))?;
        downcast_slot::<ArrayPropertyRef<T>>(slot, name)
    }

    /// Kind of the property registered under `name`.
    ///
    /// # Errors
    /// [`MeshPropsError::UnknownProperty`] when `name` is neither a
    /// registered property nor the lid table.
    pub fn property_kind(&self, name: &str) -> Result<PropertyKind, MeshPropsError> {
        if name == self.core.lid_prop_name {
            return Ok(PropertyKind::Lids);
        }
        self.core
            .properties
            .borrow()
            .get(name)
            .map(|slot| slot.kind)
            .ok_or_else(|| self.unknown(name))
    }

    /// Whether `name` addresses the lid table or a registered property.
    pub fn has_property(&self, name: &str) -> bool {
        name == self.core.lid_prop_name || self.core.properties.borrow().contains_key(name)
    }

    /// Whether any user property is registered (the lid table not counted).
    pub fn has_any_property(&self) -> bool {
        !self.core.properties.borrow().is_empty()
    }

    /// Drop a property; no-op when `name` is not registered.
    pub fn remove_property(&self, name: &str) {
        self.core.properties.borrow_mut().remove(name);
    }

    /// Drop every user property, keeping the lid table.
    pub fn remove_properties(&self) {
        self.core.properties.borrow_mut().clear();
    }

    /// Range over all live items.
    pub fn all(&self) -> ItemRange {
        self.core.lids.borrow().values()
    }

    /// Number of live items.
    pub fn nb_elements(&self) -> usize {
        self.core.lids.borrow().len()
    }

    /// Local ids of the given unique ids, in input order.
    pub fn item_unique_ids_to_local_ids(&self, uids: &[UniqueId]) -> Vec<LocalId> {
        self.core.lids.borrow().lids(uids)
    }

    /// Output-parameter variant of
    /// [`item_unique_ids_to_local_ids`](Self::item_unique_ids_to_local_ids).
    pub fn item_unique_ids_to_local_ids_into(&self, uids: &[UniqueId], out: &mut Vec<LocalId>) {
        self.core.lids.borrow().lids_into(uids, out);
    }

    fn unknown(&self, name: &str) -> MeshPropsError {
        MeshPropsError::UnknownProperty {
            family: self.core.name.clone(),
            name: name.to_owned(),
        }
    }
}

fn downcast_slot<H: Clone + 'static>(slot: &PropertySlot, name: &str) -> Result<H, MeshPropsError> {
    slot.handle
        .downcast_ref::<H>()
        .cloned()
        .ok_or_else(|| MeshPropsError::PropertyTypeMismatch(name.to_owned()))
}

impl PartialEq for Family {
    fn eq(&self, other: &Self) -> bool {
        self.core.id == other.core.id
    }
}

impl Eq for Family {}

impl std::fmt::Debug for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Family")
            .field("kind", &self.core.kind)
            .field("name", &self.core.name)
            .field("nb_elements", &self.nb_elements())
            .finish()
    }
}
