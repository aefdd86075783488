//! Mesh: the scheduling facade over families, properties, and the graph.
//!
//! `Mesh` owns an [`AlgorithmGraph`] plus the family and connectivity
//! registries, and packages the recurring update patterns — add items,
//! attach coordinates, wire connectivities — as scheduled operations. Every
//! `schedule_*` call only registers algorithms; nothing mutates storage until
//! [`Mesh::apply_scheduled_operations`] runs the round and returns the
//! completion token.

use std::collections::HashMap;

use crate::family::{ArrayPropertyRef, Family, ItemKind, ScalarPropertyRef};
use crate::graph::{AlgorithmGraph, InProperty, OutProperty};
use crate::ids::future::{FutureItemRange, MeshUpdated};
use crate::ids::range::ItemRange;
use crate::ids::{LocalId, UniqueId};
use crate::mesh_error::MeshPropsError;

/// Cartesian coordinates of one item.
pub type Real3 = [f64; 3];

/// Whether a connectivity registration expects the name to be new.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectivityOperation {
    /// Register a new connectivity; an existing name is an error.
    Add,
    /// Extend or rewrite an already-registered connectivity.
    Modify,
}

/// A registered connectivity: lids of a source family mapping to lids of a
/// target family through an array property on the source.
#[derive(Clone)]
pub struct Connectivity {
    source_family: Family,
    target_family: Family,
    name: String,
    property: ArrayPropertyRef<LocalId>,
}

impl Connectivity {
    /// Family whose items carry the connectivity arrays.
    #[inline]
    pub fn source_family(&self) -> &Family {
        &self.source_family
    }

    /// Family the stored lids point into.
    #[inline]
    pub fn target_family(&self) -> &Family {
        &self.target_family
    }

    /// Name of the backing array property.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle on the backing array property.
    pub fn property(&self) -> ArrayPropertyRef<LocalId> {
        self.property.clone()
    }

    /// Target-family lids connected to `source_lid`.
    pub fn connected_items(&self, source_lid: LocalId) -> Vec<LocalId> {
        self.property.borrow()[source_lid].to_vec()
    }
}

impl std::fmt::Debug for Connectivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connectivity")
            .field("name", &self.name)
            .field("source", &self.source_family.name())
            .field("target", &self.target_family.name())
            .finish()
    }
}

/// Source items of a scheduled connectivity: either a concrete snapshot or a
/// future filled earlier in the same round.
#[derive(Clone, Debug)]
pub enum ItemSource {
    /// A range known at scheduling time.
    Fixed(ItemRange),
    /// A deferred range read when the algorithm runs.
    Deferred(FutureItemRange),
}

impl ItemSource {
    fn resolve(&self) -> ItemRange {
        match self {
            ItemSource::Fixed(range) => range.clone(),
            ItemSource::Deferred(future) => future.peek(),
        }
    }
}

impl From<ItemRange> for ItemSource {
    fn from(range: ItemRange) -> Self {
        ItemSource::Fixed(range)
    }
}

impl From<&FutureItemRange> for ItemSource {
    fn from(future: &FutureItemRange) -> Self {
        ItemSource::Deferred(future.clone())
    }
}

/// Incremental mesh structure: families, their properties, and the update
/// graph that builds them.
pub struct Mesh {
    name: String,
    graph: AlgorithmGraph,
    families: HashMap<(ItemKind, String), Family>,
    connectivities: HashMap<String, Connectivity>,
}

impl Mesh {
    /// Create an empty mesh.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            graph: AlgorithmGraph::new(name.clone()),
            name,
            families: HashMap::new(),
            connectivities: HashMap::new(),
        }
    }

    /// Mesh name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the unique-id property every family carries.
    pub fn unique_id_property_name(family_name: &str) -> String {
        format!("{family_name}_uids")
    }

    /// Name of the coordinates property attached by
    /// [`schedule_set_item_coords`](Self::schedule_set_item_coords).
    pub fn coord_property_name(family_name: &str) -> String {
        format!("{family_name}_coords")
    }

    /// Create a family (or return the existing one) and register its
    /// unique-id property.
    pub fn add_family(&mut self, kind: ItemKind, name: &str) -> Result<Family, MeshPropsError> {
        if let Some(existing) = self.families.get(&(kind, name.to_owned())) {
            return Ok(existing.clone());
        }
        let family = Family::new(kind, name);
        family.add_mesh_scalar_property::<UniqueId>(&Self::unique_id_property_name(name))?;
        self.families
            .insert((kind, name.to_owned()), family.clone());
        Ok(family)
    }

    /// Look up a family by kind and name.
    pub fn find_family(&self, kind: ItemKind, name: &str) -> Option<Family> {
        self.families.get(&(kind, name.to_owned())).cloned()
    }

    /// The scheduling graph, for registering custom algorithms.
    pub fn graph_mut(&mut self) -> &mut AlgorithmGraph {
        &mut self.graph
    }

    /// Read-only access to the scheduling graph.
    pub fn graph(&self) -> &AlgorithmGraph {
        &self.graph
    }

    /// Schedule the creation of items: allocate lids for `uids` and record
    /// them in the family's unique-id property.
    ///
    /// `future` is filled with the allocated range when the round runs.
    pub fn schedule_add_items(
        &mut self,
        family: &Family,
        uids: Vec<UniqueId>,
        future: &FutureItemRange,
    ) -> Result<(), MeshPropsError> {
        let uid_prop = family
            .mesh_scalar_property::<UniqueId>(&Self::unique_id_property_name(family.name()))?;
        let lids = family.lids_property();
        let family_name = family.name().to_owned();

        let producer_slot = future.clone();
        let producer_uids = uids.clone();
        self.graph.add_algorithm(
            [],
            [OutProperty::new(family, family.lid_prop_name())],
            move || {
                log::debug!("algorithm: create items in family `{family_name}`");
                let added = lids.borrow_mut().append(&producer_uids);
                producer_slot.assign(added);
                Ok(())
            },
        );

        let reader_slot = future.clone();
        self.graph.add_algorithm(
            [InProperty::new(family, family.lid_prop_name())],
            [OutProperty::new(
                family,
                Self::unique_id_property_name(family.name()),
            )],
            move || {
                let added = reader_slot.peek();
                let mut prop = uid_prop.borrow_mut();
                if prop.is_initializable_from(&added) {
                    prop.try_init(&added, uids.clone())
                } else {
                    prop.append(&added, &uids);
                    Ok(())
                }
            },
        );
        Ok(())
    }

    /// Schedule coordinates for the items `future` will resolve to.
    pub fn schedule_set_item_coords(
        &mut self,
        family: &Family,
        future: &FutureItemRange,
        coords: Vec<Real3>,
    ) -> Result<(), MeshPropsError> {
        let coord_name = Self::coord_property_name(family.name());
        let coord_prop = family.add_mesh_scalar_property::<Real3>(&coord_name)?;
        let slot = future.clone();
        self.graph.add_algorithm(
            [InProperty::new(family, family.lid_prop_name())],
            [OutProperty::new(family, coord_name)],
            move || {
                log::debug!("algorithm: register item coords");
                let added = slot.peek();
                let mut prop = coord_prop.borrow_mut();
                if prop.is_initializable_from(&added) {
                    prop.try_init(&added, coords.clone())
                } else {
                    prop.append(&added, &coords);
                    Ok(())
                }
            },
        );
        Ok(())
    }

    /// Schedule a connectivity from `source` items to `target` items.
    ///
    /// `connected_uids` are translated to target lids when the algorithm
    /// runs, after the target items exist; `nb_connected_per_item[i]` is the
    /// array length of the i-th source item.
    ///
    /// # Errors
    /// [`MeshPropsError::DuplicateConnectivity`] when `name` is already
    /// registered and `op` is [`ConnectivityOperation::Add`].
    pub fn schedule_add_connectivity(
        &mut self,
        source: &Family,
        source_items: impl Into<ItemSource>,
        target: &Family,
        nb_connected_per_item: Vec<usize>,
        connected_uids: Vec<UniqueId>,
        name: &str,
        op: ConnectivityOperation,
    ) -> Result<(), MeshPropsError> {
        let property = source.add_mesh_array_property::<LocalId>(name)?;
        if self.connectivities.contains_key(name) {
            if op == ConnectivityOperation::Add {
                return Err(MeshPropsError::DuplicateConnectivity(name.to_owned()));
            }
        } else {
            self.connectivities.insert(
                name.to_owned(),
                Connectivity {
                    source_family: source.clone(),
                    target_family: target.clone(),
                    name: name.to_owned(),
                    property: property.clone(),
                },
            );
        }

        let source_items = source_items.into();
        let target_lids = target.lids_property();
        let source_name = source.name().to_owned();
        let target_name = target.name().to_owned();
        self.graph.add_algorithm(
            [
                InProperty::new(source, source.lid_prop_name()),
                InProperty::new(target, target.lid_prop_name()),
            ],
            [OutProperty::new(source, name)],
            move || {
                log::debug!(
                    "algorithm: register connectivity between `{source_name}` and `{target_name}`"
                );
                let items = source_items.resolve();
                let connected_lids = target_lids.borrow().lids(&connected_uids);
                let mut conn = property.borrow_mut();
                if conn.is_initializable_from(&items) {
                    conn.resize(nb_connected_per_item.clone());
                    conn.try_init(&items, connected_lids)
                } else {
                    conn.append(&items, &connected_lids, &nb_connected_per_item);
                    Ok(())
                }
            },
        );
        Ok(())
    }

    /// [`schedule_add_connectivity`](Self::schedule_add_connectivity) with a
    /// fixed array length per source item.
    pub fn schedule_add_connectivity_uniform(
        &mut self,
        source: &Family,
        source_items: impl Into<ItemSource>,
        target: &Family,
        nb_connected_per_item: usize,
        connected_uids: Vec<UniqueId>,
        name: &str,
        op: ConnectivityOperation,
    ) -> Result<(), MeshPropsError> {
        if nb_connected_per_item == 0 || connected_uids.len() % nb_connected_per_item != 0 {
            return Err(MeshPropsError::ValueCountMismatch {
                name: name.to_owned(),
                expected: nb_connected_per_item,
                found: connected_uids.len(),
            });
        }
        let nb_items = connected_uids.len() / nb_connected_per_item;
        self.schedule_add_connectivity(
            source,
            source_items,
            target,
            vec![nb_connected_per_item; nb_items],
            connected_uids,
            name,
            op,
        )
    }

    /// Run the scheduled round and return the completion token unlocking the
    /// futures it filled.
    pub fn apply_scheduled_operations(&mut self) -> Result<MeshUpdated, MeshPropsError> {
        self.graph.apply_algorithms()
    }

    /// Registered connectivity by name.
    pub fn connectivity(&self, name: &str) -> Result<&Connectivity, MeshPropsError> {
        self.connectivities
            .get(name)
            .ok_or_else(|| MeshPropsError::UnknownConnectivity(name.to_owned()))
    }

    /// Connectivities of `source` whose target family collects `kind` items.
    pub fn connectivities_with_target_kind(
        &self,
        source: &Family,
        kind: ItemKind,
    ) -> Vec<Connectivity> {
        self.connectivities
            .values()
            .filter(|conn| {
                conn.source_family == *source && conn.target_family.item_kind() == kind
            })
            .cloned()
            .collect()
    }

    /// Node connectivities of `source`.
    pub fn nodes(&self, source: &Family) -> Vec<Connectivity> {
        self.connectivities_with_target_kind(source, ItemKind::Node)
    }

    /// Edge connectivities of `source`.
    pub fn edges(&self, source: &Family) -> Vec<Connectivity> {
        self.connectivities_with_target_kind(source, ItemKind::Edge)
    }

    /// Face connectivities of `source`.
    pub fn faces(&self, source: &Family) -> Vec<Connectivity> {
        self.connectivities_with_target_kind(source, ItemKind::Face)
    }

    /// Cell connectivities of `source`.
    pub fn cells(&self, source: &Family) -> Vec<Connectivity> {
        self.connectivities_with_target_kind(source, ItemKind::Cell)
    }

    /// Dof connectivities of `source`.
    pub fn dofs(&self, source: &Family) -> Vec<Connectivity> {
        self.connectivities_with_target_kind(source, ItemKind::Dof)
    }

    /// The family's unique-id property.
    pub fn item_uids_property(
        &self,
        family: &Family,
    ) -> Result<ScalarPropertyRef<UniqueId>, MeshPropsError> {
        family.mesh_scalar_property::<UniqueId>(&Self::unique_id_property_name(family.name()))
    }

    /// The family's coordinates property.
    pub fn item_coord_property(
        &self,
        family: &Family,
    ) -> Result<ScalarPropertyRef<Real3>, MeshPropsError> {
        family.mesh_scalar_property::<Real3>(&Self::coord_property_name(family.name()))
    }

    /// Unique ids of the given local ids, in input order.
    pub fn unique_ids(
        &self,
        family: &Family,
        lids: &[LocalId],
    ) -> Result<Vec<UniqueId>, MeshPropsError> {
        Ok(self.item_uids_property(family)?.borrow().gather(lids))
    }

    /// Local ids of the given unique ids, in input order.
    pub fn local_ids(&self, family: &Family, uids: &[UniqueId]) -> Vec<LocalId> {
        family.item_unique_ids_to_local_ids(uids)
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("name", &self.name)
            .field("nb_families", &self.families.len())
            .field("nb_connectivities", &self.connectivities.len())
            .finish()
    }
}
