//! # mesh-props
//!
//! mesh-props is a property-based incremental mesh-data kernel for scientific
//! computing codes. An unstructured mesh and its evolving topology are stored
//! as named per-item properties (scalar values or ragged arrays) keyed by
//! recyclable local identifiers, and built up lazily through a graph of small
//! update algorithms that declare which properties they read and produce.
//!
//! ## Features
//! - Hole-tolerant identifier snapshots ([`ids::range::ItemRange`]) mixing an
//!   explicit lid list with a contiguous run
//! - A local-id allocator with O(1) recycling ([`ids::lids::ItemLidsProperty`])
//!   mapping stable unique ids to dense local ids
//! - Per-item scalar and ragged-array property storage with view and
//!   sub-range iteration support
//! - Deferred item ranges ([`ids::future::FutureItemRange`]) that wire
//!   consumers to producers before the producer has run, unlocked by a
//!   completion token
//! - A minimal dataflow scheduler ([`graph::AlgorithmGraph`]) with defined
//!   registration-order execution and copy-shares-storage semantics
//!
//! ## Execution model
//!
//! The kernel is single-threaded and synchronous. Futures are a deferred-
//! evaluation device, not a concurrency primitive: no thread ever blocks, a
//! [`ids::future::FutureItemRange`] simply cannot be consumed until the
//! completion token returned by
//! [`graph::AlgorithmGraph::apply_algorithms`] exists.
//!
//! ## Usage
//! Add `mesh-props` as a dependency in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! mesh-props = "0.2"
//! ```
//!
//! The kernel sequences and stores; it does not compute geometry, balance
//! load, or parallelize algorithm execution.

// Re-export our major subsystems:
pub mod data;
pub mod debug_invariants;
pub mod family;
pub mod graph;
pub mod ids;
pub mod mesh;
pub mod mesh_error;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::data::array::{MeshArrayProperty, MeshArrayPropertyProxy};
    pub use crate::data::scalar::MeshScalarProperty;
    pub use crate::data::store::{ArrayProperty, ScalarProperty};
    pub use crate::data::view::{PropertyConstView, PropertyView, PropertyViewIter};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::family::{Family, ItemKind, PropertyKind};
    pub use crate::graph::{AlgorithmGraph, InProperty, OutProperty};
    pub use crate::ids::future::{FilteredItemRange, FutureItemRange, MeshUpdated};
    pub use crate::ids::lids::ItemLidsProperty;
    pub use crate::ids::range::{ItemRange, LocalIdSet};
    pub use crate::ids::{LocalId, NULL_LOCAL_ID, NULL_UNIQUE_ID, UniqueId};
    pub use crate::mesh::{Connectivity, ConnectivityOperation, Mesh, Real3};
    pub use crate::mesh_error::MeshPropsError;
}
