//! Identifier module: local-id snapshots, deferred ranges, and the lid allocator.

pub mod future;
pub mod lids;
pub mod range;

/// Recyclable per-partition integer index into property storage.
///
/// Local ids are dense-ish: removal releases an id for reuse by a later
/// append, so storage indexed by lid stays compact.
pub type LocalId = u32;

/// Globally stable, never-reused identifier for a mesh item.
pub type UniqueId = u64;

/// Reserved sentinel meaning "no item" wherever a [`LocalId`] is expected.
pub const NULL_LOCAL_ID: LocalId = LocalId::MAX;

/// Reserved sentinel meaning "no item" wherever a [`UniqueId`] is expected.
pub const NULL_UNIQUE_ID: UniqueId = UniqueId::MAX;

pub use future::{FilteredItemRange, FutureItemRange, MeshUpdated};
pub use lids::ItemLidsProperty;
pub use range::{ItemRange, LocalIdSet};
