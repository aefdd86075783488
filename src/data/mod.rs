//! Data module: raw stores, mesh-indexed properties, and index-based views.
#![warn(missing_docs)]

pub mod array;
pub mod scalar;
pub mod store;
pub mod view;

pub use array::{
    MeshArrayProperty, MeshArrayPropertyConstView, MeshArrayPropertyProxy, MeshArrayPropertyView,
};
pub use scalar::MeshScalarProperty;
pub use store::{ArrayProperty, ScalarProperty};
pub use view::{PropertyConstView, PropertyView, PropertyViewIter};
