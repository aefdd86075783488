//! MeshPropsError: Unified error type for mesh-props public APIs
//!
//! This error type is used throughout the mesh-props library to provide
//! robust, non-panicking error handling for all usage-level contract
//! violations. Hot-path index preconditions are enforced by bounds checks
//! instead (see the crate-level documentation of the error policy).

use thiserror::Error;

/// Unified error type for mesh-props operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshPropsError {
    /// `init` was called on a property that already holds values.
    #[error("property `{0}` is already initialized; call clear() before re-initializing")]
    PropertyAlreadyInitialized(String),
    /// `init` was called on an array property before `resize` declared item sizes.
    #[error("array property `{0}`: call resize before init")]
    ResizeBeforeInit(String),
    /// A `FutureItemRange` (or a filtered range derived from one) was consumed twice.
    #[error("item range has already been consumed")]
    FutureAlreadyConsumed,
    /// Lookup of a property name that was never registered on the family.
    #[error("family `{family}` has no property named `{name}`")]
    UnknownProperty { family: String, name: String },
    /// Typed access to a property registered with a different element type or kind.
    #[error("property `{0}` is registered with a different concrete type")]
    PropertyTypeMismatch(String),
    /// A unique id with no live local id mapping.
    #[error("unique id {0} is not mapped to any local id")]
    UnknownUniqueId(u64),
    /// A connectivity name registered twice with `ConnectivityOperation::Add`.
    #[error("cannot add already inserted connectivity `{0}`")]
    DuplicateConnectivity(String),
    /// Lookup of a connectivity name that was never registered.
    #[error("cannot find connectivity `{0}`")]
    UnknownConnectivity(String),
    /// The number of supplied values does not match the addressed item range.
    #[error("property `{name}`: expected {expected} values, found {found}")]
    ValueCountMismatch {
        /// Property whose write was rejected.
        name: String,
        /// Value count implied by the item range.
        expected: usize,
        /// Value count actually supplied.
        found: usize,
    },
    /// A structural invariant check failed (see [`crate::DebugInvariants`]).
    #[error("invariant violated in `{name}`: {detail}")]
    InvariantViolation {
        /// Structure whose invariant failed.
        name: String,
        /// What was inconsistent.
        detail: String,
    },
}
