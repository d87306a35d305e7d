//! Canonical mesh/field model shared by every meshx codec.
//!
//! Readers build a [`Mesh`] (plus [`Field`]s when asked) and writers consume the same
//! shapes, so formats only meet here:
//! - [`ElementKind`]: the format-independent topology every element is stored under
//! - [`Mesh`]: nodes, elements keyed by kind, named [`Group`]s
//! - [`Field`]: scalar/vector/tensor samples keyed by entity ID
//! - [`LoadCase`]: float instant key with collision bumping

pub mod element;
pub mod error;
pub mod field;
pub mod mesh;

pub use element::ElementKind;
pub use error::ModelError;
pub use field::{
    Field, FieldShape, FieldValue, FieldsByCase, FieldsByShape, LOAD_CASE_EPSILON, LoadCase,
    Tensor,
};
pub use mesh::{
    ElementId, EntityKind, Group, Mesh, MeshSummary, NodeId, check_node_count,
};
