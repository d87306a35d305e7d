//! Error types for meshx-model

use thiserror::Error;

use crate::element::ElementKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("element {id} of kind {kind} has {found} nodes, expected {expected}")]
    NodeCount {
        kind: ElementKind,
        id: i32,
        expected: usize,
        found: usize,
    },

    #[error("unknown element kind tag: {0}")]
    UnknownKind(String),

    #[error("unknown entity kind: {0}")]
    UnknownEntity(String),

    #[error("unknown field shape: {0}")]
    UnknownShape(String),
}
