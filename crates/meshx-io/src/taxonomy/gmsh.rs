//! Gmsh `.pos` view slots.
//!
//! The key table of a view lists 45 block counts: 15 geometries, each as scalar,
//! vector and tensor data, in the order of [`slots`].

use meshx_model::{ElementKind, FieldShape};

/// Edges 0-1, 1-2, 2-0, 0-3, 2-3, 1-3.
const TET2: [usize; 10] = [0, 1, 2, 3, 4, 5, 6, 7, 9, 8];
/// Edges 0-1, 0-2, 0-3, 1-2, 1-4, 2-5, 3-4, 3-5, 4-5.
const WEDGE2: [usize; 15] = [0, 1, 2, 3, 4, 5, 6, 9, 7, 8, 10, 11, 12, 14, 13];
/// Edges 0-1, 0-3, 0-4, 1-2, 1-5, 2-3, 2-6, 3-7, 4-5, 4-7, 5-6, 6-7.
const HEX2: [usize; 20] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 11, 13, 9, 10, 12, 14, 15, 16, 18, 19, 17,
];
/// Edges 0-1, 0-3, 0-4, 1-2, 1-4, 2-3, 2-4, 3-4.
const PYRAMID2: [usize; 13] = [0, 1, 2, 3, 4, 5, 8, 10, 6, 7, 9, 11, 12];

pub fn permutation(kind: ElementKind) -> Option<&'static [usize]> {
    match kind {
        ElementKind::Tet2 => Some(&TET2),
        ElementKind::Wedge2 => Some(&WEDGE2),
        ElementKind::Hex2 => Some(&HEX2),
        ElementKind::Pyramid2 => Some(&PYRAMID2),
        _ => None,
    }
}

/// One entry of the view key table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub name: &'static str,
    pub kind: ElementKind,
    pub shape: FieldShape,
}

impl Slot {
    /// Nodes per record.
    pub fn nodes(&self) -> usize {
        self.kind.node_count()
    }

    /// Field components per node.
    pub fn components(&self) -> usize {
        match self.shape {
            FieldShape::Scalar => 1,
            FieldShape::Vector => 3,
            FieldShape::Tensor => 9,
        }
    }

    /// `f64` values per record: coordinates then values for every node.
    pub fn stride(&self) -> usize {
        3 * self.nodes() + self.components() * self.nodes()
    }
}

macro_rules! geometry {
    ($scalar:literal, $vector:literal, $tensor:literal, $kind:expr) => {
        [
            Slot { name: $scalar, kind: $kind, shape: FieldShape::Scalar },
            Slot { name: $vector, kind: $kind, shape: FieldShape::Vector },
            Slot { name: $tensor, kind: $kind, shape: FieldShape::Tensor },
        ]
    };
}

static GEOMETRIES: [[Slot; 3]; 15] = [
    geometry!("SCALAR_POINTS", "VECTOR_POINTS", "TENSOR_POINTS", ElementKind::Point),
    geometry!("SCALAR_LINES", "VECTOR_LINES", "TENSOR_LINES", ElementKind::Bar),
    geometry!("SCALAR_TRIANGLES", "VECTOR_TRIANGLES", "TENSOR_TRIANGLES", ElementKind::Tria),
    geometry!("SCALAR_QUADRANGLES", "VECTOR_QUADRANGLES", "TENSOR_QUADRANGLES", ElementKind::Quad),
    geometry!("SCALAR_TETRAHEDRA", "VECTOR_TETRAHEDRA", "TENSOR_TETRAHEDRA", ElementKind::Tet),
    geometry!("SCALAR_HEXAHEDRA", "VECTOR_HEXAHEDRA", "TENSOR_HEXAHEDRA", ElementKind::Hex),
    geometry!("SCALAR_PRISMS", "VECTOR_PRISMS", "TENSOR_PRISMS", ElementKind::Wedge),
    geometry!("SCALAR_PYRAMIDS", "VECTOR_PYRAMIDS", "TENSOR_PYRAMIDS", ElementKind::Pyramid),
    geometry!("SCALAR_LINES2", "VECTOR_LINES2", "TENSOR_LINES2", ElementKind::Bar2),
    geometry!("SCALAR_TRIANGLES2", "VECTOR_TRIANGLES2", "TENSOR_TRIANGLES2", ElementKind::Tria2),
    geometry!("SCALAR_QUADRANGLES2", "VECTOR_QUADRANGLES2", "TENSOR_QUADRANGLES2", ElementKind::Quad2),
    geometry!("SCALAR_TETRAHEDRA2", "VECTOR_TETRAHEDRA2", "TENSOR_TETRAHEDRA2", ElementKind::Tet2),
    geometry!("SCALAR_HEXAHEDRA2", "VECTOR_HEXAHEDRA2", "TENSOR_HEXAHEDRA2", ElementKind::Hex2),
    geometry!("SCALAR_PRISMS2", "VECTOR_PRISMS2", "TENSOR_PRISMS2", ElementKind::Wedge2),
    geometry!("SCALAR_PYRAMIDS2", "VECTOR_PYRAMIDS2", "TENSOR_PYRAMIDS2", ElementKind::Pyramid2),
];

pub const SLOT_COUNT: usize = 45;

/// All slots in key-table order.
pub fn slots() -> impl Iterator<Item = &'static Slot> {
    GEOMETRIES.iter().flatten()
}

pub fn slot(index: usize) -> Option<&'static Slot> {
    GEOMETRIES.get(index / 3).map(|geometry| &geometry[index % 3])
}

pub fn slot_named(name: &str) -> Option<(usize, &'static Slot)> {
    slots().enumerate().find(|(_, s)| s.name.eq_ignore_ascii_case(name))
}
