//! Native element vocabularies and node orders of every supported format.
//!
//! Each format module maps its own element codes to [`ElementKind`] and back. Node
//! orders differ only for quadratic kinds; [`NodeOrder`] holds the fixed index
//! permutations that move a native node list into canonical order and back.
//!
//! A permutation `p` reads `canonical[i] = native[p[i]]`.

pub mod abaqus;
pub mod gmsh;
pub mod patran;
pub mod samcef;

use meshx_model::ElementKind;

/// Node ordering convention of one format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeOrder {
    Patran,
    Abaqus,
    Samcef,
    Gmsh,
}

impl NodeOrder {
    pub const ALL: [NodeOrder; 4] = [
        NodeOrder::Patran,
        NodeOrder::Abaqus,
        NodeOrder::Samcef,
        NodeOrder::Gmsh,
    ];

    /// Permutation for `kind`, `None` when the native order already is canonical.
    pub fn permutation(self, kind: ElementKind) -> Option<&'static [usize]> {
        match self {
            NodeOrder::Patran => None,
            NodeOrder::Abaqus => abaqus::permutation(kind),
            NodeOrder::Samcef => samcef::permutation(kind),
            NodeOrder::Gmsh => gmsh::permutation(kind),
        }
    }

    /// Native node list of `kind` in canonical order.
    ///
    /// Lists shorter than the permutation are returned unchanged so the caller's
    /// node-count check reports them.
    pub fn to_canonical<T: Copy>(self, kind: ElementKind, native: &[T]) -> Vec<T> {
        match self.permutation(kind) {
            Some(perm) if native.len() == perm.len() => perm.iter().map(|&i| native[i]).collect(),
            _ => native.to_vec(),
        }
    }

    /// Canonical node list of `kind` in this format's native order.
    pub fn from_canonical<T: Copy>(self, kind: ElementKind, canonical: &[T]) -> Vec<T> {
        match self.permutation(kind) {
            Some(perm) if canonical.len() == perm.len() => {
                let mut native = canonical.to_vec();
                for (i, &p) in perm.iter().enumerate() {
                    native[p] = canonical[i];
                }
                native
            }
            _ => canonical.to_vec(),
        }
    }
}
