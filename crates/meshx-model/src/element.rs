//! Canonical element kinds.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Format-independent element topology.
///
/// Node lists stored under a kind are always in canonical order: corner nodes first,
/// then midside nodes. For quadratic solids the midside nodes run bottom face edges,
/// vertical edges, then top face edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Point,
    Bar,
    Bar2,
    Tria,
    Tria2,
    Quad,
    Quad2,
    Tet,
    Tet2,
    Wedge,
    Wedge2,
    Hex,
    Hex2,
    Pyramid,
    Pyramid2,
}

impl ElementKind {
    pub const ALL: [ElementKind; 15] = [
        ElementKind::Point,
        ElementKind::Bar,
        ElementKind::Bar2,
        ElementKind::Tria,
        ElementKind::Tria2,
        ElementKind::Quad,
        ElementKind::Quad2,
        ElementKind::Tet,
        ElementKind::Tet2,
        ElementKind::Wedge,
        ElementKind::Wedge2,
        ElementKind::Hex,
        ElementKind::Hex2,
        ElementKind::Pyramid,
        ElementKind::Pyramid2,
    ];

    /// Number of nodes an element of this kind references.
    pub fn node_count(self) -> usize {
        match self {
            ElementKind::Point => 1,
            ElementKind::Bar => 2,
            ElementKind::Bar2 => 3,
            ElementKind::Tria => 3,
            ElementKind::Tria2 => 6,
            ElementKind::Quad => 4,
            ElementKind::Quad2 => 8,
            ElementKind::Tet => 4,
            ElementKind::Tet2 => 10,
            ElementKind::Wedge => 6,
            ElementKind::Wedge2 => 15,
            ElementKind::Hex => 8,
            ElementKind::Hex2 => 20,
            ElementKind::Pyramid => 5,
            ElementKind::Pyramid2 => 13,
        }
    }

    /// Number of corner (vertex) nodes.
    pub fn corner_count(self) -> usize {
        self.linear().node_count()
    }

    pub fn is_quadratic(self) -> bool {
        self.linear() != self
    }

    /// First-order counterpart (`hex2` -> `hex`); linear kinds map to themselves.
    pub fn linear(self) -> ElementKind {
        match self {
            ElementKind::Bar2 => ElementKind::Bar,
            ElementKind::Tria2 => ElementKind::Tria,
            ElementKind::Quad2 => ElementKind::Quad,
            ElementKind::Tet2 => ElementKind::Tet,
            ElementKind::Wedge2 => ElementKind::Wedge,
            ElementKind::Hex2 => ElementKind::Hex,
            ElementKind::Pyramid2 => ElementKind::Pyramid,
            other => other,
        }
    }

    /// Second-order counterpart (`hex` -> `hex2`). Points have none.
    pub fn quadratic(self) -> Option<ElementKind> {
        match self.linear() {
            ElementKind::Bar => Some(ElementKind::Bar2),
            ElementKind::Tria => Some(ElementKind::Tria2),
            ElementKind::Quad => Some(ElementKind::Quad2),
            ElementKind::Tet => Some(ElementKind::Tet2),
            ElementKind::Wedge => Some(ElementKind::Wedge2),
            ElementKind::Hex => Some(ElementKind::Hex2),
            ElementKind::Pyramid => Some(ElementKind::Pyramid2),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            ElementKind::Point => "point",
            ElementKind::Bar => "bar",
            ElementKind::Bar2 => "bar2",
            ElementKind::Tria => "tria",
            ElementKind::Tria2 => "tria2",
            ElementKind::Quad => "quad",
            ElementKind::Quad2 => "quad2",
            ElementKind::Tet => "tet",
            ElementKind::Tet2 => "tet2",
            ElementKind::Wedge => "wedge",
            ElementKind::Wedge2 => "wedge2",
            ElementKind::Hex => "hex",
            ElementKind::Hex2 => "hex2",
            ElementKind::Pyramid => "pyramid",
            ElementKind::Pyramid2 => "pyramid2",
        }
    }
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ElementKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| ModelError::UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadratic_kinds_extend_their_linear_corners() {
        for kind in ElementKind::ALL {
            if let Some(quad) = kind.quadratic() {
                assert!(quad.is_quadratic());
                assert_eq!(quad.linear(), kind.linear());
                assert!(quad.node_count() > kind.corner_count());
            }
        }
        assert_eq!(ElementKind::Hex2.corner_count(), 8);
        assert_eq!(ElementKind::Wedge2.node_count(), 15);
        assert_eq!(ElementKind::Point.quadratic(), None);
    }

    #[test]
    fn tags_parse_back() {
        for kind in ElementKind::ALL {
            assert_eq!(kind.tag().parse::<ElementKind>().unwrap(), kind);
        }
        assert!("brick".parse::<ElementKind>().is_err());
    }
}
