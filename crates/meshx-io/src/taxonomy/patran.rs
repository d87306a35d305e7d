//! Patran neutral element shape codes and group entity codes.
//!
//! Element packets only carry the linear shape code; a node list longer than the
//! shape's corner count marks the quadratic variant.

use meshx_model::{ElementKind, EntityKind};

/// Linear kind of a packet-2 shape code.
pub fn element_kind(code: i64) -> Option<ElementKind> {
    let kind = match code {
        2 => ElementKind::Bar,
        3 => ElementKind::Tria,
        4 => ElementKind::Quad,
        5 => ElementKind::Tet,
        7 => ElementKind::Wedge,
        8 => ElementKind::Hex,
        _ => return None,
    };
    Some(kind)
}

/// Kind of an element of shape `code` with `node_count` non-zero nodes.
pub fn promoted_kind(code: i64, node_count: usize) -> Option<ElementKind> {
    let linear = element_kind(code)?;
    if node_count > linear.corner_count() {
        linear.quadratic()
    } else {
        Some(linear)
    }
}

/// Shape code written for `kind` (quadratic kinds share the linear code).
pub fn element_code(kind: ElementKind) -> Option<i64> {
    let code = match kind.linear() {
        ElementKind::Bar => 2,
        ElementKind::Tria => 3,
        ElementKind::Quad => 4,
        ElementKind::Tet => 5,
        ElementKind::Wedge => 7,
        ElementKind::Hex => 8,
        _ => return None,
    };
    Some(code)
}

/// What a packet-21 member code names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupEntity {
    Mesh(EntityKind),
    /// Coordinate frames and MPCs: valid members with no mesh counterpart.
    Coords,
    Mpc,
}

pub fn group_entity(code: i64) -> Option<GroupEntity> {
    let entity = match code {
        5 => GroupEntity::Mesh(EntityKind::Node),
        19 => GroupEntity::Coords,
        22 => GroupEntity::Mpc,
        other => GroupEntity::Mesh(EntityKind::Element(element_of_entity_code(other)?)),
    };
    Some(entity)
}

fn element_of_entity_code(code: i64) -> Option<ElementKind> {
    let kind = match code {
        6 => ElementKind::Bar,
        7 => ElementKind::Tria,
        8 => ElementKind::Quad,
        9 => ElementKind::Tet,
        11 => ElementKind::Wedge,
        12 => ElementKind::Hex,
        106 => ElementKind::Bar2,
        107 => ElementKind::Tria2,
        108 => ElementKind::Quad2,
        109 => ElementKind::Tet2,
        111 => ElementKind::Wedge2,
        112 => ElementKind::Hex2,
        _ => return None,
    };
    Some(kind)
}

pub fn entity_code(kind: EntityKind) -> Option<i64> {
    let code = match kind {
        EntityKind::Node => 5,
        EntityKind::Element(ElementKind::Bar) => 6,
        EntityKind::Element(ElementKind::Tria) => 7,
        EntityKind::Element(ElementKind::Quad) => 8,
        EntityKind::Element(ElementKind::Tet) => 9,
        EntityKind::Element(ElementKind::Wedge) => 11,
        EntityKind::Element(ElementKind::Hex) => 12,
        EntityKind::Element(ElementKind::Bar2) => 106,
        EntityKind::Element(ElementKind::Tria2) => 107,
        EntityKind::Element(ElementKind::Quad2) => 108,
        EntityKind::Element(ElementKind::Tet2) => 109,
        EntityKind::Element(ElementKind::Wedge2) => 111,
        EntityKind::Element(ElementKind::Hex2) => 112,
        EntityKind::Element(_) => return None,
    };
    Some(code)
}
