//! Abaqus `*ELEMENT, TYPE=` keywords.

use meshx_model::ElementKind;

/// C3D20: bottom edges, top edges, vertical edges.
const HEX2: [usize; 20] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 16, 17, 18, 19, 12, 13, 14, 15];
/// C3D15: bottom edges, top edges, vertical edges.
const WEDGE2: [usize; 15] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 12, 13, 14, 9, 10, 11];
/// B32: end, mid, end.
const BAR2: [usize; 3] = [0, 2, 1];

pub fn permutation(kind: ElementKind) -> Option<&'static [usize]> {
    match kind {
        ElementKind::Hex2 => Some(&HEX2),
        ElementKind::Wedge2 => Some(&WEDGE2),
        ElementKind::Bar2 => Some(&BAR2),
        _ => None,
    }
}

/// Canonical kind of an element keyword (case-insensitive).
pub fn element_kind(keyword: &str) -> Option<ElementKind> {
    let kind = match keyword.trim().to_ascii_uppercase().as_str() {
        "C3D4" | "DC3D4" => ElementKind::Tet,
        "C3D6" | "DC3D6" => ElementKind::Wedge,
        "C3D8" | "C3D8I" | "C3D8R" | "DC3D8" => ElementKind::Hex,
        "C3D10" | "DC3D10" => ElementKind::Tet2,
        "C3D15" | "DC3D15" => ElementKind::Wedge2,
        "C3D20" | "C3D20R" | "C3D20RI" | "DC3D20" => ElementKind::Hex2,
        "S3" | "S3R" | "CPS3" | "CPE3" | "CAX3" => ElementKind::Tria,
        "S4" | "S4R" | "CPS4" | "CPE4" | "CAX4" => ElementKind::Quad,
        "S6" | "STRI65" | "CPS6" | "CPE6" | "CAX6" => ElementKind::Tria2,
        "S8" | "S8R" | "CPS8" | "CPS8R" | "CPE8" | "CPE8R" | "CAX8" | "CAX8R" => {
            ElementKind::Quad2
        }
        "B31" => ElementKind::Bar,
        "B32" | "B32R" => ElementKind::Bar2,
        _ => return None,
    };
    Some(kind)
}

/// Keyword written for `kind`; points and pyramids have none.
pub fn keyword(kind: ElementKind) -> Option<&'static str> {
    let keyword = match kind {
        ElementKind::Tet => "C3D4",
        ElementKind::Wedge => "C3D6",
        ElementKind::Hex => "C3D8",
        ElementKind::Tet2 => "C3D10",
        ElementKind::Wedge2 => "C3D15",
        ElementKind::Hex2 => "C3D20",
        ElementKind::Tria => "S3R",
        ElementKind::Quad => "S4R",
        ElementKind::Bar => "B31",
        ElementKind::Tria2 => "STRI65",
        ElementKind::Quad2 => "S8R",
        ElementKind::Bar2 => "B32",
        ElementKind::Point | ElementKind::Pyramid | ElementKind::Pyramid2 => return None,
    };
    Some(keyword)
}
