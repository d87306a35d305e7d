//! Samcef `.MAI` records.
//!
//! A record lists corner nodes as positive integers, `0` as a face separator for
//! solids, and midside nodes as negated integers. The type is never written: it is
//! the number of non-negative tokens, negated when midside nodes are present.

use meshx_model::ElementKind;

/// Midside nodes: bottom edges, top edges, vertical edges.
const HEX2: [usize; 20] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 16, 17, 18, 19, 12, 13, 14, 15];
const WEDGE2: [usize; 15] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 12, 13, 14, 9, 10, 11];

pub fn permutation(kind: ElementKind) -> Option<&'static [usize]> {
    match kind {
        ElementKind::Hex2 => Some(&HEX2),
        ElementKind::Wedge2 => Some(&WEDGE2),
        _ => None,
    }
}

pub fn element_kind(code: i32) -> Option<ElementKind> {
    let linear = match code.abs() {
        2 => ElementKind::Bar,
        3 => ElementKind::Tria,
        4 => ElementKind::Quad,
        5 => ElementKind::Tet,
        7 => ElementKind::Wedge,
        9 => ElementKind::Hex,
        _ => return None,
    };
    if code < 0 { linear.quadratic() } else { Some(linear) }
}

pub fn element_code(kind: ElementKind) -> Option<i32> {
    let code = match kind.linear() {
        ElementKind::Bar => 2,
        ElementKind::Tria => 3,
        ElementKind::Quad => 4,
        ElementKind::Tet => 5,
        ElementKind::Wedge => 7,
        ElementKind::Hex => 9,
        _ => return None,
    };
    Some(if kind.is_quadratic() { -code } else { code })
}

/// Type code of a record's node tokens.
pub fn record_code(tokens: &[i32]) -> i32 {
    if tokens.iter().any(|&t| t < 0) {
        let mut non_negative: Vec<i32> = tokens.iter().copied().filter(|&t| t >= 0).collect();
        non_negative.sort_unstable();
        non_negative.dedup();
        -(non_negative.len() as i32)
    } else {
        tokens.len() as i32
    }
}

/// Number of corner nodes written before the `0` face separator, if the kind has one.
pub fn separator_after(kind: ElementKind) -> Option<usize> {
    match kind.linear() {
        ElementKind::Tet | ElementKind::Wedge => Some(3),
        ElementKind::Hex => Some(4),
        _ => None,
    }
}
