//! Patran neutral files (`.out`).
//!
//! A file is a sequence of packets. Each packet starts with a header card of
//! fixed-width integer columns:
//!
//! | columns | field                                   |
//! |---------|-----------------------------------------|
//! | 0..2    | packet type (`1` node, `2` element, ...) |
//! | 2..10   | ID                                      |
//! | 10..18  | IV (shape code, pair count, ...)        |
//! | 18..26  | KC: number of data cards that follow    |
//!
//! The reader consumes exactly KC cards after each header, so unknown packets are
//! skipped without being interpreted.

use std::fs;
use std::path::Path;

use chrono::Local;
use log::{debug, info, trace};

use meshx_deck::LineCursor;
use meshx_model::{ElementKind, Group, Mesh};

use crate::diagnostics::Diagnostic;
use crate::error::{MeshIoError, Result};
use crate::numeric::{NumberFormat, int_column, parse_sci, scan_floats};
use crate::options::{MeshRead, ReadOptions, WriteOptions, WriteReport};
use crate::taxonomy::patran::{self, GroupEntity};

/// Coordinates: 9 decimals, 1 exponent digit, 16-character columns.
pub const COORDINATE_FORMAT: NumberFormat = NumberFormat::new(9, 1);
const COORDINATE_WIDTH: usize = 16;
const ZERO_FORMAT: NumberFormat = NumberFormat::new(9, 2);
const COLUMN: usize = 8;
const NODES_PER_CARD: usize = 10;
const PAIRS_PER_CARD: usize = 5;

const NODE_PACKET: i64 = 1;
const ELEMENT_PACKET: i64 = 2;
const GROUP_PACKET: i64 = 21;
const END_PACKET: i64 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PacketHeader {
    kind: i64,
    id: i64,
    iv: i64,
    kc: usize,
}

impl PacketHeader {
    fn parse(line: &str, line_number: usize) -> Result<Self> {
        let field = |start: usize| int_column(line, start, start + COLUMN);
        let kind = int_column(line, 0, 2).ok_or_else(|| {
            MeshIoError::parse(line_number, format!("expected packet header, found {line:?}"))
        })?;
        let kc = field(18).unwrap_or(0);
        if kc < 0 {
            return Err(MeshIoError::parse(line_number, format!("negative card count {kc}")));
        }
        Ok(Self {
            kind,
            id: field(2).unwrap_or(0),
            iv: field(10).unwrap_or(0),
            kc: kc as usize,
        })
    }
}

pub fn read_out(path: impl AsRef<Path>, options: &ReadOptions) -> Result<MeshRead> {
    let path = path.as_ref();
    info!("Reading Patran neutral file {}", path.display());
    let text = fs::read_to_string(path)?;
    let read = parse_out(&text, options)?;
    info!("Read {}", read.mesh.summary());
    Ok(read)
}

pub fn parse_out(text: &str, options: &ReadOptions) -> Result<MeshRead> {
    let mut cursor = LineCursor::new(text);
    let mut read = MeshRead::default();

    while let Some(line) = cursor.advance() {
        if line.trim().is_empty() {
            continue;
        }
        let header = PacketHeader::parse(line, cursor.line_number())?;
        if header.kind == END_PACKET {
            break;
        }
        let start = cursor.line_number() + 1;
        let cards = cursor.take(header.kc)?;
        if let Some(offset) = cards.iter().position(|card| is_end_packet(card)) {
            return Err(MeshIoError::parse(
                start + offset,
                format!(
                    "packet {} declares {} cards but only {offset} precede the end packet",
                    header.kind, header.kc
                ),
            ));
        }
        match header.kind {
            NODE_PACKET if options.nodes => node_packet(&header, &cards, start, &mut read.mesh)?,
            ELEMENT_PACKET if options.elements => element_packet(&header, &cards, &mut read)?,
            GROUP_PACKET if options.groups => group_packet(&cards, &mut read),
            other => trace!("Skipped packet {other} ({} cards)", header.kc),
        }
    }
    Ok(read)
}

/// A `99` header card: packet type and the ID/IV/KC columns all integers.
fn is_end_packet(card: &str) -> bool {
    int_column(card, 0, 2) == Some(END_PACKET)
        && (0..3).all(|j| int_column(card, 2 + j * COLUMN, 2 + (j + 1) * COLUMN).is_some())
}

fn node_packet(header: &PacketHeader, cards: &[&str], line: usize, mesh: &mut Mesh) -> Result<()> {
    let coords_card = cards
        .first()
        .ok_or_else(|| MeshIoError::parse(line, format!("node {} has no coordinates", header.id)))?;
    let coords = parse_coordinates(coords_card)
        .ok_or_else(|| MeshIoError::parse(line, format!("bad coordinates for node {}", header.id)))?;
    mesh.insert_node(header.id as i32, coords);
    Ok(())
}

/// Three 16-character columns, or any three numeric tokens when the columns ran together.
fn parse_coordinates(card: &str) -> Option<[f64; 3]> {
    let columns: Option<Vec<f64>> = (0..3)
        .map(|i| {
            card.get(i * COORDINATE_WIDTH..(i + 1) * COORDINATE_WIDTH)
                .and_then(parse_sci)
        })
        .collect();
    let values = match columns {
        Some(values) => values,
        None => scan_floats(card),
    };
    match values.as_slice() {
        [x, y, z, ..] => Some([*x, *y, *z]),
        _ => None,
    }
}

fn element_packet(header: &PacketHeader, cards: &[&str], read: &mut MeshRead) -> Result<()> {
    // cards[0] is the data card (node count, config, offsets)
    let nodes: Vec<i32> = cards
        .iter()
        .skip(1)
        .flat_map(|card| integer_columns(card, NODES_PER_CARD))
        .filter(|&id| id != 0)
        .map(|id| id as i32)
        .collect();

    match patran::promoted_kind(header.iv, nodes.len()) {
        Some(kind) => read.mesh.insert_element(kind, header.id as i32, nodes)?,
        None => read
            .diagnostics
            .unsupported_element(format!("patran shape {}", header.iv)),
    }
    Ok(())
}

/// `count` 8-character integer columns. Blank or unreadable columns are 0 so later
/// columns keep their position.
fn integer_columns(card: &str, count: usize) -> impl Iterator<Item = i64> + '_ {
    (0..count).map(move |j| int_column(card, j * COLUMN, (j + 1) * COLUMN).unwrap_or(0))
}

fn group_packet(cards: &[&str], read: &mut MeshRead) {
    let Some((name, pair_cards)) = cards.split_first() else {
        return;
    };
    let name = name.trim().to_string();
    let values: Vec<i64> = pair_cards
        .iter()
        .flat_map(|card| integer_columns(card, 2 * PAIRS_PER_CARD))
        .collect();

    let mut group = Group::new();
    let mut skipped = 0usize;
    for pair in values.chunks(2) {
        let &[code, id] = pair else {
            skipped += 1;
            continue;
        };
        if code == 0 && id == 0 {
            continue;
        }
        if code == 0 || id == 0 {
            skipped += 1;
            continue;
        }
        match patran::group_entity(code) {
            Some(GroupEntity::Mesh(kind)) => group.push(kind, id as i32),
            Some(GroupEntity::Coords | GroupEntity::Mpc) | None => skipped += 1,
        }
    }
    if skipped > 0 {
        read.diagnostics.push(Diagnostic::SkippedPairs {
            group: name.clone(),
            count: skipped,
        });
    }
    debug!("Group {name}: {} members", group.len());

    let target = read.mesh.groups.entry(name).or_default();
    for (kind, ids) in group.members {
        target.extend(kind, ids);
    }
}

pub fn write_out(path: impl AsRef<Path>, mesh: &Mesh, options: &WriteOptions) -> Result<WriteReport> {
    let path = path.as_ref();
    let mut report = WriteReport::new(path);
    let title = format!(
        "P3/PATRAN Neutral File from: {}",
        fs::canonicalize(path.parent().unwrap_or(Path::new(".")))
            .map(|dir| dir.join(path.file_name().unwrap_or_default()))
            .unwrap_or_else(|_| path.to_path_buf())
            .display()
    );
    let text = format_out(mesh, options, &title, &mut report);
    fs::write(path, text)?;
    info!(
        "Wrote {} ({} nodes, {} elements, {} groups)",
        path.display(),
        report.nodes,
        report.elements,
        report.groups
    );
    Ok(report)
}

fn header_card(kind: i64, id: i64, iv: i64, kc: usize, extra: [i64; 5]) -> String {
    let mut card = format!("{kind:>2}{id:>8}{iv:>8}{kc:>8}");
    for value in extra {
        card.push_str(&format!("{value:>8}"));
    }
    card
}

fn cards_for(count: usize, per_card: usize) -> usize {
    count.div_ceil(per_card)
}

fn format_out(mesh: &Mesh, options: &WriteOptions, title: &str, report: &mut WriteReport) -> String {
    let number_format = options.number_format_or(COORDINATE_FORMAT);
    let now = Local::now();
    let mut out = String::new();

    let mut push = |line: String| {
        out.push_str(&line);
        out.push('\n');
    };

    let writable: Vec<(i32, ElementKind, i64, &Vec<i32>)> = if options.elements {
        let mut elements = Vec::new();
        for (&kind, block) in &mesh.elements {
            for (&id, nodes) in block {
                match patran::element_code(kind) {
                    Some(code) => elements.push((id, kind, code, nodes)),
                    None => report.diagnostics.push(Diagnostic::Unwritable {
                        kind,
                        id,
                        reason: "no Patran shape code".to_string(),
                    }),
                }
            }
        }
        elements.sort_by_key(|(id, kind, _, _)| (*id, *kind));
        elements
    } else {
        Vec::new()
    };
    let node_count = if options.nodes { mesh.nodes.len() } else { 0 };

    push(header_card(25, 0, 0, 1, [0; 5]));
    push(title.chars().take(80).collect());
    push(header_card(26, 0, 0, 1, [node_count as i64, writable.len() as i64, 0, 0, 0]));
    push(format!(
        "{:<12}{:<12}{:>8}",
        now.format("%d-%m-%y"),
        now.format("%H:%M:%S"),
        "3.0"
    ));

    if options.nodes {
        for (&id, coords) in &mesh.nodes {
            push(header_card(NODE_PACKET, id as i64, 0, 2, [0; 5]));
            push(
                coords
                    .iter()
                    .map(|&c| number_format.format_width(c, COORDINATE_WIDTH))
                    .collect(),
            );
            push("1G       6       0       0  000000".to_string());
            report.nodes += 1;
        }
    }

    for (id, _, code, nodes) in &writable {
        let kc = 1 + cards_for(nodes.len(), NODES_PER_CARD);
        push(header_card(ELEMENT_PACKET, *id as i64, *code, kc, [0; 5]));
        let zero = ZERO_FORMAT.format_width(0.0, COORDINATE_WIDTH);
        push(format!("{:>8}{:>8}{:>8}{:>8}{zero}{zero}{zero}", nodes.len(), 0, 0, 0));
        for chunk in nodes.chunks(NODES_PER_CARD) {
            push(chunk.iter().map(|n| format!("{n:>8}")).collect());
        }
        report.elements += 1;
    }

    if options.groups {
        for (index, (name, group)) in mesh.groups.iter().enumerate() {
            let mut pairs = Vec::with_capacity(group.len());
            for (&kind, ids) in &group.members {
                match patran::entity_code(kind) {
                    Some(code) => pairs.extend(ids.iter().map(|&id| (code, id))),
                    None => report.diagnostics.push(Diagnostic::UnsupportedEntity {
                        group: name.clone(),
                        code: kind.to_string(),
                    }),
                }
            }
            let kc = 1 + cards_for(pairs.len(), PAIRS_PER_CARD);
            push(header_card(
                GROUP_PACKET,
                index as i64 + 1,
                2 * pairs.len() as i64,
                kc,
                [0; 5],
            ));
            push(name.clone());
            for chunk in pairs.chunks(PAIRS_PER_CARD) {
                let mut card: String = chunk
                    .iter()
                    .map(|(code, id)| format!("{code:>8}{id:>8}"))
                    .collect();
                for _ in chunk.len()..PAIRS_PER_CARD {
                    card.push_str(&format!("{:>8}{:>8}", 0, 0));
                }
                push(card);
            }
            report.groups += 1;
        }
    }

    push(header_card(END_PACKET, 0, 0, 1, [0; 5]));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshx_model::EntityKind;

    fn entity(kind: ElementKind) -> EntityKind {
        EntityKind::Element(kind)
    }

    const SAMPLE: &str = "\
25       0       0       1       0       0       0       0       0
P3/PATRAN Neutral File from: sample.out
26       0       0       1       4       1       0       0       0
01-01-24    00:00:00         3.0
 1       1       0       2       0       0       0       0       0
 0.000000000E+0 0.000000000E+0 0.000000000E+0
1G       6       0       0  000000
 1       2       0       2       0       0       0       0       0
 1.000000000E+0 0.000000000E+0 0.000000000E+0
1G       6       0       0  000000
 1       3       0       2       0       0       0       0       0
 0.000000000E+0 1.000000000E+0 0.000000000E+0
1G       6       0       0  000000
 1       4       0       2       0       0       0       0       0
 0.000000000E+0 0.000000000E+0-1.500000000E+0
1G       6       0       0  000000
 2       7       5       2       0       0       0       0       0
       4       0       0       0 0.000000000E+00 0.000000000E+00 0.000000000E+00
       1       2       3       4
 5       1       0       2       0       0       0       0       0
some packet we do not know
with two cards
21       1      10       3       0       0       0       0       0
fixed
       5       1       5       2      42       7       9       7      19       1
       5       4       0       0       0       0       0       0       0       0
99       0       0       1       0       0       0       0       0
";

    #[test]
    fn reads_nodes_elements_and_groups() {
        let read = parse_out(SAMPLE, &ReadOptions::default()).expect("sample should parse");
        let mesh = &read.mesh;
        assert_eq!(mesh.nodes.len(), 4);
        assert_eq!(mesh.nodes[&4], [0.0, 0.0, -1.5]);
        assert_eq!(mesh.element(ElementKind::Tet, 7), Some(&[1, 2, 3, 4][..]));

        let fixed = &mesh.groups["fixed"];
        assert_eq!(fixed.nodes(), &[1, 2, 4]);
        assert_eq!(fixed.members[&entity(ElementKind::Tet)], vec![7]);
    }

    #[test]
    fn unknown_entity_codes_are_counted_not_fatal() {
        let read = parse_out(SAMPLE, &ReadOptions::default()).expect("sample should parse");
        // code 42 is unknown and code 19 is a coordinate frame
        assert_eq!(
            read.diagnostics.entries(),
            &[Diagnostic::SkippedPairs {
                group: "fixed".to_string(),
                count: 2
            }]
        );
        assert_eq!(read.mesh.groups["fixed"].len(), 4);
    }

    #[test]
    fn long_node_list_is_read_as_quadratic() {
        let text = "\
 2       3       5       2       0       0       0       0       0
      10       0       0       0 0.000000000E+00 0.000000000E+00 0.000000000E+00
       1       2       3       4       5       6       7       8       9      10
99       0       0       1       0       0       0       0       0
";
        let read = parse_out(text, &ReadOptions::default()).expect("element should parse");
        assert_eq!(
            read.mesh.element(ElementKind::Tet2, 3),
            Some(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10][..])
        );
        assert!(read.mesh.elements.get(&ElementKind::Tet).is_none());
    }

    #[test]
    fn unknown_shape_code_is_skipped_with_diagnostic() {
        let text = "\
 2       3       6       2       0       0       0       0       0
       4       0       0       0 0.000000000E+00 0.000000000E+00 0.000000000E+00
       1       2       3       4
";
        let read = parse_out(text, &ReadOptions::default()).expect("file should parse");
        assert_eq!(read.mesh.element_count(), 0);
        assert_eq!(read.diagnostics.len(), 1);
    }

    #[test]
    fn disabled_sections_are_consumed_but_left_empty() {
        let read = parse_out(SAMPLE, &ReadOptions::groups_only()).expect("sample should parse");
        assert!(read.mesh.nodes.is_empty());
        assert_eq!(read.mesh.element_count(), 0);
        assert_eq!(read.mesh.groups.len(), 1);
    }

    #[test]
    fn truncated_packet_fails() {
        let text = " 1       1       0       2       0       0       0       0       0\n 0.0 0.0 0.0\n";
        let err = parse_out(text, &ReadOptions::default()).expect_err("one card is missing");
        assert!(matches!(err, MeshIoError::Deck(_)));
    }

    #[test]
    fn card_count_running_into_the_trailer_fails() {
        let text = "\
 2       3       5       3       0       0       0       0       0
      10       0       0       0 0.000000000E+00 0.000000000E+00 0.000000000E+00
       1       2       3       4       5       6       7       8       9      10
99       0       0       1       0       0       0       0       0
";
        let err = parse_out(text, &ReadOptions::default()).expect_err("KC overruns the packet");
        assert!(matches!(err, MeshIoError::Parse { line: 4, .. }), "{err}");
    }

    #[test]
    fn unreadable_group_column_does_not_shift_pairs() {
        let text = "\
21       1       6       2       0       0       0       0       0
support
       5       1       x       2       5       4
99       0       0       1       0       0       0       0       0
";
        let read = parse_out(text, &ReadOptions::default()).expect("group should parse");
        assert_eq!(read.mesh.groups["support"].nodes(), &[1, 4]);
        assert_eq!(
            read.diagnostics.entries(),
            &[Diagnostic::SkippedPairs {
                group: "support".to_string(),
                count: 1
            }]
        );
    }

    #[test]
    fn writer_emits_fixed_columns() {
        let mut mesh = Mesh::new();
        mesh.insert_node(12, [1234.5, -0.25, 0.0]);
        mesh.insert_node(13, [0.0, 0.0, 0.0]);
        mesh.insert_element(ElementKind::Bar, 3, vec![12, 13]).unwrap();
        mesh.insert_element(ElementKind::Pyramid, 4, vec![12, 13, 12, 13, 12]).unwrap();

        let mut report = WriteReport::new("mem.out");
        let text = format_out(&mesh, &WriteOptions::default(), "t", &mut report);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[4], " 1      12       0       2       0       0       0       0       0");
        assert_eq!(lines[5], "  1.234500000E+3 -2.500000000E-1  0.000000000E+0");
        assert!(lines.contains(&" 2       3       2       2       0       0       0       0       0"));
        assert!(lines.contains(&"      12      13"));
        assert_eq!(lines.last(), Some(&"99       0       0       1       0       0       0       0       0"));
        assert_eq!(report.elements, 1);
        assert!(matches!(
            report.diagnostics.entries(),
            [Diagnostic::Unwritable { kind: ElementKind::Pyramid, id: 4, .. }]
        ));
    }
}
