//! Abaqus keyword decks (`.inp`): `*NODE`, `*ELEMENT`, `*NSET` and `*ELSET` cards.
//!
//! Element sets are resolved against the element IDs seen so far, so a set must
//! come after the elements it names. A set naming an unknown element is dropped
//! as a whole.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::Local;
use log::{debug, info};

use meshx_deck::{Card, Deck};
use meshx_model::{ElementId, ElementKind, EntityKind, Group, Mesh, NodeId};

use crate::diagnostics::Diagnostic;
use crate::error::{MeshIoError, Result};
use crate::numeric::{NumberFormat, scan_floats};
use crate::options::{MeshRead, ReadOptions, WriteOptions, WriteReport};
use crate::taxonomy::{NodeOrder, abaqus};

/// Coordinates: 9 decimals, 3 exponent digits, 20-character columns.
pub const COORDINATE_FORMAT: NumberFormat = NumberFormat::new(9, 3);
const COORDINATE_WIDTH: usize = 20;
const ENTRIES_PER_LINE: usize = 8;

pub fn read_inp(path: impl AsRef<Path>, options: &ReadOptions) -> Result<MeshRead> {
    let path = path.as_ref();
    info!("Reading Abaqus deck {}", path.display());
    let deck = Deck::parse_file_with_includes(path)?;
    let read = read_deck(&deck, options)?;
    info!("Read {}", read.mesh.summary());
    Ok(read)
}

pub fn parse_inp(text: &str, options: &ReadOptions) -> Result<MeshRead> {
    let deck = Deck::parse_str(text)?;
    read_deck(&deck, options)
}

/// Builds the mesh card by card, keeping the element ID → kind table that set
/// cards are resolved against.
struct DeckReader<'a> {
    options: &'a ReadOptions,
    read: MeshRead,
    element_kinds: HashMap<ElementId, ElementKind>,
}

pub fn read_deck(deck: &Deck, options: &ReadOptions) -> Result<MeshRead> {
    let mut reader = DeckReader {
        options,
        read: MeshRead::default(),
        element_kinds: HashMap::new(),
    };
    for card in &deck.cards {
        match card.normalized_keyword().as_str() {
            "NODE" => reader.node_card(card)?,
            "ELEMENT" => reader.element_card(card)?,
            "NSET" if options.groups => reader.nset_card(card)?,
            "ELSET" if options.groups => reader.elset_card(card)?,
            _ => {}
        }
    }
    Ok(reader.read)
}

impl DeckReader<'_> {
    fn node_card(&mut self, card: &Card) -> Result<()> {
        let nset = card.parameter("NSET").filter(|_| self.options.groups);
        let mut ids = Vec::new();
        for line in &card.data_lines {
            let values = scan_floats(line);
            let Some((&first, rest)) = values.split_first() else {
                return Err(MeshIoError::parse(card.line_start, format!("empty node line {line:?}")));
            };
            let id = float_id(first, card)?;
            let mut coords = [0.0; 3];
            for (axis, &value) in rest.iter().take(3).enumerate() {
                coords[axis] = value;
            }
            if self.options.nodes {
                self.read.mesh.insert_node(id, coords);
            }
            ids.push(id);
        }
        if let Some(name) = nset {
            self.group(name).extend(EntityKind::Node, ids);
        }
        Ok(())
    }

    fn element_card(&mut self, card: &Card) -> Result<()> {
        let keyword = card.parameter("TYPE").ok_or_else(|| {
            MeshIoError::parse(card.line_start, "*ELEMENT card without TYPE")
        })?;
        let records = join_continued(&card.data_lines);
        let Some(kind) = abaqus::element_kind(keyword) else {
            for _ in &records {
                self.read.diagnostics.unsupported_element(keyword);
            }
            return Ok(());
        };

        let mut ids = Vec::with_capacity(records.len());
        for record in &records {
            let values = scan_floats(record)
                .into_iter()
                .map(|value| float_id(value, card))
                .collect::<Result<Vec<i32>>>()?;
            let Some((&id, native)) = values.split_first() else {
                continue;
            };
            if self.options.elements {
                let canonical = NodeOrder::Abaqus.to_canonical(kind, native);
                self.read.mesh.insert_element(kind, id, canonical)?;
            }
            self.element_kinds.insert(id, kind);
            ids.push(id);
        }
        debug!("*ELEMENT TYPE={keyword}: {} {kind} elements", ids.len());

        if let Some(name) = card.parameter("ELSET").filter(|_| self.options.groups) {
            self.group(name).extend(EntityKind::Element(kind), ids);
        }
        Ok(())
    }

    fn nset_card(&mut self, card: &Card) -> Result<()> {
        let Some(name) = card.parameter("NSET") else {
            return Err(MeshIoError::parse(card.line_start, "*NSET card without NSET name"));
        };
        let mut nodes = Vec::new();
        for entry in set_members(card)? {
            match entry {
                SetEntry::Id(id) => nodes.push(id),
                SetEntry::Set(reference) => match self.read.mesh.groups.get(&reference) {
                    Some(other) => nodes.extend_from_slice(other.nodes()),
                    None => {
                        self.drop_group(name, format!("unknown set {reference}"));
                        return Ok(());
                    }
                },
            }
        }
        self.group(name).extend(EntityKind::Node, nodes);
        Ok(())
    }

    fn elset_card(&mut self, card: &Card) -> Result<()> {
        let Some(name) = card.parameter("ELSET") else {
            return Err(MeshIoError::parse(card.line_start, "*ELSET card without ELSET name"));
        };
        let mut resolved = Group::new();
        for entry in set_members(card)? {
            match entry {
                SetEntry::Id(id) => match self.element_kinds.get(&id) {
                    Some(&kind) => resolved.push(EntityKind::Element(kind), id),
                    None => {
                        self.drop_group(name, format!("element {id} is not defined before the set"));
                        return Ok(());
                    }
                },
                SetEntry::Set(reference) => match self.read.mesh.groups.get(&reference) {
                    Some(other) => {
                        for (kind, ids) in other.elements() {
                            resolved.extend(EntityKind::Element(kind), ids.to_vec());
                        }
                    }
                    None => {
                        self.drop_group(name, format!("unknown set {reference}"));
                        return Ok(());
                    }
                },
            }
        }
        let target = self.group(name);
        for (kind, ids) in resolved.members {
            target.extend(kind, ids);
        }
        Ok(())
    }

    fn group(&mut self, name: &str) -> &mut Group {
        self.read.mesh.groups.entry(name.to_string()).or_default()
    }

    fn drop_group(&mut self, name: &str, reason: String) {
        self.read.diagnostics.push(Diagnostic::DroppedGroup {
            group: name.to_string(),
            reason,
        });
    }
}

fn split_fields(line: &str) -> Vec<&str> {
    line.split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .collect()
}

fn parse_id(field: &str, card: &Card) -> Result<i32> {
    field.parse().map_err(|_| {
        MeshIoError::parse(
            card.line_start,
            format!("expected integer ID in *{}, found {field:?}", card.keyword),
        )
    })
}

/// A scanned number that must be an integral ID.
fn float_id(value: f64, card: &Card) -> Result<i32> {
    if value.fract() == 0.0 && value.abs() <= f64::from(i32::MAX) {
        Ok(value as i32)
    } else {
        Err(MeshIoError::parse(
            card.line_start,
            format!("expected integer ID in *{}, found {value}", card.keyword),
        ))
    }
}

/// Data lines ending with a comma continue on the next line.
fn join_continued(lines: &[String]) -> Vec<String> {
    let mut records = Vec::new();
    let mut pending = String::new();
    for line in lines {
        pending.push_str(line);
        if line.trim_end().ends_with(',') {
            continue;
        }
        records.push(std::mem::take(&mut pending));
    }
    if !pending.trim().is_empty() {
        records.push(pending);
    }
    records
}

/// One member of a set card: an ID or the name of an earlier set.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SetEntry {
    Id(i32),
    Set(String),
}

fn set_members(card: &Card) -> Result<Vec<SetEntry>> {
    if card.has_parameter("GENERATE") {
        let mut ids = Vec::new();
        for line in &card.data_lines {
            let range = split_fields(line)
                .into_iter()
                .map(|field| parse_id(field, card))
                .collect::<Result<Vec<i32>>>()?;
            match range.as_slice() {
                [start, end] => ids.extend(*start..=*end),
                [start, end, step] if *step > 0 => {
                    ids.extend((*start..=*end).step_by(*step as usize))
                }
                _ => {
                    return Err(MeshIoError::parse(
                        card.line_start,
                        format!("GENERATE line {line:?} is not start, end[, step]"),
                    ));
                }
            }
        }
        return Ok(ids.into_iter().map(SetEntry::Id).collect());
    }

    Ok(card
        .data_lines
        .iter()
        .flat_map(|line| split_fields(line))
        .map(|field| match field.parse::<i32>() {
            Ok(id) => SetEntry::Id(id),
            Err(_) => SetEntry::Set(field.to_string()),
        })
        .collect())
}

pub fn write_inp(path: impl AsRef<Path>, mesh: &Mesh, options: &WriteOptions) -> Result<WriteReport> {
    let path = path.as_ref();
    let mut report = WriteReport::new(path);
    let job = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let text = format_inp(mesh, options, &job, &mut report);
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

fn id_lines(ids: impl IntoIterator<Item = i32>) -> Vec<String> {
    let ids: Vec<String> = ids.into_iter().map(|id| id.to_string()).collect();
    ids.chunks(ENTRIES_PER_LINE)
        .map(|chunk| chunk.join(", "))
        .collect()
}

fn format_inp(mesh: &Mesh, options: &WriteOptions, job: &str, report: &mut WriteReport) -> String {
    let number_format = options.number_format_or(COORDINATE_FORMAT);
    let mut out = String::new();
    let mut push = |line: &str| {
        out.push_str(line);
        out.push('\n');
    };

    push("*HEADING");
    push(&format!("{}  meshx export", Local::now().format("%H%M%S %Y%m%d")));
    push(&format!("** JOBNAME IS '{job}'"));
    push("**---------------------------------------");
    push("** Topology");
    push("**---------------------------------------");

    if options.nodes && !mesh.nodes.is_empty() {
        push("*NODE");
        for (id, coords) in &mesh.nodes {
            let columns: Vec<String> = coords
                .iter()
                .map(|&c| number_format.format_width(c, COORDINATE_WIDTH))
                .collect();
            push(&format!("{id:>8},{}", columns.join(",")));
            report.nodes += 1;
        }
    }

    if options.elements {
        for (&kind, block) in &mesh.elements {
            let Some(keyword) = abaqus::keyword(kind) else {
                for &id in block.keys() {
                    report.diagnostics.push(Diagnostic::Unwritable {
                        kind,
                        id,
                        reason: "no Abaqus element type".to_string(),
                    });
                }
                continue;
            };
            push(&format!("*ELEMENT, TYPE={keyword}"));
            for (&id, nodes) in block {
                let mut entries = vec![format!("{id:>8}")];
                entries.extend(
                    NodeOrder::Abaqus
                        .from_canonical(kind, nodes)
                        .iter()
                        .map(|n: &NodeId| format!("{n:>8}")),
                );
                let lines: Vec<String> = entries
                    .chunks(ENTRIES_PER_LINE)
                    .map(|chunk| chunk.join(","))
                    .collect();
                push(&lines.join(",\n"));
                report.elements += 1;
            }
        }
    }

    if options.groups {
        for (name, group) in &mesh.groups {
            if !group.nodes().is_empty() {
                push(&format!("*NSET, NSET={name}"));
                for line in id_lines(group.nodes().iter().copied()) {
                    push(&line);
                }
            }
            let mut elements = Vec::new();
            for (kind, ids) in group.elements() {
                if abaqus::keyword(kind).is_some() {
                    elements.extend_from_slice(ids);
                } else {
                    report.diagnostics.push(Diagnostic::UnsupportedEntity {
                        group: name.clone(),
                        code: kind.to_string(),
                    });
                }
            }
            if !elements.is_empty() {
                push(&format!("*ELSET, ELSET={name}"));
                for line in id_lines(elements) {
                    push(&line);
                }
            }
            report.groups += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECK: &str = "\
*HEADING
beam model
** generated for tests
*NODE, NSET=NALL
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 0.0, 1.0E+000, 0.0
4, 0.0, 0.0, 1.5D0
5, 2.0, 0.0
*ELEMENT, TYPE=C3D4, ELSET=SOLID
10, 1, 2, 3, 4
*ELEMENT, TYPE=S3R
10, 1, 2,
3
11, 2, 3, 5
*ELEMENT, TYPE=SPRINGA
20, 1, 2
*ELSET, ELSET=MIXED
10, 11
*NSET, NSET=EDGE, GENERATE
1, 5, 2
";

    #[test]
    fn reads_cards_into_typed_blocks() {
        let read = parse_inp(DECK, &ReadOptions::default()).expect("deck should parse");
        let mesh = &read.mesh;
        assert_eq!(mesh.nodes.len(), 5);
        assert_eq!(mesh.nodes[&4], [0.0, 0.0, 1.5]);
        assert_eq!(mesh.nodes[&5], [2.0, 0.0, 0.0]);
        assert_eq!(mesh.element(ElementKind::Tet, 10), Some(&[1, 2, 3, 4][..]));
        assert_eq!(mesh.element(ElementKind::Tria, 10), Some(&[1, 2, 3][..]));
        assert_eq!(mesh.element(ElementKind::Tria, 11), Some(&[2, 3, 5][..]));
        assert_eq!(mesh.groups["EDGE"].nodes(), &[1, 3, 5]);
        assert_eq!(mesh.groups["NALL"].nodes().len(), 5);
        assert_eq!(
            mesh.groups["SOLID"].members[&EntityKind::Element(ElementKind::Tet)],
            vec![10]
        );
        assert_eq!(
            read.diagnostics.entries(),
            &[Diagnostic::UnsupportedElement {
                code: "SPRINGA".to_string(),
                count: 1
            }]
        );
    }

    #[test]
    fn element_set_resolves_through_latest_kind_of_each_id() {
        let read = parse_inp(DECK, &ReadOptions::default()).expect("deck should parse");
        // ID 10 was last defined as a tria, so MIXED sees two trias
        let mixed = &read.mesh.groups["MIXED"];
        assert_eq!(mixed.members[&EntityKind::Element(ElementKind::Tria)], vec![10, 11]);
        assert_eq!(mixed.len(), 2);
    }

    #[test]
    fn set_before_its_elements_is_dropped() {
        let deck = "*ELSET, ELSET=EARLY\n7\n*NODE\n1,0,0,0\n2,1,0,0\n*ELEMENT, TYPE=B31\n7, 1, 2\n";
        let read = parse_inp(deck, &ReadOptions::default()).expect("deck should parse");
        assert!(!read.mesh.groups.contains_key("EARLY"));
        assert_eq!(read.mesh.element_count(), 1);
        assert!(matches!(
            read.diagnostics.entries(),
            [Diagnostic::DroppedGroup { group, .. }] if group == "EARLY"
        ));
    }

    #[test]
    fn hex2_is_reordered_to_canonical_midsides() {
        let mut deck = String::from("*ELEMENT, TYPE=C3D20R\n1");
        let native: Vec<String> = (101..=120).map(|n| n.to_string()).collect();
        for chunk in native.chunks(8) {
            deck.push_str(", ");
            deck.push_str(&chunk.join(", "));
            deck.push_str(",\n");
        }
        let deck = deck.trim_end_matches(",\n").to_string() + "\n";
        let read = parse_inp(&deck, &ReadOptions::default()).expect("deck should parse");
        let nodes = read.mesh.element(ElementKind::Hex2, 1).expect("hex2 exists");
        assert_eq!(&nodes[12..16], &[117, 118, 119, 120]);
        assert_eq!(&nodes[16..20], &[113, 114, 115, 116]);
    }

    #[test]
    fn set_can_name_another_set() {
        let deck = "*NODE, NSET=A\n1,0,0,0\n2,1,0,0\n*NSET, NSET=B\nA\n";
        let read = parse_inp(deck, &ReadOptions::default()).expect("deck should parse");
        assert_eq!(read.mesh.groups["B"].nodes(), &[1, 2]);
    }

    #[test]
    fn set_references_and_ids_mix_on_one_line() {
        let deck = "\
*NODE, NSET=A
1,0,0,0
2,1,0,0
*NODE
7,0,1,0
*NSET, NSET=B
A, 7
*ELEMENT, TYPE=B31, ELSET=BARS
3, 1, 2
*ELEMENT, TYPE=S3
4, 1, 2, 7
*ELSET, ELSET=ALL
BARS, 4
";
        let read = parse_inp(deck, &ReadOptions::default()).expect("deck should parse");
        assert_eq!(read.mesh.groups["B"].nodes(), &[1, 2, 7]);
        let all = &read.mesh.groups["ALL"];
        assert_eq!(all.members[&EntityKind::Element(ElementKind::Bar)], vec![3]);
        assert_eq!(all.members[&EntityKind::Element(ElementKind::Tria)], vec![4]);
        assert!(read.diagnostics.is_empty());
    }

    #[test]
    fn data_lines_are_scanned_for_numbers() {
        let deck = "*NODE\n6   3.0  -1.0E-1   2\n*ELEMENT, TYPE=B31\n9 6 6\n";
        let read = parse_inp(deck, &ReadOptions::default()).expect("deck should parse");
        assert_eq!(read.mesh.nodes[&6], [3.0, -0.1, 2.0]);
        assert_eq!(read.mesh.element(ElementKind::Bar, 9), Some(&[6, 6][..]));
    }

    #[test]
    fn fractional_element_id_is_an_error() {
        let deck = "*ELEMENT, TYPE=B31\n9.5, 1, 2\n";
        let err = parse_inp(deck, &ReadOptions::default()).expect_err("IDs are integers");
        assert!(matches!(err, MeshIoError::Parse { .. }));
    }

    #[test]
    fn writer_splits_long_connectivity_with_trailing_commas() {
        let mut mesh = Mesh::new();
        let nodes: Vec<i32> = (1..=10).collect();
        for &n in &nodes {
            mesh.insert_node(n, [n as f64, 0.0, 0.0]);
        }
        mesh.insert_element(ElementKind::Tet2, 1, nodes).unwrap();

        let mut report = WriteReport::new("mem.inp");
        let text = format_inp(&mesh, &WriteOptions::default(), "mem.inp", &mut report);
        assert!(text.contains("*ELEMENT, TYPE=C3D10\n"));
        assert!(text.contains(
            "       1,       1,       2,       3,       4,       5,       6,       7,\n       8,       9,      10\n"
        ));
        assert!(text.contains("       1,    1.000000000E+000,    0.000000000E+000,    0.000000000E+000\n"));
    }
}
