//! Samcef solver decks (`.dat`): `.NOE`, `.MAI` and `.SEL` command blocks.
//!
//! A block runs from its 4-character dot command to the next one. `!` lines are
//! comments, `RETURN` ends the deck, and a `$` anywhere in a record continues it on
//! the next physical line.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use chrono::Local;
use log::{debug, info, trace};
use regex::Regex;

use meshx_deck::LineCursor;
use meshx_model::{ElementId, ElementKind, EntityKind, Group, Mesh};

use crate::diagnostics::Diagnostic;
use crate::error::{MeshIoError, Result};
use crate::numeric::{NumberFormat, parse_sci};
use crate::options::{MeshRead, ReadOptions, WriteOptions, WriteReport};
use crate::taxonomy::{NodeOrder, samcef};

pub const COORDINATE_FORMAT: NumberFormat = NumberFormat::new(4, 3);
const IDS_PER_LINE: usize = 8;

static GROUP_NAME: OnceLock<Regex> = OnceLock::new();

fn group_name_regex() -> &'static Regex {
    GROUP_NAME.get_or_init(|| Regex::new(r#""([^"]+)""#).expect("valid group name regex"))
}

fn is_comment(line: &str) -> bool {
    line.starts_with('!')
}

fn is_return(line: &str) -> bool {
    line.trim_start().starts_with("RETURN")
}

fn ends_block(line: &str) -> bool {
    line.starts_with('.') || is_return(line)
}

pub fn read_dat(path: impl AsRef<Path>, options: &ReadOptions) -> Result<MeshRead> {
    let path = path.as_ref();
    info!("Reading Samcef deck {}", path.display());
    let text = fs::read_to_string(path)?;
    let read = parse_dat(&text, options)?;
    info!("Read {}", read.mesh.summary());
    Ok(read)
}

pub fn parse_dat(text: &str, options: &ReadOptions) -> Result<MeshRead> {
    let mut reader = DatReader {
        options,
        read: MeshRead::default(),
        element_kinds: HashMap::new(),
        selection_counter: 0,
    };
    let mut cursor = LineCursor::new(text);
    while let Some(line) = cursor.advance() {
        if is_comment(line) {
            continue;
        }
        if is_return(line) {
            break;
        }
        if !line.starts_with('.') {
            continue;
        }
        let command = line.get(..4).unwrap_or(line);
        let rest = line.get(4..).unwrap_or_default();
        match command {
            ".NOE" => reader.node_block(&mut cursor)?,
            ".MAI" => reader.element_block(&mut cursor)?,
            ".SEL" => reader.selection_block(rest, &mut cursor)?,
            other => trace!("skipping command {other} at line {}", cursor.line_number()),
        }
    }
    Ok(reader.read)
}

/// Next record of the current block, with `$` continuations joined.
fn next_record(cursor: &mut LineCursor<'_>) -> Option<(usize, String)> {
    cursor.skip_while(is_comment);
    let line = cursor.peek()?;
    if ends_block(line) {
        return None;
    }
    cursor.advance();
    let start = cursor.line_number();
    let mut record = line.to_string();
    while record.contains('$') {
        record = record.replace('$', " ");
        match cursor.peek() {
            Some(next) if !ends_block(next) => {
                cursor.advance();
                record.push(' ');
                record.push_str(next);
            }
            _ => break,
        }
    }
    Some((start, record))
}

struct DatReader<'a> {
    options: &'a ReadOptions,
    read: MeshRead,
    element_kinds: HashMap<ElementId, ElementKind>,
    selection_counter: u32,
}

/// One `GROUP` entry of a `.SEL` block.
struct Selection {
    line: usize,
    info: String,
    payload: Vec<String>,
}

impl DatReader<'_> {
    fn node_block(&mut self, cursor: &mut LineCursor<'_>) -> Result<()> {
        let mut count = 0;
        while let Some((line, record)) = next_record(cursor) {
            let data: Vec<&str> = record
                .split_whitespace()
                .filter(|token| !matches!(*token, "I" | "X" | "Y" | "Z"))
                .collect();
            let [id, x, y, z, ..] = data.as_slice() else {
                return Err(MeshIoError::parse(line, format!("incomplete node record {record:?}")));
            };
            let id: i32 = id
                .parse()
                .map_err(|_| MeshIoError::parse(line, format!("bad node ID {id:?}")))?;
            let mut coords = [0.0; 3];
            for (axis, token) in [x, y, z].into_iter().enumerate() {
                coords[axis] = parse_sci(token)
                    .ok_or_else(|| MeshIoError::parse(line, format!("bad coordinate {token:?}")))?;
            }
            if self.options.nodes {
                self.read.mesh.insert_node(id, coords);
            }
            count += 1;
        }
        debug!(".NOE: {count} nodes");
        Ok(())
    }

    fn element_block(&mut self, cursor: &mut LineCursor<'_>) -> Result<()> {
        let mut count = 0;
        while let Some((line, record)) = next_record(cursor) {
            let tokens: Vec<&str> = record.split_whitespace().collect();
            let ["I", id, "N", nodes @ ..] = tokens.as_slice() else {
                return Err(MeshIoError::parse(line, format!("expected `I <id> N <nodes>`, found {record:?}")));
            };
            let id: ElementId = id
                .parse()
                .map_err(|_| MeshIoError::parse(line, format!("bad element ID {id:?}")))?;
            let nodes: Vec<i32> = nodes
                .iter()
                .map_while(|token| token.parse().ok())
                .collect();

            let code = samcef::record_code(&nodes);
            let Some(kind) = samcef::element_kind(code) else {
                self.read.diagnostics.unsupported_element(format!("samcef code {code}"));
                continue;
            };
            let mut native: Vec<i32> = nodes.iter().copied().filter(|&n| n > 0).collect();
            native.extend(nodes.iter().filter(|&&n| n < 0).map(|n| n.abs()));
            if self.options.elements {
                let canonical = NodeOrder::Samcef.to_canonical(kind, &native);
                self.read.mesh.insert_element(kind, id, canonical)?;
            }
            self.element_kinds.insert(id, kind);
            count += 1;
        }
        debug!(".MAI: {count} elements");
        Ok(())
    }

    fn selection_block(&mut self, header: &str, cursor: &mut LineCursor<'_>) -> Result<()> {
        let mut selections: Vec<Selection> = Vec::new();
        let mut lines = vec![(cursor.line_number(), header.to_string())];
        while let Some(record) = next_record(cursor) {
            lines.push(record);
        }
        for (line, text) in lines {
            let trimmed = text.trim();
            if let Some(info) = trimmed.strip_prefix("GROUP") {
                selections.push(Selection {
                    line,
                    info: info.trim().to_string(),
                    payload: Vec::new(),
                });
            } else if let Some(current) = selections.last_mut()
                && !trimmed.is_empty()
            {
                current.payload.push(trimmed.to_string());
            }
        }
        for selection in selections {
            self.selection(selection);
        }
        Ok(())
    }

    fn selection_name(&mut self, info: &str) -> String {
        if let Some(captures) = group_name_regex().captures(info) {
            return captures[1].to_string();
        }
        match info.split_whitespace().next().and_then(|t| t.parse::<u32>().ok()) {
            Some(number) => self.selection_counter = number,
            None => self.selection_counter += 1,
        }
        format!("selection_{:03}", self.selection_counter)
    }

    fn selection(&mut self, selection: Selection) {
        let name = self.selection_name(&selection.info);
        if !self.options.groups {
            return;
        }
        let mut info_tokens = selection.info.split_whitespace().peekable();
        if info_tokens.peek().is_some_and(|t| t.parse::<u32>().is_ok()) {
            info_tokens.next();
        }
        let what = info_tokens.next().unwrap_or_default();
        let payload = selection.payload.join("\n");
        trace!("selection {name} ({what}) at line {}", selection.line);

        if !matches!(what, "NOEUDS" | "MAILLES" | "FACES")
            || !(payload.starts_with('I') || payload.starts_with("MAILLE"))
        {
            self.drop_group(&name, format!("cannot read selection of {what:?}"));
            return;
        }

        let ids: Vec<i32> = match what {
            "FACES" => payload
                .lines()
                .filter_map(|face| face.split_whitespace().nth(1)?.parse().ok())
                .collect(),
            _ => payload
                .split_whitespace()
                .skip(1)
                .filter_map(|token| token.parse().ok())
                .collect(),
        };

        let mut group = Group::new();
        if what == "NOEUDS" {
            group.extend(EntityKind::Node, ids);
        } else {
            for id in ids {
                match self.element_kinds.get(&id) {
                    Some(&kind) => group.push(EntityKind::Element(kind), id),
                    None => {
                        self.drop_group(&name, format!("element {id} is not defined"));
                        return;
                    }
                }
            }
        }
        let target = self.read.mesh.groups.entry(name).or_default();
        for (kind, ids) in group.members {
            target.extend(kind, ids);
        }
    }

    fn drop_group(&mut self, name: &str, reason: String) {
        self.read.diagnostics.push(Diagnostic::DroppedGroup {
            group: name.to_string(),
            reason,
        });
    }
}

pub fn write_dat(path: impl AsRef<Path>, mesh: &Mesh, options: &WriteOptions) -> Result<WriteReport> {
    let path = path.as_ref();
    let mut report = WriteReport::new(path);
    let text = format_dat(mesh, options, &mut report);
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

/// `N` record tokens: corners with the face separator, then negated midsides.
fn element_record(kind: ElementKind, nodes: &[i32]) -> String {
    let native = NodeOrder::Samcef.from_canonical(kind, nodes);
    let (corners, midsides) = native.split_at(kind.corner_count().min(native.len()));
    let mut tokens: Vec<String> = corners.iter().map(i32::to_string).collect();
    if let Some(split) = samcef::separator_after(kind)
        && split < tokens.len()
    {
        tokens.insert(split, "0".to_string());
    }
    tokens.extend(midsides.iter().map(|n| format!("-{n}")));
    format!("N {}", tokens.join(" "))
}

fn selection_lines(ids: &[i32]) -> String {
    let lines: Vec<String> = ids
        .chunks(IDS_PER_LINE)
        .map(|chunk| chunk.iter().map(i32::to_string).collect::<Vec<_>>().join(" "))
        .collect();
    format!(" I {}", lines.join(" $\n "))
}

fn format_dat(mesh: &Mesh, options: &WriteOptions, report: &mut WriteReport) -> String {
    let number_format = options.number_format_or(COORDINATE_FORMAT);
    let now = Local::now();
    let rule = "-".repeat(40);
    let mut out = String::new();
    let mut push = |line: String| {
        out.push_str(&line);
        out.push('\n');
    };

    push(".INIT &".to_string());
    push("! DAT written by meshx".to_string());
    push(format!(
        "! date / time:  {:<12}{:<12}",
        now.format("%d-%m-%y"),
        now.format("%H:%M:%S")
    ));
    push(format!("! {rule}"));
    push(".ASEF &".to_string());
    push("MODE I 0 LECT 132 M 1 ECHO 1".to_string());
    push(format!("!{rule}\n! Topology\n!{rule}"));

    if options.nodes {
        push(".NOE".to_string());
        for (id, [x, y, z]) in &mesh.nodes {
            push(format!(
                "     I {id} X {} Y {} Z {}",
                number_format.format(*x),
                number_format.format(*y),
                number_format.format(*z)
            ));
            report.nodes += 1;
        }
    }

    if options.elements {
        let mut records = Vec::new();
        for (&kind, block) in &mesh.elements {
            if samcef::element_code(kind).is_none() {
                for &id in block.keys() {
                    report.diagnostics.push(Diagnostic::Unwritable {
                        kind,
                        id,
                        reason: "no Samcef element code".to_string(),
                    });
                }
                continue;
            }
            for (&id, nodes) in block {
                records.push((id, kind, element_record(kind, nodes)));
            }
        }
        records.sort_by_key(|(id, kind, _)| (*id, *kind));
        push(".MAI".to_string());
        for (id, _, record) in records {
            push(format!("     I {id} {record}"));
            report.elements += 1;
        }
    }

    if options.groups {
        let mut number = 1;
        for (name, group) in &mesh.groups {
            let mut elements = Vec::new();
            for (kind, ids) in group.elements() {
                if samcef::element_code(kind).is_some() {
                    elements.extend_from_slice(ids);
                } else {
                    report.diagnostics.push(Diagnostic::UnsupportedEntity {
                        group: name.clone(),
                        code: kind.to_string(),
                    });
                }
            }
            let nodes = group.nodes();
            let mixed = !nodes.is_empty() && !elements.is_empty();
            let suffix = |tag: &str| if mixed { tag.to_string() } else { String::new() };

            if !nodes.is_empty() {
                push(format!(".SEL GROUP {number} NOEUDS NOM \"{name}{}\"", suffix("_n")));
                push(selection_lines(nodes));
                number += 1;
            }
            if !elements.is_empty() {
                push(format!(".SEL GROUP {number} MAILLES NOM \"{name}{}\"", suffix("_e")));
                push(selection_lines(&elements));
                number += 1;
            }
            report.groups += 1;
        }
    }
    push("RETURN".to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECK: &str = "\
! test deck
.NOE
     I 1 X 0.0 Y 0.0 Z 0.0
     I 2 X 1.0E+000 Y 0.0 Z 0.0
     I 3 X 0.0 Y 1.0 Z 0.0
     I 4 X 0.0 Y 0.0 Z 1.0
! midsides
     I 5 X 0.5 Y 0.0 Z 0.0
.MAI
     I 10 N 1 2 3 0 4
     I 11 N 1 2 $
 3
     I 12 N 1 2 -5
.SEL GROUP 1 NOEUDS NOM \"base\"
 I 1 2 3 $
 4
.SEL
GROUP 2 MAILLES
 I 10 11
RETURN
.NOE
     I 99 X 9.0 Y 9.0 Z 9.0
";

    #[test]
    fn reads_blocks_until_return() {
        let read = parse_dat(DECK, &ReadOptions::default()).expect("deck should parse");
        let mesh = &read.mesh;
        assert_eq!(mesh.nodes.len(), 5);
        assert!(!mesh.nodes.contains_key(&99));
        assert_eq!(mesh.nodes[&2], [1.0, 0.0, 0.0]);
        assert_eq!(mesh.element(ElementKind::Tet, 10), Some(&[1, 2, 3, 4][..]));
        assert_eq!(mesh.element(ElementKind::Tria, 11), Some(&[1, 2, 3][..]));
        assert_eq!(mesh.element(ElementKind::Bar2, 12), Some(&[1, 2, 5][..]));
        assert!(read.diagnostics.is_empty());
    }

    #[test]
    fn selections_are_named_and_resolved() {
        let read = parse_dat(DECK, &ReadOptions::default()).expect("deck should parse");
        let groups = &read.mesh.groups;
        assert_eq!(groups["base"].nodes(), &[1, 2, 3, 4]);
        let second = &groups["selection_002"];
        assert_eq!(second.members[&EntityKind::Element(ElementKind::Tet)], vec![10]);
        assert_eq!(second.members[&EntityKind::Element(ElementKind::Tria)], vec![11]);
    }

    #[test]
    fn unnamed_selections_use_running_counter() {
        let deck = ".NOE\n I 1 X 0 Y 0 Z 0\n.SEL\nGROUP NOEUDS\n I 1\nGROUP NOEUDS\n I 1\n";
        let read = parse_dat(deck, &ReadOptions::default()).expect("deck should parse");
        let names: Vec<&str> = read.mesh.groups.keys().map(String::as_str).collect();
        assert_eq!(names, ["selection_001", "selection_002"]);
    }

    #[test]
    fn unreadable_selections_are_dropped() {
        let deck = ".SEL GROUP 1 ARETES\n I 1 2\n.SEL GROUP 2 MAILLES\n I 7\n";
        let read = parse_dat(deck, &ReadOptions::default()).expect("deck should parse");
        assert!(read.mesh.groups.is_empty());
        assert_eq!(read.diagnostics.len(), 2);
        assert!(read.diagnostics.iter().all(|d| matches!(d, Diagnostic::DroppedGroup { .. })));
    }

    #[test]
    fn hex2_record_round_trips_through_separator_layout() {
        let nodes: Vec<i32> = (1..=20).collect();
        let record = element_record(ElementKind::Hex2, &nodes);
        assert!(record.starts_with("N 1 2 3 4 0 5 6 7 8 -9 -10 -11 -12 -17"));

        let deck = format!(".MAI\n     I 1 {record}\n");
        let read = parse_dat(&deck, &ReadOptions::default()).expect("deck should parse");
        assert_eq!(read.mesh.element(ElementKind::Hex2, 1), Some(nodes.as_slice()));
    }

    #[test]
    fn writer_suffixes_mixed_groups_only() {
        let mut mesh = Mesh::new();
        for id in 1..=3 {
            mesh.insert_node(id, [id as f64, 0.0, 0.0]);
        }
        mesh.insert_element(ElementKind::Tria, 1, vec![1, 2, 3]).unwrap();
        let mut mixed = Group::with_nodes([1, 2]);
        mixed.push(EntityKind::Element(ElementKind::Tria), 1);
        mesh.groups.insert("mixed".to_string(), mixed);
        mesh.groups.insert("plain".to_string(), Group::with_nodes(1..=10));

        let mut report = WriteReport::new("mem.dat");
        let text = format_dat(&mesh, &WriteOptions::default(), &mut report);
        assert!(text.contains("     I 2 X 2.0000E+000 Y 0.0000E+000 Z 0.0000E+000\n"));
        assert!(text.contains("     I 1 N 1 2 3\n"));
        assert!(text.contains(".SEL GROUP 1 NOEUDS NOM \"mixed_n\"\n I 1 2\n"));
        assert!(text.contains(".SEL GROUP 2 MAILLES NOM \"mixed_e\"\n I 1\n"));
        assert!(text.contains(".SEL GROUP 3 NOEUDS NOM \"plain\"\n I 1 2 3 4 5 6 7 8 $\n 9 10\n"));
        assert!(text.ends_with("RETURN\n"));
        assert_eq!(report.groups, 2);
    }
}
