//! Gmsh binary `.pos` views.
//!
//! Layout of one file:
//!
//! ```text
//! $PostFormat
//! 1.4 1 8
//! $EndPostFormat
//! $View
//! <name> <time steps> <45 block counts>
//! <i32 byte-order marker = 1><f64 time value>
//! <block>...
//! ```
//!
//! Every non-empty block holds `count` records of `stride` little-endian `f64`s:
//! the x, y and z coordinates of each local node, then the field components of
//! each node. Records never share nodes, so each one yields an element plus a
//! fresh node per local slot. IDs are handed out from an explicit [`IdSeed`] and
//! the next free seed is returned, so several files decode without collisions.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use meshx_model::{
    ElementId, Field, FieldShape, FieldValue, FieldsByShape, Mesh, NodeId, Tensor,
};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{MeshIoError, Result};
use crate::options::{ReadOptions, WriteReport};
use crate::taxonomy::NodeOrder;
use crate::taxonomy::gmsh::{self, SLOT_COUNT, Slot};

const PREAMBLE_LINES: usize = 4;
const BYTE_ORDER_MARKER: i32 = 1;
/// Marker plus one time value.
const LEADING_OFFSET: usize = 12;

/// First node and element IDs a decode may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSeed {
    pub node: NodeId,
    pub element: ElementId,
}

impl Default for IdSeed {
    fn default() -> Self {
        Self {
            node: 1,
            element: 1,
        }
    }
}

/// One present block of the key table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEntry {
    pub index: usize,
    pub slot: &'static Slot,
    pub count: usize,
}

impl KeyEntry {
    /// Size of the block in bytes, `None` when the count cannot be addressed.
    pub fn byte_len(&self) -> Option<usize> {
        self.count.checked_mul(self.slot.stride())?.checked_mul(8)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyTable {
    pub view_name: String,
    pub entries: Vec<KeyEntry>,
    /// Byte offset of the binary section (the byte-order marker).
    pub data_start: usize,
}

/// Mesh and fields decoded from one or more views.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PosRead {
    pub mesh: Mesh,
    pub fields: FieldsByShape,
    /// Seed the next file must start from.
    pub next: IdSeed,
    /// Shape of the first block decoded.
    pub primary_shape: Option<FieldShape>,
    pub diagnostics: Diagnostics,
}

impl PosRead {
    fn empty(seed: IdSeed) -> Self {
        Self {
            next: seed,
            ..Self::default()
        }
    }

    /// Append `other`, which must have been decoded from `self.next`.
    pub fn absorb(&mut self, other: PosRead) {
        self.mesh.absorb(other.mesh);
        for (shape, field) in other.fields {
            self.fields
                .entry(shape)
                .or_insert_with(|| Field::new(shape))
                .values
                .extend(field.values);
        }
        self.next = other.next;
        if self.primary_shape.is_none() {
            self.primary_shape = other.primary_shape;
        }
        self.diagnostics.extend(other.diagnostics);
    }
}

/// Read the key table of `path` without decoding any block.
pub fn read_key_table(path: impl AsRef<Path>) -> Result<KeyTable> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    parse_key_table(&bytes, path)
}

pub fn parse_key_table(bytes: &[u8], path: &Path) -> Result<KeyTable> {
    let missing = || MeshIoError::MissingKeyTable(path.to_path_buf());

    let mut line_start = 0usize;
    for _ in 0..PREAMBLE_LINES {
        let newline = find_newline(bytes, line_start).ok_or_else(missing)?;
        line_start = newline + 1;
    }
    let line_end = find_newline(bytes, line_start).ok_or_else(missing)?;
    let counts_line = String::from_utf8_lossy(&bytes[line_start..line_end]);

    let tokens: Vec<&str> = counts_line.split_whitespace().collect();
    if tokens.len() < SLOT_COUNT {
        return Err(missing());
    }
    let (head, counts) = tokens.split_at(tokens.len() - SLOT_COUNT);
    let counts = counts
        .iter()
        .map(|t| t.parse::<usize>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| missing())?;

    let entries = counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .filter_map(|(index, &count)| {
            gmsh::slot(index).map(|slot| KeyEntry { index, slot, count })
        })
        .collect();

    Ok(KeyTable {
        view_name: head.first().map(|s| s.to_string()).unwrap_or_default(),
        entries,
        data_start: line_end + 1,
    })
}

fn find_newline(bytes: &[u8], from: usize) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|&b| b == b'\n')
        .map(|offset| from + offset)
}

/// Decode a single view file.
pub fn read_pos(path: impl AsRef<Path>, seed: IdSeed, options: &ReadOptions) -> Result<PosRead> {
    let path = path.as_ref();
    info!("Reading view {}", path.display());
    let bytes = fs::read(path)?;
    decode_pos(&bytes, path, seed, options)
}

/// Decode `paths` in order, continuing IDs from one file to the next.
///
/// The first path is required. Later paths are optional continuations: a missing
/// one is reported as a diagnostic, an empty one is skipped.
pub fn read_pos_files<P: AsRef<Path>>(
    paths: &[P],
    seed: IdSeed,
    options: &ReadOptions,
) -> Result<PosRead> {
    let mut combined = PosRead::empty(seed);
    for (position, path) in paths.iter().enumerate() {
        let path = path.as_ref();
        if position > 0 && !path.exists() {
            combined.diagnostics.push(Diagnostic::MissingFile {
                path: path.to_path_buf(),
            });
            continue;
        }
        match read_pos(path, combined.next, options) {
            Ok(read) => combined.absorb(read),
            Err(MeshIoError::EmptyKeyTable(empty)) if position > 0 => {
                info!("View {} lists no blocks, skipped", empty.display());
            }
            Err(err) => return Err(err),
        }
    }
    info!("Decoded views: {}", combined.mesh.summary());
    Ok(combined)
}

/// Decode one view held in memory. `path` only labels errors.
pub fn decode_pos(bytes: &[u8], path: &Path, seed: IdSeed, options: &ReadOptions) -> Result<PosRead> {
    let table = parse_key_table(bytes, path)?;
    if table.entries.is_empty() {
        return Err(MeshIoError::EmptyKeyTable(path.to_path_buf()));
    }

    let data = &bytes[table.data_start..];
    if data.len() < LEADING_OFFSET {
        return Err(MeshIoError::TruncatedBlock {
            path: path.to_path_buf(),
            slot: "header",
            expected: LEADING_OFFSET,
            found: data.len(),
        });
    }
    let mut cursor = Cursor::new(data);
    let marker = cursor.read_i32::<LittleEndian>()?;
    if marker != BYTE_ORDER_MARKER {
        return Err(MeshIoError::parse(
            PREAMBLE_LINES + 2,
            format!("unexpected byte-order marker {marker} in {}", path.display()),
        ));
    }
    let time = cursor.read_f64::<LittleEndian>()?;
    debug!("View {:?} at time {time}", table.view_name);

    let mut read = PosRead::empty(seed);
    for entry in &table.entries {
        let start = cursor.position() as usize;
        let available = data.len() - start;
        let byte_len = entry.byte_len().unwrap_or(usize::MAX);
        if available < byte_len {
            return Err(MeshIoError::TruncatedBlock {
                path: path.to_path_buf(),
                slot: entry.slot.name,
                expected: byte_len,
                found: available,
            });
        }
        debug!("Decoding {} records of {}", entry.count, entry.slot.name);
        decode_block(&mut cursor, entry, options, &mut read)?;
    }
    Ok(read)
}

fn decode_block(
    cursor: &mut Cursor<&[u8]>,
    entry: &KeyEntry,
    options: &ReadOptions,
    read: &mut PosRead,
) -> Result<()> {
    let slot = entry.slot;
    let n = slot.nodes();
    let c = slot.components();
    let mut record = vec![0.0f64; slot.stride()];

    let field = read
        .fields
        .entry(slot.shape)
        .or_insert_with(|| Field::new(slot.shape));
    read.primary_shape.get_or_insert(slot.shape);

    for _ in 0..entry.count {
        cursor.read_f64_into::<LittleEndian>(&mut record)?;

        let first_node = read.next.node;
        let native: Vec<NodeId> = (first_node..).take(n).collect();
        for (local, &node_id) in native.iter().enumerate() {
            if options.nodes {
                read.mesh
                    .insert_node(node_id, [record[local], record[n + local], record[2 * n + local]]);
            }
            let offset = 3 * n + local * c;
            if let Some(value) = pos_value(slot.shape, &record[offset..offset + c]) {
                field.insert(node_id, value);
            }
        }

        let element_id = read.next.element;
        if options.elements {
            let canonical = NodeOrder::Gmsh.to_canonical(slot.kind, &native);
            read.mesh.insert_element(slot.kind, element_id, canonical)?;
        }
        trace!("{} element {element_id} nodes {first_node}..", slot.kind);

        read.next.node += n as NodeId;
        read.next.element += 1;
    }
    Ok(())
}

fn pos_value(shape: FieldShape, components: &[f64]) -> Option<FieldValue> {
    match shape {
        FieldShape::Scalar => components.first().map(|&v| FieldValue::Scalar(v)),
        FieldShape::Vector => FieldValue::from_components(shape, components),
        FieldShape::Tensor => {
            let full: [f64; 9] = components.try_into().ok()?;
            Some(FieldValue::Tensor(Tensor::Full(full)))
        }
    }
}

/// `.pos` counterpart of a `-0` result file: its `-1` and `-2` lip files.
///
/// `STRESS-1-0.pos` gives `STRESS-1-1.pos` and `STRESS-1-2.pos`; other names give none.
pub fn lip_companions(path: impl AsRef<Path>) -> Vec<PathBuf> {
    let path = path.as_ref();
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return Vec::new();
    };
    let Some(base) = stem.strip_suffix("-0") else {
        return Vec::new();
    };
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("pos");
    ["1", "2"]
        .iter()
        .map(|lip| path.with_file_name(format!("{base}-{lip}.{extension}")))
        .collect()
}

/// Write `mesh` with the nodal `field` as one binary view.
///
/// Elements referencing a node without coordinates are left out with a diagnostic.
/// Nodes without a value are written with zeros.
pub fn write_pos(
    path: impl AsRef<Path>,
    mesh: &Mesh,
    field: &Field,
    view_name: &str,
) -> Result<WriteReport> {
    let path = path.as_ref();
    let mut report = WriteReport::new(path);
    let bytes = encode_pos(mesh, field, view_name, &mut report)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    info!(
        "Wrote view {} ({} elements, {} nodes)",
        path.display(),
        report.elements,
        report.nodes
    );
    Ok(report)
}

fn encode_pos(
    mesh: &Mesh,
    field: &Field,
    view_name: &str,
    report: &mut WriteReport,
) -> Result<Vec<u8>> {
    let mut counts = [0usize; SLOT_COUNT];
    let mut blocks = Vec::<u8>::new();

    for (index, slot) in gmsh::slots().enumerate() {
        if slot.shape != field.shape {
            continue;
        }
        let Some(elements) = mesh.elements.get(&slot.kind) else {
            continue;
        };
        for (&id, nodes) in elements {
            let native = NodeOrder::Gmsh.from_canonical(slot.kind, nodes);
            let coords: Option<Vec<[f64; 3]>> =
                native.iter().map(|n| mesh.nodes.get(n).copied()).collect();
            let Some(coords) = coords else {
                report.diagnostics.push(Diagnostic::Unwritable {
                    kind: slot.kind,
                    id,
                    reason: "references a node without coordinates".to_string(),
                });
                continue;
            };
            for axis in 0..3 {
                for point in &coords {
                    blocks.write_f64::<LittleEndian>(point[axis])?;
                }
            }
            for node in &native {
                for value in pos_components(field.values.get(node), slot.components()) {
                    blocks.write_f64::<LittleEndian>(value)?;
                }
            }
            counts[index] += 1;
            report.elements += 1;
            report.nodes += native.len();
        }
    }

    let name = if view_name.trim().is_empty() {
        "view"
    } else {
        view_name.trim()
    };
    let counts_line: Vec<String> = counts.iter().map(usize::to_string).collect();
    let mut bytes = format!(
        "$PostFormat\n1.4 1 8\n$EndPostFormat\n$View\n{} 1 {}\n",
        name.replace(char::is_whitespace, "_"),
        counts_line.join(" ")
    )
    .into_bytes();
    bytes.write_i32::<LittleEndian>(BYTE_ORDER_MARKER)?;
    bytes.write_f64::<LittleEndian>(0.0)?;
    bytes.extend_from_slice(&blocks);
    bytes.extend_from_slice(b"\n$EndView\n");
    Ok(bytes)
}

fn pos_components(value: Option<&FieldValue>, width: usize) -> Vec<f64> {
    let mut components = match value {
        Some(FieldValue::Scalar(v)) => vec![*v],
        Some(FieldValue::Vector(v)) => v.to_vec(),
        Some(FieldValue::Tensor(Tensor::Full(m))) => m.to_vec(),
        Some(FieldValue::Tensor(Tensor::Symmetric([xx, yy, zz, xy, yz, xz]))) => {
            vec![*xx, *xy, *xz, *xy, *yy, *yz, *xz, *yz, *zz]
        }
        None => Vec::new(),
    };
    components.resize(width, 0.0);
    components
}
