//! Tabular answer files of the Samcef result extractor.
//!
//! Line 4 holds the length of the ID block that starts on line 6; every third line
//! of that block is a node ID. Three value lines per node follow the block.

use std::fs;
use std::path::Path;

use log::{info, warn};

use meshx_model::{Field, FieldShape, FieldValue, NodeId};

use crate::error::{MeshIoError, Result};
use crate::numeric::parse_sci;

const COUNT_LINE: usize = 3;
const ID_BLOCK_START: usize = 5;
const LINES_PER_NODE: usize = 3;

pub fn read_answer(path: impl AsRef<Path>) -> Result<Field> {
    let path = path.as_ref();
    info!("Reading answer file {}", path.display());
    let field = parse_answer(&fs::read_to_string(path)?)?;
    info!("Read {} nodal vectors", field.len());
    Ok(field)
}

pub fn parse_answer(text: &str) -> Result<Field> {
    let lines: Vec<&str> = text.lines().collect();
    let count_text = lines
        .get(COUNT_LINE)
        .ok_or_else(|| MeshIoError::parse(lines.len(), "answer file has no ID count line"))?;
    let id_lines: usize = count_text
        .trim()
        .parse()
        .map_err(|_| MeshIoError::parse(COUNT_LINE + 1, format!("bad ID count {count_text:?}")))?;

    let values_start = ID_BLOCK_START + id_lines;
    let ids_block = lines.get(ID_BLOCK_START..values_start).ok_or_else(|| {
        MeshIoError::parse(lines.len(), format!("ID block of {id_lines} lines is truncated"))
    })?;

    let mut field = Field::new(FieldShape::Vector);
    for (node, offset) in (0..id_lines).step_by(LINES_PER_NODE).enumerate() {
        let line_number = ID_BLOCK_START + offset + 1;
        let id: NodeId = ids_block[offset]
            .trim()
            .parse()
            .map_err(|_| MeshIoError::parse(line_number, format!("bad node ID {:?}", ids_block[offset])))?;

        let first = values_start + node * 3;
        let mut components = [0.0; 3];
        for (axis, component) in components.iter_mut().enumerate() {
            let text = lines.get(first + axis).ok_or_else(|| {
                MeshIoError::parse(lines.len(), format!("values of node {id} are truncated"))
            })?;
            *component = parse_sci(text)
                .ok_or_else(|| MeshIoError::parse(first + axis + 1, format!("bad value {text:?}")))?;
        }
        field.insert(id, FieldValue::Vector(components));
    }
    Ok(field)
}

/// Sum of the vectors of `nodes`, e.g. the reaction resultant over a node group.
/// Nodes without a value are skipped with a warning.
pub fn resultant(field: &Field, nodes: &[NodeId]) -> [f64; 3] {
    let mut sum = [0.0; 3];
    let mut missing = 0;
    for id in nodes {
        match field.values.get(id) {
            Some(FieldValue::Vector(v)) => {
                for (total, c) in sum.iter_mut().zip(v) {
                    *total += c;
                }
            }
            _ => missing += 1,
        }
    }
    if missing > 0 {
        warn!("resultant: {missing} node(s) without a vector value");
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANSWER: &str = "\
SAMRES answer
$$GET_VALUE \"Code 221\"
All Nodes
6
IDS
11
 1
 2
12
 1
 2
 1.0
 2.0
 3.0E+00
-1.0
 0.5
 0.0
";

    #[test]
    fn reads_ids_then_values() {
        let field = parse_answer(ANSWER).expect("answer should parse");
        assert_eq!(field.shape, FieldShape::Vector);
        assert_eq!(field.values[&11], FieldValue::Vector([1.0, 2.0, 3.0]));
        assert_eq!(field.values[&12], FieldValue::Vector([-1.0, 0.5, 0.0]));
    }

    #[test]
    fn truncated_values_are_an_error() {
        let text = ANSWER.lines().take(14).collect::<Vec<_>>().join("\n");
        let err = parse_answer(&text).expect_err("node 12 is missing values");
        assert!(err.to_string().contains("node 12"));
    }

    #[test]
    fn resultant_sums_group_members() {
        let field = parse_answer(ANSWER).expect("answer should parse");
        assert_eq!(resultant(&field, &[11, 12]), [0.0, 2.5, 3.0]);
        assert_eq!(resultant(&field, &[11, 99]), [1.0, 2.0, 3.0]);
    }
}
