//! Patran result files: text reports (`.rpt`) on the read side, and the
//! record / template / session-script triple that lets Patran import a field.
//!
//! Record values are right-justified in 13-character columns with no guaranteed
//! separator (a negative value fills its column), so records are read back by
//! column, not by whitespace.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use meshx_model::{Field, FieldShape, FieldValue, FieldsByCase, LoadCase};

use crate::error::{MeshIoError, Result};
use crate::numeric::{NumberFormat, parse_sci};
use crate::options::{FieldRead, WriteReport};

pub const VALUE_FORMAT: NumberFormat = NumberFormat::new(5, 3);
const VALUE_WIDTH: usize = 13;
const VALUES_PER_LINE: usize = 5;
const NODE_ID_WIDTH: usize = 8;
const ELEMENT_ID_WIDTH: usize = 18;

/// Whether a result record is attached to nodes or to elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    Node,
    Element,
}

impl Location {
    /// Entity letter used by the session import command.
    pub fn code(self) -> char {
        match self {
            Location::Node => 'N',
            Location::Element => 'E',
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Location::Node => "nod",
            Location::Element => "els",
        }
    }
}

/// Column selection written to a `.res_tmpl` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultTemplate {
    /// Column read for scalar results; vector and tensor templates list all columns.
    pub column: String,
    pub pri: String,
    pub sec: String,
}

impl Default for ResultTemplate {
    fn default() -> Self {
        Self {
            column: "1".to_string(),
            pri: "MAXRES".to_string(),
            sec: String::new(),
        }
    }
}

/// A result record read back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub load_case: String,
    pub location: Location,
    pub field: Field,
}

/// Paths of one written record / template / session triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTriple {
    pub record: PathBuf,
    pub template: PathBuf,
    pub session: PathBuf,
}

fn load_case_label(line: &str, ordinal: usize) -> Option<f64> {
    if line.contains("Time step") || line.contains(" Pas ") {
        let tail = line.rsplit(':').next()?;
        parse_sci(tail.split('{').next()?)
    } else if line.contains(" Load case ") || line.contains(" Cas de charges ") {
        parse_sci(line.split(':').nth(1)?.split_whitespace().last()?)
    } else {
        Some(ordinal as f64)
    }
}

/// Read Patran text reports into one field per load case.
///
/// `Load Case:` lines open a case keyed by its time step, its load case number,
/// or its ordinal; numeric rows `id v1 v2 ...` fill the open case. Colliding keys
/// are bumped by [`meshx_model::LOAD_CASE_EPSILON`].
pub fn read_report<P: AsRef<Path>>(paths: &[P], shape: FieldShape) -> Result<FieldRead> {
    let mut read = FieldRead::default();
    for path in paths {
        let path = path.as_ref();
        info!("Reading report {}", path.display());
        let text = fs::read_to_string(path)?;
        parse_report(&text, shape, &mut read.fields)?;
    }
    Ok(read)
}

pub fn parse_report(text: &str, shape: FieldShape, fields: &mut FieldsByCase) -> Result<()> {
    let mut current: Option<LoadCase> = None;
    for (index, line) in text.lines().enumerate() {
        if line.contains("Load Case:") {
            let label = load_case_label(line, fields.len()).ok_or_else(|| {
                MeshIoError::parse(index + 1, format!("cannot read load case label from {line:?}"))
            })?;
            if !label.is_finite() {
                return Err(MeshIoError::parse(
                    index + 1,
                    format!("load case label {label} is not finite"),
                ));
            }
            let case = LoadCase(label).unique_in(fields);
            debug!("load case {case} at line {}", index + 1);
            fields.insert(case, Field::new(shape));
            current = Some(case);
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 2 {
            continue;
        }
        let Some(numbers) = tokens.iter().map(|t| parse_sci(t)).collect::<Option<Vec<f64>>>() else {
            continue;
        };
        let Ok(id) = tokens[0].parse::<i32>() else {
            continue;
        };
        let Some(field) = current.and_then(|case| fields.get_mut(&case)) else {
            trace!("row before any load case at line {}", index + 1);
            continue;
        };
        let value = FieldValue::from_components(shape, &numbers[1..]).ok_or_else(|| {
            MeshIoError::parse(
                index + 1,
                format!("{shape} row needs {} values, found {}", shape.components(), numbers.len() - 1),
            )
        })?;
        field.insert(id, value);
    }
    Ok(())
}

fn value_lines(components: &[f64]) -> Vec<String> {
    components
        .chunks(VALUES_PER_LINE)
        .map(|chunk| chunk.iter().map(|&v| VALUE_FORMAT.format_width(v, VALUE_WIDTH)).collect())
        .collect()
}

/// Write one load case of `field` as a Patran result record.
pub fn write_result_record(
    path: impl AsRef<Path>,
    location: Location,
    load_case: &str,
    field: &Field,
) -> Result<WriteReport> {
    let path = path.as_ref();
    let mut report = WriteReport::new(path);
    fs::write(path, format_result_record(location, load_case, field))?;
    match location {
        Location::Node => report.nodes = field.len(),
        Location::Element => report.elements = field.len(),
    }
    info!("Wrote {} ({} {} values)", path.display(), field.len(), field.shape);
    Ok(report)
}

fn format_result_record(location: Location, load_case: &str, field: &Field) -> String {
    let components = field.shape.components();
    let mut out = String::new();
    out.push_str(load_case);
    out.push('\n');
    match location {
        Location::Node => {
            out.push_str(&format!(
                "{:>8}{:>8}{:>15}{:>8}{:>8}\n",
                2, 0, "0.000000E+0", 0, components
            ));
        }
        Location::Element => out.push_str(&format!("{components}\n")),
    }
    out.push_str("X\nNONE\n");

    for (id, value) in &field.values {
        let lines = value_lines(&value.components());
        match location {
            Location::Node => {
                let (first, rest) = lines.split_first().map_or(("", &[][..]), |(f, r)| (f.as_str(), r));
                out.push_str(&format!("{id:>8}{first}\n"));
                for line in rest {
                    out.push_str(line);
                    out.push('\n');
                }
            }
            Location::Element => {
                out.push_str(&format!("{id:<18}0\n"));
                for line in &lines {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
    }
    out
}

/// 13-character value columns of one physical line.
fn value_columns(line: &str) -> impl Iterator<Item = &str> + '_ {
    (0..line.len().div_ceil(VALUE_WIDTH)).filter_map(move |i| {
        let start = i * VALUE_WIDTH;
        line.get(start..(start + VALUE_WIDTH).min(line.len()))
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
    })
}

pub fn read_result_record(path: impl AsRef<Path>) -> Result<ResultRecord> {
    let path = path.as_ref();
    info!("Reading result record {}", path.display());
    parse_result_record(&fs::read_to_string(path)?)
}

pub fn parse_result_record(text: &str) -> Result<ResultRecord> {
    let lines: Vec<&str> = text.lines().collect();
    let [load_case, counts, ..] = lines.as_slice() else {
        return Err(MeshIoError::parse(lines.len(), "result record header is incomplete"));
    };
    let count_tokens: Vec<&str> = counts.split_whitespace().collect();
    let location = if count_tokens.len() == 1 { Location::Element } else { Location::Node };
    let components: usize = count_tokens
        .last()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| MeshIoError::parse(2, format!("bad component count line {counts:?}")))?;
    let shape = match components {
        1 => FieldShape::Scalar,
        3 => FieldShape::Vector,
        6 => FieldShape::Tensor,
        n => return Err(MeshIoError::parse(2, format!("unsupported component count {n}"))),
    };

    let mut field = Field::new(shape);
    let mut index = 4;
    while index < lines.len() {
        let line = lines[index];
        index += 1;
        if line.trim().is_empty() {
            continue;
        }
        let line_number = index;
        let (id_text, mut values) = match location {
            Location::Node => {
                let split = NODE_ID_WIDTH.min(line.len());
                (&line[..split], value_columns(&line[split..]).map(String::from).collect::<Vec<_>>())
            }
            Location::Element => (line.get(..ELEMENT_ID_WIDTH).unwrap_or(line), Vec::new()),
        };
        let id: i32 = id_text
            .trim()
            .parse()
            .map_err(|_| MeshIoError::parse(line_number, format!("bad entity ID in {line:?}")))?;
        while values.len() < components {
            let Some(next) = lines.get(index) else {
                return Err(MeshIoError::parse(
                    line_number,
                    format!("entity {id} has {} of {components} values", values.len()),
                ));
            };
            values.extend(value_columns(next).map(String::from));
            index += 1;
        }
        let numbers = values
            .iter()
            .map(|v| parse_sci(v))
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| MeshIoError::parse(line_number, format!("bad value for entity {id}")))?;
        if let Some(value) = FieldValue::from_components(shape, &numbers) {
            field.insert(id, value);
        }
    }
    Ok(ResultRecord {
        load_case: load_case.to_string(),
        location,
        field,
    })
}

pub fn write_result_template(
    path: impl AsRef<Path>,
    shape: FieldShape,
    template: &ResultTemplate,
) -> Result<()> {
    let ResultTemplate { column, pri, sec } = template;
    let text = match shape {
        FieldShape::Scalar => format!(
            "KEYLOC = 0\nTYPE = scalar\nCOLUMN = {column}\nPRI = {pri}\nSEC ={sec}\nTYPE = END\n"
        ),
        FieldShape::Vector => format!(
            "KEYLOC = 0\nTYPE = vector\nCOLUMN = 1,2,3\nPRI = {pri}\nSEC ={sec}\nCTYPE = GLOBAL\nTYPE = END\n"
        ),
        FieldShape::Tensor => format!(
            "KEYLOC = 0\nTYPE = tensor\nCOLUMN = 1,2,3,4,5,6\nPRI = {pri}\nSEC =Components\nCTYPE = GLOBAL\nTYPE = END\n"
        ),
    };
    fs::write(path, text)?;
    Ok(())
}

fn session_line(record_name: &str, location: Location, template_name: &str) -> String {
    format!(
        "resold_import_results(\"{record_name}\", \"{}\", 1E-006, \"{template_name}\")\n",
        location.code()
    )
}

/// Write a one-line session script importing `record_name` with `template_name`.
pub fn write_session_script(
    path: impl AsRef<Path>,
    record_name: &str,
    location: Location,
    template_name: &str,
) -> Result<()> {
    fs::write(path, session_line(record_name, location, template_name))?;
    Ok(())
}

/// Append another import command to an existing session script.
pub fn append_session_script(
    path: impl AsRef<Path>,
    record_name: &str,
    location: Location,
    template_name: &str,
) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(session_line(record_name, location, template_name).as_bytes())?;
    Ok(())
}

/// Write record, template and session script into `dir`.
///
/// File names are `{stem}_{shape}.{nod|els}`, `{shape}.res_tmpl` and
/// `load_{stem}_{shape}.ses`; the script refers to the other two by file name.
pub fn write_result_triple(
    dir: impl AsRef<Path>,
    stem: &str,
    location: Location,
    load_case: &str,
    field: &Field,
    template: &ResultTemplate,
) -> Result<ResultTriple> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let shape = field.shape.key();
    let record_name = format!("{stem}_{shape}.{}", location.extension());
    let template_name = format!("{shape}.res_tmpl");
    let triple = ResultTriple {
        record: dir.join(&record_name),
        template: dir.join(&template_name),
        session: dir.join(format!("load_{stem}_{shape}.ses")),
    };
    write_result_record(&triple.record, location, load_case, field)?;
    write_result_template(&triple.template, field.shape, template)?;
    write_session_script(&triple.session, &record_name, location, &template_name)?;
    Ok(triple)
}
