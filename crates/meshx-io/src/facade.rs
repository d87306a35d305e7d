//! Format dispatch: pick a codec by declared format name or by file extension.
//!
//! Unknown names and extensions are errors; there is no default format.

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::info;
use serde::{Deserialize, Serialize};

use meshx_model::{Field, FieldShape, FieldsByCase, LoadCase, Mesh};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{MeshIoError, Result};
use crate::options::{FieldRead, MeshRead, ReadOptions, WriteOptions, WriteReport};
use crate::pos::{self, IdSeed};
use crate::snapshot::{self, Snapshot};
use crate::{abaqus, patran, results, samcef, samres};

fn extension_of(path: &Path) -> Result<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| {
            MeshIoError::UnsupportedFormat(format!("{} has no file extension", path.display()))
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshFormat {
    Patran,
    Samcef,
    Abaqus,
    Gmsh,
    /// JSON snapshot of the canonical model
    Snapshot,
}

impl MeshFormat {
    pub const ALL: [MeshFormat; 5] = [
        MeshFormat::Patran,
        MeshFormat::Samcef,
        MeshFormat::Abaqus,
        MeshFormat::Gmsh,
        MeshFormat::Snapshot,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MeshFormat::Patran => "patran",
            MeshFormat::Samcef => "samcef",
            MeshFormat::Abaqus => "abaqus",
            MeshFormat::Gmsh => "gmsh",
            MeshFormat::Snapshot => "json",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            MeshFormat::Patran => "out",
            MeshFormat::Samcef => "dat",
            MeshFormat::Abaqus => "inp",
            MeshFormat::Gmsh => "pos",
            MeshFormat::Snapshot => "json",
        }
    }

    pub fn from_extension(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = extension_of(path)?;
        Self::ALL
            .into_iter()
            .find(|format| format.extension() == extension)
            .ok_or_else(|| MeshIoError::UnsupportedFormat(format!("mesh extension .{extension}")))
    }

    /// `declared` if given, otherwise the format named by the extension of `path`.
    pub fn resolve(path: impl AsRef<Path>, declared: Option<MeshFormat>) -> Result<Self> {
        match declared {
            Some(format) => Ok(format),
            None => Self::from_extension(path),
        }
    }
}

impl Display for MeshFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MeshFormat {
    type Err = MeshIoError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.name() == lower)
            .ok_or_else(|| MeshIoError::UnsupportedFormat(format!("mesh format {s:?}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldFormat {
    Gmsh,
    PatranReport,
    SamresAnswer,
}

impl FieldFormat {
    pub const ALL: [FieldFormat; 3] = [
        FieldFormat::Gmsh,
        FieldFormat::PatranReport,
        FieldFormat::SamresAnswer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FieldFormat::Gmsh => "gmsh",
            FieldFormat::PatranReport => "patran",
            FieldFormat::SamresAnswer => "samres",
        }
    }

    /// Samres answers share `.out` with Patran neutral files, so they have no extension.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            FieldFormat::Gmsh => Some("pos"),
            FieldFormat::PatranReport => Some("rpt"),
            FieldFormat::SamresAnswer => None,
        }
    }

    pub fn from_extension(path: impl AsRef<Path>) -> Result<Self> {
        let extension = extension_of(path.as_ref())?;
        Self::ALL
            .into_iter()
            .find(|format| format.extension() == Some(extension.as_str()))
            .ok_or_else(|| MeshIoError::UnsupportedFormat(format!("field extension .{extension}")))
    }

    pub fn resolve(path: impl AsRef<Path>, declared: Option<FieldFormat>) -> Result<Self> {
        match declared {
            Some(format) => Ok(format),
            None => Self::from_extension(path),
        }
    }
}

impl Display for FieldFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldFormat {
    type Err = MeshIoError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.name() == lower)
            .ok_or_else(|| MeshIoError::UnsupportedFormat(format!("field format {s:?}")))
    }
}

pub fn read_mesh(
    path: impl AsRef<Path>,
    format: Option<MeshFormat>,
    options: &ReadOptions,
) -> Result<MeshRead> {
    let path = path.as_ref();
    let format = MeshFormat::resolve(path, format)?;
    info!("Reading {} as {format}", path.display());
    match format {
        MeshFormat::Patran => patran::read_out(path, options),
        MeshFormat::Samcef => samcef::read_dat(path, options),
        MeshFormat::Abaqus => abaqus::read_inp(path, options),
        MeshFormat::Gmsh => {
            let read = pos::read_pos(path, IdSeed::default(), options)?;
            Ok(MeshRead {
                mesh: read.mesh,
                diagnostics: read.diagnostics,
            })
        }
        MeshFormat::Snapshot => Ok(MeshRead {
            mesh: snapshot::load_snapshot(path)?.mesh,
            diagnostics: Diagnostics::new(),
        }),
    }
}

pub fn write_mesh(
    path: impl AsRef<Path>,
    format: Option<MeshFormat>,
    mesh: &Mesh,
    options: &WriteOptions,
) -> Result<WriteReport> {
    let path = path.as_ref();
    let format = MeshFormat::resolve(path, format)?;
    match format {
        MeshFormat::Patran => patran::write_out(path, mesh, options),
        MeshFormat::Samcef => samcef::write_dat(path, mesh, options),
        MeshFormat::Abaqus => abaqus::write_inp(path, mesh, options),
        MeshFormat::Gmsh => Err(MeshIoError::UnsupportedOperation(
            "a gmsh view needs a nodal field; write it with pos::write_pos".to_string(),
        )),
        MeshFormat::Snapshot => {
            snapshot::save_snapshot(path, &Snapshot::new(mesh.clone(), Default::default()))?;
            let mut report = WriteReport::new(path);
            report.nodes = mesh.nodes.len();
            report.elements = mesh.element_count();
            report.groups = mesh.groups.len();
            Ok(report)
        }
    }
}

/// Pick `shape` out of decoded view fields, falling back to the first block's shape.
fn view_field(read: &mut pos::PosRead, shape: FieldShape) -> Option<Field> {
    if let Some(field) = read.fields.remove(&shape) {
        return Some(field);
    }
    let primary = read.primary_shape?;
    let field = read.fields.remove(&primary)?;
    read.diagnostics.push(Diagnostic::SubstitutedShape {
        requested: shape,
        used: primary,
    });
    Some(field)
}

pub fn read_field(
    path: impl AsRef<Path>,
    format: Option<FieldFormat>,
    shape: FieldShape,
) -> Result<FieldRead> {
    let path = path.as_ref();
    let format = FieldFormat::resolve(path, format)?;
    info!("Reading {shape} field {} as {format}", path.display());
    match format {
        FieldFormat::Gmsh => {
            let mut read = pos::read_pos(path, IdSeed::default(), &ReadOptions::default())?;
            let mut fields = FieldsByCase::new();
            if let Some(field) = view_field(&mut read, shape) {
                fields.insert(LoadCase(0.0), field);
            }
            Ok(FieldRead {
                fields,
                diagnostics: read.diagnostics,
            })
        }
        FieldFormat::PatranReport => results::read_report(&[path], shape),
        FieldFormat::SamresAnswer => {
            if shape != FieldShape::Vector {
                return Err(MeshIoError::UnsupportedOperation(format!(
                    "samres answers hold vectors, not {shape} values"
                )));
            }
            let mut fields = FieldsByCase::new();
            fields.insert(LoadCase(0.0), samres::read_answer(path)?);
            Ok(FieldRead {
                fields,
                diagnostics: Diagnostics::new(),
            })
        }
    }
}

/// Mesh and field decoded together from a result file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultMesh {
    pub mesh: Mesh,
    /// The primary field, keyed by load case `0`.
    pub fields: FieldsByCase,
    pub diagnostics: Diagnostics,
}

/// Read a `.pos` result view as mesh plus field. With `lips`, the `-1`/`-2`
/// companions of a `-0` view are decoded too, continuing its IDs.
pub fn read_result_mesh(path: impl AsRef<Path>, lips: bool) -> Result<ResultMesh> {
    let path = path.as_ref();
    if MeshFormat::from_extension(path)? != MeshFormat::Gmsh {
        return Err(MeshIoError::UnsupportedFormat(format!(
            "{} is not a result view",
            path.display()
        )));
    }
    let mut paths: Vec<PathBuf> = vec![path.to_path_buf()];
    if lips {
        paths.extend(pos::lip_companions(path));
    }
    let mut read = pos::read_pos_files(&paths, IdSeed::default(), &ReadOptions::default())?;
    let mut fields = FieldsByCase::new();
    if let Some(shape) = read.primary_shape
        && let Some(field) = read.fields.remove(&shape)
    {
        fields.insert(LoadCase(0.0), field);
    }
    Ok(ResultMesh {
        mesh: read.mesh,
        fields,
        diagnostics: read.diagnostics,
    })
}

/// Display names of the views written by the XFEM solver.
const VIEW_NAMES: [(&str, &str); 15] = [
    ("DISPLACEMENT-1-0.pos", "Displacements (skin, XFEM)"),
    ("DISPLACEMENT-1-1.pos", "Displacements (skin, lip 1)"),
    ("DISPLACEMENT-1-2.pos", "Displacements (skin, lip 2)"),
    ("DISPLACEMENT-1-Full.pos", "Displacements (XFEM)"),
    ("FEDISPLACEMENT-1-0.pos", "Displacements (skin, FEM)"),
    ("FEDISPLACEMENT-1-Full.pos", "Displacements (FEM)"),
    ("STRESS-1-0.pos", "Stresses (skin, XFEM)"),
    ("STRESS-1-1.pos", "Stresses (skin, lip 1)"),
    ("STRESS-1-2.pos", "Stresses (skin, lip 2)"),
    ("STRESS-1-Full.pos", "Stresses (XFEM)"),
    ("FESTRESS-1-0.pos", "Stresses (skin, FEM)"),
    ("FESTRESS-1-Full.pos", "Stresses (FEM)"),
    ("temp_xfe.pos", "Temperature (XFEM)"),
    ("Dtemp_xfe.pos", "Temperature offset (XFEM)"),
    ("tempsam.pos", "Temperature (FEM)"),
];

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Display name of a result view; unknown files keep their file name.
pub fn pos_field_name(path: impl AsRef<Path>) -> String {
    let name = file_name(path.as_ref());
    VIEW_NAMES
        .iter()
        .find(|(file, _)| *file == name)
        .map_or(name, |(_, display)| display.to_string())
}

/// Name of the mesh a view belongs to: `<model>_<stepN>` when the view sits in a
/// `.../<model>/<...stepN...>/` folder, the file name otherwise.
pub fn pos_mesh_name(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    let step = path.parent().and_then(|dir| {
        let dir_name = dir.file_name()?.to_str()?;
        let start = dir_name.find("step")?;
        let digits: String = dir_name[start + 4..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        if digits.is_empty() {
            return None;
        }
        let model = dir.parent().map(file_name).unwrap_or_default();
        Some(format!("{model}_step{digits}"))
    });
    step.unwrap_or_else(|| file_name(path))
}

/// Names of the groups defined in a mesh file, without reading its geometry.
pub fn group_names(path: impl AsRef<Path>, format: Option<MeshFormat>) -> Result<Vec<String>> {
    let read = read_mesh(path, format, &ReadOptions::groups_only())?;
    Ok(read.mesh.groups.into_keys().collect())
}
