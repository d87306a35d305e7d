//! Codecs between legacy FE mesh/result files and the canonical `meshx-model` types.
//!
//! This crate provides:
//! - **Gmsh `.pos`** binary view decoder/encoder with ID continuation across files
//! - **Patran neutral** (`.out`) reader/writer
//! - **Abaqus keyword** (`.inp`) reader/writer with `*INCLUDE` expansion
//! - **Samcef** (`.dat`) reader/writer
//! - **Patran results**: `.rpt` reports and the record/template/session triple
//! - **Samres answers** from the Samcef result extractor
//! - **JSON snapshots** of a canonical mesh and its fields
//! - **Format dispatch** by name or file extension
//!
//! Unsupported pieces of a file never abort a read: they are skipped and reported in
//! the [`Diagnostics`] returned with the data.

pub mod abaqus;
mod diagnostics;
mod error;
pub mod facade;
pub mod numeric;
mod options;
pub mod patran;
pub mod pos;
pub mod results;
pub mod samcef;
pub mod samres;
pub mod snapshot;
pub mod taxonomy;

pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{MeshIoError, Result};
pub use facade::{
    FieldFormat, MeshFormat, ResultMesh, group_names, pos_field_name, pos_mesh_name, read_field,
    read_mesh, read_result_mesh, write_mesh,
};
pub use numeric::{NumberFormat, format_sci, parse_sci};
pub use options::{FieldRead, MeshRead, ReadOptions, WriteOptions, WriteReport};
pub use pos::{IdSeed, PosRead};
pub use results::{Location, ResultTemplate};
pub use snapshot::{Snapshot, load_snapshot, save_snapshot};
pub use taxonomy::NodeOrder;
