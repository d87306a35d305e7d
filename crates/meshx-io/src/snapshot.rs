//! JSON snapshots of a canonical mesh and its fields, for caching a converted
//! model between runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use meshx_model::{FieldsByShape, Mesh};

use crate::error::{MeshIoError, Result};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub schema_version: u32,
    pub mesh: Mesh,
    #[serde(default)]
    pub fields: FieldsByShape,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            schema_version: SNAPSHOT_VERSION,
            mesh: Mesh::new(),
            fields: FieldsByShape::new(),
            metadata: BTreeMap::new(),
        }
    }
}

impl Snapshot {
    pub fn new(mesh: Mesh, fields: FieldsByShape) -> Self {
        Self {
            mesh,
            fields,
            ..Self::default()
        }
    }
}

pub fn save_snapshot(path: impl AsRef<Path>, snapshot: &Snapshot) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let bytes = serde_json::to_vec_pretty(snapshot)?;
    fs::write(path, bytes)?;
    info!("Saved snapshot {} ({})", path.display(), snapshot.mesh.summary());
    Ok(())
}

pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Snapshot> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
    if snapshot.schema_version > SNAPSHOT_VERSION {
        return Err(MeshIoError::UnsupportedFormat(format!(
            "snapshot schema version {} (newest known is {SNAPSHOT_VERSION})",
            snapshot.schema_version
        )));
    }
    info!("Loaded snapshot {} ({})", path.display(), snapshot.mesh.summary());
    Ok(snapshot)
}
