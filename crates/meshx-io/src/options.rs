//! Read/write configuration and outcome records shared by every codec.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use meshx_model::{FieldsByCase, Mesh};

use crate::diagnostics::Diagnostics;
use crate::numeric::NumberFormat;

/// Which mesh sections a reader fills. Skipped sections stay empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    pub nodes: bool,
    pub elements: bool,
    pub groups: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            nodes: true,
            elements: true,
            groups: true,
        }
    }
}

impl ReadOptions {
    pub fn geometry_only() -> Self {
        Self {
            groups: false,
            ..Self::default()
        }
    }

    pub fn groups_only() -> Self {
        Self {
            nodes: false,
            elements: false,
            groups: true,
        }
    }
}

/// Which mesh sections a writer emits, plus an optional number-format override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    pub nodes: bool,
    pub elements: bool,
    pub groups: bool,
    /// Replaces the format's default precision/exponent width for coordinates.
    pub number_format: Option<NumberFormat>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            nodes: true,
            elements: true,
            groups: true,
            number_format: None,
        }
    }
}

impl WriteOptions {
    pub(crate) fn number_format_or(&self, default: NumberFormat) -> NumberFormat {
        self.number_format.unwrap_or(default)
    }
}

/// Outcome of a mesh read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshRead {
    pub mesh: Mesh,
    pub diagnostics: Diagnostics,
}

/// Outcome of a field read: one field per load case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldRead {
    pub fields: FieldsByCase,
    pub diagnostics: Diagnostics,
}

/// What a writer put on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReport {
    pub path: PathBuf,
    pub nodes: usize,
    pub elements: usize,
    pub groups: usize,
    pub diagnostics: Diagnostics,
}

impl WriteReport {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_options_fill_missing_sections_with_defaults() {
        let options: ReadOptions =
            serde_json::from_str(r#"{"groups": false}"#).expect("options should parse");
        assert_eq!(options, ReadOptions::geometry_only());

        let write: WriteOptions = serde_json::from_str(
            r#"{"number_format": {"precision": 6, "exp_digits": 2}}"#,
        )
        .expect("options should parse");
        assert!(write.nodes && write.elements && write.groups);
        assert_eq!(
            write.number_format_or(NumberFormat::new(9, 1)),
            NumberFormat::new(6, 2)
        );
    }
}
