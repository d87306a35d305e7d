//! Non-fatal findings collected during a read or write.
//!
//! Unsupported pieces of a file are skipped, never silently: each one becomes a
//! [`Diagnostic`] in the list returned to the caller and is also logged.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use log::{error, warn};
use serde::{Deserialize, Serialize};

use meshx_model::{ElementKind, FieldShape};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Native element code or keyword with no canonical mapping; the element was skipped.
    UnsupportedElement { code: String, count: usize },
    /// Group member kind with no canonical mapping.
    UnsupportedEntity { group: String, code: String },
    /// Group whose members could not be resolved; the whole group was dropped.
    DroppedGroup { group: String, reason: String },
    /// Group pairs skipped because their entity code names no mesh entity.
    SkippedPairs { group: String, count: usize },
    /// Optional continuation file that does not exist.
    MissingFile { path: PathBuf },
    /// View without the requested field shape; its first block's shape was read instead.
    SubstitutedShape {
        requested: FieldShape,
        used: FieldShape,
    },
    /// Element left out of a written file.
    Unwritable {
        kind: ElementKind,
        id: i32,
        reason: String,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnsupportedElement { code, count } => {
                write!(f, "skipped {count} element(s) of unsupported type {code}")
            }
            Diagnostic::UnsupportedEntity { group, code } => {
                write!(f, "group {group}: unsupported entity kind {code}")
            }
            Diagnostic::DroppedGroup { group, reason } => {
                write!(f, "dropped group {group}: {reason}")
            }
            Diagnostic::SkippedPairs { group, count } => {
                write!(f, "group {group}: skipped {count} pair(s) without a mesh entity")
            }
            Diagnostic::MissingFile { path } => {
                write!(f, "continuation file {} not found, skipped", path.display())
            }
            Diagnostic::SubstitutedShape { requested, used } => {
                write!(f, "no {requested} field, read the {used} field instead")
            }
            Diagnostic::Unwritable { kind, id, reason } => {
                write!(f, "element {id} of kind {kind} not written: {reason}")
            }
        }
    }
}

/// Ordered diagnostics of one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `diagnostic` and log it.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::Unwritable { .. } => error!("{diagnostic}"),
            _ => warn!("{diagnostic}"),
        }
        self.entries.push(diagnostic);
    }

    /// Count one more skipped element of `code`, merging with an existing entry.
    pub fn unsupported_element(&mut self, code: impl Into<String>) {
        let code = code.into();
        let existing = self.entries.iter_mut().find_map(|entry| match entry {
            Diagnostic::UnsupportedElement { code: c, count } if *c == code => Some(count),
            _ => None,
        });
        match existing {
            Some(count) => *count += 1,
            None => self.push(Diagnostic::UnsupportedElement { code, count: 1 }),
        }
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_elements_are_counted_per_code() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.unsupported_element("C3D27");
        diagnostics.unsupported_element("C3D27");
        diagnostics.unsupported_element("SPRINGA");

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(
            diagnostics.entries()[0],
            Diagnostic::UnsupportedElement {
                code: "C3D27".to_string(),
                count: 2
            }
        );
    }

    #[test]
    fn serializes_with_type_tag() {
        let diagnostic = Diagnostic::SkippedPairs {
            group: "edge".to_string(),
            count: 3,
        };
        let json = serde_json::to_string(&diagnostic).expect("diagnostic should serialize");
        assert_eq!(json, r#"{"type":"skipped_pairs","group":"edge","count":3}"#);
        assert_eq!(
            diagnostic.to_string(),
            "group edge: skipped 3 pair(s) without a mesh entity"
        );
    }
}
