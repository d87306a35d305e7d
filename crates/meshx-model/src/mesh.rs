//! Mesh container: nodes, elements grouped by kind, named groups.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::element::ElementKind;
use crate::error::ModelError;

pub type NodeId = i32;
pub type ElementId = i32;

/// What a group member refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum EntityKind {
    Node,
    Element(ElementKind),
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Node => f.write_str("node"),
            EntityKind::Element(kind) => f.write_str(kind.tag()),
        }
    }
}

impl FromStr for EntityKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "node" {
            return Ok(EntityKind::Node);
        }
        s.parse::<ElementKind>()
            .map(EntityKind::Element)
            .map_err(|_| ModelError::UnknownEntity(s.to_string()))
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        kind.to_string()
    }
}

impl TryFrom<String> for EntityKind {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Named selection of nodes and elements. Member lists keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub members: BTreeMap<EntityKind, Vec<i32>>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nodes(ids: impl IntoIterator<Item = NodeId>) -> Self {
        let mut group = Self::new();
        group.extend(EntityKind::Node, ids);
        group
    }

    pub fn push(&mut self, kind: EntityKind, id: i32) {
        self.members.entry(kind).or_default().push(id);
    }

    pub fn extend(&mut self, kind: EntityKind, ids: impl IntoIterator<Item = i32>) {
        self.members.entry(kind).or_default().extend(ids);
    }

    pub fn nodes(&self) -> &[NodeId] {
        self.members
            .get(&EntityKind::Node)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Element members as `(kind, ids)` pairs, skipping the node list.
    pub fn elements(&self) -> impl Iterator<Item = (ElementKind, &[ElementId])> {
        self.members.iter().filter_map(|(kind, ids)| match kind {
            EntityKind::Element(kind) => Some((*kind, ids.as_slice())),
            EntityKind::Node => None,
        })
    }

    pub fn len(&self) -> usize {
        self.members.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One read's worth of mesh data. Every section defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// Node coordinates (node_id → [x, y, z])
    pub nodes: BTreeMap<NodeId, [f64; 3]>,
    /// Element connectivity per kind (kind → element_id → canonical node list)
    pub elements: BTreeMap<ElementKind, BTreeMap<ElementId, Vec<NodeId>>>,
    /// Groups by name
    pub groups: BTreeMap<String, Group>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_node(&mut self, id: NodeId, coords: [f64; 3]) {
        self.nodes.insert(id, coords);
    }

    /// Insert an element whose node list is already in canonical order.
    ///
    /// Fails when the node count does not match the kind.
    pub fn insert_element(
        &mut self,
        kind: ElementKind,
        id: ElementId,
        nodes: Vec<NodeId>,
    ) -> Result<(), ModelError> {
        check_node_count(kind, id, &nodes)?;
        self.elements.entry(kind).or_default().insert(id, nodes);
        Ok(())
    }

    pub fn element(&self, kind: ElementKind, id: ElementId) -> Option<&[NodeId]> {
        self.elements
            .get(&kind)
            .and_then(|block| block.get(&id))
            .map(Vec::as_slice)
    }

    pub fn element_count(&self) -> usize {
        self.elements.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.element_count() == 0 && self.groups.is_empty()
    }

    /// Merge `other` into `self`. Entities with the same ID are replaced, group members
    /// are appended.
    pub fn absorb(&mut self, other: Mesh) {
        self.nodes.extend(other.nodes);
        for (kind, block) in other.elements {
            self.elements.entry(kind).or_default().extend(block);
        }
        for (name, group) in other.groups {
            let target = self.groups.entry(name).or_default();
            for (kind, ids) in group.members {
                target.extend(kind, ids);
            }
        }
    }

    pub fn summary(&self) -> MeshSummary {
        MeshSummary::from_mesh(self)
    }
}

pub fn check_node_count(kind: ElementKind, id: ElementId, nodes: &[NodeId]) -> Result<(), ModelError> {
    if nodes.len() != kind.node_count() {
        return Err(ModelError::NodeCount {
            kind,
            id,
            expected: kind.node_count(),
            found: nodes.len(),
        });
    }
    Ok(())
}

/// Entity counts of a mesh, used for progress logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshSummary {
    pub node_count: usize,
    pub element_counts: BTreeMap<ElementKind, usize>,
    pub group_count: usize,
}

impl MeshSummary {
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let element_counts = mesh
            .elements
            .iter()
            .map(|(kind, block)| (*kind, block.len()))
            .collect();
        Self {
            node_count: mesh.nodes.len(),
            element_counts,
            group_count: mesh.groups.len(),
        }
    }

    pub fn element_count(&self) -> usize {
        self.element_counts.values().sum()
    }
}

impl Display for MeshSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} nodes, {} elements",
            self.node_count,
            self.element_count()
        )?;
        if !self.element_counts.is_empty() {
            let parts: Vec<String> = self
                .element_counts
                .iter()
                .map(|(kind, count)| format!("{kind}={count}"))
                .collect();
            write!(f, " ({})", parts.join(", "))?;
        }
        write!(f, ", {} groups", self.group_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tet_mesh() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.insert_node(1, [0.0, 0.0, 0.0]);
        mesh.insert_node(2, [1.0, 0.0, 0.0]);
        mesh.insert_node(3, [0.0, 1.0, 0.0]);
        mesh.insert_node(4, [0.0, 0.0, 1.0]);
        mesh.insert_element(ElementKind::Tet, 1, vec![1, 2, 3, 4])
            .expect("tet should insert");
        mesh
    }

    #[test]
    fn rejects_element_with_wrong_node_count() {
        let mut mesh = Mesh::new();
        let err = mesh
            .insert_element(ElementKind::Hex2, 7, vec![1; 19])
            .expect_err("19 nodes is not a hex2");
        assert_eq!(
            err,
            ModelError::NodeCount {
                kind: ElementKind::Hex2,
                id: 7,
                expected: 20,
                found: 19
            }
        );
        assert_eq!(mesh.element_count(), 0);
    }

    #[test]
    fn same_id_can_label_elements_of_different_kinds() {
        let mut mesh = tet_mesh();
        mesh.insert_element(ElementKind::Tria, 1, vec![1, 2, 3])
            .expect("tria should insert");
        assert_eq!(mesh.element_count(), 2);
        assert_eq!(mesh.element(ElementKind::Tria, 1), Some(&[1, 2, 3][..]));
        assert_eq!(mesh.element(ElementKind::Tet, 1), Some(&[1, 2, 3, 4][..]));
    }

    #[test]
    fn absorb_merges_groups_and_blocks() {
        let mut left = tet_mesh();
        left.groups.insert("base".to_string(), Group::with_nodes([1, 2]));

        let mut right = Mesh::new();
        right.insert_node(5, [2.0, 0.0, 0.0]);
        right
            .insert_element(ElementKind::Tet, 2, vec![2, 3, 4, 5])
            .expect("tet should insert");
        let mut group = Group::with_nodes([5]);
        group.push(EntityKind::Element(ElementKind::Tet), 2);
        right.groups.insert("base".to_string(), group);

        left.absorb(right);
        assert_eq!(left.nodes.len(), 5);
        assert_eq!(left.elements[&ElementKind::Tet].len(), 2);
        let base = &left.groups["base"];
        assert_eq!(base.nodes(), &[1, 2, 5]);
        assert_eq!(base.len(), 4);
    }

    #[test]
    fn summary_reports_counts_per_kind() {
        let summary = tet_mesh().summary();
        assert_eq!(summary.node_count, 4);
        assert_eq!(summary.element_count(), 1);
        assert_eq!(summary.to_string(), "4 nodes, 1 elements (tet=1), 0 groups");
    }

    #[test]
    fn entity_kind_round_trips_through_its_tag() {
        let kinds = [EntityKind::Node, EntityKind::Element(ElementKind::Wedge2)];
        for kind in kinds {
            assert_eq!(kind.to_string().parse::<EntityKind>().unwrap(), kind);
        }
        assert!("coords".parse::<EntityKind>().is_err());
    }

    #[test]
    fn mesh_serializes_with_string_group_keys() {
        let mut mesh = tet_mesh();
        let mut group = Group::new();
        group.push(EntityKind::Element(ElementKind::Tet), 1);
        mesh.groups.insert("solid".to_string(), group);

        let json = serde_json::to_string(&mesh).expect("mesh should serialize");
        assert!(json.contains("\"tet\""));
        let back: Mesh = serde_json::from_str(&json).expect("mesh should deserialize");
        assert_eq!(back, mesh);
    }
}
