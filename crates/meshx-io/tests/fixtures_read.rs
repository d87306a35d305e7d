//! Reads of small hand-written decks in each text format.

mod common;

use common::fixture_path;
use meshx_io::{Diagnostic, MeshFormat, ReadOptions, group_names, read_mesh};
use meshx_model::{ElementKind, EntityKind, Group};

#[test]
fn patran_unknown_group_codes_are_counted() {
    let read = read_mesh(fixture_path("plate.out"), None, &ReadOptions::default())
        .expect("plate.out should parse");
    assert_eq!(read.mesh.nodes.len(), 4);
    assert_eq!(read.mesh.nodes[&3], [2.5, 1.25, 0.0]);
    assert_eq!(read.mesh.element(ElementKind::Quad, 10), Some(&[1, 2, 3, 4][..]));

    let edge = &read.mesh.groups["edge"];
    assert_eq!(edge.nodes(), &[1, 2]);
    assert_eq!(edge.members[&EntityKind::Element(ElementKind::Quad)], vec![10]);
    assert_eq!(
        read.diagnostics.entries(),
        &[Diagnostic::SkippedPairs {
            group: "edge".to_string(),
            count: 3
        }]
    );
}

#[test]
fn abaqus_deck_expands_includes_and_resolves_sets() {
    let read = read_mesh(fixture_path("bracket.inp"), None, &ReadOptions::default())
        .expect("bracket.inp should parse");
    let mesh = &read.mesh;
    assert_eq!(mesh.nodes.len(), 10);
    assert_eq!(mesh.nodes[&4], [0.0, 0.0, 2.0]);
    let tet2 = mesh.element(ElementKind::Tet2, 1).expect("tet2 exists");
    assert_eq!(tet2, (1..=10).collect::<Vec<_>>().as_slice());
    assert_eq!(mesh.element(ElementKind::Tria, 2), Some(&[1, 2, 3][..]));

    assert_eq!(mesh.groups["NALL"].nodes().len(), 10);
    assert_eq!(mesh.groups["FIXED"], Group::with_nodes([1, 2, 3]));
    assert_eq!(mesh.groups["ALL"], mesh.groups["BODY"]);
    assert!(!mesh.groups.contains_key("LATE"));

    let diagnostics = read.diagnostics.entries();
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics.contains(&Diagnostic::UnsupportedElement {
        code: "SPRINGA".to_string(),
        count: 1
    }));
    assert!(diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::DroppedGroup { group, .. } if group == "LATE"
    )));
}

#[test]
fn samcef_unnamed_selections_get_sequential_names() {
    let read = read_mesh(fixture_path("panel.dat"), None, &ReadOptions::default())
        .expect("panel.dat should parse");
    let groups = &read.mesh.groups;
    let names: Vec<&str> = groups.keys().map(String::as_str).collect();
    assert_eq!(names, ["corner", "selection_001", "selection_002"]);
    assert_eq!(groups["selection_001"], Group::with_nodes([1, 2]));

    let elements = &groups["selection_002"];
    assert_eq!(elements.members[&EntityKind::Element(ElementKind::Quad)], vec![1]);
    assert_eq!(elements.members[&EntityKind::Element(ElementKind::Tria)], vec![2]);
    assert_eq!(groups["corner"], Group::with_nodes([3]));
}

#[test]
fn groups_only_read_lists_group_names() {
    let names = group_names(fixture_path("panel.dat"), None).expect("names");
    assert_eq!(names, ["corner", "selection_001", "selection_002"]);

    let names = group_names(fixture_path("bracket.inp"), Some(MeshFormat::Abaqus)).expect("names");
    assert_eq!(names, ["ALL", "BODY", "FIXED", "NALL", "SKIN"]);

    let read = read_mesh(fixture_path("plate.out"), None, &ReadOptions::groups_only())
        .expect("plate.out should parse");
    assert!(read.mesh.nodes.is_empty());
    assert_eq!(read.mesh.element_count(), 0);
    assert_eq!(read.mesh.groups.len(), 1);
}
