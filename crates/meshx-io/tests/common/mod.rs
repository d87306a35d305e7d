#![allow(dead_code)]

use std::path::PathBuf;

use meshx_model::{ElementKind, EntityKind, Group, Mesh};

pub fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(name);
    path
}

/// One element of every kind the text formats share, with coordinates that
/// survive a 4-digit mantissa exactly. Element IDs are unique across kinds.
pub fn sample_mesh() -> Mesh {
    let mut mesh = Mesh::new();
    for id in 1..=27 {
        let x = id as f64 * 0.5;
        let y = (id % 3) as f64 * 0.25;
        let z = -((id % 5) as f64) * 1.5;
        mesh.insert_node(id, [x, y, z]);
    }
    let elements: [(ElementKind, i32, Vec<i32>); 12] = [
        (ElementKind::Tet, 1, vec![1, 2, 3, 4]),
        (ElementKind::Hex2, 2, (1..=20).collect()),
        (ElementKind::Wedge2, 3, (1..=15).collect()),
        (ElementKind::Tria, 4, vec![5, 6, 7]),
        (ElementKind::Quad2, 5, (1..=8).collect()),
        (ElementKind::Bar, 6, vec![8, 9]),
        (ElementKind::Tet2, 7, (11..=20).collect()),
        (ElementKind::Hex, 8, (20..=27).collect()),
        (ElementKind::Wedge, 9, (1..=6).collect()),
        (ElementKind::Quad, 10, vec![1, 2, 3, 4]),
        (ElementKind::Tria2, 11, (21..=26).collect()),
        (ElementKind::Bar2, 12, vec![1, 2, 3]),
    ];
    for (kind, id, nodes) in elements {
        mesh.insert_element(kind, id, nodes)
            .expect("sample element should insert");
    }

    mesh.groups
        .insert("support".to_string(), Group::with_nodes([1, 2, 3]));
    let mut solids = Group::new();
    solids.push(EntityKind::Element(ElementKind::Tet), 1);
    solids.push(EntityKind::Element(ElementKind::Hex2), 2);
    mesh.groups.insert("solids".to_string(), solids);
    mesh
}

/// `sample_mesh` plus a group holding both nodes and elements.
pub fn sample_mesh_with_mixed_group() -> Mesh {
    let mut mesh = sample_mesh();
    let mut mixed = Group::with_nodes([4]);
    mixed.push(EntityKind::Element(ElementKind::Tria), 4);
    mesh.groups.insert("mixed".to_string(), mixed);
    mesh
}
