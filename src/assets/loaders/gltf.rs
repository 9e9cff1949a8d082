//! glTF / GLB fragment loader.
//!
//! Only the node hierarchy is extracted: names, local TRS and mesh names.
//! Geometry and material data stay with the renderer.

use glam::{Quat, Vec3};

use crate::assets::prefab::{Prefab, PrefabNode};
use crate::errors::AssetError;

/// Parses a `.gltf` or `.glb` payload into a [`Prefab`].
///
/// The default scene (or the first scene when none is marked default) gives
/// the root nodes.
pub fn parse_prefab(bytes: &[u8], source: &str) -> Result<Prefab, AssetError> {
    let gltf = gltf::Gltf::from_slice(bytes)?;

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| AssetError::EmptyScene(source.to_string()))?;

    let mut prefab = Prefab::new(source);
    prefab.nodes.reserve(gltf.nodes().count());

    // Step 1: flat nodes, indexed like the document
    for node in gltf.nodes() {
        prefab.nodes.push(create_node(&node));
    }

    // Step 2: hierarchy
    for node in gltf.nodes() {
        let children: Vec<usize> = node.children().map(|c| c.index()).collect();
        prefab.nodes[node.index()].children_indices = children;
    }

    prefab.root_indices = scene.nodes().map(|n| n.index()).collect();
    if prefab.root_indices.is_empty() {
        return Err(AssetError::EmptyScene(source.to_string()));
    }

    log::debug!(
        "Parsed {source}: {} nodes, {} roots",
        prefab.node_count(),
        prefab.root_indices.len()
    );
    Ok(prefab)
}

fn create_node(node: &gltf::Node<'_>) -> PrefabNode {
    let name = node
        .name()
        .map_or_else(|| format!("Node_{}", node.index()), str::to_string);

    let mut prefab_node = PrefabNode::with_name(name);
    let (t, r, s) = node.transform().decomposed();
    prefab_node.transform.position = Vec3::from_array(t);
    prefab_node.transform.rotation = Quat::from_array(r);
    prefab_node.transform.scale = Vec3::from_array(s);
    prefab_node.mesh = node.mesh().map(|mesh| {
        mesh.name()
            .map_or_else(|| format!("Mesh_{}", mesh.index()), str::to_string)
    });
    prefab_node
}
