use std::sync::Arc;

use crate::scene::transform::Transform;

/// A node of a loaded fragment: data only, children referenced by index.
#[derive(Debug, Clone)]
pub struct PrefabNode {
    pub name: Option<String>,
    pub transform: Transform,
    /// Indices of child nodes in `Prefab::nodes`
    pub children_indices: Vec<usize>,
    /// Name of the mesh attached to this node, if any
    pub mesh: Option<String>,
}

impl PrefabNode {
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: None,
            transform: Transform::new(),
            children_indices: Vec::new(),
            mesh: None,
        }
    }

    #[must_use]
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new()
        }
    }
}

impl Default for PrefabNode {
    fn default() -> Self {
        Self::new()
    }
}

/// A fragment template parsed from an asset file.
///
/// `Prefab` is plain data with no scene references. The scene never copies
/// it: every instance holds a [`SharedPrefab`] and carries only its own
/// transform.
#[derive(Debug, Clone, Default)]
pub struct Prefab {
    /// Reference the fragment was loaded from
    pub source: String,
    /// Flat storage of all nodes
    pub nodes: Vec<PrefabNode>,
    /// Indices of the root nodes in `nodes`
    pub root_indices: Vec<usize>,
}

impl Prefab {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            nodes: Vec::new(),
            root_indices: Vec::new(),
        }
    }

    /// A fragment made of one named mesh node.
    #[must_use]
    pub fn single(source: impl Into<String>, mesh: impl Into<String>) -> Self {
        let mesh = mesh.into();
        let mut prefab = Self::new(source);
        let mut node = PrefabNode::with_name(mesh.clone());
        node.mesh = Some(mesh);
        prefab.nodes.push(node);
        prefab.root_indices.push(0);
        prefab
    }

    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn roots(&self) -> impl Iterator<Item = &PrefabNode> {
        self.root_indices.iter().filter_map(|&i| self.nodes.get(i))
    }

    /// Names of every mesh in the fragment, in node order.
    pub fn mesh_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|n| n.mesh.as_deref())
    }
}

/// Shared, immutable fragment template.
pub type SharedPrefab = Arc<Prefab>;
