use slotmap::SlotMap;

use crate::scene::NodeHandle;
use crate::scene::node::Node;
use crate::scene::transform_system;

/// Scene graph
///
/// An arena of [`Node`]s under a single root container. The root itself is
/// never removed; every other node is reachable from it.
pub struct Scene {
    nodes: SlotMap<NodeHandle, Node>,
    root: NodeHandle,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::group("scene_root"));
        Self { nodes, root }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    /// Adds a node directly under the root container.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        self.add_to_parent(node, self.root)
    }

    /// Adds a node under `parent`. Falls back to the root when `parent` does
    /// not exist.
    pub fn add_to_parent(&mut self, mut child: Node, parent: NodeHandle) -> NodeHandle {
        let parent = if self.nodes.contains_key(parent) {
            parent
        } else {
            log::error!("Parent node not found, adding to scene root");
            self.root
        };

        child.parent = Some(parent);
        child.children.clear();
        let handle = self.nodes.insert(child);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(handle);
        }
        handle
    }

    /// Removes a node and its whole subtree. Returns `false` when the node
    /// does not exist or is the root.
    pub fn remove_node(&mut self, handle: NodeHandle) -> bool {
        if handle == self.root || !self.nodes.contains_key(handle) {
            return false;
        }

        // Unlink from the parent first
        if let Some(parent) = self.nodes.get(handle).and_then(|n| n.parent)
            && let Some(p) = self.nodes.get_mut(parent)
            && let Some(i) = p.children.iter().position(|&c| c == handle)
        {
            p.children.remove(i);
        }

        let mut stack = vec![handle];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children);
            }
        }
        true
    }

    #[inline]
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    /// Children of `handle`; empty when the node does not exist.
    #[must_use]
    pub fn children(&self, handle: NodeHandle) -> &[NodeHandle] {
        match self.nodes.get(handle) {
            Some(node) => node.children(),
            None => &[],
        }
    }

    /// Total number of nodes, root included.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &Node)> {
        self.nodes.iter()
    }

    /// Direct children of the root with the given name.
    pub fn find_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = NodeHandle> + 'a {
        self.children(self.root)
            .iter()
            .copied()
            .filter(move |&h| self.nodes.get(h).is_some_and(|n| n.name == name))
    }

    /// Updates world matrices of the whole graph. Call before rendering.
    pub fn update_matrix_world(&mut self) {
        let roots = [self.root];
        transform_system::update_hierarchy_iterative(&mut self.nodes, &roots);
    }
}
