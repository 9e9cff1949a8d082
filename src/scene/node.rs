use bitflags::bitflags;
use glam::{Affine3A, Vec2};
use smallvec::SmallVec;

use crate::assets::prefab::SharedPrefab;
use crate::layout::Anchor;
use crate::scene::NodeHandle;
use crate::scene::light::Light;
use crate::scene::transform::Transform;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ShadowFlags: u8 {
        const CAST    = 1 << 0;
        const RECEIVE = 1 << 1;
    }
}

/// What a node represents.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A pure container.
    Group,
    /// One placed copy of a loaded fragment. The template is shared by every
    /// instance created from the same load.
    Instance(SharedPrefab),
    /// The ground plane, `size` in metres.
    Ground { size: Vec2 },
    Light(Light),
}

/// A scene node: hierarchy links, transform and the few flags the renderer
/// needs.
///
/// Nodes form a tree through `parent` / `children`; keep both sides in sync
/// through [`Scene`](crate::scene::Scene) rather than editing them directly.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: SmallVec<[NodeHandle; 4]>,

    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
    /// How the configuration places this node
    pub anchor: Anchor,
    pub shadows: ShadowFlags,
}

impl Node {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            parent: None,
            children: SmallVec::new(),
            name: name.into(),
            transform: Transform::new(),
            kind,
            anchor: Anchor::Fixed,
            shadows: ShadowFlags::empty(),
        }
    }

    #[must_use]
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    #[must_use]
    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    #[must_use]
    pub fn with_shadows(mut self, shadows: ShadowFlags) -> Self {
        self.shadows = shadows;
        self
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// The shared template of an instance node.
    #[must_use]
    pub fn template(&self) -> Option<&SharedPrefab> {
        match &self.kind {
            NodeKind::Instance(template) => Some(template),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn casts_shadow(&self) -> bool {
        self.shadows.contains(ShadowFlags::CAST)
    }

    #[inline]
    #[must_use]
    pub fn receives_shadow(&self) -> bool {
        self.shadows.contains(ShadowFlags::RECEIVE)
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }
}
