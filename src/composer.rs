//! Scene Composer
//!
//! Owns the live scene graph and is the only code that mutates it. Every
//! swappable slot (top, legs, supports) holds at most one attached node.
//!
//! # Load tokens
//!
//! Each asynchronous fetch for a slot is tagged with a [`LoadToken`] issued
//! here. Only a completion carrying the *latest issued* token for its slot
//! may touch the graph; anything older is discarded without being inserted.
//! The check and the swap happen inside one `&mut self` call, so nothing can
//! interleave between them.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::config::DeskConfig;
use crate::errors::AssetError;
use crate::layout::Anchor;
use crate::parts::{AssemblyLayout, InstanceSpec, PartAssembly, Slot};
use crate::scene::node::{Node, NodeKind};
use crate::scene::transform::Transform;
use crate::scene::{EnvironmentHandles, NodeHandle, Scene, build_environment};

/// Identity of one outstanding fetch for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadToken {
    slot: Slot,
    sequence: u64,
}

impl LoadToken {
    #[inline]
    #[must_use]
    pub fn slot(self) -> Slot {
        self.slot
    }

    /// Monotonically increasing per slot, starting at 1.
    #[inline]
    #[must_use]
    pub fn sequence(self) -> u64 {
        self.sequence
    }
}

impl fmt::Display for LoadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.slot, self.sequence)
    }
}

/// What a slot currently shows.
#[derive(Debug, Clone)]
pub enum SlotState {
    /// Nothing requested yet.
    Empty,
    /// First fetch in flight, nothing attached.
    Loading,
    Attached(NodeHandle),
    /// The latest fetch failed and there is no earlier node to fall back to.
    Unavailable(Arc<AssetError>),
}

impl SlotState {
    #[must_use]
    pub fn node(&self) -> Option<NodeHandle> {
        match self {
            SlotState::Attached(handle) => Some(*handle),
            _ => None,
        }
    }
}

/// Result of offering a loaded assembly to the composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Attached(NodeHandle),
    Replaced {
        old: NodeHandle,
        new: NodeHandle,
    },
    /// Superseded by a newer fetch; the graph was not touched.
    Stale,
}

/// Result of reporting a failed fetch to the composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    Stale,
    /// The previously attached node stays in place.
    KeptPrevious(NodeHandle),
    Unavailable,
}

#[derive(Debug)]
struct SlotRecord {
    state: SlotState,
    latest_issued: u64,
    latest_settled: u64,
}

impl SlotRecord {
    fn new() -> Self {
        Self {
            state: SlotState::Empty,
            latest_issued: 0,
            latest_settled: 0,
        }
    }
}

pub struct SceneComposer {
    scene: Scene,
    environment: EnvironmentHandles,
    slots: [SlotRecord; 3],
}

impl SceneComposer {
    /// Creates the scene with its static environment placed for `config`.
    #[must_use]
    pub fn new(config: &DeskConfig) -> Self {
        let mut scene = Scene::new();
        let environment = build_environment(&mut scene, config);
        Self {
            scene,
            environment,
            slots: [SlotRecord::new(), SlotRecord::new(), SlotRecord::new()],
        }
    }

    /// Read access for the external renderer.
    #[inline]
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[inline]
    #[must_use]
    pub fn environment(&self) -> &EnvironmentHandles {
        &self.environment
    }

    /// Refreshes world matrices ahead of a render.
    pub fn update_matrix_world(&mut self) {
        self.scene.update_matrix_world();
    }

    #[inline]
    #[must_use]
    pub fn state(&self, slot: Slot) -> &SlotState {
        &self.slots[slot.index()].state
    }

    #[inline]
    #[must_use]
    pub fn current(&self, slot: Slot) -> Option<NodeHandle> {
        self.state(slot).node()
    }

    /// Whether the latest issued fetch for `slot` has not settled yet.
    #[must_use]
    pub fn in_flight(&self, slot: Slot) -> bool {
        let record = &self.slots[slot.index()];
        record.latest_issued != record.latest_settled
    }

    /// Issues a fresh token; every earlier token for `slot` becomes stale.
    pub fn issue_token(&mut self, slot: Slot) -> LoadToken {
        let record = &mut self.slots[slot.index()];
        record.latest_issued += 1;
        if matches!(record.state, SlotState::Empty | SlotState::Unavailable(_)) {
            record.state = SlotState::Loading;
        }
        LoadToken {
            slot,
            sequence: record.latest_issued,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_current(&self, token: LoadToken) -> bool {
        self.slots[token.slot.index()].latest_issued == token.sequence
    }

    /// Attaches the first node of a slot.
    ///
    /// Should the slot already hold a node (a reload won the race), this
    /// behaves exactly like [`replace`](Self::replace).
    pub fn attach_initial(&mut self, token: LoadToken, part: PartAssembly) -> Commit {
        if let Some(existing) = self.current(token.slot) {
            log::debug!("{} already holds {existing:?}, replacing", token.slot);
        }
        self.commit(token, part)
    }

    /// Swaps the slot's node for `part` if `token` is the latest issued.
    ///
    /// The superseded node is removed exactly once; a stale `part` is dropped
    /// without entering the graph.
    pub fn replace(&mut self, token: LoadToken, part: PartAssembly) -> Commit {
        self.commit(token, part)
    }

    fn commit(&mut self, token: LoadToken, part: PartAssembly) -> Commit {
        debug_assert_eq!(token.slot, part.slot, "token and assembly disagree on slot");

        if !self.is_current(token) {
            log::debug!("Discarding stale completion {token}");
            return Commit::Stale;
        }

        let new = self.install(part);
        let record = &mut self.slots[token.slot.index()];
        record.latest_settled = token.sequence;
        let previous = std::mem::replace(&mut record.state, SlotState::Attached(new));

        match previous {
            SlotState::Attached(old) => {
                self.scene.remove_node(old);
                log::info!("Replaced {} ({token})", token.slot);
                Commit::Replaced { old, new }
            }
            _ => {
                log::info!("Attached {} ({token})", token.slot);
                Commit::Attached(new)
            }
        }
    }

    /// Records a failed fetch. The displayed node, if any, is left untouched.
    pub fn fail(&mut self, token: LoadToken, error: Arc<AssetError>) -> FailureOutcome {
        if !self.is_current(token) {
            return FailureOutcome::Stale;
        }

        let record = &mut self.slots[token.slot.index()];
        record.latest_settled = token.sequence;
        if let SlotState::Attached(node) = record.state {
            return FailureOutcome::KeptPrevious(node);
        }
        record.state = SlotState::Unavailable(error);
        FailureOutcome::Unavailable
    }

    /// Applies `f` to every instance of the slot's current node, in place.
    ///
    /// Never waits on a fetch. Returns the number of instances visited.
    pub fn retransform_in_place<F>(&mut self, slot: Slot, mut f: F) -> usize
    where
        F: FnMut(Anchor, &mut Transform),
    {
        let Some(root) = self.current(slot) else {
            return 0;
        };

        let targets: SmallVec<[NodeHandle; 4]> = match self.scene.get_node(root) {
            Some(node) if matches!(node.kind, NodeKind::Group) => {
                node.children().iter().copied().collect()
            }
            Some(_) => SmallVec::from_slice(&[root]),
            None => return 0,
        };

        let mut visited = 0;
        for handle in targets {
            if let Some(node) = self.scene.get_node_mut(handle) {
                f(node.anchor, &mut node.transform);
                visited += 1;
            }
        }
        visited
    }

    fn install(&mut self, part: PartAssembly) -> NodeHandle {
        let PartAssembly {
            slot,
            template,
            layout,
            instances,
        } = part;

        let instance_node = |name: String, spec: &InstanceSpec| {
            Node::new(name, NodeKind::Instance(Arc::clone(&template)))
                .with_transform(spec.transform.clone())
                .with_anchor(spec.anchor)
                .with_shadows(spec.shadows)
        };

        if layout == AssemblyLayout::Single
            && let [spec] = instances.as_slice()
        {
            return self
                .scene
                .add_node(instance_node(slot.name().to_string(), spec));
        }

        let group = self.scene.add_node(Node::group(slot.name()));
        for (i, spec) in instances.iter().enumerate() {
            self.scene
                .add_to_parent(instance_node(format!("{}_{i}", slot.name()), spec), group);
        }
        group
    }
}
