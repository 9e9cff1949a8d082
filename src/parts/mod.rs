//! Part Assemblers
//!
//! Turn a freshly loaded fragment into a finished, placed sub-assembly:
//! - [`top`]: one instance, scaled by width and depth
//! - [`legs`]: two mirrored instances
//! - [`supports`]: four instances at fixed relative offsets
//!
//! Assemblers never copy the fragment. Every instance shares the same
//! [`SharedPrefab`] and only owns its transform.

pub mod legs;
pub mod supports;
pub mod top;

use std::fmt;

use smallvec::SmallVec;

use crate::assets::prefab::SharedPrefab;
use crate::config::DeskConfig;
use crate::layout::{self, Anchor};
use crate::scene::node::ShadowFlags;
use crate::scene::transform::Transform;

/// One of the three swappable composite parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    Top,
    Legs,
    Supports,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Top, Slot::Legs, Slot::Supports];

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Slot::Top => "desk_top",
            Slot::Legs => "legs",
            Slot::Supports => "supports",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the instances of an assembly hang in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyLayout {
    /// The single instance sits directly under the root.
    Single,
    /// Instances are children of one group node.
    Group,
}

/// A placed instance before it enters the scene.
#[derive(Debug, Clone)]
pub struct InstanceSpec {
    pub anchor: Anchor,
    pub transform: Transform,
    pub shadows: ShadowFlags,
}

impl InstanceSpec {
    /// Places `anchor` for `config`.
    #[must_use]
    pub fn placed(anchor: Anchor, config: &DeskConfig, shadows: ShadowFlags) -> Self {
        let mut transform = Transform::new();
        retransform(anchor, config, &mut transform);
        Self {
            anchor,
            transform,
            shadows,
        }
    }
}

/// A finished sub-assembly, ready for the scene composer.
#[derive(Debug, Clone)]
pub struct PartAssembly {
    pub slot: Slot,
    pub template: SharedPrefab,
    pub layout: AssemblyLayout,
    pub instances: SmallVec<[InstanceSpec; 4]>,
}

/// Runs the assembler that owns `slot`.
#[must_use]
pub fn assemble(slot: Slot, template: SharedPrefab, config: &DeskConfig) -> PartAssembly {
    match slot {
        Slot::Top => top::assemble(template, config),
        Slot::Legs => legs::assemble(template, config),
        Slot::Supports => supports::assemble(template, config),
    }
}

/// Re-places an existing instance for a new configuration. Returns `false`
/// for [`Anchor::Fixed`], which is left untouched.
pub fn retransform(anchor: Anchor, config: &DeskConfig, transform: &mut Transform) -> bool {
    match layout::place(anchor, config) {
        Some(placement) => {
            placement.apply(transform);
            true
        }
        None => false,
    }
}
