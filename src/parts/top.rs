use smallvec::smallvec;

use crate::assets::prefab::SharedPrefab;
use crate::config::DeskConfig;
use crate::layout::Anchor;
use crate::parts::{AssemblyLayout, InstanceSpec, PartAssembly, Slot};
use crate::scene::node::ShadowFlags;

/// One desk-top instance at the origin, scaled for width and depth.
#[must_use]
pub fn assemble(template: SharedPrefab, config: &DeskConfig) -> PartAssembly {
    PartAssembly {
        slot: Slot::Top,
        template,
        layout: AssemblyLayout::Single,
        instances: smallvec![InstanceSpec::placed(
            Anchor::Top,
            config,
            ShadowFlags::CAST | ShadowFlags::RECEIVE,
        )],
    }
}
