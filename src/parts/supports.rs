use crate::assets::prefab::SharedPrefab;
use crate::config::DeskConfig;
use crate::layout::{Anchor, SUPPORT_OFFSETS};
use crate::parts::{AssemblyLayout, InstanceSpec, PartAssembly, Slot};
use crate::scene::node::ShadowFlags;

/// Four support instances at the fixed relative offsets, placed for the
/// current width and leg height.
#[must_use]
pub fn assemble(template: SharedPrefab, config: &DeskConfig) -> PartAssembly {
    PartAssembly {
        slot: Slot::Supports,
        template,
        layout: AssemblyLayout::Group,
        instances: SUPPORT_OFFSETS
            .into_iter()
            .map(|offset| {
                InstanceSpec::placed(
                    Anchor::Support(offset),
                    config,
                    ShadowFlags::CAST | ShadowFlags::RECEIVE,
                )
            })
            .collect(),
    }
}
