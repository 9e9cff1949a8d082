use crate::assets::prefab::SharedPrefab;
use crate::config::DeskConfig;
use crate::layout::{Anchor, LegSide};
use crate::parts::{AssemblyLayout, InstanceSpec, PartAssembly, Slot};
use crate::scene::node::ShadowFlags;

/// Two leg instances, mirrored on X. The leg fragment is loaded once per
/// session; later width or height changes re-place these instances in place.
#[must_use]
pub fn assemble(template: SharedPrefab, config: &DeskConfig) -> PartAssembly {
    PartAssembly {
        slot: Slot::Legs,
        template,
        layout: AssemblyLayout::Group,
        instances: LegSide::BOTH
            .into_iter()
            .map(|side| {
                InstanceSpec::placed(
                    Anchor::Leg(side),
                    config,
                    ShadowFlags::CAST | ShadowFlags::RECEIVE,
                )
            })
            .collect(),
    }
}
