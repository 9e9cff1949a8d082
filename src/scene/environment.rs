//! Static environment: ground plane and lights.
//!
//! Built once when the scene is created; the composition engine never
//! touches these nodes afterwards.

use std::f32::consts::FRAC_PI_2;

use glam::{Vec2, Vec3};

use crate::config::DeskConfig;
use crate::layout;
use crate::scene::light::Light;
use crate::scene::node::{Node, NodeKind, ShadowFlags};
use crate::scene::{NodeHandle, Scene};

pub const GROUND_SIZE: Vec2 = Vec2::new(5000.0, 5000.0);
pub const AMBIENT_INTENSITY: f32 = 0.7;
pub const DIRECTIONAL_INTENSITY: f32 = 1.0;

#[derive(Debug, Clone, Copy)]
pub struct EnvironmentHandles {
    pub ground: NodeHandle,
    pub ambient: NodeHandle,
    pub sun: NodeHandle,
}

/// Adds the ground plane and the light rig under the scene root.
///
/// The ground Y offset follows the leg height of `config` at this moment
/// only.
pub fn build_environment(scene: &mut Scene, config: &DeskConfig) -> EnvironmentHandles {
    let mut ground = Node::new("ground", NodeKind::Ground { size: GROUND_SIZE })
        .with_shadows(ShadowFlags::RECEIVE);
    ground.transform.set_rotation_euler(-FRAC_PI_2, 0.0, 0.0);
    ground.transform.position = Vec3::new(0.0, layout::ground_offset_y(config), 0.0);
    let ground = scene.add_node(ground);

    let ambient = scene.add_node(Node::new(
        "ambient_light",
        NodeKind::Light(Light::new_ambient(Vec3::ONE, AMBIENT_INTENSITY)),
    ));

    let mut sun = Node::new(
        "directional_light",
        NodeKind::Light(Light::new_directional(Vec3::ONE, DIRECTIONAL_INTENSITY)),
    );
    sun.transform.position = Vec3::new(0.0, 1.0, 0.0);
    let sun = scene.add_node(sun);

    EnvironmentHandles {
        ground,
        ambient,
        sun,
    }
}
