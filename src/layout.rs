//! Transform Calculator
//!
//! Pure mapping from a [`DeskConfig`] to the scale, position and rotation of
//! every composable part. Lengths in the configuration are millimetres; the
//! scene works in metres.
//!
//! Each placed instance carries an [`Anchor`] naming its role, so a single
//! function, [`place`], serves both first assembly and later in-place
//! retransforms. Calling it twice with the same configuration yields the same
//! transform.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{EulerRot, Quat, Vec3};

use crate::config::DeskConfig;
use crate::scene::transform::Transform;

/// Half distance between the two legs, in metres.
pub const LEG_OFFSET_X: f32 = 0.45;
/// Height of the leg origin above the desk-top origin.
pub const LEG_BASE_Y: f32 = 0.01;
/// Lift applied to supports above half the leg height.
pub const SUPPORT_LIFT_Y: f32 = 0.01;

/// Relative (x, z) offsets of the four supports, before width scaling.
pub const SUPPORT_OFFSETS: [SupportOffset; 4] = [
    SupportOffset::new(-0.45, -0.15),
    SupportOffset::new(0.45, -0.15),
    SupportOffset::new(-0.45, 0.15),
    SupportOffset::new(0.45, 0.15),
];

#[inline]
fn metres(mm: i32) -> f32 {
    mm as f32 / 1000.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegSide {
    Left,
    Right,
}

impl LegSide {
    pub const BOTH: [LegSide; 2] = [LegSide::Left, LegSide::Right];

    #[inline]
    #[must_use]
    pub fn sign(self) -> f32 {
        match self {
            LegSide::Left => -1.0,
            LegSide::Right => 1.0,
        }
    }
}

/// Offset of one support relative to the desk centre. `x` is used as is,
/// `z` is scaled by the desk width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportOffset {
    pub x: f32,
    pub z: f32,
}

impl SupportOffset {
    #[must_use]
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }
}

/// The role of a placed instance. Stored on the scene node so the instance
/// can be re-placed when the configuration changes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Anchor {
    /// Not driven by the configuration (groups, environment).
    #[default]
    Fixed,
    Top,
    Leg(LegSide),
    Support(SupportOffset),
}

/// A complete local transform for one instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Placement {
    pub fn apply(&self, transform: &mut Transform) {
        transform.position = self.position;
        transform.rotation = self.rotation;
        transform.scale = self.scale;
    }
}

/// Desk-top scale: fixed X baseline, depth and width linear around 600 mm
/// and 1000 mm.
#[must_use]
pub fn top_scale(config: &DeskConfig) -> Vec3 {
    Vec3::new(
        10.0,
        0.3 * config.desk_depth_mm() as f32 / 600.0,
        5.0 * config.desk_width_mm() as f32 / 1000.0,
    )
}

#[must_use]
pub fn leg_scale(config: &DeskConfig) -> Vec3 {
    Vec3::new(
        1.3 * config.desk_width_mm() as f32 / 1000.0,
        metres(config.leg_height_mm()),
        1.0,
    )
}

#[must_use]
pub fn leg_position(side: LegSide) -> Vec3 {
    Vec3::new(side.sign() * LEG_OFFSET_X, LEG_BASE_Y, 0.0)
}

/// Both legs share the same rotation; only the X position mirrors.
#[must_use]
pub fn leg_rotation() -> Quat {
    Quat::from_euler(EulerRot::XYZ, PI, FRAC_PI_2, 0.0)
}

#[must_use]
pub fn support_position(offset: SupportOffset, config: &DeskConfig) -> Vec3 {
    Vec3::new(
        offset.x,
        -metres(config.leg_height_mm()) / 2.0 + SUPPORT_LIFT_Y,
        offset.z * config.desk_width_mm() as f32 / 1000.0,
    )
}

/// Y of the ground plane. Evaluated once, when the environment is built.
#[must_use]
pub fn ground_offset_y(config: &DeskConfig) -> f32 {
    -metres(config.leg_height_mm())
}

/// Computes the placement of an anchored instance; `None` for
/// [`Anchor::Fixed`].
#[must_use]
pub fn place(anchor: Anchor, config: &DeskConfig) -> Option<Placement> {
    match anchor {
        Anchor::Fixed => None,
        Anchor::Top => Some(Placement {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: top_scale(config),
        }),
        Anchor::Leg(side) => Some(Placement {
            position: leg_position(side),
            rotation: leg_rotation(),
            scale: leg_scale(config),
        }),
        Anchor::Support(offset) => Some(Placement {
            position: support_position(offset, config),
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }),
    }
}
