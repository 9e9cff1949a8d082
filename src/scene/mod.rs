//! Scene graph
//!
//! - Node: hierarchy links, transform, shadow flags and role
//! - Transform: position, rotation, scale with cached matrices
//! - Scene: the node arena under a single root
//! - TransformSystem: world-matrix propagation
//! - Environment: ground plane and lights

pub mod environment;
pub mod light;
pub mod node;
pub mod scene;
pub mod transform;
pub mod transform_system;

pub use environment::{EnvironmentHandles, build_environment};
pub use light::{Light, LightKind};
pub use node::{Node, NodeKind, ShadowFlags};
pub use scene::Scene;
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
}
