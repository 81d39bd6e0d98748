//! redisgl Core - Scene Registry and Interaction Protocol
//!
//! A simulator publishes its scene to a browser front-end through a shared
//! key-value store:
//! 1. **Registry**: entity descriptors (robots, objects, trajectories,
//!    cameras) written under namespaced keys the front-end can scan
//! 2. **Interaction**: the front-end writes one click-and-drag record; the
//!    simulator turns it into pose adjustments or external forces
//! 3. **Session**: per-tick polling and pose publishing for one namespace
//!
//! Live state (poses, joint positions) is published separately under keys the
//! descriptors reference, so descriptors are written once.

pub mod config;
pub mod error;
pub mod interaction;
pub mod keys;
pub mod kinematics;
pub mod models;
pub mod registry;
pub mod session;
mod wire;

#[cfg(test)]
mod test_support;

// Re-export key types for convenience
pub use config::{InteractionGains, SessionConfig};
pub use error::RegistryError;
pub use interaction::{
    click_adjust_pose, click_orientation_adjustment, click_position_adjustment, compute_external_forces,
    keypress_orientation_adjustment, keypress_position_adjustment, Interaction, ModifierKey,
};
pub use keys::{EntityKind, KeySchema, ModelKeyArgs, ModelKeys};
pub use kinematics::{
    ArticulatedBody, Geometry, Graphics, JointType, KinematicsError, LinkKinematics, Material, RigidBody,
    SpatialForce, Transform,
};
pub use models::{CameraModel, Descriptor, EntityDescriptor, ObjectModel, RobotModel, TrajectoryModel};
pub use registry::ModelRegistry;
pub use session::SimulatorSession;
