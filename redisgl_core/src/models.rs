//! Entity descriptors written to the registry.
//!
//! A descriptor holds an entity's structural data plus *references* (key
//! strings) to where its live state is published. Pose and joint
//! configuration are never embedded: the simulator writes them under
//! `key_pos` / `key_ori` / `key_q` every tick, while the descriptor itself
//! is written once.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::keys::EntityKind;
use crate::kinematics::{ArticulatedBody, Graphics};

/// Serialization contract of one descriptor variant.
///
/// `KIND` selects the key prefix and is the discriminator used to decode
/// an untyped document back into a [`Descriptor`].
pub trait EntityDescriptor: Serialize + DeserializeOwned {
    const KIND: EntityKind;

    /// Key suffix, unique within the kind and namespace.
    fn name(&self) -> &str;
}

/// A robot: an articulated body plus its joint and base pose keys.
///
/// The body is shared through an `Arc` so the physics loop and the registry
/// can hold the same description without copying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotModel {
    pub articulated_body: Arc<ArticulatedBody>,
    pub key_q: String,
    pub key_pos: String,
    pub key_ori: String,
}

impl RobotModel {
    pub fn new(articulated_body: Arc<ArticulatedBody>, key_q: impl Into<String>) -> Self {
        Self {
            articulated_body,
            key_q: key_q.into(),
            key_pos: String::new(),
            key_ori: String::new(),
        }
    }

    /// Sets the keys of the base position and orientation.
    pub fn with_pose_keys(mut self, key_pos: impl Into<String>, key_ori: impl Into<String>) -> Self {
        self.key_pos = key_pos.into();
        self.key_ori = key_ori.into();
        self
    }
}

impl EntityDescriptor for RobotModel {
    const KIND: EntityKind = EntityKind::Robot;

    fn name(&self) -> &str {
        &self.articulated_body.name
    }
}

/// A free object rendered from a list of graphics primitives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectModel {
    pub name: String,
    pub graphics: Vec<Graphics>,
    pub key_pos: String,
    pub key_ori: String,
}

impl ObjectModel {
    pub fn new(name: impl Into<String>, graphics: Vec<Graphics>, key_pos: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graphics,
            key_pos: key_pos.into(),
            key_ori: String::new(),
        }
    }

    /// An object made of a single primitive, named after it.
    pub fn from_graphics(graphics: Graphics, key_pos: impl Into<String>) -> Self {
        Self::new(graphics.name.clone(), vec![graphics], key_pos)
    }

    pub fn with_key_ori(mut self, key_ori: impl Into<String>) -> Self {
        self.key_ori = key_ori.into();
        self
    }
}

impl EntityDescriptor for ObjectModel {
    const KIND: EntityKind = EntityKind::Object;

    fn name(&self) -> &str {
        &self.name
    }
}

/// A position series drawn as a trajectory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrajectoryModel {
    pub name: String,
    pub key_pos: String,
}

impl TrajectoryModel {
    pub fn new(name: impl Into<String>, key_pos: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_pos: key_pos.into(),
        }
    }
}

impl EntityDescriptor for TrajectoryModel {
    const KIND: EntityKind = EntityKind::Trajectory;

    fn name(&self) -> &str {
        &self.name
    }
}

/// A camera with its pose, intrinsics and image buffer keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraModel {
    pub name: String,
    pub key_pos: String,
    pub key_ori: String,
    pub key_intrinsic: String,
    pub key_depth_image: String,
    pub key_rgb_image: String,
}

impl CameraModel {
    pub fn new(
        name: impl Into<String>,
        key_pos: impl Into<String>,
        key_ori: impl Into<String>,
        key_intrinsic: impl Into<String>,
        key_depth_image: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            key_pos: key_pos.into(),
            key_ori: key_ori.into(),
            key_intrinsic: key_intrinsic.into(),
            key_depth_image: key_depth_image.into(),
            key_rgb_image: String::new(),
        }
    }

    pub fn with_rgb_image(mut self, key_rgb_image: impl Into<String>) -> Self {
        self.key_rgb_image = key_rgb_image.into();
        self
    }
}

impl EntityDescriptor for CameraModel {
    const KIND: EntityKind = EntityKind::Camera;

    fn name(&self) -> &str {
        &self.name
    }
}

/// Any registered descriptor, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    Robot(RobotModel),
    Object(ObjectModel),
    Trajectory(TrajectoryModel),
    Camera(CameraModel),
}

impl Descriptor {
    pub fn kind(&self) -> EntityKind {
        match self {
            Descriptor::Robot(_) => EntityKind::Robot,
            Descriptor::Object(_) => EntityKind::Object,
            Descriptor::Trajectory(_) => EntityKind::Trajectory,
            Descriptor::Camera(_) => EntityKind::Camera,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Descriptor::Robot(m) => m.name(),
            Descriptor::Object(m) => m.name(),
            Descriptor::Trajectory(m) => m.name(),
            Descriptor::Camera(m) => m.name(),
        }
    }

    /// Encodes the wrapped descriptor with its variant's contract.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        match self {
            Descriptor::Robot(m) => serde_json::to_value(m),
            Descriptor::Object(m) => serde_json::to_value(m),
            Descriptor::Trajectory(m) => serde_json::to_value(m),
            Descriptor::Camera(m) => serde_json::to_value(m),
        }
    }

    /// Decodes `value` with the contract selected by `kind`.
    pub fn from_json(kind: EntityKind, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            EntityKind::Robot => Descriptor::Robot(serde_json::from_value(value)?),
            EntityKind::Object => Descriptor::Object(serde_json::from_value(value)?),
            EntityKind::Trajectory => Descriptor::Trajectory(serde_json::from_value(value)?),
            EntityKind::Camera => Descriptor::Camera(serde_json::from_value(value)?),
        })
    }
}

impl From<RobotModel> for Descriptor {
    fn from(m: RobotModel) -> Self {
        Descriptor::Robot(m)
    }
}

impl From<ObjectModel> for Descriptor {
    fn from(m: ObjectModel) -> Self {
        Descriptor::Object(m)
    }
}

impl From<TrajectoryModel> for Descriptor {
    fn from(m: TrajectoryModel) -> Self {
        Descriptor::Trajectory(m)
    }
}

impl From<CameraModel> for Descriptor {
    fn from(m: CameraModel) -> Self {
        Descriptor::Camera(m)
    }
}
