//! Articulated-body descriptions and the kinematics the interaction engine
//! needs from them.
//!
//! The JSON shape of [`ArticulatedBody`] and [`Graphics`] is what robot and
//! object descriptors embed. Live joint configuration is not part of it: the
//! simulator publishes `q` under the robot's `key_q` and sets it on its own
//! copy of the body with [`ArticulatedBody::set_q`].

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::wire::{quat_serde, vec3_serde};

/// Kinematics errors
#[derive(Debug, Error, PartialEq)]
pub enum KinematicsError {
    #[error("Link index {idx} out of range for body with {num_links} links")]
    LinkOutOfRange { idx: i64, num_links: usize },

    #[error("Link {link} has parent {parent}, which does not precede it")]
    InvalidParent { link: usize, parent: usize },

    #[error("Expected {expected} joint positions, got {actual}")]
    DofMismatch { expected: usize, actual: usize },
}

/// Rigid transform serialized as `{ "pos": [..], "ori": { "w", "x", "y", "z" } }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(with = "vec3_serde")]
    pub pos: Vector3<f64>,

    #[serde(with = "quat_serde")]
    pub ori: UnitQuaternion<f64>,
}

impl Transform {
    pub fn new(pos: Vector3<f64>, ori: UnitQuaternion<f64>) -> Self {
        Self { pos, ori }
    }

    pub fn from_translation(pos: Vector3<f64>) -> Self {
        Self::new(pos, UnitQuaternion::identity())
    }

    pub fn isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.pos), self.ori)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_translation(Vector3::zeros())
    }
}

/// Shape of a graphics primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    Box { scale: [f64; 3] },
    Sphere { radius: f64 },
    Cylinder { radius: f64, length: f64 },
    Capsule { radius: f64, length: f64 },
    Mesh { mesh: String, scale: [f64; 3] },
}

/// Surface appearance of a graphics primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    #[serde(default)]
    pub name: String,

    /// Red, green, blue, alpha in [0, 1]
    #[serde(default = "Material::default_rgba")]
    pub rgba: [f64; 4],

    /// Texture path relative to a registered resource root
    #[serde(default)]
    pub texture: String,
}

impl Material {
    fn default_rgba() -> [f64; 4] {
        [1.0, 1.0, 1.0, 1.0]
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            rgba: Self::default_rgba(),
            texture: String::new(),
        }
    }
}

/// A renderable primitive attached to a link or an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graphics {
    pub name: String,

    #[serde(rename = "T_to_parent", default)]
    pub to_parent: Transform,

    pub geometry: Geometry,

    #[serde(default)]
    pub material: Material,
}

impl Graphics {
    pub fn new(name: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            name: name.into(),
            to_parent: Transform::default(),
            geometry,
            material: Material::default(),
        }
    }
}

/// Joint connecting a link to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JointType {
    /// Revolute about x
    Rx,
    Ry,
    Rz,
    /// Prismatic along x
    Px,
    Py,
    Pz,
}

impl JointType {
    /// Joint motion for joint position `q`.
    pub fn motion(self, q: f64) -> Isometry3<f64> {
        match self {
            JointType::Rx => Isometry3::rotation(Vector3::x() * q),
            JointType::Ry => Isometry3::rotation(Vector3::y() * q),
            JointType::Rz => Isometry3::rotation(Vector3::z() * q),
            JointType::Px => Isometry3::translation(q, 0.0, 0.0),
            JointType::Py => Isometry3::translation(0.0, q, 0.0),
            JointType::Pz => Isometry3::translation(0.0, 0.0, q),
        }
    }
}

/// One link of an articulated body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    pub name: String,

    /// Index of the parent link; `None` for links attached to the base
    #[serde(default)]
    pub id_parent: Option<usize>,

    pub joint: JointType,

    /// Joint frame relative to the parent link frame at `q = 0`
    #[serde(rename = "T_to_parent", default)]
    pub to_parent: Transform,

    #[serde(default)]
    pub graphics: Vec<Graphics>,
}

/// A tree of rigid bodies connected by single-DOF joints.
///
/// Equality compares the description only; the live `q` is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticulatedBody {
    pub name: String,

    pub rigid_bodies: Vec<RigidBody>,

    #[serde(rename = "T_base_to_world", default)]
    pub base_to_world: Transform,

    #[serde(default)]
    pub graphics: Vec<Graphics>,

    /// Joint positions; live state, never serialized
    #[serde(skip)]
    q: Vec<f64>,
}

impl ArticulatedBody {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rigid_bodies: Vec::new(),
            base_to_world: Transform::default(),
            graphics: Vec::new(),
            q: Vec::new(),
        }
    }

    /// Appends a link and returns its index.
    pub fn add_rigid_body(&mut self, rigid_body: RigidBody) -> usize {
        self.rigid_bodies.push(rigid_body);
        self.rigid_bodies.len() - 1
    }

    /// Degrees of freedom (one per link).
    pub fn dof(&self) -> usize {
        self.rigid_bodies.len()
    }

    /// Current joint positions. Unset joints read as zero.
    pub fn q(&self) -> Vec<f64> {
        (0..self.dof()).map(|i| self.joint_position(i)).collect()
    }

    /// Sets the joint positions.
    pub fn set_q(&mut self, q: Vec<f64>) -> Result<(), KinematicsError> {
        if q.len() != self.dof() {
            return Err(KinematicsError::DofMismatch {
                expected: self.dof(),
                actual: q.len(),
            });
        }
        self.q = q;
        Ok(())
    }

    fn joint_position(&self, idx: usize) -> f64 {
        self.q.get(idx).copied().unwrap_or(0.0)
    }
}

impl PartialEq for ArticulatedBody {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.rigid_bodies == other.rigid_bodies
            && self.base_to_world == other.base_to_world
            && self.graphics == other.graphics
    }
}

/// Forward kinematics capability the interaction engine relies on.
pub trait LinkKinematics {
    /// Body name; the suffix of the robot's registry key.
    fn name(&self) -> &str;

    /// Number of links.
    fn num_links(&self) -> usize;

    /// Pose of link `idx_link` in the world frame.
    fn link_to_world(&self, idx_link: usize) -> Result<Isometry3<f64>, KinematicsError>;

    /// World position of `offset`, given in the frame of link `idx_link`.
    fn link_position(
        &self,
        idx_link: usize,
        offset: &Vector3<f64>,
    ) -> Result<Vector3<f64>, KinematicsError> {
        let t_link_to_world = self.link_to_world(idx_link)?;
        Ok(t_link_to_world.transform_point(&Point3::from(*offset)).coords)
    }
}

impl LinkKinematics for ArticulatedBody {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_links(&self) -> usize {
        self.rigid_bodies.len()
    }

    fn link_to_world(&self, idx_link: usize) -> Result<Isometry3<f64>, KinematicsError> {
        let num_links = self.num_links();
        if idx_link >= num_links {
            return Err(KinematicsError::LinkOutOfRange {
                idx: idx_link as i64,
                num_links,
            });
        }

        // Walk up to the base, then compose downward
        let mut chain = Vec::new();
        let mut current = Some(idx_link);
        while let Some(link) = current {
            let parent = self.rigid_bodies[link].id_parent;
            if let Some(parent) = parent {
                if parent >= link {
                    return Err(KinematicsError::InvalidParent { link, parent });
                }
            }
            chain.push(link);
            current = parent;
        }

        let mut t_to_world = self.base_to_world.isometry();
        for &link in chain.iter().rev() {
            let rb = &self.rigid_bodies[link];
            t_to_world = t_to_world * rb.to_parent.isometry() * rb.joint.motion(self.joint_position(link));
        }
        Ok(t_to_world)
    }
}

/// A force and moment pair, both expressed in the world frame about the
/// world origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialForce {
    #[serde(with = "vec3_serde")]
    pub force: Vector3<f64>,

    #[serde(with = "vec3_serde")]
    pub moment: Vector3<f64>,
}

impl SpatialForce {
    pub fn new(force: Vector3<f64>, moment: Vector3<f64>) -> Self {
        Self { force, moment }
    }

    pub fn zero() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros())
    }

    /// Re-expresses a wrench given about point `p` as one about the origin.
    ///
    /// The force is unchanged; the moment picks up `p × f`.
    pub fn translated(&self, p: &Vector3<f64>) -> Self {
        Self::new(self.force, self.moment + p.cross(&self.force))
    }

    /// Moment of this wrench about point `p`.
    pub fn moment_about(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.moment - p.cross(&self.force)
    }
}
