//! Fixtures shared by unit tests.

use nalgebra::Vector3;

use crate::interaction::Interaction;
use crate::kinematics::{ArticulatedBody, Geometry, Graphics, JointType, RigidBody, Transform};

/// Planar arm named "arm": link 0 revolute about z at the origin, link 1
/// revolute about z one meter along x.
pub(crate) fn two_link_arm() -> ArticulatedBody {
    let mut ab = ArticulatedBody::new("arm");
    ab.add_rigid_body(RigidBody {
        name: "shoulder".to_string(),
        id_parent: None,
        joint: JointType::Rz,
        to_parent: Transform::default(),
        graphics: vec![],
    });
    ab.add_rigid_body(RigidBody {
        name: "elbow".to_string(),
        id_parent: Some(0),
        joint: JointType::Rz,
        to_parent: Transform::from_translation(Vector3::new(1.0, 0.0, 0.0)),
        graphics: vec![Graphics::new("forearm", Geometry::Capsule { radius: 0.05, length: 1.0 })],
    });
    ab
}

/// Interaction record targeting `key_object` with no keys held.
pub(crate) fn interaction(
    key_object: &str,
    idx_link: i64,
    pos_click_in_link: Vector3<f64>,
    pos_mouse_in_world: Vector3<f64>,
) -> Interaction {
    Interaction {
        key_object: key_object.to_string(),
        idx_link,
        pos_click_in_link,
        pos_mouse_in_world,
        modifier_keys: Default::default(),
        key_down: String::new(),
    }
}
