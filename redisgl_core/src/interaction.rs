//! Click-and-drag and keyboard interaction translated into pose
//! adjustments and external forces.
//!
//! The front-end overwrites one [`Interaction`] record on every pointer move
//! or keypress. The simulator polls it once per tick and feeds it to these
//! functions, which are pure:
//!
//! - **Kinematic mode**: [`click_adjust_pose`] drives the clicked point
//!   toward the mouse with proportional position or orientation control
//! - **Dynamic mode**: [`compute_external_forces`] turns the same drag into
//!   a wrench on the clicked robot link
//! - **Keyboard**: [`keypress_position_adjustment`] and
//!   [`keypress_orientation_adjustment`] give fixed per-tick nudges

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::keys::{EntityKind, ModelKeys};
use crate::kinematics::{KinematicsError, LinkKinematics, SpatialForce};
use crate::wire::vec3_serde;

pub const DEFAULT_CLICK_POSITION_GAIN: f64 = 1e-2;
pub const DEFAULT_CLICK_ORIENTATION_GAIN: f64 = 1e-1;
pub const DEFAULT_EXTERNAL_FORCE_GAIN: f64 = 100.0;
pub const DEFAULT_KEYPRESS_POSITION_GAIN: f64 = 1e-4;
pub const DEFAULT_KEYPRESS_ORIENTATION_GAIN: f64 = 1e-3;

/// Modifier key held during an interaction.
///
/// Any string the front-end sends that is not a known modifier decodes to
/// `Undefined` instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModifierKey {
    Undefined,
    Alt,
    Ctrl,
    Meta,
    Shift,
}

impl From<String> for ModifierKey {
    fn from(s: String) -> Self {
        match s.as_str() {
            "alt" => ModifierKey::Alt,
            "ctrl" => ModifierKey::Ctrl,
            "meta" => ModifierKey::Meta,
            "shift" => ModifierKey::Shift,
            _ => ModifierKey::Undefined,
        }
    }
}

impl From<ModifierKey> for String {
    fn from(key: ModifierKey) -> Self {
        match key {
            ModifierKey::Undefined => "undefined",
            ModifierKey::Alt => "alt",
            ModifierKey::Ctrl => "ctrl",
            ModifierKey::Meta => "meta",
            ModifierKey::Shift => "shift",
        }
        .to_string()
    }
}

/// The current pointer/keyboard manipulation, last writer wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Registry key of the entity under the pointer
    pub key_object: String,

    /// Link of that entity that was hit; negative when not applicable
    pub idx_link: i64,

    /// Hit point in the link frame
    #[serde(with = "vec3_serde")]
    pub pos_click_in_link: Vector3<f64>,

    /// Pointer position projected into the world frame
    #[serde(with = "vec3_serde")]
    pub pos_mouse_in_world: Vector3<f64>,

    #[serde(default)]
    pub modifier_keys: BTreeSet<ModifierKey>,

    /// Currently held key, empty if none
    #[serde(default)]
    pub key_down: String,
}

impl Interaction {
    /// Returns true if `key` is held.
    pub fn is_held(&self, key: ModifierKey) -> bool {
        self.modifier_keys.contains(&key)
    }

    /// The held key, if any. Only the first character counts.
    pub fn held_key(&self) -> Option<char> {
        self.key_down.chars().next()
    }

    /// Returns true if the record targets the registry key `key`.
    pub fn targets(&self, key: &str) -> bool {
        self.key_object == key
    }
}

/// Current world position of the clicked point on a body at (`pos`, `ori`).
fn click_point_in_world(interaction: &Interaction, pos: &Vector3<f64>, ori: &UnitQuaternion<f64>) -> Vector3<f64> {
    pos + ori * interaction.pos_click_in_link
}

/// Position delta driving the clicked point toward the mouse.
///
/// Returns `gain * (mouse - click_point)`.
pub fn click_position_adjustment(
    interaction: &Interaction,
    pos: &Vector3<f64>,
    ori: &UnitQuaternion<f64>,
    gain: f64,
) -> Vector3<f64> {
    let pos_click_in_world = click_point_in_world(interaction, pos, ori);
    gain * (interaction.pos_mouse_in_world - pos_click_in_world)
}

/// Rotation turning the body so the clicked point follows the mouse.
///
/// With `m` the scaled positional error and `r` the unit lever arm from the
/// body origin to the clicked point, the result rotates by `|r × m|` about
/// `r × m`. A click on the origin or a zero error yields identity.
pub fn click_orientation_adjustment(
    interaction: &Interaction,
    pos: &Vector3<f64>,
    ori: &UnitQuaternion<f64>,
    gain: f64,
) -> UnitQuaternion<f64> {
    let pos_click_in_world = click_point_in_world(interaction, pos, ori);

    let m_click = gain * (interaction.pos_mouse_in_world - pos_click_in_world);
    let r_com = (pos_click_in_world - pos)
        .try_normalize(f64::EPSILON)
        .unwrap_or_else(Vector3::zeros);
    UnitQuaternion::from_scaled_axis(r_com.cross(&m_click))
}

/// Applies one click adjustment to a pose.
///
/// With ctrl held only the orientation changes (adjustment left-multiplied);
/// otherwise only the position does.
pub fn click_adjust_pose(
    interaction: &Interaction,
    pos: &mut Vector3<f64>,
    ori: &mut UnitQuaternion<f64>,
    gain_pos: f64,
    gain_ori: f64,
) {
    if interaction.is_held(ModifierKey::Ctrl) {
        let rotation = click_orientation_adjustment(interaction, pos, ori, gain_ori);
        *ori = rotation * *ori;
    } else {
        let delta = click_position_adjustment(interaction, pos, ori, gain_pos);
        *pos += delta;
    }
}

/// External forces for a drag on a robot, keyed by link index.
///
/// Empty unless the interaction targets this robot's registry key. Otherwise
/// a single entry for `idx_link`: force `gain * (mouse - click_point)` with
/// zero moment about the click point, expressed about the world origin.
pub fn compute_external_forces<B>(
    model_keys: &ModelKeys,
    body: &B,
    interaction: &Interaction,
    gain: f64,
) -> Result<BTreeMap<usize, SpatialForce>, KinematicsError>
where
    B: LinkKinematics + ?Sized,
{
    let mut f_ext = BTreeMap::new();

    if !interaction.targets(&model_keys.key(EntityKind::Robot, body.name())) {
        return Ok(f_ext);
    }

    let idx_link = usize::try_from(interaction.idx_link).map_err(|_| KinematicsError::LinkOutOfRange {
        idx: interaction.idx_link,
        num_links: body.num_links(),
    })?;
    let pos_click_in_world = body.link_position(idx_link, &interaction.pos_click_in_link)?;

    let f = gain * (interaction.pos_mouse_in_world - pos_click_in_world);
    let f_click = SpatialForce::new(f, Vector3::zeros());

    f_ext.insert(idx_link, f_click.translated(&pos_click_in_world));
    Ok(f_ext)
}

/// Per-tick translation nudge for the held key.
///
/// `a`/`d` move along -x/+x, `s`/`w` along -y/+y, `q`/`e` along -z/+z.
pub fn keypress_position_adjustment(interaction: &Interaction, gain: f64) -> Vector3<f64> {
    match interaction.held_key().and_then(position_axis) {
        Some((axis, sign)) => sign * gain * axis,
        None => Vector3::zeros(),
    }
}

/// Per-tick rotation nudge for the held key.
///
/// `j`/`l` rotate about -x/+x, `k`/`i` about -y/+y, `u`/`o` about -z/+z.
pub fn keypress_orientation_adjustment(interaction: &Interaction, gain: f64) -> UnitQuaternion<f64> {
    match interaction.held_key().and_then(orientation_axis) {
        Some((axis, sign)) => UnitQuaternion::from_scaled_axis(sign * gain * axis),
        None => UnitQuaternion::identity(),
    }
}

fn position_axis(key: char) -> Option<(Vector3<f64>, f64)> {
    Some(match key {
        'a' => (Vector3::x(), -1.0),
        'd' => (Vector3::x(), 1.0),
        'w' => (Vector3::y(), 1.0),
        's' => (Vector3::y(), -1.0),
        'e' => (Vector3::z(), 1.0),
        'q' => (Vector3::z(), -1.0),
        _ => return None,
    })
}

fn orientation_axis(key: char) -> Option<(Vector3<f64>, f64)> {
    Some(match key {
        'j' => (Vector3::x(), -1.0),
        'l' => (Vector3::x(), 1.0),
        'i' => (Vector3::y(), 1.0),
        'k' => (Vector3::y(), -1.0),
        'o' => (Vector3::z(), 1.0),
        'u' => (Vector3::z(), -1.0),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::{ArticulatedBody, JointType, RigidBody, Transform};
    use crate::test_support::{interaction, two_link_arm};
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use serde_json::json;
    use std::f64::consts::FRAC_PI_2;

    fn three_links_at_origin() -> ArticulatedBody {
        let mut ab = ArticulatedBody::new("arm");
        for (i, joint) in [JointType::Rz, JointType::Ry, JointType::Rx].into_iter().enumerate() {
            ab.add_rigid_body(RigidBody {
                name: format!("link{}", i),
                id_parent: i.checked_sub(1),
                joint,
                to_parent: Transform::default(),
                graphics: vec![],
            });
        }
        ab
    }

    #[test]
    fn test_decode_record() {
        let record: Interaction = serde_json::from_value(json!({
            "key_object": "lab::model::robot::arm",
            "idx_link": 2,
            "pos_click_in_link": [0.0, 0.0, 0.1],
            "pos_mouse_in_world": [1.0, 0.0, 0.0],
            "modifier_keys": ["ctrl", "hyper"],
            "key_down": "w",
        }))
        .unwrap();

        assert_eq!(record.idx_link, 2);
        assert_eq!(record.pos_click_in_link, Vector3::new(0.0, 0.0, 0.1));
        assert!(record.is_held(ModifierKey::Ctrl));
        assert!(record.is_held(ModifierKey::Undefined));
        assert!(!record.is_held(ModifierKey::Shift));
        assert_eq!(record.held_key(), Some('w'));
    }

    #[test]
    fn test_decode_defaults_and_failures() {
        let record: Interaction = serde_json::from_value(json!({
            "key_object": "",
            "idx_link": -1,
            "pos_click_in_link": [0.0, 0.0, 0.0],
            "pos_mouse_in_world": [0.0, 0.0, 0.0],
        }))
        .unwrap();
        assert!(record.modifier_keys.is_empty());
        assert_eq!(record.held_key(), None);

        let missing_object = serde_json::from_value::<Interaction>(json!({
            "idx_link": 0,
            "pos_click_in_link": [0.0, 0.0, 0.0],
            "pos_mouse_in_world": [0.0, 0.0, 0.0],
        }));
        assert!(missing_object.is_err());

        let short_vector = serde_json::from_value::<Interaction>(json!({
            "key_object": "x",
            "idx_link": 0,
            "pos_click_in_link": [0.0, 0.0],
            "pos_mouse_in_world": [0.0, 0.0, 0.0],
        }));
        assert!(short_vector.is_err());
    }

    #[test]
    fn test_click_position_adjustment() {
        let record = interaction("x", 0, Vector3::new(0.0, 1.0, 0.0), Vector3::new(2.0, 0.0, 0.0));
        let pos = Vector3::new(1.0, 0.0, 0.0);
        // Click point rotated onto +x: world (1, 0, 0) + (1, 0, 0)
        let ori = UnitQuaternion::from_scaled_axis(Vector3::z() * -FRAC_PI_2);
        let delta = click_position_adjustment(&record, &pos, &ori, 0.5);
        assert_relative_eq!(delta, Vector3::zeros(), epsilon = 1e-12);

        let delta = click_position_adjustment(&record, &pos, &UnitQuaternion::identity(), 0.5);
        assert_relative_eq!(delta, Vector3::new(0.5, -0.5, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_click_orientation_adjustment() {
        let record = interaction("x", 0, Vector3::new(1.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 0.0));
        let rotation = click_orientation_adjustment(&record, &Vector3::zeros(), &UnitQuaternion::identity(), 1.0);
        assert_relative_eq!(rotation.angle(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(rotation.axis().unwrap().into_inner(), Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_click_orientation_degenerate_is_identity() {
        // Click on the body origin: no lever arm
        let record = interaction("x", 0, Vector3::zeros(), Vector3::new(1.0, 1.0, 0.0));
        let rotation = click_orientation_adjustment(&record, &Vector3::zeros(), &UnitQuaternion::identity(), 1.0);
        assert_eq!(rotation, UnitQuaternion::identity());

        // Mouse on the click point: no error
        let record = interaction("x", 0, Vector3::x(), Vector3::x());
        let rotation = click_orientation_adjustment(&record, &Vector3::zeros(), &UnitQuaternion::identity(), 1.0);
        assert_eq!(rotation, UnitQuaternion::identity());
    }

    #[test]
    fn test_click_adjust_pose_ctrl_changes_only_orientation() {
        let mut record = interaction("x", 0, Vector3::new(1.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 0.0));
        record.modifier_keys.insert(ModifierKey::Ctrl);

        let pos_before = Vector3::new(0.3, -0.2, 0.1);
        let mut pos = pos_before;
        let mut ori = UnitQuaternion::identity();
        click_adjust_pose(&record, &mut pos, &mut ori, 1e-2, 1e-1);

        assert_eq!(pos, pos_before);
        assert!(ori.angle() > 0.0);
    }

    #[test]
    fn test_click_adjust_pose_without_ctrl_changes_only_position() {
        let mut record = interaction("x", 0, Vector3::new(1.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 0.0));
        record.modifier_keys.insert(ModifierKey::Shift);

        let ori_before = UnitQuaternion::from_scaled_axis(Vector3::new(0.1, 0.2, 0.3));
        let mut pos = Vector3::zeros();
        let mut ori = ori_before;
        click_adjust_pose(&record, &mut pos, &mut ori, 1e-2, 1e-1);

        assert_eq!(ori, ori_before);
        assert_ne!(pos, Vector3::zeros());
    }

    #[test]
    fn test_external_force_on_clicked_link() {
        let ab = three_links_at_origin();
        let keys = ModelKeys::new("lab");
        let record = interaction("lab::model::robot::arm", 2, Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0));

        let f_ext = compute_external_forces(&keys, &ab, &record, 100.0).unwrap();
        assert_eq!(f_ext.len(), 1);
        let f = f_ext[&2];
        assert_relative_eq!(f.force, Vector3::new(100.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(f.moment, Vector3::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn test_external_force_zero_moment_about_click_point() {
        let ab = two_link_arm();
        let keys = ModelKeys::new("lab");
        let record = interaction("lab::model::robot::arm", 1, Vector3::new(0.5, 0.0, 0.0), Vector3::new(1.5, 1.0, 0.0));

        let f_ext = compute_external_forces(&keys, &ab, &record, 10.0).unwrap();
        let f = f_ext[&1];
        let p = Vector3::new(1.5, 0.0, 0.0);
        assert_relative_eq!(f.force, Vector3::new(0.0, 10.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(f.moment_about(&p), Vector3::zeros(), epsilon = 1e-12);
        assert_relative_eq!(f.moment, Vector3::new(0.0, 0.0, 15.0), epsilon = 1e-12);
    }

    #[test]
    fn test_external_force_bad_link() {
        let ab = two_link_arm();
        let keys = ModelKeys::new("lab");
        for idx_link in [-1, 5] {
            let record = interaction("lab::model::robot::arm", idx_link, Vector3::zeros(), Vector3::zeros());
            let err = compute_external_forces(&keys, &ab, &record, 100.0).unwrap_err();
            assert_eq!(err, KinematicsError::LinkOutOfRange { idx: idx_link, num_links: 2 });
        }
    }

    #[test]
    fn test_keypress_position_table() {
        let gain = 1e-4;
        let cases = [
            ('a', Vector3::new(-gain, 0.0, 0.0)),
            ('d', Vector3::new(gain, 0.0, 0.0)),
            ('w', Vector3::new(0.0, gain, 0.0)),
            ('s', Vector3::new(0.0, -gain, 0.0)),
            ('e', Vector3::new(0.0, 0.0, gain)),
            ('q', Vector3::new(0.0, 0.0, -gain)),
        ];
        for (key, expected) in cases {
            let mut record = interaction("x", 0, Vector3::zeros(), Vector3::zeros());
            record.key_down = key.to_string();
            assert_eq!(keypress_position_adjustment(&record, gain), expected, "key {}", key);
        }
    }

    #[test]
    fn test_keypress_orientation_table() {
        let gain = 1e-3;
        let cases = [
            ('j', Vector3::new(-gain, 0.0, 0.0)),
            ('l', Vector3::new(gain, 0.0, 0.0)),
            ('i', Vector3::new(0.0, gain, 0.0)),
            ('k', Vector3::new(0.0, -gain, 0.0)),
            ('o', Vector3::new(0.0, 0.0, gain)),
            ('u', Vector3::new(0.0, 0.0, -gain)),
        ];
        for (key, expected) in cases {
            let mut record = interaction("x", 0, Vector3::zeros(), Vector3::zeros());
            record.key_down = key.to_string();
            let rotation = keypress_orientation_adjustment(&record, gain);
            assert_relative_eq!(rotation.scaled_axis(), expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_keypress_unrecognized_or_empty() {
        let mut record = interaction("x", 0, Vector3::zeros(), Vector3::zeros());
        for key_down in ["", "z", "W", " "] {
            record.key_down = key_down.to_string();
            assert_eq!(keypress_position_adjustment(&record, 1.0), Vector3::zeros());
            assert_eq!(keypress_orientation_adjustment(&record, 1.0), UnitQuaternion::identity());
        }
        // Translation keys do not rotate and vice versa
        record.key_down = "a".to_string();
        assert_eq!(keypress_orientation_adjustment(&record, 1.0), UnitQuaternion::identity());
        record.key_down = "i".to_string();
        assert_eq!(keypress_position_adjustment(&record, 1.0), Vector3::zeros());
    }

    proptest! {
        #[test]
        fn prop_other_targets_get_no_force(
            key_object in "[a-z:]{0,30}",
            idx_link in -3i64..10,
            mouse in prop::array::uniform3(-10.0f64..10.0),
        ) {
            prop_assume!(key_object != "lab::model::robot::arm");
            let ab = two_link_arm();
            let keys = ModelKeys::new("lab");
            let record = interaction(&key_object, idx_link, Vector3::zeros(), Vector3::from(mouse));
            let f_ext = compute_external_forces(&keys, &ab, &record, 100.0).unwrap();
            prop_assert!(f_ext.is_empty());
        }
    }
}
