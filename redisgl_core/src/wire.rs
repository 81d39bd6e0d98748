//! Serde adapters for the JSON shapes the front-end reads and writes.

/// `Vector3<f64>` as a plain `[x, y, z]` array.
pub(crate) mod vec3_serde {
    use nalgebra::Vector3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(v: &Vector3<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        [v.x, v.y, v.z].serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vector3<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let [x, y, z]: [f64; 3] = Deserialize::deserialize(deserializer)?;
        Ok(Vector3::new(x, y, z))
    }
}

/// `UnitQuaternion<f64>` as `{ "w": .., "x": .., "y": .., "z": .. }`.
pub(crate) mod quat_serde {
    use nalgebra::{Quaternion, UnitQuaternion};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Wxyz {
        w: f64,
        x: f64,
        y: f64,
        z: f64,
    }

    pub fn serialize<S>(q: &UnitQuaternion<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Wxyz {
            w: q.w,
            x: q.i,
            y: q.j,
            z: q.k,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<UnitQuaternion<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Wxyz { w, x, y, z } = Deserialize::deserialize(deserializer)?;
        let q = Quaternion::new(w, x, y, z);
        if q.norm() < f64::EPSILON {
            return Err(serde::de::Error::custom("Expected a non-zero quaternion"));
        }
        Ok(UnitQuaternion::from_quaternion(q))
    }
}
