//! Per-tick glue between a simulation loop and the front-end.
//!
//! A session owns one namespace. Each tick the host polls the interaction
//! record, drives the objects and robots it targets, and publishes the
//! resulting state under the keys the descriptors reference.

use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};
use redisgl_env::SceneStore;
use serde::de::Error as _;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::SessionConfig;
use crate::error::RegistryError;
use crate::interaction::{
    click_adjust_pose, compute_external_forces, keypress_orientation_adjustment, keypress_position_adjustment,
    Interaction,
};
use crate::keys::{EntityKind, KeySchema, ModelKeys};
use crate::kinematics::{ArticulatedBody, LinkKinematics, SpatialForce, Transform};
use crate::models::{EntityDescriptor, ObjectModel};
use crate::registry::ModelRegistry;

/// Encodes a position as `[x, y, z]`.
pub fn encode_pos(pos: &Vector3<f64>) -> Value {
    json!([pos.x, pos.y, pos.z])
}

/// Encodes an orientation as `[x, y, z, w]`.
pub fn encode_ori(ori: &UnitQuaternion<f64>) -> Value {
    json!([ori.i, ori.j, ori.k, ori.w])
}

pub fn decode_pos(value: Value) -> Result<Vector3<f64>, serde_json::Error> {
    let [x, y, z]: [f64; 3] = serde_json::from_value(value)?;
    Ok(Vector3::new(x, y, z))
}

pub fn decode_ori(value: Value) -> Result<UnitQuaternion<f64>, serde_json::Error> {
    let [x, y, z, w]: [f64; 4] = serde_json::from_value(value)?;
    Unit::try_new(Quaternion::new(w, x, y, z), f64::EPSILON)
        .ok_or_else(|| serde_json::Error::custom("orientation quaternion has zero norm"))
}

/// A simulator's connection to the scene registry.
pub struct SimulatorSession<S: SceneStore + ?Sized> {
    registry: ModelRegistry<S>,
    model_keys: ModelKeys,
    config: SessionConfig,
}

impl<S: SceneStore + ?Sized> SimulatorSession<S> {
    /// Opens a session and publishes the namespace's model keys so the
    /// front-end can discover it.
    pub async fn open(store: Arc<S>, config: SessionConfig) -> Result<Self, RegistryError> {
        let schema = KeySchema::new(config.app.clone());
        let model_keys = schema.model_keys(&config.namespace);
        let registry = ModelRegistry::new(store, schema);

        registry.register_model_keys(&model_keys, config.commit_writes).await?;
        info!("Opened session '{}' for app '{}'", config.namespace, config.app);

        Ok(Self {
            registry,
            model_keys,
            config,
        })
    }

    pub fn registry(&self) -> &ModelRegistry<S> {
        &self.registry
    }

    pub fn model_keys(&self) -> &ModelKeys {
        &self.model_keys
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Registers a descriptor in this session's namespace.
    pub async fn register<D: EntityDescriptor>(&self, descriptor: &D) -> Result<String, RegistryError> {
        self.registry
            .register(&self.model_keys, descriptor, self.config.commit_writes)
            .await
    }

    pub async fn unregister(&self, kind: EntityKind, name: &str) -> Result<(), RegistryError> {
        self.registry
            .unregister(&self.model_keys, kind, name, self.config.commit_writes)
            .await
    }

    /// Reads the interaction record for this tick.
    ///
    /// A malformed record is logged and treated as absent; the front-end
    /// will overwrite it on the next pointer event.
    pub async fn poll_interaction(&self) -> Result<Option<Interaction>, RegistryError> {
        match self.registry.fetch_interaction().await {
            Ok(interaction) => Ok(interaction),
            Err(RegistryError::Decode { key, source }) => {
                warn!("Ignoring malformed interaction under {}: {}", key, source);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Writes a pose under `key_pos` and, unless empty, `key_ori`.
    pub async fn publish_pose(&self, key_pos: &str, key_ori: &str, pose: &Transform) -> Result<(), RegistryError> {
        let store = self.registry.store();
        store.set(key_pos, encode_pos(&pose.pos))?;
        if !key_ori.is_empty() {
            store.set(key_ori, encode_ori(&pose.ori))?;
        }
        if self.config.commit_writes {
            store.commit().await?;
        }
        Ok(())
    }

    /// Reads a pose back. `None` when no position is published; a missing
    /// orientation reads as identity.
    pub async fn read_pose(&self, key_pos: &str, key_ori: &str) -> Result<Option<Transform>, RegistryError> {
        let store = self.registry.store();
        let pos = store.get(key_pos);
        let ori = (!key_ori.is_empty()).then(|| store.get(key_ori));
        store.commit().await?;

        let Some(pos) = pos.await? else {
            return Ok(None);
        };
        let pos = decode_pos(pos).map_err(|e| RegistryError::decode(key_pos, e))?;
        let ori = match ori {
            Some(reply) => match reply.await? {
                Some(value) => decode_ori(value).map_err(|e| RegistryError::decode(key_ori, e))?,
                None => UnitQuaternion::identity(),
            },
            None => UnitQuaternion::identity(),
        };
        Ok(Some(Transform::new(pos, ori)))
    }

    /// Writes a robot's joint configuration under `key_q`.
    pub async fn publish_q(&self, key_q: &str, body: &ArticulatedBody) -> Result<(), RegistryError> {
        let store = self.registry.store();
        store.set(key_q, json!(body.q()))?;
        if self.config.commit_writes {
            store.commit().await?;
        }
        Ok(())
    }

    /// Reads a joint configuration published under `key_q`.
    pub async fn read_q(&self, key_q: &str) -> Result<Option<Vec<f64>>, RegistryError> {
        let store = self.registry.store();
        let reply = store.get(key_q);
        store.commit().await?;
        match reply.await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| RegistryError::decode(key_q, e)),
            None => Ok(None),
        }
    }

    /// Applies one tick of manipulation to `object` and publishes its pose.
    ///
    /// Only an interaction targeting this object moves it: the click drag
    /// first, then the held-key nudges. The pose is published either way.
    pub async fn drive_object(
        &self,
        object: &ObjectModel,
        pose: &mut Transform,
        interaction: Option<&Interaction>,
    ) -> Result<(), RegistryError> {
        let key = self.model_keys.key(EntityKind::Object, &object.name);
        if let Some(interaction) = interaction.filter(|i| i.targets(&key)) {
            let gains = &self.config.gains;
            click_adjust_pose(
                interaction,
                &mut pose.pos,
                &mut pose.ori,
                gains.click_position,
                gains.click_orientation,
            );
            pose.pos += keypress_position_adjustment(interaction, gains.keypress_position);
            pose.ori = keypress_orientation_adjustment(interaction, gains.keypress_orientation) * pose.ori;
        }
        self.publish_pose(&object.key_pos, &object.key_ori, pose).await
    }

    /// External forces the current drag applies to `body`.
    pub fn external_forces<B>(
        &self,
        body: &B,
        interaction: &Interaction,
    ) -> Result<BTreeMap<usize, SpatialForce>, RegistryError>
    where
        B: LinkKinematics + ?Sized,
    {
        Ok(compute_external_forces(
            &self.model_keys,
            body,
            interaction,
            self.config.gains.external_force,
        )?)
    }

    /// Removes every entity of the namespace and its model keys.
    ///
    /// Returns the number of entity keys deleted.
    pub async fn close(self) -> Result<usize, RegistryError> {
        let removed = self.registry.clear_namespace(&self.model_keys, false).await?;
        self.registry.unregister_model_keys(&self.model_keys, true).await?;
        info!("Closed session '{}'", self.config.namespace);
        Ok(removed)
    }
}
