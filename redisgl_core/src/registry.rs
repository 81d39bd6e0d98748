//! Model registry: descriptor CRUD under the key schema.
//!
//! Every mutating call queues its store commands and, when `commit` is true,
//! flushes the queue before returning so the change is visible to the
//! front-end. Reads always commit, because their replies only resolve once
//! the queue is executed; this also flushes anything queued earlier.

use redisgl_env::{KeySet, SceneStore};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::RegistryError;
use crate::interaction::Interaction;
use crate::keys::{is_valid_namespace, EntityKind, KeySchema, ModelKeyArgs, ModelKeys};
use crate::kinematics::ArticulatedBody;
use crate::models::{CameraModel, Descriptor, EntityDescriptor, ObjectModel, RobotModel, TrajectoryModel};

/// Registers scene entities for one application.
pub struct ModelRegistry<S: SceneStore + ?Sized> {
    store: Arc<S>,
    schema: KeySchema,
}

impl<S: SceneStore + ?Sized> Clone for ModelRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            schema: self.schema.clone(),
        }
    }
}

fn check_namespace(namespace: &str) -> Result<(), RegistryError> {
    if is_valid_namespace(namespace) {
        return Ok(());
    }
    Err(RegistryError::InvalidSegment {
        what: "namespace",
        value: namespace.to_string(),
        reason: "must be non-empty, without '::' and without a leading or trailing ':'",
    })
}

fn check_name(name: &str) -> Result<(), RegistryError> {
    if !name.is_empty() {
        return Ok(());
    }
    Err(RegistryError::InvalidSegment {
        what: "entity name",
        value: String::new(),
        reason: "must be non-empty",
    })
}

impl<S: SceneStore + ?Sized> ModelRegistry<S> {
    /// Creates a registry writing through `store`.
    pub fn new(store: Arc<S>, schema: KeySchema) -> Self {
        Self { store, schema }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn schema(&self) -> &KeySchema {
        &self.schema
    }

    /// Validated key of the entity `name` of `kind`.
    fn entity_key(&self, model_keys: &ModelKeys, kind: EntityKind, name: &str) -> Result<String, RegistryError> {
        check_namespace(model_keys.namespace())?;
        check_name(name)?;
        Ok(model_keys.key(kind, name))
    }

    async fn maybe_commit(&self, commit: bool) -> Result<(), RegistryError> {
        if commit {
            self.store.commit().await?;
        }
        Ok(())
    }

    async fn set_json(&self, key: &str, value: Value, commit: bool) -> Result<(), RegistryError> {
        self.store.set(key, value)?;
        self.maybe_commit(commit).await
    }

    async fn get_json(&self, key: &str) -> Result<Option<Value>, RegistryError> {
        let reply = self.store.get(key);
        self.store.commit().await?;
        Ok(reply.await?)
    }

    async fn get_decoded<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, RegistryError> {
        match self.get_json(key).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| RegistryError::decode(key, e)),
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Descriptors
    // ------------------------------------------------------------------

    /// Writes `descriptor` under `<kind prefix><name>`, replacing any
    /// existing document. Returns the key written.
    pub async fn register<D: EntityDescriptor>(
        &self,
        model_keys: &ModelKeys,
        descriptor: &D,
        commit: bool,
    ) -> Result<String, RegistryError> {
        self.write_descriptor(model_keys, D::KIND, descriptor.name(), || serde_json::to_value(descriptor), commit)
            .await
    }

    /// Writes a descriptor of any kind.
    pub async fn register_descriptor(
        &self,
        model_keys: &ModelKeys,
        descriptor: &Descriptor,
        commit: bool,
    ) -> Result<String, RegistryError> {
        self.write_descriptor(model_keys, descriptor.kind(), descriptor.name(), || descriptor.to_json(), commit)
            .await
    }

    async fn write_descriptor(
        &self,
        model_keys: &ModelKeys,
        kind: EntityKind,
        name: &str,
        encode: impl FnOnce() -> Result<Value, serde_json::Error>,
        commit: bool,
    ) -> Result<String, RegistryError> {
        let key = self.entity_key(model_keys, kind, name)?;
        let value = encode().map_err(|e| RegistryError::encode(&key, e))?;
        self.set_json(&key, value, commit).await?;
        debug!("Registered {} '{}' under {}", kind, name, key);
        Ok(key)
    }

    pub async fn register_robot(
        &self,
        model_keys: &ModelKeys,
        robot: &RobotModel,
        commit: bool,
    ) -> Result<String, RegistryError> {
        self.register(model_keys, robot, commit).await
    }

    /// Registers a robot from its body and state keys.
    pub async fn register_articulated_body(
        &self,
        model_keys: &ModelKeys,
        articulated_body: Arc<ArticulatedBody>,
        key_q: &str,
        key_pos: &str,
        key_ori: &str,
        commit: bool,
    ) -> Result<String, RegistryError> {
        let robot = RobotModel::new(articulated_body, key_q).with_pose_keys(key_pos, key_ori);
        self.register(model_keys, &robot, commit).await
    }

    pub async fn register_object(
        &self,
        model_keys: &ModelKeys,
        object: &ObjectModel,
        commit: bool,
    ) -> Result<String, RegistryError> {
        self.register(model_keys, object, commit).await
    }

    pub async fn register_trajectory(
        &self,
        model_keys: &ModelKeys,
        name: &str,
        key_pos: &str,
        commit: bool,
    ) -> Result<String, RegistryError> {
        self.register(model_keys, &TrajectoryModel::new(name, key_pos), commit)
            .await
    }

    pub async fn register_camera(
        &self,
        model_keys: &ModelKeys,
        camera: &CameraModel,
        commit: bool,
    ) -> Result<String, RegistryError> {
        self.register(model_keys, camera, commit).await
    }

    /// Deletes the descriptor `name` of `kind`. Deleting a missing entry
    /// succeeds.
    pub async fn unregister(
        &self,
        model_keys: &ModelKeys,
        kind: EntityKind,
        name: &str,
        commit: bool,
    ) -> Result<(), RegistryError> {
        let key = self.entity_key(model_keys, kind, name)?;
        self.store.del(&[key.clone()])?;
        self.maybe_commit(commit).await?;
        debug!("Unregistered {}", key);
        Ok(())
    }

    pub async fn unregister_robot(&self, model_keys: &ModelKeys, name: &str, commit: bool) -> Result<(), RegistryError> {
        self.unregister(model_keys, EntityKind::Robot, name, commit).await
    }

    pub async fn unregister_object(&self, model_keys: &ModelKeys, name: &str, commit: bool) -> Result<(), RegistryError> {
        self.unregister(model_keys, EntityKind::Object, name, commit).await
    }

    pub async fn unregister_trajectory(
        &self,
        model_keys: &ModelKeys,
        name: &str,
        commit: bool,
    ) -> Result<(), RegistryError> {
        self.unregister(model_keys, EntityKind::Trajectory, name, commit).await
    }

    pub async fn unregister_camera(&self, model_keys: &ModelKeys, name: &str, commit: bool) -> Result<(), RegistryError> {
        self.unregister(model_keys, EntityKind::Camera, name, commit).await
    }

    /// Reads back the descriptor `name` as `D`.
    pub async fn fetch<D: EntityDescriptor>(
        &self,
        model_keys: &ModelKeys,
        name: &str,
    ) -> Result<Option<D>, RegistryError> {
        let key = self.entity_key(model_keys, D::KIND, name)?;
        self.get_decoded(&key).await
    }

    /// Reads back a descriptor, decoding it with the contract of `kind`.
    pub async fn fetch_descriptor(
        &self,
        model_keys: &ModelKeys,
        kind: EntityKind,
        name: &str,
    ) -> Result<Option<Descriptor>, RegistryError> {
        let key = self.entity_key(model_keys, kind, name)?;
        match self.get_json(&key).await? {
            Some(value) => Descriptor::from_json(kind, value)
                .map(Some)
                .map_err(|e| RegistryError::decode(&key, e)),
            None => Ok(None),
        }
    }

    /// Names registered under the `kind` prefix, sorted.
    pub async fn list_registered(
        &self,
        model_keys: &ModelKeys,
        kind: EntityKind,
    ) -> Result<Vec<String>, RegistryError> {
        check_namespace(model_keys.namespace())?;
        let reply = self.store.scan(&model_keys.scan_pattern(kind));
        self.store.commit().await?;
        let keys = reply.await?;
        Ok(keys
            .iter()
            .filter_map(|key| model_keys.strip_prefix(kind, key))
            .map(str::to_string)
            .collect())
    }

    // ------------------------------------------------------------------
    // Resource paths
    // ------------------------------------------------------------------

    /// Allows the front-end server to serve files from `path`. Idempotent.
    pub async fn register_resource_path(&self, path: &str, commit: bool) -> Result<(), RegistryError> {
        self.store.sadd(&self.schema.resources_key(), &[path.to_string()])?;
        self.maybe_commit(commit).await?;
        debug!("Registered resource path {}", path);
        Ok(())
    }

    /// Revokes a resource path. Removing an unknown path succeeds.
    pub async fn unregister_resource_path(&self, path: &str, commit: bool) -> Result<(), RegistryError> {
        self.store.srem(&self.schema.resources_key(), &[path.to_string()])?;
        self.maybe_commit(commit).await?;
        debug!("Unregistered resource path {}", path);
        Ok(())
    }

    /// Currently registered resource paths.
    pub async fn resource_paths(&self) -> Result<KeySet, RegistryError> {
        let reply = self.store.smembers(&self.schema.resources_key());
        self.store.commit().await?;
        Ok(reply.await?)
    }

    // ------------------------------------------------------------------
    // Model keys
    // ------------------------------------------------------------------

    /// Publishes the four prefixes of a namespace under its args key.
    pub async fn register_model_keys(&self, model_keys: &ModelKeys, commit: bool) -> Result<(), RegistryError> {
        check_namespace(model_keys.namespace())?;
        let key = self.schema.args_key(model_keys.namespace());
        let value = serde_json::to_value(model_keys.args()).map_err(|e| RegistryError::encode(&key, e))?;
        self.set_json(&key, value, commit).await?;
        debug!("Registered model keys for namespace '{}'", model_keys.namespace());
        Ok(())
    }

    /// Removes the args key of a namespace.
    pub async fn unregister_model_keys(&self, model_keys: &ModelKeys, commit: bool) -> Result<(), RegistryError> {
        check_namespace(model_keys.namespace())?;
        self.store.del(&[self.schema.args_key(model_keys.namespace())])?;
        self.maybe_commit(commit).await?;
        debug!("Unregistered model keys for namespace '{}'", model_keys.namespace());
        Ok(())
    }

    /// Recovers the prefixes of `namespace` from its args key.
    pub async fn fetch_model_keys(&self, namespace: &str) -> Result<Option<ModelKeys>, RegistryError> {
        check_namespace(namespace)?;
        let key = self.schema.args_key(namespace);
        let args: Option<ModelKeyArgs> = self.get_decoded(&key).await?;
        Ok(args.map(|args| ModelKeys::from_args(namespace, args)))
    }

    /// Deletes every key under the four kind prefixes of a namespace.
    /// Returns the number of keys deleted.
    ///
    /// The four scans are issued together, committed, and awaited jointly
    /// before one batched delete. The scans are a snapshot: a key written by
    /// another client between the scan and the delete survives the clear.
    /// Callers that need a stronger guarantee must layer it on top (for
    /// example a generation key bumped before clearing).
    pub async fn clear_namespace(&self, model_keys: &ModelKeys, commit: bool) -> Result<usize, RegistryError> {
        check_namespace(model_keys.namespace())?;

        let robots = self.store.scan(&model_keys.scan_pattern(EntityKind::Robot));
        let objects = self.store.scan(&model_keys.scan_pattern(EntityKind::Object));
        let trajectories = self.store.scan(&model_keys.scan_pattern(EntityKind::Trajectory));
        let cameras = self.store.scan(&model_keys.scan_pattern(EntityKind::Camera));
        self.store.commit().await?;

        let (robots, objects, trajectories, cameras) = tokio::try_join!(robots, objects, trajectories, cameras)?;

        let keys: Vec<String> = robots
            .into_iter()
            .chain(objects)
            .chain(trajectories)
            .chain(cameras)
            .collect();
        if !keys.is_empty() {
            self.store.del(&keys)?;
        }
        self.maybe_commit(commit).await?;

        info!("Cleared {} keys from namespace '{}'", keys.len(), model_keys.namespace());
        Ok(keys.len())
    }

    // ------------------------------------------------------------------
    // Interaction
    // ------------------------------------------------------------------

    /// Reads the current interaction record, if the front-end wrote one.
    ///
    /// Meant to be polled once per simulation tick.
    pub async fn fetch_interaction(&self) -> Result<Option<Interaction>, RegistryError> {
        self.get_decoded(&self.schema.interaction_key()).await
    }

    /// Overwrites the interaction record (the front-end side of the
    /// protocol).
    pub async fn publish_interaction(&self, interaction: &Interaction, commit: bool) -> Result<(), RegistryError> {
        let key = self.schema.interaction_key();
        let value = serde_json::to_value(interaction).map_err(|e| RegistryError::encode(&key, e))?;
        self.set_json(&key, value, commit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::{Geometry, Graphics};
    use crate::test_support::{interaction, two_link_arm};
    use nalgebra::Vector3;
    use redisgl_env::{EnvError, MemoryStore, SledStore};
    use serde_json::json;

    fn registry() -> ModelRegistry<MemoryStore> {
        ModelRegistry::new(MemoryStore::shared(), KeySchema::default())
    }

    fn ball() -> ObjectModel {
        ObjectModel::from_graphics(Graphics::new("ball", Geometry::Sphere { radius: 0.1 }), "ball::pos")
            .with_key_ori("ball::ori")
    }

    fn camera() -> CameraModel {
        CameraModel::new("cam", "cam::pos", "cam::ori", "cam::K", "cam::depth")
    }

    #[tokio::test]
    async fn test_register_robot_scenario() {
        let registry = registry();
        let keys = registry.schema().model_keys("lab");
        let robot = RobotModel::new(Arc::new(two_link_arm()), "arm::q");

        let key = registry.register_robot(&keys, &robot, true).await.unwrap();
        assert_eq!(key, "lab::model::robot::arm");

        let fetched: RobotModel = registry.fetch(&keys, "arm").await.unwrap().unwrap();
        assert_eq!(fetched.articulated_body.name, "arm");
        assert_eq!(fetched, robot);
    }

    #[tokio::test]
    async fn test_configured_robot_round_trips() {
        let registry = registry();
        let keys = ModelKeys::new("lab");
        let mut arm = two_link_arm();
        arm.set_q(vec![0.3, 0.2]).unwrap();
        let robot = RobotModel::new(Arc::new(arm), "arm::q");

        registry.register_robot(&keys, &robot, true).await.unwrap();
        let fetched: RobotModel = registry.fetch(&keys, "arm").await.unwrap().unwrap();
        assert_eq!(fetched, robot);
        // Live joint state stays under key_q, not in the descriptor
        assert_eq!(fetched.articulated_body.q(), vec![0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_round_trip_every_kind() {
        let registry = registry();
        let keys = ModelKeys::new("lab");
        let descriptors: Vec<Descriptor> = vec![
            RobotModel::new(Arc::new(two_link_arm()), "arm::q")
                .with_pose_keys("arm::pos", "arm::ori")
                .into(),
            ball().into(),
            TrajectoryModel::new("path", "ee::pos").into(),
            camera().with_rgb_image("cam::rgb").into(),
        ];

        for descriptor in &descriptors {
            registry.register_descriptor(&keys, descriptor, true).await.unwrap();
        }
        for descriptor in &descriptors {
            let fetched = registry
                .fetch_descriptor(&keys, descriptor.kind(), descriptor.name())
                .await
                .unwrap();
            assert_eq!(fetched.as_ref(), Some(descriptor));
        }
    }

    #[tokio::test]
    async fn test_overwrite_replaces_document() {
        let registry = registry();
        let keys = ModelKeys::new("lab");
        registry.register_object(&keys, &ball(), true).await.unwrap();

        let replacement = ObjectModel::new("ball", vec![], "other::pos");
        registry.register_object(&keys, &replacement, true).await.unwrap();

        let fetched: ObjectModel = registry.fetch(&keys, "ball").await.unwrap().unwrap();
        assert_eq!(fetched, replacement);
        assert!(fetched.graphics.is_empty());
        assert_eq!(fetched.key_ori, "");
    }

    #[tokio::test]
    async fn test_uncommitted_write_is_queued() {
        let registry = registry();
        let keys = ModelKeys::new("lab");
        registry.register_trajectory(&keys, "path", "ee::pos", false).await.unwrap();
        assert!(registry.store().keyspace().is_empty().unwrap());

        registry.store().commit().await.unwrap();
        assert_eq!(registry.store().keyspace().len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unregister_idempotent() {
        let registry = registry();
        let keys = ModelKeys::new("lab");
        registry.register_camera(&keys, &camera(), true).await.unwrap();

        registry.unregister_camera(&keys, "cam", true).await.unwrap();
        assert_eq!(registry.fetch::<CameraModel>(&keys, "cam").await.unwrap(), None);

        registry.unregister_camera(&keys, "cam", true).await.unwrap();
        assert_eq!(registry.fetch::<CameraModel>(&keys, "cam").await.unwrap(), None);
        assert!(registry.store().keyspace().is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_resource_paths_idempotent() {
        let registry = registry();
        registry.register_resource_path("/srv/meshes", true).await.unwrap();
        registry.register_resource_path("/srv/meshes", true).await.unwrap();
        registry.register_resource_path("/srv/textures", true).await.unwrap();
        assert_eq!(registry.resource_paths().await.unwrap().len(), 2);

        registry.unregister_resource_path("/srv/meshes", true).await.unwrap();
        registry.unregister_resource_path("/srv/meshes", true).await.unwrap();
        registry.unregister_resource_path("/never/added", true).await.unwrap();
        let paths = registry.resource_paths().await.unwrap();
        assert_eq!(paths.into_iter().collect::<Vec<_>>(), vec!["/srv/textures".to_string()]);
    }

    #[tokio::test]
    async fn test_model_keys_discovery() {
        let registry = registry();
        let keys = ModelKeys::new("lab");
        registry.register_model_keys(&keys, true).await.unwrap();

        let stored = registry.store().get("webapp::simulator::args::lab");
        registry.store().commit().await.unwrap();
        assert_eq!(stored.await.unwrap().unwrap()["key_robots_prefix"], "lab::model::robot::");

        assert_eq!(registry.fetch_model_keys("lab").await.unwrap(), Some(keys.clone()));

        registry.unregister_model_keys(&keys, true).await.unwrap();
        assert_eq!(registry.fetch_model_keys("lab").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_namespace_removes_scanned_keys_only() {
        let registry = registry();
        let lab = ModelKeys::new("lab");
        let lab2 = ModelKeys::new("lab2");

        registry.register_robot(&lab, &RobotModel::new(Arc::new(two_link_arm()), "q"), false).await.unwrap();
        registry.register_object(&lab, &ball(), false).await.unwrap();
        registry.register_trajectory(&lab, "path", "ee::pos", false).await.unwrap();
        registry.register_camera(&lab, &camera(), false).await.unwrap();
        registry.register_model_keys(&lab, false).await.unwrap();
        registry.register_object(&lab2, &ball(), false).await.unwrap();
        registry.register_resource_path("/srv", true).await.unwrap();

        let removed = registry.clear_namespace(&lab, true).await.unwrap();
        assert_eq!(removed, 4);

        for kind in EntityKind::ALL {
            assert!(registry.list_registered(&lab, kind).await.unwrap().is_empty());
        }
        assert_eq!(registry.list_registered(&lab2, EntityKind::Object).await.unwrap(), vec!["ball"]);
        assert!(registry.fetch_model_keys("lab").await.unwrap().is_some());
        assert_eq!(registry.resource_paths().await.unwrap().len(), 1);

        // Clearing an empty namespace is a no-op
        assert_eq!(registry.clear_namespace(&lab, true).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_registered_sorted() {
        let registry = registry();
        let keys = ModelKeys::new("lab");
        for name in ["c", "a", "b"] {
            registry.register_trajectory(&keys, name, "pos", false).await.unwrap();
        }
        assert_eq!(
            registry.list_registered(&keys, EntityKind::Trajectory).await.unwrap(),
            vec!["a", "b", "c"]
        );
    }

    #[tokio::test]
    async fn test_invalid_segments_rejected() {
        let registry = registry();
        let bad = ModelKeys::new("lab::model");
        let err = registry.register_trajectory(&bad, "path", "pos", true).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSegment { what: "namespace", .. }));
        assert!(registry.clear_namespace(&bad, true).await.is_err());

        let keys = ModelKeys::new("lab");
        let err = registry.register_trajectory(&keys, "", "pos", true).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSegment { what: "entity name", .. }));
        assert!(registry.store().keyspace().is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_invalid_segments_rejected_on_every_path() {
        let registry = registry();
        let bad = ModelKeys::new("lab::model");
        let keys = ModelKeys::new("lab");

        let err = registry.unregister(&bad, EntityKind::Robot, "x", true).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSegment { what: "namespace", .. }));
        assert!(registry.fetch::<RobotModel>(&bad, "x").await.is_err());
        assert!(registry.fetch_descriptor(&bad, EntityKind::Camera, "x").await.is_err());
        assert!(registry.list_registered(&bad, EntityKind::Object).await.is_err());
        assert!(registry.register_model_keys(&bad, true).await.is_err());
        assert!(registry.unregister_model_keys(&bad, true).await.is_err());
        assert!(registry.fetch_model_keys("lab::model").await.is_err());
        assert!(registry.fetch_model_keys(":lab").await.is_err());

        let err = registry.unregister_object(&keys, "", true).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSegment { what: "entity name", .. }));
        assert!(registry.fetch::<ObjectModel>(&keys, "").await.is_err());

        // Nothing reached the store
        assert_eq!(registry.store().pending().unwrap(), 0);
        assert!(registry.store().keyspace().is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_sled_clear_namespace_with_glob_characters() {
        let store = Arc::new(SledStore::open_temp().unwrap());
        let registry = ModelRegistry::new(store, KeySchema::default());
        let starred = ModelKeys::new("l*b");
        let plain = ModelKeys::new("lab");

        registry.register_object(&starred, &ball(), false).await.unwrap();
        registry.register_trajectory(&starred, "path", "ee::pos", false).await.unwrap();
        registry.register_object(&plain, &ball(), false).await.unwrap();
        registry.register_camera(&plain, &camera(), true).await.unwrap();

        assert_eq!(registry.list_registered(&starred, EntityKind::Object).await.unwrap(), vec!["ball"]);
        assert_eq!(registry.clear_namespace(&starred, true).await.unwrap(), 2);

        for kind in EntityKind::ALL {
            assert!(registry.list_registered(&starred, kind).await.unwrap().is_empty());
        }
        assert_eq!(registry.fetch::<ObjectModel>(&plain, "ball").await.unwrap(), Some(ball()));
        assert_eq!(registry.fetch::<CameraModel>(&plain, "cam").await.unwrap(), Some(camera()));

        // And the other way round: "lab" never reaches "l*b"
        registry.register_object(&starred, &ball(), true).await.unwrap();
        assert_eq!(registry.clear_namespace(&plain, true).await.unwrap(), 2);
        assert!(registry.fetch::<ObjectModel>(&starred, "ball").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_malformed_document_is_decode_error() {
        let registry = registry();
        let keys = ModelKeys::new("lab");
        registry
            .store()
            .set("lab::model::camera::cam", json!({ "name": "cam" }))
            .unwrap();

        let err = registry.fetch::<CameraModel>(&keys, "cam").await.unwrap_err();
        match err {
            RegistryError::Decode { key, .. } => assert_eq!(key, "lab::model::camera::cam"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let registry = registry();
        let keys = ModelKeys::new("lab");
        registry.store().shutdown();

        let err = registry.register_trajectory(&keys, "path", "pos", true).await.unwrap_err();
        assert!(matches!(err, RegistryError::Store(EnvError::Connection(_))));
        let err = registry.clear_namespace(&keys, true).await.unwrap_err();
        assert!(matches!(err, RegistryError::Store(_)));
    }

    #[tokio::test]
    async fn test_interaction_polling() {
        let registry = registry();
        assert_eq!(registry.fetch_interaction().await.unwrap(), None);

        let mut record = interaction("lab::model::object::ball", -1, Vector3::zeros(), Vector3::x());
        record.key_down = "w".to_string();
        registry.publish_interaction(&record, true).await.unwrap();

        assert_eq!(registry.fetch_interaction().await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_works_with_trait_object_store() {
        let store: Arc<dyn SceneStore> = MemoryStore::shared();
        let registry = ModelRegistry::new(store, KeySchema::new("viewer"));
        let keys = ModelKeys::new("lab");
        registry.register_trajectory(&keys, "path", "pos", true).await.unwrap();
        assert_eq!(
            registry.list_registered(&keys, EntityKind::Trajectory).await.unwrap(),
            vec!["path"]
        );
        assert_eq!(registry.schema().interaction_key(), "webapp::viewer::interaction");
    }
}
