//! Key schema shared by the simulator and the visualization front-end.
//!
//! Both sides build identical key strings from the same
//! (app, namespace, kind, name) tuple, so the formats below are a wire
//! contract:
//!
//! ```text
//! webapp::resources::<app>             set of servable resource roots
//! webapp::<app>::args::<namespace>     JSON blob with the four kind prefixes
//! webapp::<app>::interaction           current interaction record
//! <namespace>::model::<kind>::<name>   entity descriptor
//! ```

use redisgl_env::escape_glob;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Root segment for keys owned by the web app.
pub const KEY_PREFIX: &str = "webapp::";

/// Root segment for resource registrations.
pub const KEY_RESOURCES_PREFIX: &str = "webapp::resources::";

/// App name used when the caller does not pick one.
pub const DEFAULT_APP: &str = "simulator";

/// Separator between key segments.
pub const SEPARATOR: &str = "::";

/// The four kinds of registered entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Robot,
    Object,
    Trajectory,
    Camera,
}

impl EntityKind {
    /// Every kind, in registration-prefix order.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Robot,
        EntityKind::Object,
        EntityKind::Trajectory,
        EntityKind::Camera,
    ];

    /// Key segment naming this kind.
    pub fn segment(self) -> &'static str {
        match self {
            EntityKind::Robot => "robot",
            EntityKind::Object => "object",
            EntityKind::Trajectory => "trajectory",
            EntityKind::Camera => "camera",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// Returns true if `namespace` can scope entity keys without ambiguity.
///
/// A namespace must be non-empty, must not contain the `::` separator and
/// must not start or end with `:`. Under these rules the first `::` in an
/// entity key always ends the namespace, which makes
/// `prefix(namespace, kind) + name` injective and keeps a prefix scan of one
/// namespace from reaching into another.
pub fn is_valid_namespace(namespace: &str) -> bool {
    !namespace.is_empty()
        && !namespace.contains(SEPARATOR)
        && !namespace.starts_with(':')
        && !namespace.ends_with(':')
}

/// Derives app-level keys and per-namespace [`ModelKeys`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeySchema {
    app: String,
}

impl KeySchema {
    /// Creates the schema for one application.
    pub fn new(app: impl Into<String>) -> Self {
        Self { app: app.into() }
    }

    /// The application name.
    pub fn app(&self) -> &str {
        &self.app
    }

    /// `webapp::<app>::`
    pub fn app_prefix(&self) -> String {
        format!("{}{}{}", KEY_PREFIX, self.app, SEPARATOR)
    }

    /// Set of resource roots the front-end server may read from.
    pub fn resources_key(&self) -> String {
        format!("{}{}", KEY_RESOURCES_PREFIX, self.app)
    }

    /// Key of the prefix blob for `namespace`.
    pub fn args_key(&self, namespace: &str) -> String {
        format!("{}args{}{}", self.app_prefix(), SEPARATOR, namespace)
    }

    /// Key of the interaction record. One per app, not per namespace.
    pub fn interaction_key(&self) -> String {
        format!("{}interaction", self.app_prefix())
    }

    /// Entity prefixes for `namespace`.
    pub fn model_keys(&self, namespace: &str) -> ModelKeys {
        ModelKeys::new(namespace)
    }
}

impl Default for KeySchema {
    fn default() -> Self {
        Self::new(DEFAULT_APP)
    }
}

/// The four entity-kind prefixes of one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ModelKeys {
    pub key_namespace: String,
    pub key_robots_prefix: String,
    pub key_objects_prefix: String,
    pub key_trajectories_prefix: String,
    pub key_cameras_prefix: String,
}

impl ModelKeys {
    /// Derives the prefixes `<namespace>::model::<kind>::`.
    pub fn new(namespace: impl Into<String>) -> Self {
        let key_namespace = namespace.into();
        let prefix = |kind: EntityKind| {
            format!("{}{}model{}{}{}", key_namespace, SEPARATOR, SEPARATOR, kind.segment(), SEPARATOR)
        };
        Self {
            key_robots_prefix: prefix(EntityKind::Robot),
            key_objects_prefix: prefix(EntityKind::Object),
            key_trajectories_prefix: prefix(EntityKind::Trajectory),
            key_cameras_prefix: prefix(EntityKind::Camera),
            key_namespace,
        }
    }

    /// Rebuilds the prefix set from a stored args blob.
    pub fn from_args(namespace: impl Into<String>, args: ModelKeyArgs) -> Self {
        Self {
            key_namespace: namespace.into(),
            key_robots_prefix: args.key_robots_prefix,
            key_objects_prefix: args.key_objects_prefix,
            key_trajectories_prefix: args.key_trajectories_prefix,
            key_cameras_prefix: args.key_cameras_prefix,
        }
    }

    /// The namespace these prefixes scope.
    pub fn namespace(&self) -> &str {
        &self.key_namespace
    }

    /// Prefix for entities of `kind`.
    pub fn prefix(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Robot => &self.key_robots_prefix,
            EntityKind::Object => &self.key_objects_prefix,
            EntityKind::Trajectory => &self.key_trajectories_prefix,
            EntityKind::Camera => &self.key_cameras_prefix,
        }
    }

    /// Full key of the entity `name` of `kind`.
    pub fn key(&self, kind: EntityKind, name: &str) -> String {
        format!("{}{}", self.prefix(kind), name)
    }

    /// Scan pattern matching exactly the keys under the `kind` prefix.
    pub fn scan_pattern(&self, kind: EntityKind) -> String {
        format!("{}*", escape_glob(self.prefix(kind)))
    }

    /// Entity name of `key` if it lives under the `kind` prefix.
    pub fn strip_prefix<'a>(&self, kind: EntityKind, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.prefix(kind))
    }

    /// The blob stored under the args key.
    pub fn args(&self) -> ModelKeyArgs {
        ModelKeyArgs {
            key_robots_prefix: self.key_robots_prefix.clone(),
            key_objects_prefix: self.key_objects_prefix.clone(),
            key_trajectories_prefix: self.key_trajectories_prefix.clone(),
            key_cameras_prefix: self.key_cameras_prefix.clone(),
        }
    }
}

/// JSON document stored under [`KeySchema::args_key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelKeyArgs {
    pub key_robots_prefix: String,
    pub key_objects_prefix: String,
    pub key_trajectories_prefix: String,
    pub key_cameras_prefix: String,
}
