//! Session configuration.

use serde::{Deserialize, Serialize};

use crate::interaction::{
    DEFAULT_CLICK_ORIENTATION_GAIN, DEFAULT_CLICK_POSITION_GAIN, DEFAULT_EXTERNAL_FORCE_GAIN,
    DEFAULT_KEYPRESS_ORIENTATION_GAIN, DEFAULT_KEYPRESS_POSITION_GAIN,
};
use crate::keys::DEFAULT_APP;

/// Gains applied to the front-end's interaction record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionGains {
    /// Click-and-drag translation gain (default: 1e-2)
    pub click_position: f64,

    /// Click-and-drag rotation gain, Ctrl held (default: 1e-1)
    pub click_orientation: f64,

    /// Spring gain for forces on articulated bodies (default: 100)
    pub external_force: f64,

    /// Per-tick keyboard translation (default: 1e-4)
    pub keypress_position: f64,

    /// Per-tick keyboard rotation in radians (default: 1e-3)
    pub keypress_orientation: f64,
}

impl Default for InteractionGains {
    fn default() -> Self {
        Self {
            click_position: DEFAULT_CLICK_POSITION_GAIN,
            click_orientation: DEFAULT_CLICK_ORIENTATION_GAIN,
            external_force: DEFAULT_EXTERNAL_FORCE_GAIN,
            keypress_position: DEFAULT_KEYPRESS_POSITION_GAIN,
            keypress_orientation: DEFAULT_KEYPRESS_ORIENTATION_GAIN,
        }
    }
}

impl InteractionGains {
    pub fn with_click_gains(mut self, position: f64, orientation: f64) -> Self {
        self.click_position = position;
        self.click_orientation = orientation;
        self
    }

    pub fn with_external_force(mut self, gain: f64) -> Self {
        self.external_force = gain;
        self
    }

    pub fn with_keypress_gains(mut self, position: f64, orientation: f64) -> Self {
        self.keypress_position = position;
        self.keypress_orientation = orientation;
        self
    }
}

/// Configuration for a [`SimulatorSession`](crate::session::SimulatorSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Application segment of the front-end keys (default: "simulator")
    pub app: String,

    /// Namespace the session's entities are registered under
    pub namespace: String,

    pub gains: InteractionGains,

    /// Commit after every registry write (default: true). When false the
    /// caller batches writes and commits the store itself.
    pub commit_writes: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app: DEFAULT_APP.to_string(),
            namespace: "sim".to_string(),
            gains: InteractionGains::default(),
            commit_writes: true,
        }
    }
}

impl SessionConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.app = app.into();
        self
    }

    pub fn with_gains(mut self, gains: InteractionGains) -> Self {
        self.gains = gains;
        self
    }

    pub fn with_commit_writes(mut self, commit_writes: bool) -> Self {
        self.commit_writes = commit_writes;
        self
    }
}
