use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = ".config/unipad";
const CONFIG_FILE: &str = "config.toml";
// Well below the permit limit of tokio's bounded channel
pub const MAX_HANDOFF_CAPACITY: usize = 1 << 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub controller: ControllerConfig,
    pub ui: UIConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ControllerConfig {
    // Buffer between the gamepad thread and the coordinator
    pub handoff_capacity: usize,
    pub left_stick: StickConfig,
    pub right_stick: StickConfig,
    pub collector: CollectorSettings,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            handoff_capacity: 1000,
            left_stick: StickConfig {
                radius: 45.0,
                invert_y: true,
            },
            right_stick: StickConfig {
                radius: 45.0,
                invert_y: false,
            },
            collector: CollectorSettings::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct StickConfig {
    pub radius: f32,
    pub invert_y: bool,
}

impl Default for StickConfig {
    fn default() -> Self {
        Self {
            radius: 45.0,
            invert_y: false,
        }
    }
}

/// Tuning of the gilrs event collector.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CollectorSettings {
    pub joystick_deadzone: f32,
    // Analog trigger axes count as pressed at or above this value
    pub trigger_press_threshold: f32,
    pub poll_interval_ms: u64,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            joystick_deadzone: 0.05,
            trigger_press_threshold: 0.5,
            poll_interval_ms: 2,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct UIConfig {
    pub knob_radius: f32,
    pub padding: f32,
    pub panel_height: f32,
    pub repaint_interval_ms: u64,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            knob_radius: 15.0,
            padding: 20.0,
            panel_height: 130.0,
            repaint_interval_ms: 16,
        }
    }
}

impl Config {
    /// Loads the config from `path`, or from `~/.config/unipad/config.toml`.
    ///
    /// A missing file is not an error, defaults are used instead.
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(default_path);

        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
        if !exists {
            warn!("Config file {} does not exist, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
        let config = Self::parse(&content).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.clone(),
                source,
            },
            other => other,
        })?;

        info!("Loaded config from {}", path.display());
        debug!("{:?}", config);
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.controller.validate()?;
        if !(self.ui.knob_radius.is_finite() && self.ui.knob_radius > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "ui.knob_radius must be positive, got {}",
                self.ui.knob_radius
            )));
        }
        Ok(())
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_HANDOFF_CAPACITY).contains(&self.handoff_capacity) {
            return Err(ConfigError::Invalid(format!(
                "controller.handoff_capacity must be in [1, {MAX_HANDOFF_CAPACITY}], got {}",
                self.handoff_capacity
            )));
        }
        for (name, stick) in [
            ("left_stick", &self.left_stick),
            ("right_stick", &self.right_stick),
        ] {
            if !(stick.radius.is_finite() && stick.radius > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "controller.{name}.radius must be positive and finite, got {}",
                    stick.radius
                )));
            }
        }
        let collector = &self.collector;
        if !(0.0..1.0).contains(&collector.joystick_deadzone) {
            return Err(ConfigError::Invalid(format!(
                "controller.collector.joystick_deadzone must be in [0, 1), got {}",
                collector.joystick_deadzone
            )));
        }
        if !(0.0..1.0).contains(&collector.trigger_press_threshold) {
            return Err(ConfigError::Invalid(format!(
                "controller.collector.trigger_press_threshold must be in [0, 1), got {}",
                collector.trigger_press_threshold
            )));
        }
        Ok(())
    }
}

pub fn default_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory, using current directory");
        PathBuf::from(".")
    });
    path.push(CONFIG_DIR);
    path.push(CONFIG_FILE);
    path
}
