// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::Deserialize;

use super::error::ConfigError;
use crate::backend::DistanceModel;

/// Default speed of sound, in world units per second.
pub const DEFAULT_DOPPLER_VELOCITY: f32 = 344.0;

/// Default Doppler exaggeration.
pub const DEFAULT_DOPPLER_FACTOR: f32 = 1.0;

/// The YAML configuration for the sound manager.
#[derive(Deserialize, Clone, Debug)]
pub struct SoundConfig {
    /// Root of the sound effects tree. Sound names are relative to it.
    sfx_dir: PathBuf,

    /// The backend device to open.
    #[serde(default = "default_device")]
    device: String,

    /// Upper bound on the source pool. The backend may allow fewer.
    max_sources: Option<usize>,

    #[serde(default = "default_doppler_velocity")]
    doppler_velocity: f32,

    #[serde(default = "default_doppler_factor")]
    doppler_factor: f32,

    #[serde(default)]
    distance_model: DistanceModel,

    /// Subfolders loaded in full when the manager starts.
    #[serde(default)]
    prefetch: Vec<String>,
}

fn default_device() -> String {
    "mock".to_string()
}

fn default_doppler_velocity() -> f32 {
    DEFAULT_DOPPLER_VELOCITY
}

fn default_doppler_factor() -> f32 {
    DEFAULT_DOPPLER_FACTOR
}

impl SoundConfig {
    /// Creates a configuration with every optional setting at its default.
    pub fn new(sfx_dir: &Path) -> SoundConfig {
        SoundConfig {
            sfx_dir: sfx_dir.to_path_buf(),
            device: default_device(),
            max_sources: None,
            doppler_velocity: DEFAULT_DOPPLER_VELOCITY,
            doppler_factor: DEFAULT_DOPPLER_FACTOR,
            distance_model: DistanceModel::default(),
            prefetch: Vec::new(),
        }
    }

    pub fn with_device(mut self, device: &str) -> SoundConfig {
        self.device = device.to_string();
        self
    }

    pub fn with_max_sources(mut self, max_sources: usize) -> SoundConfig {
        self.max_sources = Some(max_sources);
        self
    }

    pub fn with_prefetch(mut self, subfolders: &[&str]) -> SoundConfig {
        self.prefetch = subfolders.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Parse the configuration from a YAML file. A relative `sfx_dir` is
    /// resolved against the directory holding the file.
    pub fn deserialize(path: &Path) -> Result<SoundConfig, ConfigError> {
        let mut config = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<SoundConfig>()?;

        if config.sfx_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.sfx_dir = parent.join(&config.sfx_dir);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects values no backend would accept.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_sources == Some(0) {
            return Err(ConfigError::Invalid {
                field: "max_sources",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.doppler_velocity.is_nan() || self.doppler_velocity <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "doppler_velocity",
                reason: format!("{} is not positive", self.doppler_velocity),
            });
        }
        if self.doppler_factor.is_nan() || self.doppler_factor < 0.0 {
            return Err(ConfigError::Invalid {
                field: "doppler_factor",
                reason: format!("{} is negative", self.doppler_factor),
            });
        }
        Ok(())
    }

    pub fn sfx_dir(&self) -> &Path {
        &self.sfx_dir
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn max_sources(&self) -> Option<usize> {
        self.max_sources
    }

    pub fn doppler_velocity(&self) -> f32 {
        self.doppler_velocity
    }

    pub fn doppler_factor(&self) -> f32 {
        self.doppler_factor
    }

    pub fn distance_model(&self) -> DistanceModel {
        self.distance_model
    }

    pub fn prefetch(&self) -> &[String] {
        &self.prefetch
    }
}
