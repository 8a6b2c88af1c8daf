//! # Engine Configuration
//!
//! Every tunable of the engine in one value, read from a JSON file. Missing
//! fields take their defaults. [`EngineConfig::validated`] clamps values that
//! would break the chunk window or the physics queries, warning about each
//! one, and the result is handed to the engine by value.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::warn;
use serde::{Deserialize, Serialize};

use super::voxels::{chunk::CHUNK_DIMENSION, chunk_grid::GridSettings};

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Chunks with every axis distance to the player below this are drawn
    pub render_distance: i32,
    /// Chunks further than this from the player are evicted
    pub load_distance: i32,
    /// Most chunks generated per tick
    pub load_budget: usize,
    /// Most chunks evicted per tick
    pub unload_budget: usize,
    /// Most chunks meshed per tick
    pub bake_budget: usize,
    /// Size of the worker pool
    pub worker_threads: usize,
    /// Seed of the terrain generator
    pub world_seed: u64,
    /// How far the player can reach to place or break blocks, in blocks
    pub reach_distance: f32,
    /// Height of the world in chunks
    pub world_height_chunks: i32,
    /// Directory of the JSON edit store; edits are kept in memory when unset
    pub edits_directory: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            render_distance: 4,
            load_distance: 5,
            load_budget: 16,
            unload_budget: 32,
            bake_budget: 8,
            worker_threads: 4,
            world_seed: 1337,
            reach_distance: 6.0,
            world_height_chunks: 4,
            edits_directory: None,
        }
    }
}

/// Errors raised while reading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("could not read config file {path}: {source}")]
    Io {
        /// The config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
    /// The contents are not a valid configuration.
    #[error("malformed config: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl EngineConfig {
    /// Reads a configuration file. The result is not validated yet.
    ///
    /// # Errors
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Malformed`]
    /// if it is not valid JSON for this type.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Parses a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Clamps inconsistent values to the nearest usable ones.
    pub fn validated(mut self) -> Self {
        if self.render_distance < 1 {
            warn!("render_distance {} raised to 1", self.render_distance);
            self.render_distance = 1;
        }
        if self.load_distance < self.render_distance {
            warn!(
                "load_distance {} raised to render_distance {}",
                self.load_distance, self.render_distance
            );
            self.load_distance = self.render_distance;
        }
        for (name, budget) in [
            ("load_budget", &mut self.load_budget),
            ("unload_budget", &mut self.unload_budget),
            ("bake_budget", &mut self.bake_budget),
            ("worker_threads", &mut self.worker_threads),
        ] {
            if *budget == 0 {
                warn!("{} raised to 1", name);
                *budget = 1;
            }
        }
        if self.world_height_chunks < 1 {
            warn!("world_height_chunks {} raised to 1", self.world_height_chunks);
            self.world_height_chunks = 1;
        }

        let max_reach = CHUNK_DIMENSION as f32;
        if !(1.0..=max_reach).contains(&self.reach_distance) {
            let clamped = if self.reach_distance.is_nan() {
                1.0
            } else {
                self.reach_distance.clamp(1.0, max_reach)
            };
            warn!("reach_distance {} clamped to {}", self.reach_distance, clamped);
            self.reach_distance = clamped;
        }
        self
    }

    /// The distances and budgets of the chunk grid.
    pub fn grid_settings(&self) -> GridSettings {
        GridSettings {
            render_distance: self.render_distance,
            load_distance: self.load_distance,
            load_budget: self.load_budget,
            unload_budget: self.unload_budget,
            bake_budget: self.bake_budget,
            world_height_chunks: self.world_height_chunks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_take_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "world_seed": 7, "render_distance": 2 }"#).unwrap();
        assert_eq!(config.world_seed, 7);
        assert_eq!(config.render_distance, 2);
        assert_eq!(config.bake_budget, EngineConfig::default().bake_budget);
        assert_eq!(config.edits_directory, None);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let error = EngineConfig::from_json_str("{ render_distance: ").unwrap_err();
        assert!(matches!(error, ConfigError::Malformed(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let error = EngineConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(error, ConfigError::Io { .. }));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "load_distance": 9, "edits_directory": "saves/edits" }}"#).unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.load_distance, 9);
        assert_eq!(config.edits_directory, Some(PathBuf::from("saves/edits")));
    }

    #[test]
    fn validation_clamps_inconsistent_values() {
        let config = EngineConfig {
            render_distance: 0,
            load_distance: -3,
            load_budget: 0,
            unload_budget: 0,
            bake_budget: 0,
            worker_threads: 0,
            world_height_chunks: 0,
            reach_distance: 100.0,
            ..Default::default()
        }
        .validated();

        assert_eq!(config.render_distance, 1);
        assert_eq!(config.load_distance, 1);
        assert_eq!(config.load_budget, 1);
        assert_eq!(config.unload_budget, 1);
        assert_eq!(config.bake_budget, 1);
        assert_eq!(config.worker_threads, 1);
        assert_eq!(config.world_height_chunks, 1);
        assert_eq!(config.reach_distance, CHUNK_DIMENSION as f32);
    }

    #[test]
    fn valid_values_are_untouched() {
        let config = EngineConfig::default();
        assert_eq!(config.clone().validated(), config);
        let settings = config.grid_settings();
        assert_eq!(settings.load_distance, 5);
        assert_eq!(settings.world_height_chunks, 4);
    }
}
