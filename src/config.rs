use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::actor::MovementSettings;
use crate::grid::GridCoord;
use crate::obstacles::MAX_GRID_SIZE;
use crate::pathfinding::SearchAlgorithm;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub actors: ActorsConfig,
    #[serde(default)]
    pub pathfinding: PathfindingConfig,
    #[serde(default)]
    pub obstacles: ObstaclesConfig,
    #[serde(default)]
    pub visual: VisualConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_size")]
    pub size: i32,
    #[serde(default = "default_tile_spacing")]
    pub tile_spacing: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActorsConfig {
    #[serde(default = "default_player_speed")]
    pub player_speed: f32,
    #[serde(default = "default_enemy_speed")]
    pub enemy_speed: f32,
    #[serde(default = "default_height_offset")]
    pub height_offset: f32,
    #[serde(default = "default_arrive_epsilon")]
    pub arrive_epsilon: f32,
    #[serde(default = "default_actor_width")]
    pub player_width: f32,
    #[serde(default = "default_actor_width")]
    pub enemy_width: f32,
    #[serde(default = "default_player_start")]
    pub player_start: [i32; 2],
    #[serde(default = "default_enemy_start")]
    pub enemy_start: [i32; 2],
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PathfindingConfig {
    #[serde(default)]
    pub algorithm: SearchAlgorithm,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ObstaclesConfig {
    /// JSON obstacle store; an open grid when unset
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisualConfig {
    #[serde(default = "default_window_title")]
    pub window_title: String,
    #[serde(default = "default_bg_r")]
    pub background_r: u8,
    #[serde(default = "default_bg_g")]
    pub background_g: u8,
    #[serde(default = "default_bg_b")]
    pub background_b: u8,
    #[serde(default = "default_cell_pixels")]
    pub cell_pixels: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Used when RUST_LOG is not set
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default = "default_event_log_path")]
    pub event_log_path: String,
}

// Default values
fn default_size() -> i32 { 10 }
fn default_tile_spacing() -> f32 { 2.0 }
fn default_player_speed() -> f32 { 5.0 }
fn default_enemy_speed() -> f32 { 3.0 }
fn default_height_offset() -> f32 { 0.5 }
fn default_arrive_epsilon() -> f32 { 0.1 }
fn default_actor_width() -> f32 { 1.0 }
fn default_player_start() -> [i32; 2] { [0, 0] }
fn default_enemy_start() -> [i32; 2] { [9, 9] }
fn default_window_title() -> String { "gridturn".to_string() }
fn default_bg_r() -> u8 { 30 }
fn default_bg_g() -> u8 { 30 }
fn default_bg_b() -> u8 { 30 }
fn default_cell_pixels() -> f32 { 48.0 }
fn default_filter() -> String { "info".to_string() }
fn default_event_log_path() -> String { "match_log.json".to_string() }

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            tile_spacing: default_tile_spacing(),
        }
    }
}

impl Default for ActorsConfig {
    fn default() -> Self {
        Self {
            player_speed: default_player_speed(),
            enemy_speed: default_enemy_speed(),
            height_offset: default_height_offset(),
            arrive_epsilon: default_arrive_epsilon(),
            player_width: default_actor_width(),
            enemy_width: default_actor_width(),
            player_start: default_player_start(),
            enemy_start: default_enemy_start(),
        }
    }
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            background_r: default_bg_r(),
            background_g: default_bg_g(),
            background_b: default_bg_b(),
            cell_pixels: default_cell_pixels(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            event_log_path: default_event_log_path(),
        }
    }
}

impl ActorsConfig {
    pub fn player_movement(&self) -> MovementSettings {
        MovementSettings {
            speed: self.player_speed,
            height_offset: self.height_offset,
            arrive_epsilon: self.arrive_epsilon,
            width: self.player_width,
        }
    }

    pub fn enemy_movement(&self) -> MovementSettings {
        MovementSettings {
            speed: self.enemy_speed,
            height_offset: self.height_offset,
            arrive_epsilon: self.arrive_epsilon,
            width: self.enemy_width,
        }
    }

    pub fn player_start(&self) -> GridCoord {
        GridCoord::new(self.player_start[0], self.player_start[1])
    }

    pub fn enemy_start(&self) -> GridCoord {
        GridCoord::new(self.enemy_start[0], self.enemy_start[1])
    }
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Load configuration from file, or use defaults if it is missing or broken
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                info!(path = %path.display(), "loaded configuration");
                config
            }
            Err(ConfigError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file, using defaults");
                Config::default()
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "using default configuration");
                Config::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.size <= 0 || self.grid.size as usize > MAX_GRID_SIZE {
            return Err(ConfigError::Invalid(format!(
                "grid.size must be between 1 and {}, got {}",
                MAX_GRID_SIZE, self.grid.size
            )));
        }
        if !(self.grid.tile_spacing > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "grid.tile_spacing must be positive, got {}",
                self.grid.tile_spacing
            )));
        }
        if !(self.actors.player_speed > 0.0) || !(self.actors.enemy_speed > 0.0) {
            return Err(ConfigError::Invalid("actor speeds must be positive".to_string()));
        }
        if self.actors.arrive_epsilon < 0.0 {
            return Err(ConfigError::Invalid("actors.arrive_epsilon must not be negative".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.grid.size, 10);
        assert_eq!(config.grid.tile_spacing, 2.0);
        assert_eq!(config.actors.player_speed, 5.0);
        assert_eq!(config.actors.enemy_speed, 3.0);
        assert_eq!(config.actors.enemy_start(), GridCoord::new(9, 9));
        assert_eq!(config.pathfinding.algorithm, SearchAlgorithm::Bfs);
        assert!(config.obstacles.path.is_none());
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::from_toml_str(
            r#"
            [grid]
            size = 6

            [actors]
            enemy_start = [5, 0]

            [pathfinding]
            algorithm = "astar"
            "#,
        )
        .unwrap();

        assert_eq!(config.grid.size, 6);
        assert_eq!(config.grid.tile_spacing, 2.0);
        assert_eq!(config.actors.enemy_start(), GridCoord::new(5, 0));
        assert_eq!(config.pathfinding.algorithm, SearchAlgorithm::AStar);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            Config::from_toml_str("[grid]\nsize = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[grid]\ntile_spacing = -1.0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[grid]\nsize = 50000\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[grid\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn movement_settings_follow_roles() {
        let config = Config::default();
        let enemy = config.actors.enemy_movement();
        assert_eq!(enemy.speed, 3.0);
        assert_eq!(enemy.height_offset, 0.5);
        assert_eq!(config.actors.player_movement().speed, 5.0);
    }
}
