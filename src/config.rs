use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const APP_NAME: &str = "classroom_kiosk";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// SQLite file holding the alarm times.
    pub database: PathBuf,
    pub sounds: SoundsConfig,
    pub player: PlayerConfig,
    pub broker: BrokerConfig,
    pub display: DisplayConfig,
    pub alarm: AlarmConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = Self::data_dir();
        Self {
            database: data_dir.join("config.db"),
            sounds: SoundsConfig {
                dir: data_dir.join("mp3"),
                ..SoundsConfig::default()
            },
            player: PlayerConfig::default(),
            broker: BrokerConfig::default(),
            display: DisplayConfig {
                logo_path: data_dir.join("ifpb.png"),
                ..DisplayConfig::default()
            },
            alarm: AlarmConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SoundsConfig {
    pub dir: PathBuf,
    /// Only files with this extension are picked.
    pub extension: String,
}

impl Default for SoundsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("mp3"),
            extension: "mp3".to_string(),
        }
    }
}

/// The external program that plays an alarm sound, invoked as `program args... <file>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlayerConfig {
    pub program: String,
    pub args: Vec<String>,
    /// How long a terminated player gets before it is killed.
    pub grace_period_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            program: "mpg123".to_string(),
            args: vec!["-q".to_string()],
            grace_period_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BrokerConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub topic: String,
    pub client_id: String,
    pub keep_alive_secs: u64,
    pub reconnect_delay_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "localhost".to_string(),
            port: 1883,
            username: None,
            password: None,
            topic: "ifpb/sala101/mensagens".to_string(),
            client_id: format!("{APP_NAME}-{}", std::process::id()),
            keep_alive_secs: 60,
            reconnect_delay_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Image drawn as the logo, scaled to the logo box. The label is drawn on
    /// a placeholder when it is missing or unreadable.
    pub logo_path: PathBuf,
    pub logo_label: String,
    pub logo_width: i32,
    pub logo_height: i32,
    /// Pixels the logo moves per animation tick on each axis.
    pub logo_speed: i32,
    /// Horizontal space left free around wrapped overlay text.
    pub message_margin: i32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            logo_path: PathBuf::from("ifpb.png"),
            logo_label: "IFPB".to_string(),
            logo_width: 200,
            logo_height: 200,
            logo_speed: 2,
            message_margin: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AlarmConfig {
    pub message: String,
    pub overlay_secs: u64,
    /// Playback is cut after this long even if the sound is longer.
    pub playback_limit_secs: u64,
    pub check_interval_secs: u64,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            message: "MUDANÇA DE AULA!".to_string(),
            overlay_secs: 10,
            playback_limit_secs: 30,
            check_interval_secs: 60,
        }
    }
}

impl AlarmConfig {
    #[must_use]
    pub const fn overlay_duration(&self) -> Duration {
        Duration::from_secs(self.overlay_secs)
    }

    #[must_use]
    pub const fn playback_limit(&self) -> Duration {
        Duration::from_secs(self.playback_limit_secs)
    }

    #[must_use]
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs.max(1))
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&config).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path` if present, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config = toml::to_string(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, config).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    fn project_dirs() -> Result<directories::ProjectDirs, ConfigError> {
        directories::ProjectDirs::from("", "", APP_NAME).ok_or(ConfigError::NoProjectDirs)
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let mut path = Self::project_dirs()?.config_dir().to_path_buf();
        path.push("config.toml");
        Ok(path)
    }

    /// Where the database and sounds live by default. Falls back to the
    /// working directory when no home directory is known.
    #[must_use]
    pub fn data_dir() -> PathBuf {
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::new();
        config.broker.username = Some("iot".to_string());
        config.broker.password = Some("123".to_string());
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[broker]\nhost = \"200.129.71.149\"\ntopic = \"ifpb/sala01/mensagens\"\n",
        )
        .unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.broker.host, "200.129.71.149");
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.alarm, AlarmConfig::default());
        assert_eq!(config.player.grace_period_ms, 2000);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.alarm.message, "MUDANÇA DE AULA!");
        assert!(Config::load(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn logo_path_defaults_next_to_the_database() {
        let config = Config::new();
        assert_eq!(config.display.logo_path.file_name().unwrap(), "ifpb.png");
        assert_eq!(config.display.logo_path.parent(), config.database.parent());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[display]\nlogo_path = \"/srv/kiosk/logo.png\"\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.display.logo_path, PathBuf::from("/srv/kiosk/logo.png"));
        assert_eq!(config.display.logo_label, "IFPB");
    }

    #[test]
    fn rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "broker = 5").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
