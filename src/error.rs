//! Error kinds for every concern of the kiosk.
//!
//! None of these are fatal to the running kiosk: the scheduling and
//! presentation path logs them and carries on. Only the CLI surfaces them
//! as a process exit.

use std::{io, path::PathBuf};

use thiserror::Error;

/// A time string the admin entered that is not a valid `HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("expected exactly one ':' separator in {0:?}")]
    Separator(String),
    #[error("{0:?} is not a number")]
    NotNumeric(String),
    #[error("hour {0} is outside 0-23")]
    HourOutOfRange(u32),
    #[error("minute {0} is outside 0-59")]
    MinuteOutOfRange(u32),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("alarm store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),
    #[error("couldn't create store directory {}: {source}", path.display())]
    Directory { path: PathBuf, source: io::Error },
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("couldn't start player {program:?}: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("couldn't read sound directory {}: {source}", dir.display())]
    SoundDir { dir: PathBuf, source: io::Error },
}

/// Why the logo image could not be used; the placeholder is drawn instead.
#[derive(Debug, Error)]
pub enum LogoError {
    #[error("couldn't load logo {}: {source}", path.display())]
    Load {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("logo box {width}x{height} is empty")]
    EmptyBox { width: i32, height: i32 },
}

#[derive(Debug, Error)]
pub enum SubscriberError {
    #[error("couldn't start subscriber thread: {0}")]
    Spawn(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't determine the config directory")]
    NoProjectDirs,
    #[error("couldn't read config file {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("couldn't parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("couldn't serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("couldn't write config file {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Everything the command line front end can fail with.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("couldn't create sound directory {}: {source}", path.display())]
    SoundDir { path: PathBuf, source: io::Error },
    #[error("alarm {0} is already registered")]
    Duplicate(String),
    #[error("gui error: {0}")]
    Gui(String),
}
