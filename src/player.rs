//! Alarm sound playback through an external player process.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use rand::{seq::SliceRandom, Rng};

use crate::{config::PlayerConfig, error::PlaybackError};

pub trait Player {
    /// Starts playing `path`, stopping whatever was playing before.
    fn play(&mut self, path: &Path) -> Result<(), PlaybackError>;
    /// Stops playback. A no-op when nothing is playing.
    fn stop(&mut self);
    fn is_playing(&mut self) -> bool;
}

/// Owns at most one player process. Dropping it stops the process.
#[derive(Debug)]
pub struct ProcessPlayer {
    program: String,
    args: Vec<String>,
    grace: Duration,
    child: Option<Child>,
}

const POLL_INTERVAL: Duration = Duration::from_millis(20);

impl ProcessPlayer {
    #[must_use]
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            grace: Duration::from_millis(config.grace_period_ms),
            child: None,
        }
    }

    #[cfg(unix)]
    fn terminate(child: &Child) {
        use nix::{
            sys::signal::{kill, Signal},
            unistd::Pid,
        };
        let Ok(pid) = i32::try_from(child.id()) else {
            return;
        };
        if let Err(err) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
            debug!("SIGTERM to player {pid} failed: {err}");
        }
    }

    #[cfg(not(unix))]
    fn terminate(_child: &Child) {}

    /// Waits up to the grace period for the child to exit on its own.
    fn wait_for_exit(&self, child: &mut Child) -> bool {
        let deadline = Instant::now() + self.grace;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!("player exited with {status}");
                    return true;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(POLL_INTERVAL),
                Ok(None) => return false,
                Err(err) => {
                    warn!("couldn't poll player process: {err}");
                    return false;
                }
            }
        }
    }
}

impl Player for ProcessPlayer {
    fn play(&mut self, path: &Path) -> Result<(), PlaybackError> {
        self.stop();
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| PlaybackError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        info!("playing {} (pid {})", path.display(), child.id());
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        // already finished on its own
        if let Ok(Some(_)) = child.try_wait() {
            return;
        }
        Self::terminate(&child);
        if self.wait_for_exit(&mut child) {
            info!("player {} stopped", child.id());
            return;
        }
        warn!("player {} ignored termination, killing it", child.id());
        if let Err(err) = child.kill() {
            warn!("couldn't kill player {}: {err}", child.id());
        }
        // reap so no zombie is left behind
        let _ = child.wait();
    }

    fn is_playing(&mut self) -> bool {
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(None)) => true,
            Some(_) => {
                self.child = None;
                false
            }
            None => false,
        }
    }
}

impl Drop for ProcessPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The directory alarm sounds are picked from.
#[derive(Debug, Clone)]
pub struct SoundLibrary {
    dir: PathBuf,
    extension: String,
}

impl SoundLibrary {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every file currently in the directory with the configured extension, sorted.
    pub fn sounds(&self) -> Result<Vec<PathBuf>, PlaybackError> {
        let read_dir = std::fs::read_dir(&self.dir).map_err(|source| PlaybackError::SoundDir {
            dir: self.dir.clone(),
            source,
        })?;
        let mut sounds: Vec<PathBuf> = read_dir
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .and_then(OsStr::to_str)
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
            })
            .collect();
        sounds.sort();
        Ok(sounds)
    }

    /// Uniform pick over [`Self::sounds`]; `None` when the directory holds no sound.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Option<PathBuf>, PlaybackError> {
        Ok(self.sounds()?.choose(rng).cloned())
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::path::{Path, PathBuf};

    use super::Player;
    use crate::error::PlaybackError;

    /// Records calls instead of spawning anything.
    #[derive(Debug, Default)]
    pub(crate) struct FakePlayer {
        pub(crate) playing: Option<PathBuf>,
        pub(crate) started: Vec<PathBuf>,
        pub(crate) stops: usize,
        pub(crate) fail: bool,
    }

    impl Player for FakePlayer {
        fn play(&mut self, path: &Path) -> Result<(), PlaybackError> {
            self.stop();
            if self.fail {
                return Err(PlaybackError::Spawn {
                    program: "missing-player".to_string(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            self.playing = Some(path.to_path_buf());
            self.started.push(path.to_path_buf());
            Ok(())
        }

        fn stop(&mut self) {
            if self.playing.take().is_some() {
                self.stops += 1;
            }
        }

        fn is_playing(&mut self) -> bool {
            self.playing.is_some()
        }
    }
}
