//! # Audio
//!
//! Plays sound files through an external player. Playback is detached, the
//! control loop never waits for it. A short-lived thread waits on each player
//! so finished players are reaped and their exit status is logged.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, warn};
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AudioParams {
    /// Player executable, given the file to play as its only argument.
    pub player: String,

    /// Greeting sound. Relative paths are relative to the software root.
    pub greeting_file: PathBuf,
}

pub struct AudioPlayer {
    params: AudioParams,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Could not start the audio player {0:?}: {1}")]
    SpawnFailed(String, io::Error),

    #[error("Could not start the thread waiting on the audio player: {0}")]
    ThreadSpawnFailed(io::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AudioPlayer {
    pub fn new(params: AudioParams) -> Self {
        Self { params }
    }

    /// Full path to the greeting sound.
    pub fn greeting_path(&self) -> PathBuf {
        let file = &self.params.greeting_file;

        if file.is_absolute() {
            return file.clone();
        }

        match util::host::get_sw_root() {
            Ok(mut root) => {
                root.push(file);
                root
            }
            Err(_) => file.clone(),
        }
    }

    pub fn play_greeting(&self) -> Result<JoinHandle<Option<ExitStatus>>, AudioError> {
        self.play(&self.greeting_path())
    }

    /// Start playing a file and return immediately.
    ///
    /// The returned handle yields the player's exit status once it has been
    /// reaped, it does not need to be joined.
    pub fn play(&self, file: &Path) -> Result<JoinHandle<Option<ExitStatus>>, AudioError> {
        let mut child = Command::new(&self.params.player)
            .arg(file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AudioError::SpawnFailed(self.params.player.clone(), e))?;

        let pid = child.id();
        debug!("Playing {:?} (pid {})", file, pid);

        thread::Builder::new()
            .name("audio".into())
            .spawn(move || match child.wait() {
                Ok(status) => {
                    if !status.success() {
                        warn!("Audio player (pid {}) exited with {}", pid, status);
                    }
                    Some(status)
                }
                Err(e) => {
                    warn!("Could not wait on the audio player (pid {}): {}", pid, e);
                    None
                }
            })
            .map_err(AudioError::ThreadSpawnFailed)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
