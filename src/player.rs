//! Media player abstraction and playback controller
//!
//! The controller owns exactly one player for the lifetime of a session and
//! enforces the lifecycle: load (stop, set source, prepare, play), pause, and
//! a final stop plus release.

use crate::error::{OverlayError, Result};
use log::{debug, info, warn};

/// Trait for media players
///
/// All calls are synchronous.
pub trait MediaPlayer: Send {
    /// Replace the current media item
    fn set_source(&mut self, uri: &str) -> Result<()>;

    /// Open the media item and get ready to play
    fn prepare(&mut self) -> Result<()>;

    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn stop(&mut self) -> Result<()>;

    /// Free all player resources; the player is unusable afterwards
    fn release(&mut self) -> Result<()>;
}

/// Lifecycle state tracked by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// Created, nothing loaded
    Idle,
    Prepared,
    Playing,
    Paused,
    Stopped,
    Released,
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Prepared => "prepared",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Released => "released",
        };
        f.write_str(name)
    }
}

/// Owns a single media player and drives its lifecycle
pub struct PlaybackController {
    player: Box<dyn MediaPlayer>,
    state: PlayerState,
    source: Option<String>,
}

impl PlaybackController {
    #[must_use]
    pub fn new(player: Box<dyn MediaPlayer>) -> Self {
        Self {
            player,
            state: PlayerState::Idle,
            source: None,
        }
    }

    /// Load a new source and start playing right away
    ///
    /// # Errors
    /// - `OverlayError::Playback` when the player was released or any
    ///   lifecycle call fails
    pub fn load_source(&mut self, uri: &str) -> Result<()> {
        self.ensure_usable("load source")?;
        info!("Loading video source {}", uri);

        self.player.stop()?;
        self.state = PlayerState::Stopped;

        self.player.set_source(uri)?;
        self.source = Some(uri.to_string());

        self.player.prepare()?;
        self.state = PlayerState::Prepared;

        self.player.play()?;
        self.state = PlayerState::Playing;
        debug!("Playback started for {}", uri);
        Ok(())
    }

    /// Pause playback
    ///
    /// # Errors
    /// - `OverlayError::Playback` when the player was released or refuses
    pub fn pause(&mut self) -> Result<()> {
        self.ensure_usable("pause")?;
        self.player.pause()?;
        if self.state == PlayerState::Playing {
            self.state = PlayerState::Paused;
        }
        Ok(())
    }

    /// Stop and release the player; later calls are no-ops
    ///
    /// Release is attempted even when stop fails.
    ///
    /// # Errors
    /// - The first error from stop or release
    pub fn shutdown(&mut self) -> Result<()> {
        if self.state == PlayerState::Released {
            return Ok(());
        }

        let stopped = self.player.stop();
        if let Err(ref e) = stopped {
            warn!("Failed to stop player during shutdown: {}", e);
        }
        let released = self.player.release();
        self.state = PlayerState::Released;
        info!("Player released");

        stopped.and(released)
    }

    #[must_use]
    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// URI of the currently loaded source
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn ensure_usable(&self, operation: &str) -> Result<()> {
        if self.state == PlayerState::Released {
            return Err(OverlayError::playback_operation_error(
                operation,
                self.source.as_deref(),
                "player already released",
            ));
        }
        Ok(())
    }
}
