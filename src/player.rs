//! Playback control
//!
//! Sends player commands (open, play/pause, stop) and library scans to Kodi
//! and turns the acknowledgements into user-facing messages. A command
//! counts as successful when the response carries no `error` member.

use crate::library::MediaItem;
use crate::rpc::{RpcError, RpcRequest, Transport};
use crate::status::StatusReporter;
use serde_json::{Value, json};
use thiserror::Error;

/// Errors that can occur while controlling playback
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Kodi refused to open the item
    #[error("Couldn't play {name}.")]
    Open {
        name: String,
        #[source]
        source: RpcError,
    },

    /// Play/pause toggle failed
    #[error("Unable to start playback")]
    PlayPause(#[source] RpcError),

    /// Stop failed
    #[error("Error stopping playback")]
    Stop(#[source] RpcError),

    /// Library scan could not be started
    #[error("Couldn't scan video library")]
    Scan(#[source] RpcError),

    /// Any other request failed
    #[error("Kodi request failed: {0}")]
    Request(#[from] RpcError),
}

/// Issues commands to one Kodi player.
pub struct Player<'a, T: Transport + ?Sized> {
    transport: &'a T,
    player_id: u32,
}

impl<'a, T: Transport + ?Sized> Player<'a, T> {
    pub fn new(transport: &'a T, player_id: u32) -> Self {
        Self {
            transport,
            player_id,
        }
    }

    /// Status reporter for the same player.
    pub fn status(&self) -> StatusReporter<'a, T> {
        StatusReporter::new(self.transport, self.player_id)
    }

    /// Starts playing `item`, resuming where it was left off.
    pub fn open(&self, item: &MediaItem) -> Result<String, PlaybackError> {
        let request = RpcRequest::command(
            "Player.Open",
            json!({
                "item": {"file": item.file},
                "options": {"resume": true}
            }),
        );

        tracing::debug!(file = %item.file, "Opening item");
        let response = self.transport.call(&request).map_err(|e| PlaybackError::Open {
            name: item.display_name().unwrap_or(&item.file).to_string(),
            source: e,
        })?;

        Ok(started_message(item, &response))
    }

    /// Toggles between play and pause, then reports the new state.
    pub fn play_pause(&self) -> Result<String, PlaybackError> {
        self.send("Player.PlayPause")
            .map_err(PlaybackError::PlayPause)?;
        Ok(self.status().whats_playing())
    }

    /// Resumes playback unless already playing.
    pub fn play(&self) -> Result<String, PlaybackError> {
        if self.is_playing()? {
            return Ok("Kodi is not paused.".to_string());
        }
        self.play_pause()
    }

    /// Pauses playback unless already paused.
    pub fn pause(&self) -> Result<String, PlaybackError> {
        if !self.is_playing()? {
            return Ok("Kodi is not playing.".to_string());
        }
        self.play_pause()
    }

    /// Stops playback.
    pub fn stop(&self) -> Result<String, PlaybackError> {
        self.send("Player.Stop").map_err(PlaybackError::Stop)?;
        Ok("Stopping Kodi.".to_string())
    }

    /// Starts a video library scan with progress dialogs shown on screen.
    pub fn scan(&self) -> Result<String, PlaybackError> {
        let request = RpcRequest::query("VideoLibrary.Scan", json!({"showdialogs": true}));
        self.transport.call(&request).map_err(PlaybackError::Scan)?;
        Ok("Scanning the video library".to_string())
    }

    /// Shows the on-screen display, then reports the state.
    pub fn show_info(&self) -> String {
        self.navigate("Input.ShowOSD")
    }

    /// Returns to the home screen, then reports the state.
    pub fn home(&self) -> String {
        self.navigate("Input.Home")
    }

    /// Kodi answers with an error when no player is active; that counts as stopped.
    fn is_playing(&self) -> Result<bool, PlaybackError> {
        match self.status().is_playing() {
            Ok(playing) => Ok(playing),
            Err(e) if e.is_transport() => Err(e.into()),
            Err(e) => {
                tracing::debug!(error = %e, "No active player");
                Ok(false)
            }
        }
    }

    fn navigate(&self, method: &'static str) -> String {
        if let Err(e) = self.transport.call(&RpcRequest::command(method, Value::Null)) {
            tracing::warn!(method, error = %e, "Input command failed");
        }
        self.status().whats_playing()
    }

    fn send(&self, method: &'static str) -> Result<Value, RpcError> {
        let request = RpcRequest::command(method, json!({"playerid": self.player_id}));
        self.transport.call(&request)
    }
}

/// "Playing '<label>'", falling back to the title, then the raw response.
fn started_message(item: &MediaItem, response: &Value) -> String {
    match item.display_name() {
        Some(name) => format!("Playing '{}'", name),
        None => serde_json::to_string_pretty(response).unwrap_or_else(|_| response.to_string()),
    }
}
