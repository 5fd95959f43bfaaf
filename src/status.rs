//! Playback status
//!
//! Asks Kodi what is currently playing and whether it is paused, and turns
//! the answer into a one-line description. The state is recomputed on every
//! call and never cached.

use crate::rpc::{RpcError, RpcRequest, Transport};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// What is printed when nothing can be reported.
pub const NOTHING_PLAYING: &str = "Nothing playing.";

#[derive(Debug, Deserialize)]
struct SpeedResult {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct ItemResult {
    item: PlayerItem,
}

#[derive(Debug, Deserialize)]
struct PlayerItem {
    #[serde(default)]
    label: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    showtitle: String,
    season: Option<i64>,
    episode: Option<i64>,
}

/// The item currently loaded in the player.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    pub title: String,
    pub show_title: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl NowPlaying {
    fn from_item(item: PlayerItem) -> Option<Self> {
        let title = if item.title.trim().is_empty() {
            item.label
        } else {
            item.title
        };
        if title.trim().is_empty() {
            return None;
        }

        Some(Self {
            title,
            show_title: item.showtitle,
            season: item.season.and_then(|n| u32::try_from(n).ok()).filter(|n| *n > 0),
            episode: item.episode.and_then(|n| u32::try_from(n).ok()).filter(|n| *n > 0),
        })
    }
}

/// Snapshot of the player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub now_playing: Option<NowPlaying>,
}

impl PlaybackState {
    /// One-line description, e.g. "Arrow - 3x4 - Corto Maltese [paused]".
    pub fn describe(&self) -> String {
        let Some(ref item) = self.now_playing else {
            return NOTHING_PLAYING.to_string();
        };

        let state = if self.is_playing { "[playing]" } else { "[paused]" };
        match (item.season, item.episode) {
            (Some(season), Some(episode)) => format!(
                "{} - {}x{} - {} {}",
                item.show_title, season, episode, item.title, state
            ),
            _ => format!("{} {}", item.title, state),
        }
    }
}

/// Reads playback state from one Kodi player.
pub struct StatusReporter<'a, T: Transport + ?Sized> {
    transport: &'a T,
    player_id: u32,
}

impl<'a, T: Transport + ?Sized> StatusReporter<'a, T> {
    pub fn new(transport: &'a T, player_id: u32) -> Self {
        Self {
            transport,
            player_id,
        }
    }

    /// True if the player is moving, in either direction.
    pub fn is_playing(&self) -> Result<bool, RpcError> {
        let request = RpcRequest::query(
            "Player.GetProperties",
            json!({"properties": ["speed"], "playerid": self.player_id}),
        );
        let result: SpeedResult = decode(self.transport.call(&request)?)?;
        Ok(result.speed != 0.0)
    }

    /// Current item and play/pause state.
    pub fn playback_state(&self) -> Result<PlaybackState, RpcError> {
        let request = RpcRequest::query(
            "Player.GetItem",
            json!({
                "properties": ["showtitle", "title", "season", "episode"],
                "playerid": self.player_id
            }),
        )
        .with_id("VideoGetItem");
        let result: ItemResult = decode(self.transport.call(&request)?)?;

        let Some(now_playing) = NowPlaying::from_item(result.item) else {
            return Ok(PlaybackState {
                is_playing: false,
                now_playing: None,
            });
        };

        Ok(PlaybackState {
            is_playing: self.is_playing()?,
            now_playing: Some(now_playing),
        })
    }

    /// Description of what is playing, or "Nothing playing." on any failure.
    pub fn whats_playing(&self) -> String {
        match self.playback_state() {
            Ok(state) => state.describe(),
            Err(e) => {
                tracing::debug!(error = %e, "No playback state");
                NOTHING_PLAYING.to_string()
            }
        }
    }
}

fn decode<R: DeserializeOwned>(value: Value) -> Result<R, RpcError> {
    serde_json::from_value(value).map_err(|e| RpcError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::fake::FakeTransport;

    fn episode_item() -> Value {
        json!({"item": {
            "label": "Corto Maltese",
            "title": "Corto Maltese",
            "showtitle": "Arrow",
            "season": 3,
            "episode": 4,
            "type": "episode"
        }})
    }

    #[test]
    fn test_is_playing_speed() {
        for (speed, expected) in [(0, false), (1, true), (-2, true), (32, true)] {
            let transport =
                FakeTransport::new().with_result("Player.GetProperties", json!({"speed": speed}));
            let reporter = StatusReporter::new(&transport, 1);
            assert_eq!(reporter.is_playing().unwrap(), expected, "speed {speed}");
        }
    }

    #[test]
    fn test_is_playing_garbage() {
        let transport = FakeTransport::new().with_result("Player.GetProperties", json!({}));
        let result = StatusReporter::new(&transport, 1).is_playing();
        assert!(matches!(result, Err(RpcError::Parse(_))));
    }

    #[test]
    fn test_episode_description() {
        let transport = FakeTransport::new()
            .with_result("Player.GetItem", episode_item())
            .with_result("Player.GetProperties", json!({"speed": 1}));

        let reporter = StatusReporter::new(&transport, 1);
        assert_eq!(reporter.whats_playing(), "Arrow - 3x4 - Corto Maltese [playing]");
    }

    #[test]
    fn test_movie_description() {
        let transport = FakeTransport::new()
            .with_result(
                "Player.GetItem",
                json!({"item": {"label": "The Avengers", "title": "The Avengers", "showtitle": "", "season": -1, "episode": -1}}),
            )
            .with_result("Player.GetProperties", json!({"speed": 0}));

        let reporter = StatusReporter::new(&transport, 1);
        assert_eq!(reporter.whats_playing(), "The Avengers [paused]");
    }

    #[test]
    fn test_decode_failure_is_nothing_playing() {
        let transport = FakeTransport::new().with_body("Player.GetItem", json!("garbled"));
        assert_eq!(StatusReporter::new(&transport, 1).whats_playing(), NOTHING_PLAYING);

        let transport = FakeTransport::new().with_result("Player.GetItem", json!({}));
        assert_eq!(StatusReporter::new(&transport, 1).whats_playing(), NOTHING_PLAYING);

        let transport = FakeTransport::new().with_error("Player.GetItem");
        assert_eq!(StatusReporter::new(&transport, 1).whats_playing(), NOTHING_PLAYING);
    }

    #[test]
    fn test_empty_item_is_nothing_playing() {
        let transport = FakeTransport::new()
            .with_result("Player.GetItem", json!({"item": {"label": "", "type": "unknown"}}));

        let reporter = StatusReporter::new(&transport, 1);
        assert_eq!(reporter.whats_playing(), NOTHING_PLAYING);
        assert!(transport.requests_for("Player.GetProperties").is_empty());
    }

    #[test]
    fn test_speed_failure_is_nothing_playing() {
        let transport = FakeTransport::new()
            .with_result("Player.GetItem", episode_item())
            .with_error("Player.GetProperties");

        assert_eq!(StatusReporter::new(&transport, 1).whats_playing(), NOTHING_PLAYING);
    }

    #[test]
    fn test_requests_target_player() {
        let transport = FakeTransport::new().with_result("Player.GetProperties", json!({"speed": 1}));
        StatusReporter::new(&transport, 2).is_playing().unwrap();
        assert_eq!(transport.requests_for("Player.GetProperties")[0].params["playerid"], 2);
    }
}
