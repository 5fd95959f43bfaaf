//! kodi-control - A command-line remote for the Kodi media player
//!
//! This library talks to Kodi's JSON-RPC API: it finds movies and episodes
//! in the video library from free-text queries, starts and controls
//! playback, and describes what is currently playing.

mod aliases;
mod config;
mod library;
mod player;
mod resolver;
mod rpc;
mod status;

pub use aliases::AliasTable;
pub use config::Config;
pub use library::{Library, LibraryFilter, MediaItem, MediaKind};
pub use player::Player;
pub use resolver::{
    EPISODE_FORMAT_HINT, EpisodeQuery, MatchPolicy, Resolver, normalize_episode_token,
    parse_content_kind, parse_find_query,
};
pub use rpc::{HttpTransport, RpcRequest, Transport, Verb};
pub use status::{NOTHING_PLAYING, NowPlaying, PlaybackState, StatusReporter};

// Re-export error types
pub use config::ConfigError;
pub use library::LibraryError;
pub use player::PlaybackError;
pub use resolver::ResolveError;
pub use rpc::RpcError;

use thiserror::Error;

/// Progress event emitted while resolving a query
///
/// These events let the caller narrate a lookup ("Looking for 'Arrow'...")
/// or stay silent.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Searching the library for a title
    LookingFor {
        query: String,
        kind: Option<MediaKind>,
    },

    /// A movie, show or episode was picked
    Found { title: String },

    /// Searching a show's episodes for a season/episode token
    LookingForEpisode { token: String },

    /// Fetching the show's unwatched episodes
    FetchingNextEpisode,
}

/// Top-level error type for kodi-control operations
#[derive(Debug, Error)]
pub enum KodiControlError {
    /// Kodi did not answer the startup ping
    #[error("Kodi was not detected at {endpoint}.")]
    NotDetected {
        endpoint: String,
        #[source]
        source: RpcError,
    },

    /// Error while loading the configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from a raw JSON-RPC call
    #[error("Request error: {0}")]
    Rpc(#[from] RpcError),

    /// Error during a library query
    #[error(transparent)]
    Library(#[from] LibraryError),

    /// A query could not be resolved to a library item
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A player command failed
    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// A connected Kodi remote
///
/// Owns the transport and the alias table; each method corresponds to one
/// user action and returns the message to show for it.
pub struct Remote<T: Transport> {
    transport: T,
    aliases: AliasTable,
    player_id: u32,
}

impl Remote<HttpTransport> {
    /// Connects to the Kodi instance described by `config`.
    ///
    /// Fails with `KodiControlError::NotDetected` if Kodi does not answer.
    /// The alias table is loaded from the configured location; problems
    /// with it only result in an empty table.
    pub fn connect(config: &Config) -> Result<Self, KodiControlError> {
        let transport = HttpTransport::new(config)?;
        detect(&transport)?;

        let aliases = AliasTable::load(config.aliases_file().as_deref());
        Ok(Self::new(transport, aliases, config.player_id))
    }
}

/// Kodi labels episodes "3x04. Title"; the part before the dot is the number.
fn episode_line(show: &MediaItem, episode: &MediaItem) -> String {
    match episode.label.split_once('.') {
        Some((number, _)) => format!("{} - {} - {}", show.title, number.trim(), episode.title),
        None => format!(
            "{} - {}",
            show.title,
            episode.display_name().unwrap_or(&episode.file)
        ),
    }
}

/// Pings Kodi, mapping any failure to `KodiControlError::NotDetected`.
fn detect<T: Transport + ?Sized>(transport: &T) -> Result<(), KodiControlError> {
    rpc::ping(transport).map_err(|e| KodiControlError::NotDetected {
        endpoint: transport.describe(),
        source: e,
    })?;
    tracing::debug!(endpoint = %transport.describe(), "Kodi detected");
    Ok(())
}

impl<T: Transport> Remote<T> {
    /// Creates a remote over an already established transport.
    pub fn new(transport: T, aliases: AliasTable, player_id: u32) -> Self {
        Self {
            transport,
            aliases,
            player_id,
        }
    }

    fn library(&self) -> Library<'_, T> {
        Library::new(&self.transport)
    }

    fn resolver(&self) -> Resolver<'_, T> {
        Resolver::new(&self.transport, &self.aliases)
    }

    fn player(&self) -> Player<'_, T> {
        Player::new(&self.transport, self.player_id)
    }

    /// All movies, sorted by label.
    pub fn list_movies(&self) -> Result<Vec<MediaItem>, KodiControlError> {
        Ok(self.library().movies(&LibraryFilter::all())?)
    }

    /// All TV shows, sorted by label.
    pub fn list_shows(&self) -> Result<Vec<MediaItem>, KodiControlError> {
        Ok(self.library().shows(&LibraryFilter::all())?)
    }

    /// "<show> - 3x04 - <title>" for every episode of the show matching `query`.
    pub fn list_episodes<F>(&self, query: &str, progress: F) -> Result<Vec<String>, KodiControlError>
    where
        F: FnMut(ProgressEvent),
    {
        let (show, episodes) = self.resolver().show_episodes(query, progress)?;
        Ok(episodes.iter().map(|e| episode_line(&show, e)).collect())
    }

    /// Movies or shows whose title contains the term of a "movies:term" query.
    pub fn find<F>(&self, query: &str, progress: F) -> Result<Vec<MediaItem>, KodiControlError>
    where
        F: FnMut(ProgressEvent),
    {
        let (kind, term) = parse_find_query(query)?;
        Ok(self.resolver().find(kind, term, progress)?)
    }

    /// Finds and plays a movie.
    pub fn play_movie<F>(
        &self,
        query: &str,
        policy: MatchPolicy,
        progress: F,
    ) -> Result<String, KodiControlError>
    where
        F: FnMut(ProgressEvent),
    {
        let movie = self.resolver().movie(query, policy, progress)?;
        Ok(self.player().open(&movie)?)
    }

    /// Plays the next unwatched episode of a show.
    pub fn play_next_episode<F>(&self, query: &str, progress: F) -> Result<String, KodiControlError>
    where
        F: FnMut(ProgressEvent),
    {
        let (show, episode) = self.resolver().next_unwatched_episode(query, progress)?;
        let started = self.player().open(&episode)?;
        Ok(started.replacen("Playing", &format!("Playing {}:", show.title), 1))
    }

    /// Plays a specific episode given as "Show Name - 1x01".
    pub fn play_episode<F>(&self, query: &str, progress: F) -> Result<String, KodiControlError>
    where
        F: FnMut(ProgressEvent),
    {
        let (_, episode) = self.resolver().episode(query, progress)?;
        Ok(self.player().open(&episode)?)
    }

    /// Toggles play/pause and reports the new state.
    pub fn toggle(&self) -> Result<String, KodiControlError> {
        Ok(self.player().play_pause()?)
    }

    /// Resumes playback if paused.
    pub fn play(&self) -> Result<String, KodiControlError> {
        Ok(self.player().play()?)
    }

    /// Pauses playback if playing.
    pub fn pause(&self) -> Result<String, KodiControlError> {
        Ok(self.player().pause()?)
    }

    /// Stops playback.
    pub fn stop(&self) -> Result<String, KodiControlError> {
        Ok(self.player().stop()?)
    }

    /// Rescans the video library.
    pub fn scan(&self) -> Result<String, KodiControlError> {
        Ok(self.player().scan()?)
    }

    /// Shows Kodi's on-screen display and reports what is playing.
    pub fn info(&self) -> String {
        self.player().show_info()
    }

    /// Goes to Kodi's home screen and reports what is playing.
    pub fn home(&self) -> String {
        self.player().home()
    }

    /// What is playing, or "Nothing playing.".
    pub fn status(&self) -> String {
        self.player().status().whats_playing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::tests::{episode, movie, show};
    use crate::rpc::fake::FakeTransport;
    use serde_json::json;

    fn remote(transport: FakeTransport) -> Remote<FakeTransport> {
        Remote::new(transport, AliasTable::empty(), 1)
    }

    #[test]
    fn test_detect() {
        let transport = FakeTransport::new().with_result("JSONRPC.Ping", json!("pong"));
        assert!(detect(&transport).is_ok());

        let transport = FakeTransport::new().unreachable("JSONRPC.Ping");
        let err = detect(&transport).unwrap_err();
        assert!(matches!(
            err,
            KodiControlError::NotDetected {
                source: RpcError::Request(_),
                ..
            }
        ));
        assert_eq!(err.to_string(), "Kodi was not detected at fake://kodi/jsonrpc.");
    }

    #[test]
    fn test_play_movie_scenario() {
        let transport = FakeTransport::new()
            .with_result(
                "VideoLibrary.GetMovies",
                json!({"movies": [movie("The Avengers", "/a.mp4"), movie("Arrow", "/b.mp4")]}),
            )
            .with_result("Player.Open", json!("OK"));
        let remote = remote(transport);

        let message = remote
            .play_movie("avengers", MatchPolicy::FirstMatch, |_| {})
            .unwrap();
        assert_eq!(message, "Playing 'The Avengers'");

        let opened = remote.transport.requests_for("Player.Open");
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].params["item"]["file"], "/a.mp4");
    }

    #[test]
    fn test_play_next_episode_scenario_without_show() {
        let transport = FakeTransport::new().with_result("VideoLibrary.GetTVShows", json!({}));
        let remote = remote(transport);

        let err = remote.play_next_episode("Ghost Show", |_| {}).unwrap_err();
        assert_eq!(err.to_string(), "No unwatched episodes for 'Ghost Show'");
        assert!(remote.transport.requests_for("Player.Open").is_empty());
    }

    #[test]
    fn test_play_next_episode_message() {
        let transport = FakeTransport::new()
            .with_result("VideoLibrary.GetTVShows", json!({"tvshows": [show(7, "Arrow", 0)]}))
            .with_result("VideoLibrary.GetEpisodes", json!({"episodes": [episode(3, 4, "Sara", 0)]}))
            .with_result("Player.Open", json!("OK"));
        let remote = remote(transport);

        let message = remote.play_next_episode("arrow", |_| {}).unwrap();
        assert_eq!(message, "Playing Arrow: '3x04. Sara'");
    }

    #[test]
    fn test_play_episode_not_found_does_not_open() {
        let transport = FakeTransport::new()
            .with_result("VideoLibrary.GetTVShows", json!({"tvshows": [show(7, "Arrow", 0)]}))
            .with_result("VideoLibrary.GetEpisodes", json!({"episodes": [episode(3, 4, "Sara", 0)]}));
        let remote = remote(transport);

        let err = remote.play_episode("Arrow - 3x05", |_| {}).unwrap_err();
        assert_eq!(err.to_string(), "Couldn't find episode 'Arrow: 3x05'");
        assert!(remote.transport.requests_for("Player.Open").is_empty());
    }

    #[test]
    fn test_list_episodes() {
        let transport = FakeTransport::new()
            .with_result("VideoLibrary.GetTVShows", json!({"tvshows": [show(7, "Arrow", 0)]}))
            .with_result(
                "VideoLibrary.GetEpisodes",
                json!({"episodes": [
                    episode(3, 4, "Sara", 0),
                    episode(3, 5, "Haunted", 0),
                    {"episodeid": 99, "label": "Special", "title": "Special", "file": "/tv/special.mkv"}
                ]}),
            );

        let labels = remote(transport).list_episodes("Arrow", |_| {}).unwrap();
        assert_eq!(
            labels,
            vec!["Arrow - 3x04 - Sara", "Arrow - 3x05 - Haunted", "Arrow - Special"]
        );
    }

    #[test]
    fn test_find_requires_kind() {
        let err = remote(FakeTransport::new()).find("Suits", |_| {}).unwrap_err();
        assert!(matches!(err, KodiControlError::Resolve(ResolveError::Format(_))));
    }

    #[test]
    fn test_list_movies_unreachable() {
        let transport = FakeTransport::new().unreachable("VideoLibrary.GetMovies");
        let err = remote(transport).list_movies().unwrap_err();
        assert!(matches!(err, KodiControlError::Library(_)));
    }

    #[test]
    fn test_status_nothing_playing() {
        let transport = FakeTransport::new().with_body("Player.GetItem", json!(""));
        assert_eq!(remote(transport).status(), NOTHING_PLAYING);
    }
}
