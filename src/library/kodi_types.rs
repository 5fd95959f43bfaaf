//! Kodi VideoLibrary response types for deserialization.
//!
//! These structures mirror the `result` member of the JSON-RPC responses.
//! Kodi omits the list member entirely when nothing matches, hence the
//! `#[serde(default)]` on every list.

use serde::Deserialize;

/// Result of `VideoLibrary.GetMovies`.
#[derive(Debug, Default, Deserialize)]
pub(super) struct MoviesResult {
    #[serde(default)]
    pub movies: Vec<KodiMovie>,
}

/// A single movie.
#[derive(Debug, Deserialize)]
pub(super) struct KodiMovie {
    pub movieid: Option<u32>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub playcount: u32,
}

/// Result of `VideoLibrary.GetTVShows`.
#[derive(Debug, Default, Deserialize)]
pub(super) struct TvShowsResult {
    #[serde(default)]
    pub tvshows: Vec<KodiTvShow>,
}

/// A single TV show.
#[derive(Debug, Deserialize)]
pub(super) struct KodiTvShow {
    pub tvshowid: u32,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub title: String,
    /// Path of the show's folder
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub playcount: u32,
}

/// Result of `VideoLibrary.GetEpisodes`.
#[derive(Debug, Default, Deserialize)]
pub(super) struct EpisodesResult {
    #[serde(default)]
    pub episodes: Vec<KodiEpisode>,
}

/// A single episode.
#[derive(Debug, Deserialize)]
pub(super) struct KodiEpisode {
    pub episodeid: Option<u32>,
    /// Kodi formats this as "3x04. Title"
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub playcount: u32,
    /// -1 or missing when unknown
    pub season: Option<i64>,
    pub episode: Option<i64>,
}
