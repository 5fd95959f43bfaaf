//! Queries against Kodi's video library.
//!
//! This module builds the `VideoLibrary.*` requests for movies, TV shows and
//! episodes and normalizes the answers into `MediaItem` records. Malformed
//! answers are treated as "nothing found"; only failures to reach Kodi at
//! all are reported as errors.

mod kodi_types;

use crate::rpc::{RpcError, RpcRequest, Transport};
use kodi_types::{EpisodesResult, KodiEpisode, KodiMovie, KodiTvShow, MoviesResult, TvShowsResult};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;

/// Errors that can occur during library queries.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Kodi could not be reached
    #[error("Library query failed: {0}")]
    Transport(#[from] RpcError),
}

/// The kind of library entry a `MediaItem` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Movie,
    Show,
    Episode,
}

/// A simplified library entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    /// What kind of entry this is
    pub kind: MediaKind,
    /// Kodi's `movieid`, `tvshowid` or `episodeid`
    pub id: Option<u32>,
    /// Display string, for episodes including season and episode ("3x04. Title")
    pub label: String,
    /// The bare title
    pub title: String,
    /// Playable location handed to `Player.Open`
    pub file: String,
    /// How often this has been watched
    pub playcount: u32,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl MediaItem {
    /// Label if present, else title.
    pub fn display_name(&self) -> Option<&str> {
        [self.label.as_str(), self.title.as_str()]
            .into_iter()
            .find(|s| !s.trim().is_empty())
    }

    fn from_movie(movie: KodiMovie) -> Self {
        Self {
            kind: MediaKind::Movie,
            id: movie.movieid,
            label: movie.label,
            title: movie.title,
            file: movie.file,
            playcount: movie.playcount,
            season: None,
            episode: None,
        }
    }

    fn from_show(show: KodiTvShow) -> Self {
        Self {
            kind: MediaKind::Show,
            id: Some(show.tvshowid),
            label: show.label,
            title: show.title,
            file: show.file,
            playcount: show.playcount,
            season: None,
            episode: None,
        }
    }

    fn from_episode(episode: KodiEpisode) -> Self {
        Self {
            kind: MediaKind::Episode,
            id: episode.episodeid,
            label: episode.label,
            title: episode.title,
            file: episode.file,
            playcount: episode.playcount,
            season: episode.season.and_then(positive),
            episode: episode.episode.and_then(positive),
        }
    }
}

fn positive(n: i64) -> Option<u32> {
    u32::try_from(n).ok().filter(|n| *n > 0)
}

/// Which entries a library query should return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryFilter {
    /// Only titles containing this text (case-insensitive, matched by Kodi)
    pub title_contains: Option<String>,
    /// Only entries with a playcount of zero
    pub unwatched_only: bool,
}

impl LibraryFilter {
    /// Everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Titles containing `query`.
    pub fn title(query: impl Into<String>) -> Self {
        Self {
            title_contains: Some(query.into()),
            unwatched_only: false,
        }
    }

    /// Restricts the filter to unwatched entries.
    pub fn unwatched(mut self) -> Self {
        self.unwatched_only = true;
        self
    }

    /// The Kodi `filter` parameter, if any rule applies.
    fn to_json(&self) -> Option<Value> {
        let mut rules = Vec::new();
        if let Some(ref query) = self.title_contains {
            rules.push(json!({"field": "title", "operator": "contains", "value": query}));
        }
        if self.unwatched_only {
            rules.push(json!({"field": "playcount", "operator": "is", "value": "0"}));
        }

        match rules.len() {
            0 => None,
            1 => rules.pop(),
            _ => Some(json!({"and": rules})),
        }
    }
}

/// Case-insensitive substring match on an item's title (label if untitled).
pub fn title_contains(item: &MediaItem, query: &str) -> bool {
    let haystack = if item.title.is_empty() { &item.label } else { &item.title };
    haystack.to_lowercase().contains(&query.trim().to_lowercase())
}

/// Read access to Kodi's video library.
pub struct Library<'a, T: Transport + ?Sized> {
    transport: &'a T,
}

impl<'a, T: Transport + ?Sized> Library<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// Movies matching `filter`, in Kodi's label order (leading articles ignored).
    pub fn movies(&self, filter: &LibraryFilter) -> Result<Vec<MediaItem>, LibraryError> {
        let params = list_params(&["title", "file", "playcount"], filter, true);
        let request = RpcRequest::query("VideoLibrary.GetMovies", params).with_id("libMovies");

        let result: MoviesResult = self.fetch(&request)?;
        let movies: Vec<MediaItem> = result.movies.into_iter().map(MediaItem::from_movie).collect();

        tracing::debug!(count = movies.len(), ?filter, "Movies listed");
        Ok(movies)
    }

    /// TV shows matching `filter`, in Kodi's label order (leading articles ignored).
    pub fn shows(&self, filter: &LibraryFilter) -> Result<Vec<MediaItem>, LibraryError> {
        let params = list_params(&["title", "file", "playcount"], filter, true);
        let request = RpcRequest::query("VideoLibrary.GetTVShows", params).with_id("libTvShows");

        let result: TvShowsResult = self.fetch(&request)?;
        let shows: Vec<MediaItem> = result.tvshows.into_iter().map(MediaItem::from_show).collect();

        tracing::debug!(count = shows.len(), ?filter, "Shows listed");
        Ok(shows)
    }

    /// Episodes of `show` in the order Kodi returns them.
    ///
    /// This order is not re-sorted and is not guaranteed to be chronological.
    pub fn episodes(
        &self,
        show: &MediaItem,
        unwatched_only: bool,
    ) -> Result<Vec<MediaItem>, LibraryError> {
        let Some(tvshowid) = show.id.filter(|_| show.kind == MediaKind::Show) else {
            tracing::warn!(show = %show.title, "Cannot list episodes without a show id");
            return Ok(Vec::new());
        };

        let filter = LibraryFilter {
            title_contains: None,
            unwatched_only,
        };
        let mut params = list_params(&["title", "file", "playcount", "season", "episode"], &filter, false);
        params["tvshowid"] = json!(tvshowid);
        let request = RpcRequest::query("VideoLibrary.GetEpisodes", params).with_id("libEpisodes");

        let result: EpisodesResult = self.fetch(&request)?;
        let episodes: Vec<MediaItem> = result
            .episodes
            .into_iter()
            .map(MediaItem::from_episode)
            .collect();

        tracing::debug!(count = episodes.len(), show = %show.title, unwatched_only, "Episodes listed");
        Ok(episodes)
    }

    /// Performs a list request, turning anything but a transport failure
    /// into an empty result.
    fn fetch<R>(&self, request: &RpcRequest) -> Result<R, LibraryError>
    where
        R: DeserializeOwned + Default,
    {
        match self.transport.call(request) {
            Ok(Value::Null) => Ok(R::default()),
            Ok(value) => Ok(serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!(method = request.method, error = %e, "Unexpected library response");
                R::default()
            })),
            Err(e) if e.is_transport() => Err(e.into()),
            Err(e) => {
                tracing::warn!(method = request.method, error = %e, "Library query rejected");
                Ok(R::default())
            }
        }
    }
}

fn list_params(properties: &[&str], filter: &LibraryFilter, sorted: bool) -> Value {
    let mut params = json!({ "properties": properties });
    if sorted {
        params["sort"] = json!({"order": "ascending", "method": "label", "ignorearticle": true});
    }
    if let Some(filter) = filter.to_json() {
        params["filter"] = filter;
    }
    params
}
