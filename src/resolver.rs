//! Resolving free-text queries to library items
//!
//! This module turns what the user typed ("avengers", "Arrow",
//! "Arrow - 3x4") into exactly one playable library entry. Every lookup is
//! a first-match lookup: Kodi's sort order (label, ignoring leading
//! articles) decides between several candidates and no disambiguation is
//! offered.

use crate::ProgressEvent;
use crate::aliases::AliasTable;
use crate::library::{Library, LibraryError, LibraryFilter, MediaItem, MediaKind, title_contains};
use crate::rpc::Transport;
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Hint shown when an episode query cannot be parsed.
pub const EPISODE_FORMAT_HINT: &str = "Please format the show/episode as 'Show Name - 1x01'";

/// Hint shown when a find query has no content prefix.
pub const FIND_FORMAT_HINT: &str = "Please search as 'movies:Title' or 'tv:Title'";

static EPISODE_QUERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<show>.*\S) - (?P<token>\S+)$").expect("episode query pattern is valid")
});

static EPISODE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<season>\d+)[xX](?P<episode>\d+)$").expect("episode token pattern is valid")
});

/// Errors that can occur while resolving a query
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The query does not have the required shape
    #[error("{0}")]
    Format(String),

    /// No movie matched
    #[error("No matches found for '{0}'")]
    MovieNotFound(String),

    /// No show matched
    #[error("Couldn't find the show '{0}'")]
    ShowNotFound(String),

    /// The show exists but the episode does not
    #[error("Couldn't find episode '{show}: {episode}'")]
    EpisodeNotFound { show: String, episode: String },

    /// No show with unwatched episodes matched
    #[error("No unwatched episodes for '{0}'")]
    NoUnwatched(String),

    /// Nothing in the library matched a find query
    #[error("Couldn't find '{0}'.")]
    NotFound(String),

    /// Kodi could not be queried
    #[error(transparent)]
    Library(#[from] LibraryError),
}

/// How a movie query picks its result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    /// First title containing the query
    #[default]
    FirstMatch,
    /// First title equal to the query, ignoring case
    Exact,
}

/// A request for one specific episode, e.g. "Arrow - 3x04".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeQuery {
    pub show: String,
    /// Season and episode as searched for in labels, normalized to e.g. "3x04"
    pub token: String,
}

impl FromStr for EpisodeQuery {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format_error = || ResolveError::Format(EPISODE_FORMAT_HINT.to_string());

        let captures = EPISODE_QUERY.captures(s.trim()).ok_or_else(format_error)?;
        let token = normalize_episode_token(&captures["token"]).ok_or_else(format_error)?;

        Ok(Self {
            show: captures["show"].trim().to_string(),
            token,
        })
    }
}

/// Normalizes "3x4" to "3x04". Returns `None` for anything else.
pub fn normalize_episode_token(token: &str) -> Option<String> {
    let captures = EPISODE_TOKEN.captures(token.trim())?;
    let season: u32 = captures["season"].parse().ok()?;
    let episode: u32 = captures["episode"].parse().ok()?;
    Some(format!("{}x{:02}", season, episode))
}

/// Interprets "movies", "movie", "tv" or "shows".
pub fn parse_content_kind(kind: &str) -> Option<MediaKind> {
    let kind = kind.trim().to_lowercase();
    if kind.contains("movie") {
        Some(MediaKind::Movie)
    } else if kind.contains("tv") || kind.contains("show") {
        Some(MediaKind::Show)
    } else {
        None
    }
}

/// Splits "movies:The Avengers" into its kind and search term.
pub fn parse_find_query(query: &str) -> Result<(MediaKind, &str), ResolveError> {
    let format_error = || ResolveError::Format(FIND_FORMAT_HINT.to_string());

    let (kind, term) = query.split_once(':').ok_or_else(format_error)?;
    let kind = parse_content_kind(kind).ok_or_else(format_error)?;
    let term = term.trim();
    if term.is_empty() {
        return Err(format_error());
    }
    Ok((kind, term))
}

/// Finds library items for free-text queries.
pub struct Resolver<'a, T: Transport + ?Sized> {
    library: Library<'a, T>,
    aliases: &'a AliasTable,
}

impl<'a, T: Transport + ?Sized> Resolver<'a, T> {
    pub fn new(transport: &'a T, aliases: &'a AliasTable) -> Self {
        Self {
            library: Library::new(transport),
            aliases,
        }
    }

    /// The movie to play for `query`.
    pub fn movie<F>(
        &self,
        query: &str,
        policy: MatchPolicy,
        mut progress: F,
    ) -> Result<MediaItem, ResolveError>
    where
        F: FnMut(ProgressEvent),
    {
        let name = self.aliases.resolve(query);
        progress(ProgressEvent::LookingFor {
            query: name.to_string(),
            kind: Some(MediaKind::Movie),
        });

        let movie = self
            .library
            .movies(&LibraryFilter::title(name))?
            .into_iter()
            .filter(|m| title_contains(m, name))
            .find(|m| match policy {
                MatchPolicy::FirstMatch => true,
                MatchPolicy::Exact => m.title.to_lowercase() == name.to_lowercase(),
            })
            .ok_or_else(|| ResolveError::MovieNotFound(name.to_string()))?;

        tracing::debug!(query, matched = %movie.title, ?policy, "Movie resolved");
        progress(ProgressEvent::Found {
            title: movie.title.clone(),
        });
        Ok(movie)
    }

    /// The first unwatched episode of the first unwatched show matching `query`.
    ///
    /// Returns the show together with the episode. "First" is Kodi's episode
    /// order, which is not guaranteed to be chronological.
    pub fn next_unwatched_episode<F>(
        &self,
        query: &str,
        mut progress: F,
    ) -> Result<(MediaItem, MediaItem), ResolveError>
    where
        F: FnMut(ProgressEvent),
    {
        let name = self.aliases.resolve(query);
        progress(ProgressEvent::LookingFor {
            query: name.to_string(),
            kind: Some(MediaKind::Show),
        });

        let no_unwatched = || ResolveError::NoUnwatched(name.to_string());

        let show = self
            .library
            .shows(&LibraryFilter::title(name).unwatched())?
            .into_iter()
            .find(|s| title_contains(s, name))
            .ok_or_else(no_unwatched)?;
        progress(ProgressEvent::Found {
            title: show.title.clone(),
        });

        progress(ProgressEvent::FetchingNextEpisode);
        let episode = self
            .library
            .episodes(&show, true)?
            .into_iter()
            .next()
            .ok_or_else(no_unwatched)?;

        tracing::debug!(query, show = %show.title, episode = %episode.label, "Next episode resolved");
        Ok((show, episode))
    }

    /// A specific episode given as "Show Name - 1x01", watched or not.
    pub fn episode<F>(
        &self,
        query: &str,
        mut progress: F,
    ) -> Result<(MediaItem, MediaItem), ResolveError>
    where
        F: FnMut(ProgressEvent),
    {
        let EpisodeQuery { show, token } = query.parse::<EpisodeQuery>()?;

        let show = self.show(&show, &mut progress)?;

        progress(ProgressEvent::LookingForEpisode {
            token: token.clone(),
        });
        let episode = self
            .library
            .episodes(&show, false)?
            .into_iter()
            .find(|e| e.label.contains(&token))
            .ok_or_else(|| ResolveError::EpisodeNotFound {
                show: show.title.clone(),
                episode: token.clone(),
            })?;

        tracing::debug!(query, episode = %episode.label, "Episode resolved");
        progress(ProgressEvent::Found {
            title: episode.label.clone(),
        });
        Ok((show, episode))
    }

    /// The first show whose title contains `query`, watched or not.
    pub fn show<F>(&self, query: &str, mut progress: F) -> Result<MediaItem, ResolveError>
    where
        F: FnMut(ProgressEvent),
    {
        let name = self.aliases.resolve(query);
        progress(ProgressEvent::LookingFor {
            query: name.to_string(),
            kind: Some(MediaKind::Show),
        });

        let show = self
            .library
            .shows(&LibraryFilter::title(name))?
            .into_iter()
            .find(|s| title_contains(s, name))
            .ok_or_else(|| ResolveError::ShowNotFound(name.to_string()))?;

        progress(ProgressEvent::Found {
            title: show.title.clone(),
        });
        Ok(show)
    }

    /// Every movie or show whose title contains `query`.
    pub fn find<F>(
        &self,
        kind: MediaKind,
        query: &str,
        mut progress: F,
    ) -> Result<Vec<MediaItem>, ResolveError>
    where
        F: FnMut(ProgressEvent),
    {
        let name = self.aliases.resolve(query);
        progress(ProgressEvent::LookingFor {
            query: name.to_string(),
            kind: Some(kind),
        });

        let candidates = match kind {
            MediaKind::Show => self.library.shows(&LibraryFilter::all())?,
            MediaKind::Movie | MediaKind::Episode => self.library.movies(&LibraryFilter::all())?,
        };

        let matches: Vec<MediaItem> = candidates
            .into_iter()
            .filter(|item| title_contains(item, name))
            .collect();

        if matches.is_empty() {
            return Err(ResolveError::NotFound(name.to_string()));
        }
        Ok(matches)
    }

    /// The first show matching `query` and all of its episodes.
    pub fn show_episodes<F>(
        &self,
        query: &str,
        mut progress: F,
    ) -> Result<(MediaItem, Vec<MediaItem>), ResolveError>
    where
        F: FnMut(ProgressEvent),
    {
        let show = self.show(query, &mut progress)?;
        let episodes = self.library.episodes(&show, false)?;
        Ok((show, episodes))
    }
}
