//! Alias table for awkward titles
//!
//! Some library titles are hard to type or ambiguous ("Marvel's Agents of
//! S.H.I.E.L.D.", "Law & Order: SVU"). The alias table maps what the user
//! types to the title Kodi knows. It is loaded once from a JSON file and is
//! read-only afterwards.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Both accepted file shapes: a single object, or a list of objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AliasFile {
    Map(HashMap<String, String>),
    List(Vec<HashMap<String, String>>),
}

/// Mapping from alias to canonical title.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasTable {
    /// Keys are trimmed and lowercased
    entries: HashMap<String, String>,
}

impl AliasTable {
    /// A table without any aliases.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads the table from `path`.
    ///
    /// A missing file or one that cannot be parsed results in an empty
    /// table; the problem is logged but never fatal.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::empty();
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "No alias file, using empty alias table");
            return Self::empty();
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read alias file");
                return Self::empty();
            }
        };

        match Self::from_json(&content) {
            Ok(table) => {
                tracing::debug!(path = %path.display(), count = table.len(), "Loaded aliases");
                table
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to parse alias file");
                Self::empty()
            }
        }
    }

    /// Parses the JSON alias format.
    ///
    /// When an alias appears more than once the first definition wins.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let maps = match serde_json::from_str::<AliasFile>(content)? {
            AliasFile::Map(map) => vec![map],
            AliasFile::List(list) => list,
        };

        let mut table = Self::empty();
        for map in maps {
            for (alias, canonical) in map {
                table.insert(&alias, canonical);
            }
        }
        Ok(table)
    }

    fn insert(&mut self, alias: &str, canonical: String) {
        self.entries.entry(normalize(alias)).or_insert(canonical);
    }

    /// Returns the canonical title for `query`, or `query` itself.
    pub fn resolve<'a>(&'a self, query: &'a str) -> &'a str {
        match self.entries.get(&normalize(query)) {
            Some(canonical) => {
                tracing::debug!(alias = query, canonical = %canonical, "Alias substituted");
                canonical.as_str()
            }
            None => query.trim(),
        }
    }

    /// Number of aliases in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table has no aliases.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<A: AsRef<str>, C: Into<String>> FromIterator<(A, C)> for AliasTable {
    fn from_iter<I: IntoIterator<Item = (A, C)>>(iter: I) -> Self {
        let mut table = Self::empty();
        for (alias, canonical) in iter {
            table.insert(alias.as_ref(), canonical.into());
        }
        table
    }
}

fn normalize(alias: &str) -> String {
    alias.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve() {
        let table: AliasTable = [("shield", "Marvel's Agents of S.H.I.E.L.D.")]
            .into_iter()
            .collect();

        assert_eq!(table.resolve("shield"), "Marvel's Agents of S.H.I.E.L.D.");
        assert_eq!(table.resolve("  SHIELD "), "Marvel's Agents of S.H.I.E.L.D.");
        assert_eq!(table.resolve(" Arrow "), "Arrow");
    }

    #[test]
    fn test_from_json_object() {
        let table = AliasTable::from_json(r#"{"svu": "Law & Order: Special Victims Unit"}"#).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.resolve("svu"), "Law & Order: Special Victims Unit");
    }

    #[test]
    fn test_from_json_list_first_wins() {
        let table = AliasTable::from_json(
            r#"[{"got": "Game of Thrones"}, {"shield": "Marvel's Agents of S.H.I.E.L.D."}, {"got": "Gotham"}]"#,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve("got"), "Game of Thrones");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        let table = AliasTable::load(Some(path.as_path()));
        assert!(table.is_empty());
        assert!(AliasTable::load(None).is_empty());
    }

    #[test]
    fn test_load_garbage_is_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "this is not json").unwrap();
        assert!(AliasTable::load(Some(file.path())).is_empty());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"doctor who": "Doctor Who (2005)"}}]"#).unwrap();

        let table = AliasTable::load(Some(file.path()));
        assert_eq!(table.resolve("Doctor Who"), "Doctor Who (2005)");
    }
}
