use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::workflow::state::Recipe;

#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error("failed to access favorites file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("favorites file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no favorite at position {0}")]
    NoSuchFavorite(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteRecipe {
    pub recipe: Recipe,
    pub saved_at: DateTime<Utc>,
}

/// Saved recipes, persisted as JSON. Two recipes are the same favorite when
/// their name and content match.
pub struct Favorites {
    path: PathBuf,
    entries: Vec<FavoriteRecipe>,
}

impl Favorites {
    /// Load favorites from `path`; a missing file means no favorites yet.
    pub fn load(path: PathBuf) -> Result<Self, FavoritesError> {
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| FavoritesError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(FavoritesError::Io { path, source }),
        };

        debug!("Loaded {} favorites from {}", entries.len(), path.display());
        Ok(Self { path, entries })
    }

    pub fn entries(&self) -> &[FavoriteRecipe] {
        &self.entries
    }

    pub fn contains(&self, recipe: &Recipe) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.recipe.name == recipe.name && entry.recipe.content == recipe.content)
    }

    /// Save `recipe`. Returns `false` if it was already a favorite.
    pub fn add(&mut self, recipe: &Recipe) -> Result<bool, FavoritesError> {
        if self.contains(recipe) {
            return Ok(false);
        }

        self.entries.push(FavoriteRecipe {
            recipe: recipe.clone(),
            saved_at: Utc::now(),
        });
        self.persist()?;
        Ok(true)
    }

    /// Remove the favorite at a 1-based position, as shown to the user.
    pub fn remove(&mut self, position: usize) -> Result<FavoriteRecipe, FavoritesError> {
        if position == 0 || position > self.entries.len() {
            return Err(FavoritesError::NoSuchFavorite(position));
        }

        let removed = self.entries.remove(position - 1);
        self.persist()?;
        Ok(removed)
    }

    fn persist(&self) -> Result<(), FavoritesError> {
        let io_error = |source| FavoritesError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let json = serde_json::to_string_pretty(&self.entries).map_err(|source| {
            FavoritesError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, json).map_err(io_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::recipe;

    #[test]
    fn test_missing_file_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let favorites = Favorites::load(temp.path().join("favorites.json")).unwrap();
        assert!(favorites.entries().is_empty());
    }

    #[test]
    fn test_add_deduplicates_and_persists() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested").join("favorites.json");
        let mut favorites = Favorites::load(path.clone()).unwrap();

        assert!(favorites.add(&recipe("Shakshuka")).unwrap());
        assert!(!favorites.add(&recipe("Shakshuka")).unwrap());
        assert!(favorites.add(&recipe("Crepes")).unwrap());

        let reloaded = Favorites::load(path).unwrap();
        let names: Vec<_> = reloaded.entries().iter().map(|f| f.recipe.name.as_str()).collect();
        assert_eq!(names, vec!["Shakshuka", "Crepes"]);
    }

    #[test]
    fn test_same_name_different_content_is_distinct() {
        let temp = tempfile::tempdir().unwrap();
        let mut favorites = Favorites::load(temp.path().join("favorites.json")).unwrap();
        let mut other = recipe("Omelette");
        other.content = "A different omelette".to_string();

        assert!(favorites.add(&recipe("Omelette")).unwrap());
        assert!(favorites.add(&other).unwrap());
        assert_eq!(favorites.entries().len(), 2);
    }

    #[test]
    fn test_remove_by_position() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("favorites.json");
        let mut favorites = Favorites::load(path.clone()).unwrap();
        favorites.add(&recipe("Shakshuka")).unwrap();
        favorites.add(&recipe("Crepes")).unwrap();

        let removed = favorites.remove(1).unwrap();
        assert_eq!(removed.recipe.name, "Shakshuka");
        assert!(matches!(favorites.remove(0), Err(FavoritesError::NoSuchFavorite(0))));
        assert!(matches!(favorites.remove(5), Err(FavoritesError::NoSuchFavorite(5))));
        assert_eq!(Favorites::load(path).unwrap().entries().len(), 1);
    }

    #[test]
    fn test_corrupt_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("favorites.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(Favorites::load(path), Err(FavoritesError::Corrupt { .. })));
    }
}
