//! JSON recipe file: loads recipes into a store and writes aggregates back.
//!
//! The file holds the recipe records plus the interaction ledgers (who liked,
//! saved and rated what), so per-user idempotency survives a reload:
//!
//! ```json
//! { "recipes": [ { "id": "r1", ... } ], "ledgers": { "r1": { "likers": ["me"] } } }
//! ```
//!
//! A bare array of recipes is still accepted and loads with empty ledgers.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use potluck_core::{InteractionLedger, Recipe, RecipeStore};
use serde::{Deserialize, Serialize};

/// Everything persisted about a set of recipes.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeFile {
    pub recipes: Vec<Recipe>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ledgers: BTreeMap<String, InteractionLedger>,
}

impl RecipeFile {
    /// Capture the recipes and ledgers currently in `store`.
    pub fn from_store(store: &RecipeStore) -> Self {
        Self {
            recipes: store.snapshot(),
            ledgers: store.ledgers(),
        }
    }
}

impl From<Vec<Recipe>> for RecipeFile {
    fn from(recipes: Vec<Recipe>) -> Self {
        Self {
            recipes,
            ledgers: BTreeMap::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OnDisk {
    Recipes(Vec<Recipe>),
    File(RecipeFile),
}

/// Read the recipe file at `path`. A missing file is an empty collection.
pub fn load(path: &Path) -> Result<RecipeFile> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "recipe file missing, starting empty");
        return Ok(RecipeFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let on_disk: OnDisk = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(match on_disk {
        OnDisk::File(file) => file,
        OnDisk::Recipes(recipes) => recipes.into(),
    })
}

/// Load every recipe and ledger from `path` into `store`. Returns the number
/// of recipes loaded.
pub fn load_into(path: &Path, store: &RecipeStore) -> Result<usize> {
    let file = load(path)?;
    let count = file.recipes.len();
    for recipe in file.recipes {
        let id = recipe.id.clone();
        store
            .upsert(recipe)
            .with_context(|| format!("Recipe {} in {} is invalid", id, path.display()))?;
    }

    let ledgers = file.ledgers.len();
    for (id, ledger) in file.ledgers {
        store
            .restore_ledger(&id, ledger)
            .with_context(|| format!("Ledger for {} in {} is invalid", id, path.display()))?;
    }

    tracing::debug!(path = %path.display(), count, ledgers, "recipes loaded");
    Ok(count)
}

/// Write `file` to `path`, replacing it atomically.
pub fn save(path: &Path, file: &RecipeFile) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(file).context("Failed to serialize recipes")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;

    tracing::debug!(
        path = %path.display(),
        count = file.recipes.len(),
        ledgers = file.ledgers.len(),
        "recipes saved"
    );
    Ok(())
}

/// Write the current contents of `store` to `path`.
pub fn save_store(path: &Path, store: &RecipeStore) -> Result<()> {
    save(path, &RecipeFile::from_store(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::sample_recipes;
    use potluck_core::RatingChange;
    use tempfile::TempDir;

    fn open(path: &Path, user: &str) -> RecipeStore {
        let store = RecipeStore::for_viewer(user);
        load_into(path, &store).unwrap();
        store
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let file = load(&temp_dir.path().join("nothing.json")).unwrap();
        assert!(file.recipes.is_empty());
        assert!(file.ledgers.is_empty());
    }

    #[test]
    fn test_save_then_load_into_store() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("recipes.json");

        let recipes = sample_recipes();
        save(&path, &RecipeFile::from(recipes.clone())).unwrap();

        let store = RecipeStore::new();
        let count = load_into(&path, &store).unwrap();
        assert_eq!(count, recipes.len());
        assert_eq!(store.get(&recipes[0].id).unwrap(), recipes[0]);
    }

    #[test]
    fn test_bare_recipe_array_still_loads() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("recipes.json");
        fs::write(&path, serde_json::to_string(&sample_recipes()).unwrap()).unwrap();

        let file = load(&path).unwrap();
        assert_eq!(file.recipes.len(), sample_recipes().len());
        assert!(file.ledgers.is_empty());
    }

    #[test]
    fn test_rerate_after_reload_replaces() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("recipes.json");
        save(&path, &RecipeFile::from(sample_recipes())).unwrap();

        let store = open(&path, "me");
        let first = store.record_rating("mushroom-risotto", "me", 1.0).unwrap();
        assert_eq!(first.change, RatingChange::Added);
        save_store(&path, &store).unwrap();

        let store = open(&path, "me");
        assert_eq!(store.rating_by("mushroom-risotto", "me").unwrap(), Some(1.0));
        let second = store.record_rating("mushroom-risotto", "me", 5.0).unwrap();
        assert_eq!(second.change, RatingChange::Replaced { previous: 1.0 });
        assert_eq!(second.recipe.rating_count, 1);
        assert_eq!(second.recipe.rating, 5.0);
    }

    #[test]
    fn test_likes_after_reload_as_another_user() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("recipes.json");
        save(&path, &RecipeFile::from(sample_recipes())).unwrap();

        let store = open(&path, "alice");
        let liked = store.apply_like_delta("overnight-oats", "alice", true).unwrap();
        assert_eq!(liked.recipe.likes, 5);
        save_store(&path, &store).unwrap();

        let store = open(&path, "bob");
        let as_bob = store.get("overnight-oats").unwrap();
        assert!(!as_bob.is_liked);
        assert_eq!(as_bob.likes, 5);

        let out = store.apply_like_delta("overnight-oats", "bob", true).unwrap();
        assert!(out.changed);
        assert_eq!(out.recipe.likes, 6);

        let again = store.apply_like_delta("overnight-oats", "alice", true).unwrap();
        assert!(!again.changed);
        assert_eq!(again.recipe.likes, 6);
        save_store(&path, &store).unwrap();

        let file = load(&path).unwrap();
        let ledger = &file.ledgers["overnight-oats"];
        assert_eq!(ledger.likers.iter().collect::<Vec<_>>(), vec!["alice", "bob"]);
    }

    #[test]
    fn test_ledger_for_unknown_recipe_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("recipes.json");
        let mut file = RecipeFile::from(sample_recipes());
        file.ledgers
            .insert("ghost".to_string(), InteractionLedger::default());
        save(&path, &file).unwrap();

        let err = load_into(&path, &RecipeStore::new()).unwrap_err();
        assert!(err.to_string().contains("Ledger for ghost"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("recipes.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
