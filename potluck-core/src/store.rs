//! In-memory recipe aggregate store.
//!
//! Recipes are kept in a sharded map keyed by id. Every mutation runs while
//! holding that recipe's entry lock, so a reader never sees `likes` move
//! without the like ledger, or `rating` without `rating_count`. Operations on
//! different recipes do not wait on each other beyond shard contention.
//!
//! Viewer-relative flags (`is_liked`, `is_saved`) are not trusted from the
//! record itself. Each recipe carries a ledger of which users liked, saved and
//! rated it, and flags are projected from that ledger when a recipe is read
//! for a given viewer.
//!
//! Every applied mutation bumps the recipe's version. Outcomes carry the
//! version they produced, so a collaborator that receives changes out of
//! order can drop the stale ones.

use std::collections::{BTreeMap, BTreeSet};

use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{RecipeError, RecipeResult};
use crate::types::{Comment, Recipe, MAX_RATING};

/// Default limit on comment length, in characters.
pub const DEFAULT_MAX_COMMENT_CHARS: usize = 2000;

/// Result of an interaction that may have been a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// The recipe after the operation, projected for the acting user
    pub recipe: Recipe,
    /// False when the recipe was already in the requested state
    pub changed: bool,
    /// Version of the recipe after the operation; unchanged by a no-op
    pub version: u64,
}

/// How a per-user rating affected the aggregate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RatingChange {
    /// First rating from this user
    Added,
    /// This user's earlier rating was swapped out
    Replaced { previous: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatingOutcome {
    pub recipe: Recipe,
    pub change: RatingChange,
    pub version: u64,
}

/// Who has liked, saved and rated one recipe.
///
/// This is what makes likes and ratings idempotent per user, so it has to be
/// persisted next to the recipe record for that to hold across restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionLedger {
    #[serde(default)]
    pub likers: BTreeSet<String>,
    #[serde(default)]
    pub savers: BTreeSet<String>,
    /// Each user's current rating
    #[serde(default)]
    pub ratings: BTreeMap<String, f64>,
}

impl InteractionLedger {
    pub fn is_empty(&self) -> bool {
        self.likers.is_empty() && self.savers.is_empty() && self.ratings.is_empty()
    }
}

/// A recipe plus who has interacted with it.
#[derive(Debug)]
struct Entry {
    recipe: Recipe,
    ledger: InteractionLedger,
    version: u64,
}

impl Entry {
    fn project(&self, viewer: Option<&str>) -> Recipe {
        let mut recipe = self.recipe.clone();
        if let Some(user_id) = viewer {
            recipe.is_liked = self.ledger.likers.contains(user_id);
            recipe.is_saved = self.ledger.savers.contains(user_id);
        }
        recipe
    }

    fn outcome(&self, viewer: &str, changed: bool) -> Outcome {
        Outcome {
            recipe: self.project(Some(viewer)),
            changed,
            version: self.version,
        }
    }
}

fn check_rating(value: f64) -> RecipeResult<()> {
    if value.is_finite() && (0.0..=MAX_RATING).contains(&value) {
        Ok(())
    } else {
        Err(RecipeError::InvalidRating(value))
    }
}

fn clamp_rating(value: f64) -> f64 {
    value.clamp(0.0, MAX_RATING)
}

/// Authoritative in-memory set of recipes.
#[derive(Debug)]
pub struct RecipeStore {
    entries: DashMap<String, Entry>,
    /// The viewer records are loaded for; their `is_liked`/`is_saved`
    /// flags are attributed to this user on upsert.
    owner: Option<String>,
    max_comment_chars: usize,
}

impl Default for RecipeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeStore {
    /// A store with no owning viewer. Flags on upserted records are kept
    /// verbatim but not attributed to anyone.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            owner: None,
            max_comment_chars: DEFAULT_MAX_COMMENT_CHARS,
        }
    }

    /// A store loaded on behalf of one viewer (one client session).
    pub fn for_viewer(user_id: impl Into<String>) -> Self {
        Self {
            owner: Some(user_id.into()),
            ..Self::new()
        }
    }

    pub fn with_max_comment_chars(mut self, max: usize) -> Self {
        self.max_comment_chars = max;
        self
    }

    /// Apply the store-level limits from an engine configuration.
    pub fn with_config(self, config: &EngineConfig) -> Self {
        self.with_max_comment_chars(config.max_comment_chars)
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Snapshot of a recipe as seen by the store owner.
    pub fn get(&self, id: &str) -> RecipeResult<Recipe> {
        self.entries
            .get(id)
            .map(|e| e.project(self.owner.as_deref()))
            .ok_or_else(|| RecipeError::not_found(id))
    }

    /// Snapshot of a recipe with flags projected for `user_id`.
    pub fn get_for_viewer(&self, id: &str, user_id: &str) -> RecipeResult<Recipe> {
        self.entries
            .get(id)
            .map(|e| e.project(Some(user_id)))
            .ok_or_else(|| RecipeError::not_found(id))
    }

    /// All recipes as seen by the owner, oldest first (ties by id).
    pub fn snapshot(&self) -> Vec<Recipe> {
        self.collect(self.owner.as_deref())
    }

    /// All recipes with flags projected for `user_id`, oldest first.
    pub fn snapshot_for_viewer(&self, user_id: &str) -> Vec<Recipe> {
        self.collect(Some(user_id))
    }

    fn collect(&self, viewer: Option<&str>) -> Vec<Recipe> {
        let mut recipes: Vec<Recipe> = self
            .entries
            .iter()
            .map(|e| e.value().project(viewer))
            .collect();
        recipes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        recipes
    }

    /// Insert or fully replace a recipe. Used for initial load and sync, not
    /// for interactions. The interaction ledger starts over.
    pub fn upsert(&self, mut recipe: Recipe) -> RecipeResult<()> {
        recipe.validate()?;

        let mut ledger = InteractionLedger::default();
        if let Some(owner) = &self.owner {
            if recipe.is_liked {
                ledger.likers.insert(owner.clone());
                // The owner's like has to be part of the count
                recipe.likes = recipe.likes.max(1);
            }
            if recipe.is_saved {
                ledger.savers.insert(owner.clone());
            }
        }

        let id = recipe.id.clone();
        let (replaced, version) = match self.entries.entry(id.clone()) {
            MapEntry::Occupied(mut slot) => {
                let version = slot.get().version + 1;
                slot.insert(Entry {
                    recipe,
                    ledger,
                    version,
                });
                (true, version)
            }
            MapEntry::Vacant(slot) => {
                slot.insert(Entry {
                    recipe,
                    ledger,
                    version: 0,
                });
                (false, 0)
            }
        };

        tracing::debug!(recipe_id = %id, replaced, version, "recipe upserted");
        Ok(())
    }

    /// Remove a recipe together with its comments. The outcome's version is
    /// one past the last version the recipe had.
    pub fn remove(&self, id: &str) -> RecipeResult<Outcome> {
        let (_, entry) = self
            .entries
            .remove(id)
            .ok_or_else(|| RecipeError::not_found(id))?;
        tracing::debug!(recipe_id = %id, comments = entry.recipe.comments.len(), "recipe removed");
        Ok(Outcome {
            recipe: entry.project(self.owner.as_deref()),
            changed: true,
            version: entry.version + 1,
        })
    }

    /// A copy of the interaction ledger of one recipe.
    pub fn ledger(&self, id: &str) -> RecipeResult<InteractionLedger> {
        self.entries
            .get(id)
            .map(|e| e.ledger.clone())
            .ok_or_else(|| RecipeError::not_found(id))
    }

    /// Every non-empty ledger, keyed by recipe id.
    pub fn ledgers(&self) -> BTreeMap<String, InteractionLedger> {
        self.entries
            .iter()
            .filter(|e| !e.ledger.is_empty())
            .map(|e| (e.key().clone(), e.ledger.clone()))
            .collect()
    }

    /// Replace the interaction ledger of a recipe, typically one saved
    /// earlier with [`RecipeStore::ledgers`]. The aggregate has to be able to
    /// account for the ledger: every recorded rating must be in range and
    /// part of `rating_count`, and `likes` is raised to the number of likers
    /// if it falls short.
    pub fn restore_ledger(&self, id: &str, ledger: InteractionLedger) -> RecipeResult<()> {
        let mut entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| RecipeError::not_found(id))?;

        if let Some(value) = ledger.ratings.values().find(|v| check_rating(**v).is_err()) {
            return Err(RecipeError::InvalidRating(*value));
        }
        if ledger.ratings.len() as u64 > entry.recipe.rating_count {
            return Err(RecipeError::invalid_recipe(
                id,
                format!(
                    "ledger holds {} ratings but rating count is {}",
                    ledger.ratings.len(),
                    entry.recipe.rating_count
                ),
            ));
        }

        let likers = ledger.likers.len() as u64;
        entry.recipe.likes = entry.recipe.likes.max(likers);
        entry.ledger = ledger;
        entry.version += 1;

        tracing::debug!(
            recipe_id = %id,
            likers,
            savers = entry.ledger.savers.len(),
            ratings = entry.ledger.ratings.len(),
            "ledger restored"
        );
        Ok(())
    }

    /// Record `user_id` liking (or unliking) a recipe, moving `likes` by one.
    /// Already being in the target state is a no-op.
    pub fn apply_like_delta(&self, id: &str, user_id: &str, like: bool) -> RecipeResult<Outcome> {
        let mut entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| RecipeError::not_found(id))?;

        let changed = if like {
            entry.ledger.likers.insert(user_id.to_string())
        } else {
            entry.ledger.likers.remove(user_id)
        };

        if changed {
            entry.version += 1;
            let likes = &mut entry.recipe.likes;
            *likes = if like {
                likes.saturating_add(1)
            } else {
                likes.saturating_sub(1)
            };
            tracing::debug!(recipe_id = %id, user_id, like, likes = *likes, "like applied");
        }

        Ok(entry.outcome(user_id, changed))
    }

    /// Record `user_id` saving (or unsaving) a recipe. Saves are not counted.
    pub fn apply_save_delta(&self, id: &str, user_id: &str, save: bool) -> RecipeResult<Outcome> {
        let mut entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| RecipeError::not_found(id))?;

        let changed = if save {
            entry.ledger.savers.insert(user_id.to_string())
        } else {
            entry.ledger.savers.remove(user_id)
        };

        if changed {
            entry.version += 1;
            tracing::debug!(recipe_id = %id, user_id, save, "save applied");
        }

        Ok(entry.outcome(user_id, changed))
    }

    /// Fold one anonymous rating into the running mean.
    pub fn add_rating(&self, id: &str, value: f64) -> RecipeResult<Recipe> {
        check_rating(value)?;

        let mut entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| RecipeError::not_found(id))?;

        let recipe = &mut entry.recipe;
        let count = recipe.rating_count as f64;
        recipe.rating = clamp_rating((recipe.rating * count + value) / (count + 1.0));
        recipe.rating_count += 1;
        entry.version += 1;

        Ok(entry.project(self.owner.as_deref()))
    }

    /// Record `user_id`'s rating, replacing their earlier one if present so
    /// each user contributes at most once.
    pub fn record_rating(&self, id: &str, user_id: &str, value: f64) -> RecipeResult<RatingOutcome> {
        check_rating(value)?;

        let mut guard = self
            .entries
            .get_mut(id)
            .ok_or_else(|| RecipeError::not_found(id))?;
        let entry = &mut *guard;

        let recipe = &mut entry.recipe;
        let change = match entry.ledger.ratings.insert(user_id.to_string(), value) {
            // A previous rating implies rating_count >= 1
            Some(previous) if recipe.rating_count > 0 => {
                let count = recipe.rating_count as f64;
                recipe.rating = clamp_rating((recipe.rating * count - previous + value) / count);
                RatingChange::Replaced { previous }
            }
            _ => {
                let count = recipe.rating_count as f64;
                recipe.rating = clamp_rating((recipe.rating * count + value) / (count + 1.0));
                recipe.rating_count += 1;
                RatingChange::Added
            }
        };
        entry.version += 1;

        tracing::debug!(
            recipe_id = %id,
            user_id,
            value,
            rating = recipe.rating,
            rating_count = recipe.rating_count,
            "rating recorded"
        );

        Ok(RatingOutcome {
            recipe: entry.project(Some(user_id)),
            change,
            version: entry.version,
        })
    }

    /// The rating `user_id` currently has on record for a recipe.
    pub fn rating_by(&self, id: &str, user_id: &str) -> RecipeResult<Option<f64>> {
        self.entries
            .get(id)
            .map(|e| e.ledger.ratings.get(user_id).copied())
            .ok_or_else(|| RecipeError::not_found(id))
    }

    /// Append a comment. A comment whose id is already present is a no-op,
    /// so redelivering the same comment never duplicates it.
    pub fn append_comment(&self, id: &str, comment: Comment) -> RecipeResult<Outcome> {
        let mut entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| RecipeError::not_found(id))?;

        if comment.recipe_id != id {
            return Err(RecipeError::invalid_comment(format!(
                "comment is for recipe {}, not {}",
                comment.recipe_id, id
            )));
        }
        if comment.text.trim().is_empty() {
            return Err(RecipeError::invalid_comment("comment text is empty"));
        }
        let chars = comment.text.chars().count();
        if chars > self.max_comment_chars {
            return Err(RecipeError::invalid_comment(format!(
                "comment is {} characters, limit is {}",
                chars, self.max_comment_chars
            )));
        }

        let user_id = comment.user_id.clone();
        let changed = !entry.recipe.comments.iter().any(|c| c.id == comment.id);
        if changed {
            tracing::debug!(recipe_id = %id, comment_id = %comment.id, "comment appended");
            entry.recipe.comments.push(comment);
            entry.version += 1;
        } else {
            tracing::debug!(recipe_id = %id, comment_id = %comment.id, "duplicate comment ignored");
        }

        Ok(entry.outcome(&user_id, changed))
    }
}
