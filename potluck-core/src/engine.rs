//! Interaction engine: turns user actions into store mutations.
//!
//! The engine is the only layer that knows who the acting user is. Every
//! operation either applies completely or leaves the store untouched, and
//! repeating an action that is already in effect is reported as unchanged
//! rather than as an error.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{RecipeError, RecipeResult};
use crate::filter::{filter_recipes, sort_recipes, RecipeQuery, SortBy};
use crate::store::{Outcome, RatingOutcome, RecipeStore};
use crate::sync::{ChangeKind, ChangeSink, NoopSink, SyncError};
use crate::types::{Category, Comment, Recipe, UserProfile};

/// A change that was applied in memory but could not be pushed to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncFailure {
    pub recipe_id: String,
    pub kind: ChangeKind,
    pub error: SyncError,
}

#[derive(Debug)]
pub struct InteractionEngine {
    store: Arc<RecipeStore>,
    config: EngineConfig,
    sink: Arc<dyn ChangeSink>,
    sync_failures: Mutex<Vec<SyncFailure>>,
}

impl InteractionEngine {
    pub fn new(store: Arc<RecipeStore>, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            sink: Arc::new(NoopSink),
            sync_failures: Mutex::new(Vec::new()),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ChangeSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn store(&self) -> &Arc<RecipeStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn like(&self, recipe_id: &str, user_id: &str) -> RecipeResult<Outcome> {
        let outcome = self.store.apply_like_delta(recipe_id, user_id, true)?;
        self.after(ChangeKind::Liked, &outcome);
        Ok(outcome)
    }

    pub fn unlike(&self, recipe_id: &str, user_id: &str) -> RecipeResult<Outcome> {
        let outcome = self.store.apply_like_delta(recipe_id, user_id, false)?;
        self.after(ChangeKind::Unliked, &outcome);
        Ok(outcome)
    }

    pub fn save(&self, recipe_id: &str, user_id: &str) -> RecipeResult<Outcome> {
        let outcome = self.store.apply_save_delta(recipe_id, user_id, true)?;
        self.after(ChangeKind::Saved, &outcome);
        Ok(outcome)
    }

    pub fn unsave(&self, recipe_id: &str, user_id: &str) -> RecipeResult<Outcome> {
        let outcome = self.store.apply_save_delta(recipe_id, user_id, false)?;
        self.after(ChangeKind::Unsaved, &outcome);
        Ok(outcome)
    }

    /// Rate a recipe. A user's second rating replaces their first.
    pub fn rate(&self, recipe_id: &str, user_id: &str, value: f64) -> RecipeResult<RatingOutcome> {
        let outcome = self.store.record_rating(recipe_id, user_id, value)?;
        self.publish(ChangeKind::Rated, &outcome.recipe, outcome.version);
        Ok(outcome)
    }

    /// Post a new comment as `author`. The comment gets a fresh id and the
    /// current time.
    pub fn comment(
        &self,
        recipe_id: &str,
        author: &UserProfile,
        text: &str,
    ) -> RecipeResult<Comment> {
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            user_id: author.id.clone(),
            user_name: author.name.clone(),
            user_avatar: author.avatar.clone(),
            text: text.trim().to_string(),
            created_at: Utc::now(),
            recipe_id: recipe_id.to_string(),
        };

        self.redeliver_comment(comment.clone())?;
        Ok(comment)
    }

    /// Submit an already-built comment again. Has no effect if a comment
    /// with the same id is already on the recipe. Comments longer than the
    /// configured `max_comment_chars` are rejected whatever limit the store
    /// was built with.
    pub fn redeliver_comment(&self, comment: Comment) -> RecipeResult<Outcome> {
        let recipe_id = comment.recipe_id.clone();
        if !self.store.contains(&recipe_id) {
            return Err(RecipeError::not_found(recipe_id));
        }
        let chars = comment.text.chars().count();
        if chars > self.config.max_comment_chars {
            return Err(RecipeError::invalid_comment(format!(
                "comment is {} characters, limit is {}",
                chars, self.config.max_comment_chars
            )));
        }

        let outcome = self.store.append_comment(&recipe_id, comment)?;
        self.after(ChangeKind::Commented, &outcome);
        Ok(outcome)
    }

    /// Remove a recipe and its comments.
    pub fn delete(&self, recipe_id: &str) -> RecipeResult<Recipe> {
        let removed = self.store.remove(recipe_id)?;
        self.after(ChangeKind::Deleted, &removed);
        Ok(removed.recipe)
    }

    /// Recipes visible under `selected`, using the configured filter mode.
    pub fn filter(&self, selected: Option<&Category>) -> Vec<Recipe> {
        filter_recipes(&self.store.snapshot(), selected, self.config.filter_mode)
    }

    /// Run a search query over the store and sort the matches.
    pub fn search(&self, query: &RecipeQuery, sort_by: SortBy) -> Vec<Recipe> {
        let mut matches = query.apply(&self.store.snapshot());
        sort_recipes(&mut matches, sort_by);
        matches
    }

    /// Drain the sync failures recorded since the last call.
    pub fn take_sync_failures(&self) -> Vec<SyncFailure> {
        match self.sync_failures.lock() {
            Ok(mut failures) => std::mem::take(&mut *failures),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    fn after(&self, kind: ChangeKind, outcome: &Outcome) {
        if outcome.changed {
            self.publish(kind, &outcome.recipe, outcome.version);
        } else {
            tracing::debug!(
                recipe_id = %outcome.recipe.id,
                kind = kind.as_str(),
                "interaction already in effect, nothing to do"
            );
        }
    }

    fn publish(&self, kind: ChangeKind, recipe: &Recipe, version: u64) {
        if let Err(error) = self.sink.publish(kind, recipe, version) {
            // The in-memory change stands; the caller finds out through
            // take_sync_failures
            tracing::warn!(recipe_id = %recipe.id, kind = kind.as_str(), %error, "failed to sync change");
            let failure = SyncFailure {
                recipe_id: recipe.id.clone(),
                kind,
                error,
            };
            match self.sync_failures.lock() {
                Ok(mut failures) => failures.push(failure),
                Err(poisoned) => poisoned.into_inner().push(failure),
            }
        }
    }
}
