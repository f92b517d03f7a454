use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RecipeError, RecipeResult};

/// Upper bound of the rating scale. Ratings live in `[0, MAX_RATING]`.
pub const MAX_RATING: f64 = 5.0;

/// Case-insensitive comparison using full Unicode lowercasing, so "Éthiopian"
/// and "éthiopian" are the same tag.
pub(crate) fn eq_fold(a: &str, b: &str) -> bool {
    a == b || a.chars().flat_map(char::to_lowercase).eq(b.chars().flat_map(char::to_lowercase))
}

/// How hard a recipe is to make.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    /// Kept as text so "1/2" or "2-3" survive untouched
    pub amount: String,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A comment left on a recipe. `recipe_id` is a lookup key back to the
/// owning recipe, not an ownership edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_avatar: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub recipe_id: String,
}

/// A browse category. Only `name` is used, as a key against a recipe's tags
/// or region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

impl Category {
    /// Build a category whose id is the lowercased name.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.to_lowercase(),
            name,
        }
    }
}

/// The identity the engine stamps onto comments it creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: String,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar: String::new(),
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = avatar.into();
        self
    }
}

/// A shareable dish record together with its interaction-derived state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Minutes
    #[serde(default)]
    pub prep_time: u32,
    /// Minutes
    #[serde(default)]
    pub cook_time: u32,
    pub servings: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub author_id: String,
    pub author_name: String,
    #[serde(default)]
    pub author_avatar: String,
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_saved: bool,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub rating_count: u64,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Recipe {
    /// Prep plus cook time, in minutes.
    pub fn total_time(&self) -> u32 {
        self.prep_time.saturating_add(self.cook_time)
    }

    /// Case-insensitive exact tag membership.
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| eq_fold(t, name))
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    /// Check the shape of a recipe handed to the store from outside.
    pub fn validate(&self) -> RecipeResult<()> {
        let fail = |reason: &str| -> RecipeResult<()> {
            Err(RecipeError::invalid_recipe(&self.id, reason))
        };

        if self.id.trim().is_empty() {
            return fail("id is empty");
        }
        if self.title.trim().is_empty() {
            return fail("title is empty");
        }
        if self.servings == 0 {
            return fail("servings must be at least 1");
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.ingredients.iter().find(|i| !seen.insert(i.id.as_str())) {
            return fail(&format!("duplicate ingredient id {}", dup.id));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.steps.iter().find(|s| !seen.insert(s.id.as_str())) {
            return fail(&format!("duplicate step id {}", dup.id));
        }

        if !self.rating.is_finite() || !(0.0..=MAX_RATING).contains(&self.rating) {
            return fail(&format!("rating {} outside [0, 5]", self.rating));
        }
        if self.rating_count == 0 && self.rating != 0.0 {
            return fail("rating is non-zero but rating count is zero");
        }

        if let Some(stray) = self.comments.iter().find(|c| c.recipe_id != self.id) {
            return fail(&format!(
                "comment {} belongs to recipe {}",
                stray.id, stray.recipe_id
            ));
        }

        Ok(())
    }
}
