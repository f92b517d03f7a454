//! Category filtering, sorting and search over recipe lists.
//!
//! Everything here is a pure function of its input: no recipe is mutated and
//! the relative order of the input is preserved unless a sort is requested.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{eq_fold, Category, Difficulty, Recipe};

/// Which recipe attribute a category is matched against.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Match the category name against the recipe's tags
    #[default]
    Tag,
    /// Match the category name against the recipe's region
    Region,
}

impl FilterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::Tag => "tag",
            FilterMode::Region => "region",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tag" | "tags" => Some(FilterMode::Tag),
            "region" => Some(FilterMode::Region),
            _ => None,
        }
    }
}

fn matches_category(recipe: &Recipe, name: &str, mode: FilterMode) -> bool {
    match mode {
        FilterMode::Tag => recipe.has_tag(name),
        FilterMode::Region => recipe
            .region
            .as_deref()
            .is_some_and(|r| eq_fold(r, name)),
    }
}

/// Return the recipes visible under `selected`, in their original order.
///
/// With no selection the input is returned unchanged. An unknown category
/// simply matches nothing.
pub fn filter_recipes(
    recipes: &[Recipe],
    selected: Option<&Category>,
    mode: FilterMode,
) -> Vec<Recipe> {
    match selected {
        None => recipes.to_vec(),
        Some(category) => recipes
            .iter()
            .filter(|r| matches_category(r, &category.name, mode))
            .cloned()
            .collect(),
    }
}

/// A category filter bound to one matching mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CategoryFilter {
    pub mode: FilterMode,
}

impl CategoryFilter {
    pub fn new(mode: FilterMode) -> Self {
        Self { mode }
    }

    pub fn apply(&self, recipes: &[Recipe], selected: Option<&Category>) -> Vec<Recipe> {
        filter_recipes(recipes, selected, self.mode)
    }
}

/// Distinct categories present in `recipes`, sorted by name.
///
/// Names that differ only in case collapse into one entry, keeping the
/// spelling seen first.
pub fn available_categories(recipes: &[Recipe], mode: FilterMode) -> Vec<Category> {
    let mut seen: BTreeMap<String, String> = BTreeMap::new();

    let mut note = |name: &str| {
        let name = name.trim();
        if !name.is_empty() {
            seen.entry(name.to_lowercase())
                .or_insert_with(|| name.to_string());
        }
    };

    for recipe in recipes {
        match mode {
            FilterMode::Tag => recipe.tags.iter().for_each(|t| note(t)),
            FilterMode::Region => {
                if let Some(region) = &recipe.region {
                    note(region);
                }
            }
        }
    }

    seen.into_iter()
        .map(|(id, name)| Category { id, name })
        .collect()
}

/// Sort order for recipe lists
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Most recently created first
    #[default]
    Newest,
    /// Highest rating first; unrated recipes last
    TopRated,
    /// Most likes first
    MostLiked,
    /// Shortest total time first
    QuickestFirst,
}

impl SortBy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "newest" => Some(SortBy::Newest),
            "top_rated" => Some(SortBy::TopRated),
            "most_liked" => Some(SortBy::MostLiked),
            "quickest_first" | "quickest" => Some(SortBy::QuickestFirst),
            _ => None,
        }
    }
}

/// Sort recipes in place. Ties are broken by id so the result is deterministic.
pub fn sort_recipes(recipes: &mut [Recipe], sort_by: SortBy) {
    recipes.sort_by(|a, b| {
        let primary = match sort_by {
            SortBy::Newest => b.created_at.cmp(&a.created_at),
            SortBy::TopRated => (b.rating_count > 0)
                .cmp(&(a.rating_count > 0))
                .then_with(|| b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal))
                .then_with(|| b.rating_count.cmp(&a.rating_count)),
            SortBy::MostLiked => b.likes.cmp(&a.likes),
            SortBy::QuickestFirst => a.total_time().cmp(&b.total_time()),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    });
}

/// Parsed recipe search query.
///
/// Supports:
/// - Plain text: matches title or description
/// - tag:value: recipe must carry the tag (can use multiple)
/// - region:value: recipe region must match
/// - difficulty:easy|medium|hard
/// - max-time:45: total time at most 45 minutes
///
/// Example: `"curry tag:dinner region:thai max-time:45"`
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecipeQuery {
    pub text: Vec<String>,
    pub tags: Vec<String>,
    pub region: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub max_total_time: Option<u32>,
}

impl RecipeQuery {
    pub fn parse(q: &str) -> Self {
        let mut query = RecipeQuery::default();

        for token in tokenize(q) {
            if let Some(tag) = token.strip_prefix("tag:") {
                if !tag.is_empty() {
                    query.tags.push(tag.to_string());
                }
            } else if let Some(region) = token.strip_prefix("region:") {
                if !region.is_empty() {
                    query.region = Some(region.to_string());
                }
            } else if let Some(level) = token.strip_prefix("difficulty:") {
                // Unknown levels are dropped rather than matching nothing
                if let Some(difficulty) = Difficulty::parse(level) {
                    query.difficulty = Some(difficulty);
                }
            } else if let Some(minutes) = token.strip_prefix("max-time:") {
                if let Ok(minutes) = minutes.parse() {
                    query.max_total_time = Some(minutes);
                }
            } else if !token.is_empty() {
                query.text.push(token.to_lowercase());
            }
        }

        query
    }

    pub fn is_empty(&self) -> bool {
        *self == RecipeQuery::default()
    }

    pub fn matches(&self, recipe: &Recipe) -> bool {
        if !self.tags.iter().all(|t| recipe.has_tag(t)) {
            return false;
        }
        if let Some(region) = &self.region {
            if !matches_category(recipe, region, FilterMode::Region) {
                return false;
            }
        }
        if let Some(difficulty) = self.difficulty {
            if recipe.difficulty != difficulty {
                return false;
            }
        }
        if let Some(max) = self.max_total_time {
            if recipe.total_time() > max {
                return false;
            }
        }
        if !self.text.is_empty() {
            let phrase = self.text.join(" ");
            let in_title = recipe.title.to_lowercase().contains(&phrase);
            let in_description = recipe.description.to_lowercase().contains(&phrase);
            if !in_title && !in_description {
                return false;
            }
        }
        true
    }

    /// Matching recipes, in input order.
    pub fn apply(&self, recipes: &[Recipe]) -> Vec<Recipe> {
        recipes.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// Split on whitespace, keeping quoted phrases together.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in input.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => {
                current.push(c);
            }
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}
