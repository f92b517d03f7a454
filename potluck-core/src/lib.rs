pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod store;
pub mod sync;
pub mod types;

pub use config::{ConfigError, EngineConfig};
pub use engine::{InteractionEngine, SyncFailure};
pub use error::{RecipeError, RecipeResult};
pub use filter::{
    available_categories, filter_recipes, sort_recipes, CategoryFilter, FilterMode, RecipeQuery,
    SortBy,
};
pub use store::{
    InteractionLedger, Outcome, RatingChange, RatingOutcome, RecipeStore,
    DEFAULT_MAX_COMMENT_CHARS,
};
pub use sync::{ChangeKind, ChangeSink, NoopSink, PublishedChange, RecordingSink, SyncError};
pub use types::{Category, Comment, Difficulty, Ingredient, Recipe, Step, UserProfile, MAX_RATING};
