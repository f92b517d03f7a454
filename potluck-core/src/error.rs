use thiserror::Error;

/// Result type alias for recipe store and engine operations.
pub type RecipeResult<T> = Result<T, RecipeError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecipeError {
    #[error("Recipe not found: {0}")]
    NotFound(String),

    #[error("Invalid rating: {0} (must be between 0 and 5)")]
    InvalidRating(f64),

    #[error("Invalid comment: {0}")]
    InvalidComment(String),

    #[error("Invalid recipe {id}: {reason}")]
    InvalidRecipe { id: String, reason: String },
}

impl RecipeError {
    pub fn not_found(id: impl Into<String>) -> Self {
        RecipeError::NotFound(id.into())
    }

    pub fn invalid_comment(message: impl Into<String>) -> Self {
        RecipeError::InvalidComment(message.into())
    }

    pub fn invalid_recipe(id: impl Into<String>, reason: impl Into<String>) -> Self {
        RecipeError::InvalidRecipe {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
