//! Hook for pushing changed aggregates to an external store.
//!
//! The engine calls the sink after every applied mutation. Sinks must not
//! block on I/O; a sink that talks to a network or disk should hand the
//! change off (e.g. onto a channel) and return.
//!
//! Publishing happens after the recipe's entry lock is released, so two
//! changes to the same recipe made on different threads can reach the sink
//! in either order. Each change carries the recipe version it produced;
//! versions of one recipe strictly increase, and a sink should ignore a
//! change whose version is not newer than the last one it applied.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Recipe;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Sync rejected: {0}")]
    Rejected(String),

    #[error("Sync unavailable: {0}")]
    Unavailable(String),
}

/// What happened to a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Liked,
    Unliked,
    Saved,
    Unsaved,
    Rated,
    Commented,
    Deleted,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Liked => "liked",
            ChangeKind::Unliked => "unliked",
            ChangeKind::Saved => "saved",
            ChangeKind::Unsaved => "unsaved",
            ChangeKind::Rated => "rated",
            ChangeKind::Commented => "commented",
            ChangeKind::Deleted => "deleted",
        }
    }
}

/// Receives every applied change.
pub trait ChangeSink: Send + Sync + fmt::Debug {
    /// `version` is the recipe's version after the change.
    fn publish(&self, kind: ChangeKind, recipe: &Recipe, version: u64) -> Result<(), SyncError>;
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ChangeSink for NoopSink {
    fn publish(
        &self,
        _kind: ChangeKind,
        _recipe: &Recipe,
        _version: u64,
    ) -> Result<(), SyncError> {
        Ok(())
    }
}

/// One change as a sink received it.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedChange {
    pub kind: ChangeKind,
    pub recipe: Recipe,
    pub version: u64,
}

/// Sink that remembers what it was given, for tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    changes: RwLock<Vec<PublishedChange>>,
    fail_with: Option<SyncError>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that records changes and then reports `error` for each one.
    pub fn failing(error: SyncError) -> Self {
        Self {
            changes: RwLock::new(Vec::new()),
            fail_with: Some(error),
        }
    }

    pub fn changes(&self) -> Vec<PublishedChange> {
        self.changes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn kinds(&self) -> Vec<ChangeKind> {
        self.changes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|c| c.kind)
            .collect()
    }
}

impl ChangeSink for RecordingSink {
    fn publish(&self, kind: ChangeKind, recipe: &Recipe, version: u64) -> Result<(), SyncError> {
        self.changes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(PublishedChange {
                kind,
                recipe: recipe.clone(),
                version,
            });
        match &self.fail_with {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
