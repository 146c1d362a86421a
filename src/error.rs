//! Error types for page resolution and rendering.

use thiserror::Error;

use crate::services::ItemId;

/// Errors raised while resolving or rendering wiki pages.
///
/// | Variant | Policy |
/// |---------|--------|
/// | `NotFound`, `NoSuchAccount` | degrade to a placeholder |
/// | `InvalidPath` | caught at the wiklet boundary, rendered inline |
/// | `Upstream` | propagates to the caller, never retried |
/// | `AlreadyExists`, `ModifyConflict`, `NotWikiItem` | write path only |
#[derive(Debug, Error)]
pub enum WikiError {
    #[error("no such page: {0}")]
    NotFound(String),

    #[error("no such account: {0}")]
    NoSuchAccount(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("not a wiki item: {0}")]
    NotWikiItem(String),

    #[error("page `{name}` already exists (id {id}, version {version})")]
    AlreadyExists {
        name: String,
        id: ItemId,
        version: u32,
    },

    #[error("modify conflict on `{name}`: current version is {version}")]
    ModifyConflict {
        name: String,
        id: ItemId,
        version: u32,
    },

    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

impl WikiError {
    /// Whether a lookup that failed this way may fall back to another scope.
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::NoSuchAccount(_) | Self::InvalidPath(_) | Self::NotWikiItem(_)
        )
    }
}

pub type Result<T, E = WikiError> = std::result::Result<T, E>;
