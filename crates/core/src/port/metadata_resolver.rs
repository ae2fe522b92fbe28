// Metadata Resolver Port - turns a submitted link into playable metadata

use crate::domain::Playtime;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Metadata for one source reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMedia {
    pub title: Option<String>,
    pub duration: Playtime,
}

/// Resolution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Unsupported source: {0}")]
    Unsupported(String),

    #[error("Source not found: {0}")]
    NotFound(String),

    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Lookup timed out after {0}ms")]
    Timeout(u64),
}

/// Metadata Resolver trait
///
/// Runs before an Entry exists. A failure means no entry is built; there
/// are no placeholder durations.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Resolve a raw source reference
    ///
    /// # Errors
    /// - ResolutionError::Unsupported if no backend handles this reference
    /// - ResolutionError::NotFound if the backend has no such item
    async fn resolve(&self, source_ref: &str) -> Result<ResolvedMedia, ResolutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Resolver backed by a fixed table, with a fallback duration
    #[derive(Clone)]
    pub struct StaticResolver {
        table: Arc<Mutex<HashMap<String, Result<ResolvedMedia, ResolutionError>>>>,
        fallback: Option<Playtime>,
    }

    impl StaticResolver {
        /// Every unknown reference resolves to `duration`
        pub fn with_default(duration: Playtime) -> Self {
            Self {
                table: Arc::new(Mutex::new(HashMap::new())),
                fallback: Some(duration),
            }
        }

        /// Unknown references fail with `NotFound`
        pub fn strict() -> Self {
            Self {
                table: Arc::new(Mutex::new(HashMap::new())),
                fallback: None,
            }
        }

        pub fn insert(&self, source_ref: &str, duration: Playtime) {
            self.table.lock().insert(
                source_ref.to_string(),
                Ok(ResolvedMedia {
                    title: Some(source_ref.to_string()),
                    duration,
                }),
            );
        }

        pub fn insert_failure(&self, source_ref: &str, error: ResolutionError) {
            self.table.lock().insert(source_ref.to_string(), Err(error));
        }
    }

    #[async_trait]
    impl MetadataResolver for StaticResolver {
        async fn resolve(&self, source_ref: &str) -> Result<ResolvedMedia, ResolutionError> {
            if let Some(known) = self.table.lock().get(source_ref) {
                return known.clone();
            }
            match self.fallback {
                Some(duration) => Ok(ResolvedMedia {
                    title: None,
                    duration,
                }),
                None => Err(ResolutionError::NotFound(source_ref.to_string())),
            }
        }
    }
}
