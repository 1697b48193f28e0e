//! Catalog items and the store that persists them

use std::future::Future;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Error as CrateError;
use crate::tagging::ItemKind;

/// A media item as handed over by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub name: String,

    pub kind: ItemKind,

    /// The item's own external identifier, unnormalized
    #[serde(default)]
    pub advisory_id: Option<String>,

    /// Identifier of the parent series, used by episodes without their own
    #[serde(default)]
    pub series_advisory_id: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
}

impl CatalogItem {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
            advisory_id: None,
            series_advisory_id: None,
            tags: Vec::new(),
            tagline: None,
            overview: None,
        }
    }

    pub fn with_advisory_id(mut self, id: impl Into<String>) -> Self {
        self.advisory_id = Some(id.into());
        self
    }

    /// The identifier to look up, falling back to the series for episodes
    pub fn lookup_id(&self) -> Option<&str> {
        let own = self.advisory_id.as_deref().filter(|id| !id.trim().is_empty());
        match self.kind {
            ItemKind::Episode => own.or_else(|| {
                self.series_advisory_id
                    .as_deref()
                    .filter(|id| !id.trim().is_empty())
            }),
            _ => own,
        }
    }
}

/// Errors raised by a catalog store
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Store rejected {item}: {reason}")]
    Rejected { item: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PersistError> for CrateError {
    fn from(err: PersistError) -> Self {
        CrateError::Persist(err.to_string())
    }
}

/// Where tagged items are written
///
/// Persisting the same item twice must leave the store as persisting it once.
pub trait CatalogStore: Send + Sync {
    fn persist(&self, item: &CatalogItem) -> impl Future<Output = Result<(), PersistError>> + Send;
}

/// Store keeping the latest version of each item in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<Vec<CatalogItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the persisted items, in first-persisted order
    pub fn items(&self) -> Vec<CatalogItem> {
        self.items.lock().map(|items| items.clone()).unwrap_or_default()
    }
}

impl CatalogStore for MemoryStore {
    async fn persist(&self, item: &CatalogItem) -> Result<(), PersistError> {
        let mut items = self.items.lock().map_err(|e| PersistError::Rejected {
            item: item.name.clone(),
            reason: e.to_string(),
        })?;
        match items
            .iter_mut()
            .find(|stored| stored.name == item.name && stored.kind == item.kind)
        {
            Some(stored) => *stored = item.clone(),
            None => items.push(item.clone()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_falls_back_to_series_id() {
        let mut episode = CatalogItem::new("Pilot", ItemKind::Episode);
        episode.series_advisory_id = Some("tt7654321".to_string());
        assert_eq!(episode.lookup_id(), Some("tt7654321"));

        episode.advisory_id = Some("tt1111111".to_string());
        assert_eq!(episode.lookup_id(), Some("tt1111111"));

        let mut movie = CatalogItem::new("Film", ItemKind::Movie);
        movie.series_advisory_id = Some("tt7654321".to_string());
        movie.advisory_id = Some("  ".to_string());
        assert_eq!(movie.lookup_id(), None);
    }

    #[test]
    fn test_item_json() {
        let item: CatalogItem = serde_json::from_str(
            r#"{ "name": "Film", "kind": "Movie", "advisoryId": "1234567", "tags": ["Drama"] }"#,
        )
        .unwrap();
        assert_eq!(item.advisory_id.as_deref(), Some("1234567"));
        assert_eq!(item.tags, vec!["Drama".to_string()]);
        assert_eq!(item.overview, None);
    }

    #[tokio::test]
    async fn test_memory_store_is_idempotent() {
        let store = MemoryStore::new();
        let mut item = CatalogItem::new("Film", ItemKind::Movie);
        store.persist(&item).await.unwrap();
        item.tags.push("No Nudity".to_string());
        store.persist(&item).await.unwrap();
        store.persist(&item).await.unwrap();

        assert_eq!(store.items(), vec![item]);
    }
}
