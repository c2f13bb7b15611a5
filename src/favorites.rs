//! Locally persisted favorite cities.
//!
//! The whole list lives as one JSON array in a single storage slot and every
//! mutation is a read-modify-write of that array.
//!
//! # Durability
//!
//! Reads never fail: a missing, unreadable or non-array slot is an empty
//! list. Writes that fail are logged and swallowed, so a returned favorite
//! (or a completed removal) does not prove the change reached disk.
//!
//! Ids are `1 + max(existing ids)`, computed from the current list rather
//! than a persisted counter. Removing the highest id and adding again
//! hands out that id a second time.

use tracing::{debug, warn};

use crate::model::Favorite;
use crate::storage::Storage;

/// Storage slot holding the serialized favorites list.
pub const FAVORITES_KEY: &str = "airpulse:favorites";

/// CRUD over the stored favorites list.
#[derive(Clone)]
pub struct FavoritesStore {
    storage: Storage,
    key: String,
}

impl FavoritesStore {
    /// A store over the default favorites slot.
    pub fn new(storage: Storage) -> Self {
        Self::with_key(storage, FAVORITES_KEY)
    }

    /// A store over a custom slot.
    pub fn with_key(storage: Storage, key: &str) -> Self {
        Self {
            storage,
            key: key.to_string(),
        }
    }

    /// All favorites in stored order.
    pub async fn list(&self) -> Vec<Favorite> {
        self.read().await
    }

    /// Append a favorite and persist the list.
    ///
    /// Returns the new record with its assigned id.
    pub async fn add(&self, label: &str, latitude: f64, longitude: f64) -> Favorite {
        let mut list = self.read().await;

        let favorite = Favorite {
            id: Some(next_id(&list)),
            label: label.to_string(),
            latitude,
            longitude,
        };
        list.push(favorite.clone());
        self.write(&list).await;

        debug!(id = ?favorite.id, label, "Favorite added");
        favorite
    }

    /// Remove every favorite with `id` and persist the rest.
    ///
    /// Removing an id that is not stored leaves the list as it was.
    pub async fn remove(&self, id: i64) {
        let mut list = self.read().await;
        list.retain(|f| f.id != Some(id));
        self.write(&list).await;

        debug!(id, "Favorite removed");
    }

    async fn read(&self) -> Vec<Favorite> {
        let raw = match self.storage.get_slot(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read favorites; treating as empty");
                return Vec::new();
            }
        };

        decode_list(&raw)
    }

    async fn write(&self, list: &[Favorite]) {
        let encoded = match serde_json::to_string(list) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(error = %e, "Failed to encode favorites");
                return;
            }
        };

        if let Err(e) = self.storage.put_slot(&self.key, &encoded).await {
            warn!(key = %self.key, error = %e, "Failed to persist favorites");
        }
    }
}

/// One more than the largest stored id, or 1 for a list without ids.
fn next_id(list: &[Favorite]) -> i64 {
    list.iter().filter_map(|f| f.id).fold(0, i64::max) + 1
}

/// Decode a stored slot value.
///
/// Anything other than a JSON array is an empty list; array entries that
/// are not favorites are skipped.
fn decode_list(raw: &str) -> Vec<Favorite> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        Ok(_) => Vec::new(),
        Err(e) => {
            warn!(error = %e, "Stored favorites are not valid JSON; treating as empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_store() -> (Storage, FavoritesStore) {
        let storage = Storage::new("sqlite::memory:").await.unwrap();
        let store = FavoritesStore::new(storage.clone());
        (storage, store)
    }

    #[tokio::test]
    async fn test_first_favorite_gets_id_one() {
        let (_, store) = setup_store().await;

        let favorite = store.add("Skopje", 41.9981, 21.4254).await;

        assert_eq!(favorite.id, Some(1));
        assert_eq!(favorite.label, "Skopje");
        assert_eq!(store.list().await, vec![favorite]);
    }

    #[tokio::test]
    async fn test_ids_follow_current_maximum() {
        let (_, store) = setup_store().await;

        store.add("Skopje", 41.9981, 21.4254).await;
        store.add("London", 51.5072, -0.1276).await;
        let third = store.add("Tokyo", 35.6762, 139.6503).await;
        assert_eq!(third.id, Some(3));

        store.remove(2).await;
        let fourth = store.add("Paris", 48.8566, 2.3522).await;
        assert_eq!(fourth.id, Some(4));

        let labels: Vec<String> = store.list().await.into_iter().map(|f| f.label).collect();
        assert_eq!(labels, vec!["Skopje", "Tokyo", "Paris"]);
    }

    #[tokio::test]
    async fn test_id_reused_after_emptying() {
        let (_, store) = setup_store().await;

        let first = store.add("Skopje", 41.9981, 21.4254).await;
        store.remove(1).await;
        let again = store.add("London", 51.5072, -0.1276).await;

        assert_eq!(first.id, Some(1));
        assert_eq!(again.id, Some(1));
    }

    #[tokio::test]
    async fn test_remove_unknown_id_is_noop() {
        let (_, store) = setup_store().await;

        store.add("Skopje", 41.9981, 21.4254).await;
        let before = store.list().await;

        store.remove(42).await;

        assert_eq!(store.list().await, before);
    }

    #[tokio::test]
    async fn test_unparseable_slot_is_empty() {
        let (storage, store) = setup_store().await;

        storage.put_slot(FAVORITES_KEY, "{not json").await.unwrap();
        assert!(store.list().await.is_empty());

        storage.put_slot(FAVORITES_KEY, r#"{"id": 1}"#).await.unwrap();
        assert!(store.list().await.is_empty());

        let favorite = store.add("Skopje", 41.9981, 21.4254).await;
        assert_eq!(favorite.id, Some(1));
    }

    #[tokio::test]
    async fn test_malformed_entries_are_skipped() {
        let (storage, store) = setup_store().await;

        storage
            .put_slot(
                FAVORITES_KEY,
                r#"[{"id": 7, "label": "Rome", "latitude": 41.9, "longitude": 12.5}, "junk"]"#,
            )
            .await
            .unwrap();

        let list = store.list().await;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, Some(7));

        assert_eq!(store.add("Vienna", 48.2, 16.37).await.id, Some(8));
    }

    #[tokio::test]
    async fn test_slots_are_independent() {
        let (storage, store) = setup_store().await;
        let other = FavoritesStore::with_key(storage, "other:favorites");

        store.add("Skopje", 41.9981, 21.4254).await;

        assert!(other.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_still_returns_record() {
        let path = std::env::temp_dir().join(format!(
            "airpulse-failed-write-{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let url = format!("sqlite:{}?mode=rwc", path.display());

        let store = FavoritesStore::new(Storage::new(&url).await.unwrap());
        let first = store.add("Skopje", 41.9981, 21.4254).await;

        // A second connection makes every further write to the slot table fail.
        let admin = sqlx::sqlite::SqlitePool::connect(&url).await.unwrap();
        for event in ["INSERT", "UPDATE"] {
            sqlx::query(&format!(
                "CREATE TRIGGER reject_{0} BEFORE {0} ON local_storage \
                 BEGIN SELECT RAISE(ABORT, 'storage is full'); END",
                event.to_lowercase()
            ))
            .execute(&admin)
            .await
            .unwrap();
        }

        let second = store.add("London", 51.5072, -0.1276).await;
        assert_eq!(second.id, Some(2));
        assert_eq!(second.label, "London");
        assert_eq!(store.list().await, vec![first.clone()]);

        store.remove(1).await;
        assert_eq!(store.list().await, vec![first]);

        admin.close().await;
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_next_id_ignores_missing_ids() {
        let list = vec![Favorite {
            id: None,
            label: "Draft".to_string(),
            latitude: 0.0,
            longitude: 0.0,
        }];
        assert_eq!(next_id(&list), 1);
        assert_eq!(next_id(&[]), 1);
    }
}
