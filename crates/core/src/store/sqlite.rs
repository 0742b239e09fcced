//! SQLite-backed document store.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::{broadcast, mpsc};

use super::{
    CatalogSource, Change, ReviewCollection, StoreError, Subscription, UserDirectory,
    SUBSCRIPTION_BUFFER,
};
use crate::catalog::CatalogItem;
use crate::metrics::record_store_operation;
use crate::profile::{ProfileUpdate, UserProfile};
use crate::reviews::{NewReview, ReviewPatch, ReviewRecord};

/// Capacity of the change feed shared by all live listeners.
const CHANGE_FEED_CAPACITY: usize = 256;

/// Document store on a single SQLite connection.
///
/// Cloning is cheap and every clone shares the connection and change feed.
/// Each committed write publishes a [`Change`]; `watch_*` listeners re-query
/// and push a fresh snapshot when a change concerns them.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    changes: broadcast::Sender<Change>,
}

impl SqliteStore {
    /// Open or create the database file and its tables.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// In-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        Self::initialize_schema(&conn)?;
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            changes,
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS catalog_items (
                id TEXT PRIMARY KEY,
                position INTEGER NOT NULL,
                document TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS users (
                user_id TEXT PRIMARY KEY,
                name TEXT NOT NULL DEFAULT '',
                birth_date TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                gender TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL DEFAULT '',
                registration_date TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS user_favorites (
                user_id TEXT NOT NULL,
                item_id TEXT NOT NULL,
                PRIMARY KEY (user_id, item_id)
            );

            CREATE TABLE IF NOT EXISTS reviews (
                id TEXT PRIMARY KEY,
                item_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                user_name TEXT NOT NULL,
                rating INTEGER NOT NULL,
                comment TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_catalog_position ON catalog_items(position);
            CREATE INDEX IF NOT EXISTS idx_reviews_item ON reviews(item_id, timestamp);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Replace the catalog collection, keeping the given order.
    pub fn replace_catalog(&self, items: &[CatalogItem]) -> Result<usize, StoreError> {
        let count = self.run("replace_catalog", |conn| {
            let tx = conn.transaction().map_err(db_err)?;
            tx.execute("DELETE FROM catalog_items", []).map_err(db_err)?;
            {
                let mut stmt = tx
                    .prepare(
                        "INSERT OR REPLACE INTO catalog_items (id, position, document) VALUES (?, ?, ?)",
                    )
                    .map_err(db_err)?;
                for (position, item) in items.iter().enumerate() {
                    let document = serde_json::to_string(item)
                        .map_err(|e| StoreError::Internal(e.to_string()))?;
                    stmt.execute(params![item.id, position as i64, document])
                        .map_err(db_err)?;
                }
            }
            tx.commit().map_err(db_err)?;
            Ok(items.len())
        })?;
        tracing::info!(count, "Replaced catalog collection");
        self.publish(Change::Catalog);
        Ok(count)
    }

    /// Subscribe to the raw change feed.
    pub fn changes(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Internal("connection lock poisoned".to_string()))
    }

    /// Run one operation on the connection and record its outcome.
    fn run<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let started = Instant::now();
        let result = self.lock().and_then(|mut conn| f(&mut conn));
        record_store_operation(operation, started, &result);
        if let Err(ref e) = result {
            tracing::debug!(operation, error = %e, "Store operation failed");
        }
        result
    }

    fn publish(&self, change: Change) {
        // No receivers just means nobody is listening.
        let _ = self.changes.send(change);
    }

    fn read_user(conn: &Connection, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let profile = conn
            .query_row(
                "SELECT user_id, name, birth_date, description, gender, email, registration_date FROM users WHERE user_id = ?",
                params![user_id],
                |row| {
                    Ok(UserProfile {
                        user_id: row.get(0)?,
                        name: row.get(1)?,
                        birth_date: row.get(2)?,
                        description: row.get(3)?,
                        gender: row.get(4)?,
                        email: row.get(5)?,
                        registration_date: row.get(6)?,
                        favorites: Default::default(),
                    })
                },
            )
            .optional()
            .map_err(db_err)?;

        let Some(mut profile) = profile else {
            return Ok(None);
        };

        let mut stmt = conn
            .prepare("SELECT item_id FROM user_favorites WHERE user_id = ?")
            .map_err(db_err)?;
        profile.favorites = stmt
            .query_map(params![user_id], |row| row.get::<_, String>(0))
            .map_err(db_err)?
            .collect::<Result<_, _>>()
            .map_err(db_err)?;

        Ok(Some(profile))
    }

    fn require_user(conn: &Connection, user_id: &str) -> Result<(), StoreError> {
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE user_id = ?)",
                params![user_id],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        if exists {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("users/{}", user_id)))
        }
    }

    fn read_reviews(conn: &Connection, item_id: &str) -> Result<Vec<ReviewRecord>, StoreError> {
        let mut stmt = conn
            .prepare(
                "SELECT id, item_id, user_id, user_name, rating, comment, timestamp FROM reviews WHERE item_id = ? ORDER BY timestamp ASC, id ASC",
            )
            .map_err(db_err)?;
        let reviews = stmt
            .query_map(params![item_id], Self::row_to_review)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(reviews)
    }

    fn row_to_review(row: &rusqlite::Row) -> rusqlite::Result<ReviewRecord> {
        Ok(ReviewRecord {
            id: row.get(0)?,
            item_id: row.get(1)?,
            user_id: row.get(2)?,
            user_name: row.get(3)?,
            rating: row.get(4)?,
            comment: row.get(5)?,
            timestamp: row.get(6)?,
        })
    }

    /// Spawn a store-side listener.
    ///
    /// The feed is subscribed before the initial snapshot is taken so no
    /// change between the two is missed. A lagged feed triggers a resend.
    fn spawn_listener<T, R, S>(
        &self,
        stream: &'static str,
        relevant: R,
        snapshot: S,
    ) -> Subscription<T>
    where
        T: Send + 'static,
        R: Fn(&Change) -> bool + Send + 'static,
        S: Fn(&SqliteStore) -> Result<T, StoreError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let mut feed = self.changes.subscribe();
        let store = self.clone();

        let producer = tokio::spawn(async move {
            if tx.send(snapshot(&store)).await.is_err() {
                return;
            }
            loop {
                match feed.recv().await {
                    Ok(change) if relevant(&change) => {}
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(stream, skipped, "Change feed lagged, resending snapshot");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
                if tx.send(snapshot(&store)).await.is_err() {
                    break;
                }
            }
            tracing::trace!(stream, "Store listener stopped");
        });

        Subscription::new(rx, producer)
    }
}

fn db_err(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

#[async_trait]
impl CatalogSource for SqliteStore {
    async fn fetch_all(&self) -> Result<Vec<CatalogItem>, StoreError> {
        self.run("fetch_catalog", |conn| {
            let mut stmt = conn
                .prepare("SELECT document FROM catalog_items ORDER BY position ASC")
                .map_err(db_err)?;
            let documents = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(db_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(db_err)?;
            documents
                .iter()
                .map(|doc| {
                    serde_json::from_str(doc).map_err(|e| StoreError::Internal(e.to_string()))
                })
                .collect()
        })
    }
}

#[async_trait]
impl UserDirectory for SqliteStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        self.run("get_user", |conn| Self::read_user(conn, user_id))
    }

    async fn put_user(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.run("put_user", |conn| {
            let tx = conn.transaction().map_err(db_err)?;
            tx.execute(
                "INSERT OR REPLACE INTO users (user_id, name, birth_date, description, gender, email, registration_date) VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    profile.user_id,
                    profile.name,
                    profile.birth_date,
                    profile.description,
                    profile.gender,
                    profile.email,
                    profile.registration_date,
                ],
            )
            .map_err(db_err)?;
            tx.execute(
                "DELETE FROM user_favorites WHERE user_id = ?",
                params![profile.user_id],
            )
            .map_err(db_err)?;
            for item_id in &profile.favorites {
                tx.execute(
                    "INSERT INTO user_favorites (user_id, item_id) VALUES (?, ?)",
                    params![profile.user_id, item_id],
                )
                .map_err(db_err)?;
            }
            tx.commit().map_err(db_err)
        })?;
        self.publish(Change::User(profile.user_id.clone()));
        Ok(())
    }

    async fn update_user(&self, user_id: &str, update: &ProfileUpdate) -> Result<(), StoreError> {
        self.run("update_user", |conn| {
            let updated = conn
                .execute(
                    "UPDATE users SET name = COALESCE(?, name), birth_date = COALESCE(?, birth_date), description = COALESCE(?, description), gender = COALESCE(?, gender) WHERE user_id = ?",
                    params![
                        update.name,
                        update.birth_date,
                        update.description,
                        update.gender,
                        user_id,
                    ],
                )
                .map_err(db_err)?;
            if updated == 0 {
                return Err(StoreError::NotFound(format!("users/{}", user_id)));
            }
            Ok(())
        })?;
        self.publish(Change::User(user_id.to_string()));
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), StoreError> {
        self.run("delete_user", |conn| {
            let tx = conn.transaction().map_err(db_err)?;
            tx.execute("DELETE FROM user_favorites WHERE user_id = ?", params![user_id])
                .map_err(db_err)?;
            tx.execute("DELETE FROM users WHERE user_id = ?", params![user_id])
                .map_err(db_err)?;
            tx.commit().map_err(db_err)
        })?;
        self.publish(Change::User(user_id.to_string()));
        Ok(())
    }

    async fn add_favorite(&self, user_id: &str, item_id: &str) -> Result<(), StoreError> {
        self.run("add_favorite", |conn| {
            Self::require_user(conn, user_id)?;
            conn.execute(
                "INSERT OR IGNORE INTO user_favorites (user_id, item_id) VALUES (?, ?)",
                params![user_id, item_id],
            )
            .map_err(db_err)?;
            Ok(())
        })?;
        self.publish(Change::User(user_id.to_string()));
        Ok(())
    }

    async fn remove_favorite(&self, user_id: &str, item_id: &str) -> Result<(), StoreError> {
        self.run("remove_favorite", |conn| {
            Self::require_user(conn, user_id)?;
            conn.execute(
                "DELETE FROM user_favorites WHERE user_id = ? AND item_id = ?",
                params![user_id, item_id],
            )
            .map_err(db_err)?;
            Ok(())
        })?;
        self.publish(Change::User(user_id.to_string()));
        Ok(())
    }

    fn watch_user(&self, user_id: &str) -> Subscription<Option<UserProfile>> {
        let user_id = user_id.to_string();
        let watched = user_id.clone();
        self.spawn_listener(
            "user",
            move |change| change.touches_user(&watched),
            move |store| store.run("watch_user", |conn| Self::read_user(conn, &user_id)),
        )
    }
}

#[async_trait]
impl ReviewCollection for SqliteStore {
    async fn list_for_item(&self, item_id: &str) -> Result<Vec<ReviewRecord>, StoreError> {
        self.run("list_reviews", |conn| Self::read_reviews(conn, item_id))
    }

    async fn get_review(&self, review_id: &str) -> Result<Option<ReviewRecord>, StoreError> {
        self.run("get_review", |conn| {
            conn.query_row(
                "SELECT id, item_id, user_id, user_name, rating, comment, timestamp FROM reviews WHERE id = ?",
                params![review_id],
                Self::row_to_review,
            )
            .optional()
            .map_err(db_err)
        })
    }

    async fn add_review(&self, review: &NewReview) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.run("add_review", |conn| {
            conn.execute(
                "INSERT INTO reviews (id, item_id, user_id, user_name, rating, comment, timestamp) VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    id,
                    review.item_id,
                    review.user_id,
                    review.user_name,
                    review.rating,
                    review.comment,
                    review.timestamp,
                ],
            )
            .map_err(db_err)
        })?;
        self.publish(Change::Reviews(review.item_id.clone()));
        Ok(id)
    }

    async fn update_review(&self, review_id: &str, patch: &ReviewPatch) -> Result<(), StoreError> {
        let item_id = self.run("update_review", |conn| {
            conn.query_row(
                "UPDATE reviews SET comment = ?, rating = ?, timestamp = ? WHERE id = ? RETURNING item_id",
                params![patch.comment, patch.rating, patch.timestamp, review_id],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(db_err)?
            .ok_or_else(|| StoreError::NotFound(format!("reviews/{}", review_id)))
        })?;
        self.publish(Change::Reviews(item_id));
        Ok(())
    }

    async fn delete_review(&self, review_id: &str) -> Result<(), StoreError> {
        let item_id = self.run("delete_review", |conn| {
            conn.query_row(
                "DELETE FROM reviews WHERE id = ? RETURNING item_id",
                params![review_id],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(db_err)
        })?;
        if let Some(item_id) = item_id {
            self.publish(Change::Reviews(item_id));
        }
        Ok(())
    }

    fn watch_item(&self, item_id: &str) -> Subscription<Vec<ReviewRecord>> {
        let item_id = item_id.to_string();
        let watched = item_id.clone();
        self.spawn_listener(
            "reviews",
            move |change| change.touches_reviews_of(&watched),
            move |store| store.run("watch_reviews", |conn| Self::read_reviews(conn, &item_id)),
        )
    }
}
