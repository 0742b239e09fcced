//! Mock document store for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, mpsc};

use crate::catalog::CatalogItem;
use crate::profile::{ProfileUpdate, UserProfile};
use crate::reviews::{NewReview, ReviewPatch, ReviewRecord};
use crate::store::{
    CatalogSource, Change, ReviewCollection, StoreError, Subscription, UserDirectory,
    SUBSCRIPTION_BUFFER,
};

#[derive(Debug, Clone)]
enum MockEvent {
    Changed(Change),
    ListenerError(Change, StoreError),
}

#[derive(Debug, Default)]
struct MockState {
    catalog: Vec<CatalogItem>,
    users: HashMap<String, UserProfile>,
    reviews: Vec<ReviewRecord>,
    next_review_id: u64,
    next_error: Option<StoreError>,
    catalog_fetches: usize,
    calls: Vec<String>,
}

/// In-memory implementation of every store trait.
///
/// Provides controllable behavior for testing:
/// - Seed catalog, users and reviews directly
/// - Fail the next operation with a chosen error
/// - Push errors into live listeners
/// - Record operation names for assertions
///
/// # Example
///
/// ```rust,ignore
/// use phonelist_core::testing::{MockStore, fixtures};
///
/// let store = Arc::new(MockStore::new());
/// store.set_user(fixtures::profile("u1"));
/// store.fail_next(StoreError::Unavailable("offline".into()));
///
/// assert!(store.add_favorite("u1", "pixel").await.is_err());
/// assert_eq!(store.calls(), vec!["add_favorite"]);
/// ```
pub struct MockStore {
    state: Arc<Mutex<MockState>>,
    events: broadcast::Sender<MockEvent>,
}

impl std::fmt::Debug for MockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("state", &"<state>")
            .field("listeners", &self.events.receiver_count())
            .finish()
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        lock_state(&self.state)
    }

    /// Record the call and consume a pending failure, if any.
    fn begin(&self, operation: &str) -> Result<MutexGuard<'_, MockState>, StoreError> {
        let mut state = self.lock();
        state.calls.push(operation.to_string());
        match state.next_error.take() {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }

    fn publish(&self, change: Change) {
        let _ = self.events.send(MockEvent::Changed(change));
    }

    // =========================================================================
    // Test controls
    // =========================================================================

    pub fn set_catalog(&self, items: Vec<CatalogItem>) {
        self.lock().catalog = items;
        self.publish(Change::Catalog);
    }

    /// Insert or replace a user document and notify listeners.
    pub fn set_user(&self, profile: UserProfile) {
        let user_id = profile.user_id.clone();
        self.lock().users.insert(user_id.clone(), profile);
        self.publish(Change::User(user_id));
    }

    pub fn user(&self, user_id: &str) -> Option<UserProfile> {
        self.lock().users.get(user_id).cloned()
    }

    /// Insert a stored review and notify listeners.
    pub fn insert_review(&self, review: ReviewRecord) {
        let item_id = review.item_id.clone();
        self.lock().reviews.push(review);
        self.publish(Change::Reviews(item_id));
    }

    pub fn reviews(&self) -> Vec<ReviewRecord> {
        self.lock().reviews.clone()
    }

    /// Make the next operation fail with `error`.
    pub fn fail_next(&self, error: StoreError) {
        self.lock().next_error = Some(error);
    }

    /// Deliver `error` to every live listener concerned by `change`.
    pub fn push_listener_error(&self, change: Change, error: StoreError) {
        let _ = self.events.send(MockEvent::ListenerError(change, error));
    }

    /// Names of the operations called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn catalog_fetches(&self) -> usize {
        self.lock().catalog_fetches
    }

    /// Number of live listeners currently attached.
    pub fn listener_count(&self) -> usize {
        self.events.receiver_count()
    }

    fn spawn_listener<T, R, S>(&self, relevant: R, snapshot: S) -> Subscription<T>
    where
        T: Send + 'static,
        R: Fn(&Change) -> bool + Send + 'static,
        S: Fn(&MockState) -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let mut events = self.events.subscribe();
        let state = Arc::clone(&self.state);

        let producer = tokio::spawn(async move {
            let initial = snapshot(&lock_state(&state));
            if tx.send(Ok(initial)).await.is_err() {
                return;
            }
            loop {
                let event = events.recv().await;
                let next = match event {
                    Ok(MockEvent::Changed(change)) if relevant(&change) => {
                        Ok(snapshot(&lock_state(&state)))
                    }
                    Ok(MockEvent::ListenerError(change, error)) if relevant(&change) => Err(error),
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        Ok(snapshot(&lock_state(&state)))
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if tx.send(next).await.is_err() {
                    break;
                }
            }
        });

        Subscription::new(rx, producer)
    }
}

fn lock_state(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn reviews_of(state: &MockState, item_id: &str) -> Vec<ReviewRecord> {
    let mut reviews: Vec<_> = state
        .reviews
        .iter()
        .filter(|r| r.item_id == item_id)
        .cloned()
        .collect();
    reviews.sort_by_key(|r| r.timestamp);
    reviews
}

#[async_trait]
impl CatalogSource for MockStore {
    async fn fetch_all(&self) -> Result<Vec<CatalogItem>, StoreError> {
        let mut state = self.begin("fetch_all")?;
        state.catalog_fetches += 1;
        Ok(state.catalog.clone())
    }
}

#[async_trait]
impl UserDirectory for MockStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let state = self.begin("get_user")?;
        Ok(state.users.get(user_id).cloned())
    }

    async fn put_user(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.begin("put_user")?
            .users
            .insert(profile.user_id.clone(), profile.clone());
        self.publish(Change::User(profile.user_id.clone()));
        Ok(())
    }

    async fn update_user(&self, user_id: &str, update: &ProfileUpdate) -> Result<(), StoreError> {
        {
            let mut state = self.begin("update_user")?;
            let profile = state
                .users
                .get_mut(user_id)
                .ok_or_else(|| StoreError::NotFound(format!("users/{}", user_id)))?;
            update.apply(profile);
        }
        self.publish(Change::User(user_id.to_string()));
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), StoreError> {
        self.begin("delete_user")?.users.remove(user_id);
        self.publish(Change::User(user_id.to_string()));
        Ok(())
    }

    async fn add_favorite(&self, user_id: &str, item_id: &str) -> Result<(), StoreError> {
        {
            let mut state = self.begin("add_favorite")?;
            let profile = state
                .users
                .get_mut(user_id)
                .ok_or_else(|| StoreError::NotFound(format!("users/{}", user_id)))?;
            profile.favorites.insert(item_id.to_string());
        }
        self.publish(Change::User(user_id.to_string()));
        Ok(())
    }

    async fn remove_favorite(&self, user_id: &str, item_id: &str) -> Result<(), StoreError> {
        {
            let mut state = self.begin("remove_favorite")?;
            let profile = state
                .users
                .get_mut(user_id)
                .ok_or_else(|| StoreError::NotFound(format!("users/{}", user_id)))?;
            profile.favorites.remove(item_id);
        }
        self.publish(Change::User(user_id.to_string()));
        Ok(())
    }

    fn watch_user(&self, user_id: &str) -> Subscription<Option<UserProfile>> {
        let user_id = user_id.to_string();
        let watched = user_id.clone();
        self.spawn_listener(
            move |change| change.touches_user(&watched),
            move |state| state.users.get(&user_id).cloned(),
        )
    }
}

#[async_trait]
impl ReviewCollection for MockStore {
    async fn list_for_item(&self, item_id: &str) -> Result<Vec<ReviewRecord>, StoreError> {
        let state = self.begin("list_for_item")?;
        Ok(reviews_of(&state, item_id))
    }

    async fn get_review(&self, review_id: &str) -> Result<Option<ReviewRecord>, StoreError> {
        let state = self.begin("get_review")?;
        Ok(state.reviews.iter().find(|r| r.id == review_id).cloned())
    }

    async fn add_review(&self, review: &NewReview) -> Result<String, StoreError> {
        let id = {
            let mut state = self.begin("add_review")?;
            state.next_review_id += 1;
            let id = format!("review-{}", state.next_review_id);
            state.reviews.push(review.clone().with_id(id.clone()));
            id
        };
        self.publish(Change::Reviews(review.item_id.clone()));
        Ok(id)
    }

    async fn update_review(&self, review_id: &str, patch: &ReviewPatch) -> Result<(), StoreError> {
        let item_id = {
            let mut state = self.begin("update_review")?;
            let review = state
                .reviews
                .iter_mut()
                .find(|r| r.id == review_id)
                .ok_or_else(|| StoreError::NotFound(format!("reviews/{}", review_id)))?;
            review.apply(patch);
            review.item_id.clone()
        };
        self.publish(Change::Reviews(item_id));
        Ok(())
    }

    async fn delete_review(&self, review_id: &str) -> Result<(), StoreError> {
        let removed = {
            let mut state = self.begin("delete_review")?;
            let position = state.reviews.iter().position(|r| r.id == review_id);
            position.map(|i| state.reviews.remove(i))
        };
        if let Some(review) = removed {
            self.publish(Change::Reviews(review.item_id));
        }
        Ok(())
    }

    fn watch_item(&self, item_id: &str) -> Subscription<Vec<ReviewRecord>> {
        let item_id = item_id.to_string();
        let watched = item_id.clone();
        self.spawn_listener(
            move |change| change.touches_reviews_of(&watched),
            move |state| reviews_of(state, &item_id),
        )
    }
}
