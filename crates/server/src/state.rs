use std::sync::Arc;

use phonelist_core::{
    Authenticator, CatalogStore, Config, FavoritesSet, FilterEngine, NoticeHandle, ProfileService,
    ReviewLog, SanitizedConfig, Session, SqliteStore,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    store: Arc<SqliteStore>,
    catalog: CatalogStore,
    filter: FilterEngine,
    profiles: ProfileService,
    notices: NoticeHandle,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        store: Arc<SqliteStore>,
        profiles: ProfileService,
        notices: NoticeHandle,
    ) -> Self {
        let catalog = CatalogStore::new(store.clone(), notices.clone());
        Self {
            config,
            authenticator,
            store,
            catalog,
            filter: FilterEngine::new(),
            profiles,
            notices,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn store(&self) -> &Arc<SqliteStore> {
        &self.store
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn filter_engine(&self) -> &FilterEngine {
        &self.filter
    }

    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }

    /// Favorites component bound to one request's session.
    pub fn favorites(&self, session: Session) -> FavoritesSet {
        FavoritesSet::new(self.store.clone(), session, self.notices.clone())
    }

    /// Review log bound to one request's (or connection's) session.
    pub fn review_log(&self, session: Session) -> ReviewLog {
        ReviewLog::new(
            self.store.clone(),
            self.store.clone(),
            session,
            self.notices.clone(),
        )
    }
}
