pub mod auth;
pub mod catalog;
pub mod config;
pub mod favorites;
pub mod listener;
pub mod metrics;
pub mod notice;
pub mod profile;
pub mod reviews;
pub mod store;
pub mod testing;

pub use auth::{
    create_auth_services, AuthError, AuthRequest, AuthServices, Authenticator, Identity,
    IdentityProvider, LocalIdentityProvider, NoneAuthenticator, Session, SignedIn,
};
pub use catalog::{filter_catalog, CatalogItem, CatalogStore, Facets, FilterEngine, FilterParams};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthConfig, AuthMethod, CatalogConfig,
    Config, ConfigError, DatabaseConfig, SanitizedConfig, ServerConfig,
};
pub use favorites::{join_favorites, FavoritesSet};
pub use listener::{LiveMirror, MirrorStatus};
pub use notice::{notice_channel, Notice, NoticeHandle, NoticeKind};
pub use profile::{ProfileError, ProfileService, ProfileUpdate, UserProfile};
pub use reviews::{NewReview, ReviewLog, ReviewPatch, ReviewRecord};
pub use store::{
    CatalogSource, Change, ReviewCollection, SqliteStore, StoreError, Subscription, UserDirectory,
};
