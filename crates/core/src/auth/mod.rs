mod local;
mod none;
mod session;
mod traits;
mod types;

pub use local::*;
pub use none::*;
pub use session::*;
pub use traits::*;
pub use types::*;

use std::sync::Arc;

use crate::config::{AuthConfig, AuthMethod, DatabaseConfig};

/// Request authenticator plus, when accounts are enabled, the provider that
/// manages them.
#[derive(Clone)]
pub struct AuthServices {
    pub authenticator: Arc<dyn Authenticator>,
    pub identity_provider: Option<Arc<dyn IdentityProvider>>,
}

/// Factory function to create the auth services from config
pub fn create_auth_services(
    auth: &AuthConfig,
    database: &DatabaseConfig,
) -> Result<AuthServices, AuthError> {
    match auth.method {
        AuthMethod::None => Ok(AuthServices {
            authenticator: Arc::new(NoneAuthenticator::new()),
            identity_provider: None,
        }),
        AuthMethod::Local => {
            if auth.session_ttl_hours == 0 {
                return Err(AuthError::ConfigurationError(
                    "session_ttl_hours must be positive when using local auth".to_string(),
                ));
            }
            let provider = Arc::new(LocalIdentityProvider::new(
                &database.path,
                auth.session_ttl_hours,
            )?);
            Ok(AuthServices {
                authenticator: provider.clone(),
                identity_provider: Some(provider),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn database(dir: &TempDir) -> DatabaseConfig {
        DatabaseConfig {
            path: dir.path().join("auth.db"),
        }
    }

    #[test]
    fn test_create_auth_services_none() {
        let dir = TempDir::new().unwrap();
        let config = AuthConfig {
            method: AuthMethod::None,
            session_ttl_hours: 1,
        };
        let services = create_auth_services(&config, &database(&dir)).unwrap();
        assert_eq!(services.authenticator.method_name(), "none");
        assert!(services.identity_provider.is_none());
    }

    #[test]
    fn test_create_auth_services_local() {
        let dir = TempDir::new().unwrap();
        let config = AuthConfig {
            method: AuthMethod::Local,
            session_ttl_hours: 12,
        };
        let services = create_auth_services(&config, &database(&dir)).unwrap();
        assert_eq!(services.authenticator.method_name(), "local");
        assert!(services.identity_provider.is_some());
    }

    #[test]
    fn test_create_auth_services_local_zero_ttl() {
        let dir = TempDir::new().unwrap();
        let config = AuthConfig {
            method: AuthMethod::Local,
            session_ttl_hours: 0,
        };
        let result = create_auth_services(&config, &database(&dir));
        assert!(matches!(result, Err(AuthError::ConfigurationError(_))));
    }
}
