//! Sign-up, login and logout flows.
//!
//! These are the only places the session identifier is written. Every other
//! caller reads it through [`AuthService::require_user`] and passes it to
//! the [`ApiClient`] explicitly.

use std::sync::Arc;

use shared::Credentials;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::services::api::ApiClient;
use crate::services::session::{require_session, SessionStorage};

#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
    store: Arc<dyn SessionStorage>,
}

impl AuthService {
    pub fn new(api: ApiClient, store: Arc<dyn SessionStorage>) -> Self {
        Self { api, store }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Create an account and store the identifier the server assigned
    pub async fn register(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let user_id = self.api.sign_up(credentials).await?;
        self.store.save(Some(&user_id))?;
        info!("Registered new account");
        Ok(user_id)
    }

    /// Sign in, replacing whatever session was stored before
    pub async fn login(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let user_id = self.api.log_in(credentials).await?;
        self.store.save(Some(&user_id))?;
        info!("Signed in");
        Ok(user_id)
    }

    /// Tell the server, then forget the local session.
    ///
    /// The local session is cleared even when the server call fails or the
    /// stored session cannot be read, so the user can always sign out. Only
    /// a failure to clear the store is returned.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let stored = self.store.read().unwrap_or_else(|e| {
            warn!(error = %e, "Could not read stored session, clearing it");
            None
        });
        if let Some(user_id) = stored {
            if let Err(e) = self.api.log_out(&user_id).await {
                warn!(error = %e, "Server logout failed, clearing local session anyway");
            }
        }
        self.store.clear()?;
        Ok(())
    }

    /// `false` without a network call when nothing is stored
    pub async fn is_authenticated(&self) -> Result<bool, ApiError> {
        match self.store.read()? {
            Some(user_id) => self.api.verify_authentication(&user_id).await,
            None => Ok(false),
        }
    }

    pub fn current_user(&self) -> Result<Option<String>, ApiError> {
        Ok(self.store.read()?)
    }

    pub fn require_user(&self) -> Result<String, ApiError> {
        require_session(self.store.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::services::session::{MemorySessionStore, YamlSessionStore};
    use tempfile::TempDir;

    // Nothing listens on port 9 locally; any request would be a transport error.
    fn offline_service(store: Arc<dyn SessionStorage>) -> AuthService {
        AuthService::new(ApiClient::with_base_url("http://127.0.0.1:9".to_string()), store)
    }

    #[tokio::test]
    async fn test_is_authenticated_without_session() {
        let service = offline_service(Arc::new(MemorySessionStore::new()));
        assert!(!service.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_server_unreachable() {
        let store = Arc::new(MemorySessionStore::with_user("user-123"));
        let service = offline_service(store.clone());

        service.logout().await.unwrap();
        assert_eq!(store.read().unwrap(), None);

        // Second logout is a no-op
        service.logout().await.unwrap();
    }

    #[tokio::test]
    async fn test_logout_removes_corrupt_session_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(YamlSessionStore::new(temp_dir.path()));
        store.save(Some("user-123")).unwrap();
        std::fs::write(store.path(), "userId: [unterminated").unwrap();
        assert!(store.read().is_err());

        let service = offline_service(store.clone());
        service.logout().await.unwrap();

        assert!(!store.path().exists());
        assert_eq!(store.read().unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_rejects_invalid_credentials_locally() {
        let store = Arc::new(MemorySessionStore::with_user("previous"));
        let service = offline_service(store.clone());

        let err = service
            .login(&Credentials::new("not-an-email", ""))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(store.read().unwrap(), Some("previous".to_string()));
    }

    #[test]
    fn test_require_user() {
        let service = offline_service(Arc::new(MemorySessionStore::new()));
        assert_eq!(service.require_user().unwrap_err().kind(), ErrorKind::Precondition);
        assert_eq!(service.current_user().unwrap(), None);
    }
}
