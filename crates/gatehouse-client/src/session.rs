//! Client session state
//!
//! One [`Session`] owns the cached `{token, user}` pair and is its only
//! writer. Readers hold a [`watch::Receiver`] from [`Session::subscribe`] and
//! always see the latest [`SessionState`].

use crate::api::{AuthApi, AuthPayload, ClientError, RegisterForm, UserSummary};
use crate::storage::{SessionStorage, StorageError, TOKEN_KEY, USER_KEY};
use std::sync::Arc;
use tokio::sync::watch;

/// Snapshot published to subscribers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<UserSummary>,
    pub is_authenticated: bool,
}

impl SessionState {
    fn signed_in(user: UserSummary) -> Self {
        Self {
            user: Some(user),
            is_authenticated: true,
        }
    }
}

pub struct Session {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn SessionStorage>,
    token: Option<String>,
    state: watch::Sender<SessionState>,
}

impl Session {
    /// Build a session from whatever pair the storage holds
    ///
    /// A half-written pair, or a user entry that no longer parses, is cleared
    /// and the session starts signed out.
    pub fn restore(
        api: Arc<dyn AuthApi>,
        storage: Arc<dyn SessionStorage>,
    ) -> Result<Self, StorageError> {
        let token = storage.get(TOKEN_KEY)?;
        let user = storage.get(USER_KEY)?;

        let (token, state) = match (token, user) {
            (Some(token), Some(user)) => match serde_json::from_str::<UserSummary>(&user) {
                Ok(user) => (Some(token), SessionState::signed_in(user)),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unreadable cached user");
                    storage.remove_all(&[TOKEN_KEY, USER_KEY])?;
                    (None, SessionState::default())
                }
            },
            (None, None) => (None, SessionState::default()),
            _ => {
                tracing::warn!("Discarding incomplete cached session");
                storage.remove_all(&[TOKEN_KEY, USER_KEY])?;
                (None, SessionState::default())
            }
        };

        let (state, _) = watch::channel(state);
        Ok(Self {
            api,
            storage,
            token,
            state,
        })
    }

    /// Receiver for state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    pub fn user(&self) -> Option<UserSummary> {
        self.state.borrow().user.clone()
    }

    /// Bearer token for authenticated requests
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Sign in; on failure the session is left as it was
    pub async fn login(&mut self, email: &str, password: &str) -> Result<UserSummary, ClientError> {
        let payload = self.api.login(email, password).await?;
        self.sign_in(payload)
    }

    /// Create an account and sign in; on failure the session is left as it was
    pub async fn register(&mut self, form: &RegisterForm) -> Result<UserSummary, ClientError> {
        let payload = self.api.register(form).await?;
        self.sign_in(payload)
    }

    /// Forget the cached pair; purely local
    pub fn logout(&mut self) -> Result<(), StorageError> {
        let user_id = self.state.borrow().user.as_ref().map(|u| u.id);
        self.token = None;
        self.state.send_replace(SessionState::default());
        tracing::debug!(user_id = ?user_id, "Signed out");
        self.storage.remove_all(&[TOKEN_KEY, USER_KEY])
    }

    fn sign_in(&mut self, payload: AuthPayload) -> Result<UserSummary, ClientError> {
        let AuthPayload { token, user } = payload;
        let user_json = serde_json::to_string(&user)
            .map_err(|e| ClientError::InvalidResponse(format!("Unserializable user: {e}")))?;

        if let Err(e) = self
            .storage
            .set_all(&[(TOKEN_KEY, token.as_str()), (USER_KEY, user_json.as_str())])
        {
            if let Err(cleanup) = self.restore_previous() {
                tracing::warn!(error = %cleanup, "Failed to roll back session storage");
            }
            return Err(e.into());
        }

        self.token = Some(token);
        self.state.send_replace(SessionState::signed_in(user.clone()));
        tracing::debug!(user_id = %user.id, "Signed in");
        Ok(user)
    }

    /// Put the storage back in line with the in-memory pair
    fn restore_previous(&self) -> Result<(), StorageError> {
        let state = self.state.borrow().clone();
        match (&self.token, &state.user) {
            (Some(token), Some(user)) => match serde_json::to_string(user) {
                Ok(user_json) => self
                    .storage
                    .set_all(&[(TOKEN_KEY, token.as_str()), (USER_KEY, user_json.as_str())]),
                Err(_) => self.storage.remove_all(&[TOKEN_KEY, USER_KEY]),
            },
            _ => self.storage.remove_all(&[TOKEN_KEY, USER_KEY]),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use gatehouse_core::{Role, UserId};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Accepts one password for any email
    pub(crate) struct FakeApi {
        pub password: &'static str,
    }

    pub(crate) fn summary(email: &str) -> UserSummary {
        UserSummary {
            id: UserId::new(),
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            email: email.to_string(),
            role: Role::User,
        }
    }

    #[async_trait]
    impl AuthApi for FakeApi {
        async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ClientError> {
            if password != self.password {
                return Err(ClientError::Api {
                    status: 401,
                    message: "Incorrect email or password".to_string(),
                });
            }
            Ok(AuthPayload {
                token: format!("token-for-{email}"),
                user: summary(email),
            })
        }

        async fn register(&self, form: &RegisterForm) -> Result<AuthPayload, ClientError> {
            if form.email.is_empty() {
                return Err(ClientError::Api {
                    status: 400,
                    message: "Missing required fields: email".to_string(),
                });
            }
            Ok(AuthPayload {
                token: format!("token-for-{}", form.email),
                user: summary(&form.email),
            })
        }
    }

    /// Storage whose writes can be made to fail
    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_writes: AtomicBool,
    }

    impl SessionStorage for FlakyStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.fail_writes.load(Ordering::SeqCst) && key == USER_KEY {
                return Err(StorageError::Poisoned);
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    fn api() -> Arc<dyn AuthApi> {
        Arc::new(FakeApi {
            password: "SecurePass456!",
        })
    }

    #[tokio::test]
    async fn test_login_updates_state_and_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = Session::restore(api(), storage.clone()).unwrap();
        let mut rx = session.subscribe();
        assert!(!session.is_authenticated());

        let user = session
            .login("jane@example.com", "SecurePass456!")
            .await
            .unwrap();

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated);
        assert_eq!(session.user(), Some(user.clone()));
        assert_eq!(session.token(), Some("token-for-jane@example.com"));
        assert_eq!(
            storage.get(TOKEN_KEY).unwrap().as_deref(),
            Some("token-for-jane@example.com")
        );
        let cached: UserSummary =
            serde_json::from_str(&storage.get(USER_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(cached, user);
    }

    #[tokio::test]
    async fn test_failed_login_leaves_state_untouched() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = Session::restore(api(), storage.clone()).unwrap();
        session
            .login("jane@example.com", "SecurePass456!")
            .await
            .unwrap();
        let before = session.state();
        let rx = session.subscribe();

        let err = session
            .login("jane@example.com", "wrong")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Incorrect email or password");
        assert_eq!(session.state(), before);
        assert!(!rx.has_changed().unwrap());
        assert_eq!(
            storage.get(TOKEN_KEY).unwrap().as_deref(),
            Some("token-for-jane@example.com")
        );
    }

    #[tokio::test]
    async fn test_register_signs_in() {
        let mut session = Session::restore(api(), Arc::new(MemoryStorage::new())).unwrap();

        let form = RegisterForm {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            password: "SecurePass456!".to_string(),
        };
        let user = session.register(&form).await.unwrap();

        assert_eq!(user.email, "jane@example.com");
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = Session::restore(api(), storage.clone()).unwrap();
        session
            .login("jane@example.com", "SecurePass456!")
            .await
            .unwrap();

        session.logout().unwrap();

        assert_eq!(session.state(), SessionState::default());
        assert_eq!(session.token(), None);
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_restore_from_complete_pair() {
        let storage = Arc::new(MemoryStorage::new());
        let user = summary("jane@example.com");
        let user_json = serde_json::to_string(&user).unwrap();
        storage
            .set_all(&[(TOKEN_KEY, "cached-token"), (USER_KEY, user_json.as_str())])
            .unwrap();

        let session = Session::restore(api(), storage).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.user(), Some(user));
        assert_eq!(session.token(), Some("cached-token"));
    }

    #[test]
    fn test_restore_discards_half_pair() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "orphan-token").unwrap();

        let session = Session::restore(api(), storage.clone()).unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_restore_discards_unreadable_user() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_all(&[(TOKEN_KEY, "cached-token"), (USER_KEY, "{not json")])
            .unwrap();

        let session = Session::restore(api(), storage.clone()).unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_storage_failure_rolls_back() {
        let storage = Arc::new(FlakyStorage::default());
        let mut session = Session::restore(api(), storage.clone()).unwrap();
        storage.fail_writes.store(true, Ordering::SeqCst);

        let result =
            tokio_test::block_on(session.login("jane@example.com", "SecurePass456!"));

        assert!(matches!(result, Err(ClientError::Storage(_))));
        assert!(!session.is_authenticated());
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
    }
}
