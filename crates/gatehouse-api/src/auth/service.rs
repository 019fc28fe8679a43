//! Authentication service layer
//!
//! Orchestrates registration and login over the credential store, the
//! password hasher and the token issuer. Login failures for an unknown email
//! and for a wrong password are indistinguishable to the caller.

use super::jwt::TokenIssuer;
use super::password::{Argon2Hasher, PasswordError};
use crate::error::AppError;
use gatehouse_core::{normalize_email, NewUser, Role, User, UserStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use utoipa::ToSchema;
use validator::ValidateEmail;

/// Message for both unknown email and wrong password
pub const INVALID_CREDENTIALS: &str = "Incorrect email or password";

/// Message for a registration whose email is taken
pub const DUPLICATE_EMAIL: &str = "A user with this email already exists";

/// User registration request
#[derive(Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Defaults to "user"
    pub role: Option<String>,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

/// User login request
#[derive(Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Successful register or login
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub token: String,
    pub user: User,
}

/// Plaintext behind the decoy hash verified when a login email is unknown
const DECOY_PASSWORD: &str = "gatehouse-decoy-password";

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: Argon2Hasher,
    tokens: TokenIssuer,
    /// Hash under the current work factor, so an unknown email costs one
    /// verification like a wrong password does
    decoy_hash: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: Argon2Hasher,
        tokens: TokenIssuer,
    ) -> Result<Self, PasswordError> {
        let decoy_hash = hasher.hash(DECOY_PASSWORD)?;
        Ok(Self {
            store,
            hasher,
            tokens,
            decoy_hash,
        })
    }

    /// Register a new user and issue its first token
    ///
    /// # Returns
    ///
    /// * `Ok(AuthOutcome)` - Token and the created user
    /// * `Err(AppError::BadRequest)` - Missing email/password, invalid email or unknown role
    /// * `Err(AppError::Conflict)` - Email already registered
    /// * `Err(AppError::Internal)` - Store or hashing fault
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthOutcome, AppError> {
        let (email, password) = required_credentials(request.email, request.password)?;

        let email = normalize_email(&email);
        if !email.validate_email() {
            return Err(AppError::BadRequest(
                "Please provide a valid email address".to_string(),
            ));
        }

        let role = match request.role.as_deref().map(str::trim) {
            Some(role) if !role.is_empty() => role
                .parse::<Role>()
                .map_err(|e| AppError::BadRequest(e.to_string()))?,
            _ => Role::default(),
        };

        // Early exit only; the store's unique constraint decides races
        if self.store.find_by_email(&email).await?.is_some() {
            tracing::info!(outcome = "register_conflict", "Registration rejected");
            return Err(AppError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        let password_hash = self.hash_password(password).await?;

        let user = self
            .store
            .insert(NewUser {
                first_name: request.first_name.unwrap_or_default().trim().to_string(),
                last_name: request.last_name.unwrap_or_default().trim().to_string(),
                email,
                password_hash,
                role,
            })
            .await
            .inspect_err(|e| tracing::info!(outcome = "register_failed", error = %e, "Registration rejected"))?;

        let token = self.issue_token(&user)?;
        tracing::info!(user_id = %user.id, role = %user.role, outcome = "registered", "User registered");

        Ok(AuthOutcome { token, user })
    }

    /// Authenticate with email and password
    ///
    /// # Returns
    ///
    /// * `Ok(AuthOutcome)` - Token and the matched user
    /// * `Err(AppError::BadRequest)` - Missing email/password
    /// * `Err(AppError::Unauthorized)` - Unknown email or wrong password, same message for both
    /// * `Err(AppError::Internal)` - Store or hashing fault
    pub async fn login(&self, request: LoginRequest) -> Result<AuthOutcome, AppError> {
        let (email, password) = required_credentials(request.email, request.password)?;
        let email = normalize_email(&email);

        let Some(credentials) = self.store.find_credentials_by_email(&email).await? else {
            self.verify_password(password, self.decoy_hash.clone())
                .await?;
            tracing::info!(outcome = "login_failed", "Login rejected");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !self
            .verify_password(password, credentials.password_hash)
            .await?
        {
            tracing::info!(user_id = %credentials.user.id, outcome = "login_failed", "Login rejected");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let user = credentials.user;
        let token = self.issue_token(&user)?;
        tracing::info!(user_id = %user.id, outcome = "login_success", "User logged in");

        Ok(AuthOutcome { token, user })
    }

    fn issue_token(&self, user: &User) -> Result<String, AppError> {
        self.tokens
            .issue(user.id)
            .map_err(|e| AppError::Internal(format!("Failed to issue token: {e}")))
    }

    /// Argon2 is CPU-bound; keep it off the async workers
    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let hasher = self.hasher.clone();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {e}")))??;
        Ok(hash)
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, AppError> {
        let hasher = self.hasher.clone();
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Verification task failed: {e}")))??;
        Ok(matches)
    }
}

/// Extract email and password, naming every missing or blank field
fn required_credentials(
    email: Option<String>,
    password: Option<String>,
) -> Result<(String, String), AppError> {
    let email = email.filter(|e| !e.trim().is_empty());
    let password = password.filter(|p| !p.is_empty());

    match (email, password) {
        (Some(email), Some(password)) => Ok((email, password)),
        (email, password) => {
            let missing: Vec<&str> = [
                email.is_none().then_some("email"),
                password.is_none().then_some("password"),
            ]
            .into_iter()
            .flatten()
            .collect();
            Err(AppError::BadRequest(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::PasswordConfig;
    use gatehouse_core::{MemoryUserStore, StoreError, UserCredentials, UserId};

    fn service_with(store: Arc<dyn UserStore>) -> AuthService {
        let hasher = Argon2Hasher::new(&PasswordConfig {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
            output_len: Some(32),
        })
        .unwrap();
        AuthService::new(
            store,
            hasher,
            TokenIssuer::new("service-test-secret", 86_400, "gatehouse"),
        )
        .unwrap()
    }

    fn service() -> AuthService {
        service_with(Arc::new(MemoryUserStore::new()))
    }

    fn jane() -> RegisterRequest {
        RegisterRequest {
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            email: Some("jane@example.com".to_string()),
            password: Some("SecurePass456!".to_string()),
            role: None,
        }
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_issues_token_for_new_user() {
        let service = service();
        let outcome = service.register(jane()).await.unwrap();

        assert_eq!(outcome.user.email, "jane@example.com");
        assert_eq!(outcome.user.first_name, "Jane");
        assert_eq!(outcome.user.role, Role::User);
        assert_eq!(service.tokens.verify(&outcome.token).unwrap(), outcome.user.id);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let service = service();
        service.register(jane()).await.unwrap();

        let mut again = jane();
        again.email = Some("  JANE@example.com ".to_string());
        let result = service.register(again).await;
        assert!(matches!(result, Err(AppError::Conflict(msg)) if msg == DUPLICATE_EMAIL));
    }

    #[tokio::test]
    async fn test_register_names_missing_fields() {
        let service = service();

        let result = service.register(RegisterRequest::default()).await;
        assert!(
            matches!(result, Err(AppError::BadRequest(msg)) if msg == "Missing required fields: email, password")
        );

        let mut no_password = jane();
        no_password.password = Some(String::new());
        let result = service.register(no_password).await;
        assert!(
            matches!(result, Err(AppError::BadRequest(msg)) if msg == "Missing required fields: password")
        );
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_email_and_role() {
        let service = service();

        let mut bad_email = jane();
        bad_email.email = Some("not-an-email".to_string());
        assert!(matches!(
            service.register(bad_email).await,
            Err(AppError::BadRequest(_))
        ));

        let mut bad_role = jane();
        bad_role.role = Some("superuser".to_string());
        assert!(matches!(
            service.register(bad_role).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_register_with_explicit_role() {
        let mut admin = jane();
        admin.role = Some("admin".to_string());
        let outcome = service().register(admin).await.unwrap();
        assert_eq!(outcome.user.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_login_after_register() {
        let service = service();
        let registered = service.register(jane()).await.unwrap();

        let outcome = service
            .login(login("Jane@Example.com", "SecurePass456!"))
            .await
            .unwrap();
        assert_eq!(outcome.user.id, registered.user.id);
        assert_eq!(service.tokens.verify(&outcome.token).unwrap(), registered.user.id);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = service();
        service.register(jane()).await.unwrap();

        let wrong_password = service
            .login(login("jane@example.com", "wrong"))
            .await
            .unwrap_err();
        let unknown_email = service
            .login(login("nobody@example.com", "SecurePass456!"))
            .await
            .unwrap_err();

        assert_eq!(wrong_password.status_code(), unknown_email.status_code());
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(wrong_password.to_string(), INVALID_CREDENTIALS);
    }

    #[test]
    fn test_unknown_email_verifies_under_configured_work_factor() {
        let service = service();
        let decoy = argon2::PasswordHash::new(&service.decoy_hash).unwrap();

        assert_eq!(decoy.algorithm.as_str(), "argon2id");
        assert_eq!(decoy.params.get_decimal("m"), Some(1024));
        assert_eq!(decoy.params.get_decimal("t"), Some(1));
        assert!(!service.hasher.verify("SecurePass456!", &service.decoy_hash).unwrap());
    }

    #[tokio::test]
    async fn test_unknown_email_with_decoy_password_still_rejected() {
        let result = service()
            .login(login("nobody@example.com", DECOY_PASSWORD))
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(msg)) if msg == INVALID_CREDENTIALS));
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let result = service()
            .login(LoginRequest {
                email: Some("jane@example.com".to_string()),
                password: None,
            })
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    struct UnreachableStore;

    #[async_trait::async_trait]
    impl UserStore for UnreachableStore {
        async fn insert(&self, _: NewUser) -> Result<User, StoreError> {
            Err(StoreError::Database("connection refused".to_string()))
        }
        async fn find_by_email(&self, _: &str) -> Result<Option<User>, StoreError> {
            Err(StoreError::Database("connection refused".to_string()))
        }
        async fn find_credentials_by_email(
            &self,
            _: &str,
        ) -> Result<Option<UserCredentials>, StoreError> {
            Err(StoreError::Timeout(std::time::Duration::from_secs(5)))
        }
        async fn find_by_id(&self, _: UserId) -> Result<Option<User>, StoreError> {
            Err(StoreError::Database("connection refused".to_string()))
        }
        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Database("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_outage_is_internal() {
        let service = service_with(Arc::new(UnreachableStore));

        assert!(matches!(
            service.register(jane()).await,
            Err(AppError::Internal(_))
        ));
        assert!(matches!(
            service.login(login("jane@example.com", "SecurePass456!")).await,
            Err(AppError::Internal(_))
        ));
    }
}
