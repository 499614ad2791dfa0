use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use super::domain::{AuthSession, LoginInput};
use super::password::Passwords;
use super::token::TokenKeys;
use crate::domain::Principal;
use crate::errors::DirectoryError;
use crate::store::DirectoryStore;

/// Credential check and token issuance, independent of the web framework.
pub struct AuthService {
    store: Arc<dyn DirectoryStore>,
    passwords: Passwords,
    tokens: Arc<TokenKeys>,
    /// Hash at the configured cost, verified against when the email is unknown.
    decoy_hash: OnceCell<String>,
}

impl AuthService {
    pub fn new(store: Arc<dyn DirectoryStore>, passwords: Passwords, tokens: Arc<TokenKeys>) -> Self {
        Self { store, passwords, tokens, decoy_hash: OnceCell::new() }
    }

    async fn decoy_hash(&self) -> Result<String, DirectoryError> {
        self.decoy_hash
            .get_or_try_init(|| self.passwords.hash(uuid::Uuid::new_v4().to_string()))
            .await
            .cloned()
    }

    /// Authenticate by email and password and issue a signed token.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::auth::{AuthService, Passwords, TokenKeys, domain::LoginInput};
    /// use service::domain::User;
    /// use service::store::memory::MemoryStore;
    ///
    /// let store = MemoryStore::new();
    /// let passwords = Passwords::new(64, 1, 1).unwrap();
    /// let now = chrono::Utc::now();
    /// let user = User {
    ///     id: uuid::Uuid::new_v4(),
    ///     email: "owner@acme.com".into(),
    ///     name: "Ada Owner".into(),
    ///     password_hash: passwords.hash_blocking("Passw0rd!").unwrap(),
    ///     roles: vec!["business".into()],
    ///     created_at: now,
    ///     updated_at: now,
    /// };
    /// tokio_test::block_on(store.seed_user(user)).unwrap();
    ///
    /// let keys = Arc::new(TokenKeys::new(b"doc-secret", "HS256", chrono::Duration::hours(1)).unwrap());
    /// let svc = AuthService::new(Arc::new(store), passwords, keys);
    /// let input = LoginInput { email: "Owner@Acme.com".into(), password: "Passw0rd!".into() };
    /// let session = tokio_test::block_on(svc.login(input)).unwrap();
    /// assert!(session.principal.has_role("business"));
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, DirectoryError> {
        input.validate()?;

        let user = match self.store.find_user_by_email(&input.email).await? {
            Some(u) => u,
            None => {
                // same Argon2 cost as a wrong password
                let decoy = self.decoy_hash().await?;
                self.passwords.verify(decoy, input.password).await?;
                debug!("no user for email");
                return Err(DirectoryError::Unauthorized);
            }
        };

        if !self.passwords.verify(user.password_hash.clone(), input.password).await? {
            debug!(user_id = %user.id, "password mismatch");
            return Err(DirectoryError::Unauthorized);
        }

        let (token, expires_at) = self.tokens.issue(&user)?;
        info!(user_id = %user.id, "user_logged_in");
        Ok(AuthSession {
            token,
            expires_at,
            principal: Principal { id: user.id, name: user.name, roles: user.roles, expires_at },
        })
    }

    /// Verify a bearer token; see [`TokenKeys::verify`].
    pub fn authenticate(&self, token: &str) -> Result<Principal, DirectoryError> {
        self.tokens.verify(token)
    }
}
