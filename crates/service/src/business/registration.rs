use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::domain::RegisterBusinessInput;
use crate::auth::Passwords;
use crate::domain::{Business, User, BUSINESS_OWNER_ROLE};
use crate::errors::DirectoryError;
use crate::store::{DirectoryStore, StoreError, StoreSession, TransactionOptions};

#[derive(Debug, Clone)]
pub struct RegistrationConfig {
    pub min_password_length: usize,
    /// Upper bound on the transactional part of a registration.
    pub transaction_timeout: Duration,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self { min_password_length: 8, transaction_timeout: Duration::from_secs(10) }
    }
}

pub struct RegistrationService {
    store: Arc<dyn DirectoryStore>,
    passwords: Passwords,
    cfg: RegistrationConfig,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn DirectoryStore>, passwords: Passwords, cfg: RegistrationConfig) -> Self {
        Self { store, passwords, cfg }
    }

    /// Create the owner account and its business in one transaction.
    ///
    /// Either both records are stored or neither is. The session is ended on
    /// every exit path; if this future is dropped mid-transaction the session
    /// is dropped with it and the store discards the writes.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::auth::Passwords;
    /// use service::business::{RegisterBusinessInput, RegistrationConfig, RegistrationService};
    /// use service::store::memory::MemoryStore;
    ///
    /// let store = MemoryStore::new();
    /// let svc = RegistrationService::new(
    ///     Arc::new(store.clone()),
    ///     Passwords::new(64, 1, 1).unwrap(),
    ///     RegistrationConfig::default(),
    /// );
    /// let input = RegisterBusinessInput {
    ///     business_name: "Acme Bakery".into(),
    ///     owner_full_name: "Ada Lovelace".into(),
    ///     work_email: "Ada@Acme.example".into(),
    ///     password: "Passw0rd!".into(),
    ///     confirm_password: "Passw0rd!".into(),
    ///     ..Default::default()
    /// };
    /// let business = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(business.email, "ada@acme.example");
    /// assert_eq!(tokio_test::block_on(store.users()).len(), 1);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.work_email))]
    pub async fn register(&self, input: RegisterBusinessInput) -> Result<Business, DirectoryError> {
        input.validate(self.cfg.min_password_length)?;
        let email = models::user::normalize_email(&input.work_email);

        // fast path; the unique index is what actually settles races
        if self.store.find_user_by_email(&email).await?.is_some() {
            debug!("email already registered");
            return Err(DirectoryError::conflict_email());
        }

        let password_hash = self.passwords.hash(input.password.clone()).await?;
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            name: input.owner_full_name.trim().to_string(),
            password_hash,
            roles: vec![BUSINESS_OWNER_ROLE.to_string()],
            created_at: now,
            updated_at: now,
        };

        let mut session = self
            .store
            .start_session()
            .await
            .map_err(|e| DirectoryError::Internal(format!("could not start session: {}", e)))?;

        let options = TransactionOptions::majority(self.cfg.transaction_timeout);
        let staged = tokio::time::timeout(
            self.cfg.transaction_timeout,
            stage_owner_and_business(session.as_mut(), &options, &user, &input, now),
        )
        .await;

        // commit runs outside the timeout so its result is never ambiguous
        let result = match staged {
            Ok(Ok(business)) => match session.commit_transaction().await {
                Ok(()) => Ok(business),
                Err(e) => Err(DirectoryError::from(e)),
            },
            Ok(Err(e)) => {
                abort(session.as_mut()).await;
                Err(DirectoryError::from(e))
            }
            Err(_) => {
                abort(session.as_mut()).await;
                Err(DirectoryError::Persistence("transaction timed out".into()))
            }
        };
        session.end_session().await;

        match &result {
            Ok(b) => info!(user_id = %user.id, business_id = %b.id, "business_registered"),
            Err(e) => warn!(error = %e, "registration failed"),
        }
        result
    }
}

/// Opens the transaction and writes both records; the caller commits.
async fn stage_owner_and_business(
    session: &mut dyn StoreSession,
    options: &TransactionOptions,
    user: &User,
    input: &RegisterBusinessInput,
    now: DateTime<Utc>,
) -> Result<Business, StoreError> {
    session.start_transaction(options).await?;
    let owner_id = session.insert_user(user).await?;
    let business = Business {
        id: Uuid::new_v4(),
        name: input.business_name.trim().to_string(),
        category_id: input.category_id,
        description: input.description.trim().to_string(),
        website: input.website.trim().to_string(),
        phone: input.phone_number.trim().to_string(),
        email: user.email.clone(),
        owner_id,
        owner_name: user.name.clone(),
        owner_job_title: input.owner_job_title.trim().to_string(),
        created_at: now,
    };
    session.insert_business(&business).await?;
    Ok(business)
}

async fn abort(session: &mut dyn StoreSession) {
    if !session.in_transaction() {
        return;
    }
    if let Err(e) = session.abort_transaction().await {
        warn!(error = %e, "abort failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn service(store: &MemoryStore) -> RegistrationService {
        RegistrationService::new(
            Arc::new(store.clone()),
            Passwords::new(64, 1, 1).unwrap(),
            RegistrationConfig::default(),
        )
    }

    fn input(email: &str) -> RegisterBusinessInput {
        RegisterBusinessInput {
            business_name: "Acme Bakery".into(),
            website: "https://acme.example".into(),
            owner_full_name: "Ada Lovelace".into(),
            owner_job_title: "Founder".into(),
            work_email: email.into(),
            phone_number: "+1 555 0100".into(),
            password: "Passw0rd!".into(),
            confirm_password: "Passw0rd!".into(),
            category_id: None,
            description: "Bread and pastries".into(),
        }
    }

    #[tokio::test]
    async fn stores_owner_and_business_cross_referenced() {
        let store = MemoryStore::new();
        let business = service(&store).register(input("ada@acme.example")).await.unwrap();

        let users = store.users().await;
        assert_eq!(users.len(), 1);
        let owner = &users[0];
        assert_eq!(business.owner_id, owner.id);
        assert_eq!(business.owner_name, owner.name);
        assert_eq!(owner.roles, vec![BUSINESS_OWNER_ROLE]);
        assert!(owner.password_hash.starts_with("$argon2id$"));
        assert_ne!(owner.password_hash, "Passw0rd!");
        assert_eq!(store.businesses().await, vec![business]);
        assert_eq!(store.commits(), 1);
        assert_eq!(store.sessions_ended(), 1);
    }

    #[tokio::test]
    async fn duplicate_email_in_any_case_is_conflict_without_writes() {
        let store = MemoryStore::new();
        let svc = service(&store);
        svc.register(input("ada@acme.example")).await.unwrap();

        let err = svc.register(input("ADA@Acme.Example")).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Conflict(_)));
        assert_eq!(store.users().await.len(), 1);
        assert_eq!(store.businesses().await.len(), 1);
        // rejected before a session was opened
        assert_eq!(store.sessions_started(), 1);
    }

    #[tokio::test]
    async fn failed_business_insert_leaves_nothing_behind() {
        let store = MemoryStore::new();
        store.fail_next_business_insert();
        let err = service(&store).register(input("ada@acme.example")).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Persistence(_)));
        assert!(store.users().await.is_empty());
        assert!(store.businesses().await.is_empty());
        assert_eq!(store.sessions_ended(), store.sessions_started());
        assert_eq!(store.open_sessions(), 0);
    }

    #[tokio::test]
    async fn failed_commit_is_reported_as_failure() {
        let store = MemoryStore::new();
        store.fail_next_commit();
        let err = service(&store).register(input("ada@acme.example")).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Persistence(_)));
        assert!(store.users().await.is_empty());
        assert_eq!(store.commits(), 0);
        assert_eq!(store.sessions_ended(), 1);
    }

    #[tokio::test]
    async fn slow_transaction_times_out_and_releases_session() {
        let store = MemoryStore::new();
        store.set_insert_delay(Duration::from_millis(200));
        let svc = RegistrationService::new(
            Arc::new(store.clone()),
            Passwords::new(64, 1, 1).unwrap(),
            RegistrationConfig { min_password_length: 8, transaction_timeout: Duration::from_millis(50) },
        );
        let err = svc.register(input("ada@acme.example")).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Persistence(ref m) if m.contains("timed out")));
        assert!(store.users().await.is_empty());
        assert_eq!(store.sessions_ended(), 1);
        assert_eq!(store.open_sessions(), 0);
    }

    #[tokio::test]
    async fn slow_commit_is_not_cut_short_by_the_timeout() {
        let store = MemoryStore::new();
        store.set_commit_delay(Duration::from_millis(150));
        let svc = RegistrationService::new(
            Arc::new(store.clone()),
            Passwords::new(64, 1, 1).unwrap(),
            RegistrationConfig { min_password_length: 8, transaction_timeout: Duration::from_millis(50) },
        );
        let business = svc.register(input("ada@acme.example")).await.unwrap();
        assert_eq!(store.businesses().await, vec![business]);
        assert_eq!(store.users().await.len(), 1);
        assert_eq!(store.commits(), 1);
        assert_eq!(store.sessions_ended(), 1);
    }

    #[tokio::test]
    async fn invalid_input_never_opens_a_session() {
        let store = MemoryStore::new();
        let bad = RegisterBusinessInput { confirm_password: "other".into(), ..input("ada@acme.example") };
        let err = service(&store).register(bad).await.unwrap_err();
        match err {
            DirectoryError::Validation(errs) => assert!(errs.has("confirmPassword")),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(store.sessions_started(), 0);
    }

    #[tokio::test]
    async fn concurrent_distinct_emails_all_succeed() {
        let store = MemoryStore::new();
        let svc = Arc::new(service(&store));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let svc = Arc::clone(&svc);
                tokio::spawn(async move { svc.register(input(&format!("owner{}@acme.example", i))).await })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let users = store.users().await;
        let businesses = store.businesses().await;
        assert_eq!(users.len(), 8);
        assert_eq!(businesses.len(), 8);
        for b in &businesses {
            let owner = users.iter().find(|u| u.id == b.owner_id).unwrap();
            assert_eq!(owner.email, b.email);
        }
        assert_eq!(store.sessions_ended(), store.sessions_started());
    }

    #[tokio::test]
    async fn concurrent_same_email_has_one_winner() {
        let store = MemoryStore::new();
        store.set_insert_delay(Duration::from_millis(5));
        let svc = Arc::new(service(&store));
        let handles: Vec<_> = (0..6)
            .map(|i| {
                let svc = Arc::clone(&svc);
                let email = if i % 2 == 0 { "race@acme.example" } else { "RACE@acme.example" };
                tokio::spawn(async move { svc.register(input(email)).await })
            })
            .collect();

        let mut ok = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => ok += 1,
                Err(e) => assert!(matches!(e, DirectoryError::Conflict(_)), "unexpected {:?}", e),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(store.users().await.len(), 1);
        assert_eq!(store.businesses().await.len(), 1);
        assert_eq!(store.sessions_ended(), store.sessions_started());
    }
}
