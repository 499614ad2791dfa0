//! In-memory store for tests, doc examples and benches.
//!
//! Transactions stage writes privately and publish them atomically on commit.
//! Email uniqueness is checked both when a user is staged and again under the
//! collection lock at commit, so two sessions racing on one address cannot
//! both win.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{DirectoryStore, StoreError, StoreSession, TransactionOptions};
use crate::domain::{Business, User};

#[derive(Default)]
struct Collections {
    users: HashMap<Uuid, User>,
    businesses: HashMap<Uuid, Business>,
}

impl Collections {
    fn email_taken(&self, email: &str) -> bool {
        self.users.values().any(|u| u.email == email)
    }
}

#[derive(Default)]
struct Shared {
    data: Mutex<Collections>,
    fail_next_business_insert: AtomicBool,
    fail_next_commit: AtomicBool,
    insert_delay_ms: AtomicU64,
    commit_delay_ms: AtomicU64,
    sessions_started: AtomicUsize,
    sessions_ended: AtomicUsize,
    sessions_dropped: AtomicUsize,
    commits: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a user outside any transaction (fixtures).
    pub async fn seed_user(&self, mut user: User) -> Result<(), StoreError> {
        user.email = normalize(&user.email);
        let mut data = self.shared.data.lock().await;
        if data.email_taken(&user.email) {
            return Err(StoreError::Duplicate("email".into()));
        }
        data.users.insert(user.id, user);
        Ok(())
    }

    /// The next `insert_business` in any session fails.
    pub fn fail_next_business_insert(&self) {
        self.shared.fail_next_business_insert.store(true, Ordering::SeqCst);
    }

    /// The next `commit_transaction` in any session fails and discards its writes.
    pub fn fail_next_commit(&self) {
        self.shared.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Every insert waits this long first.
    pub fn set_insert_delay(&self, delay: Duration) {
        self.shared.insert_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Every commit waits this long before publishing.
    pub fn set_commit_delay(&self, delay: Duration) {
        self.shared.commit_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub async fn users(&self) -> Vec<User> {
        self.shared.data.lock().await.users.values().cloned().collect()
    }

    pub async fn businesses(&self) -> Vec<Business> {
        self.shared.data.lock().await.businesses.values().cloned().collect()
    }

    pub fn sessions_started(&self) -> usize {
        self.shared.sessions_started.load(Ordering::SeqCst)
    }

    /// Sessions closed through `end_session`.
    pub fn sessions_ended(&self) -> usize {
        self.shared.sessions_ended.load(Ordering::SeqCst)
    }

    /// Sessions started and not yet dropped.
    pub fn open_sessions(&self) -> usize {
        self.sessions_started() - self.shared.sessions_dropped.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.shared.commits.load(Ordering::SeqCst)
    }
}

fn normalize(email: &str) -> String {
    models::user::normalize_email(email)
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.shared.data.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = normalize(email);
        let data = self.shared.data.lock().await;
        Ok(data.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_business(&self, id: Uuid) -> Result<Option<Business>, StoreError> {
        Ok(self.shared.data.lock().await.businesses.get(&id).cloned())
    }

    async fn find_business_by_email(&self, email: &str) -> Result<Option<Business>, StoreError> {
        let email = normalize(email);
        let data = self.shared.data.lock().await;
        Ok(data.businesses.values().find(|b| normalize(&b.email) == email).cloned())
    }

    async fn start_session(&self) -> Result<Box<dyn StoreSession>, StoreError> {
        self.shared.sessions_started.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession { shared: Arc::clone(&self.shared), staged: None }))
    }
}

#[derive(Default)]
struct Staged {
    users: Vec<User>,
    businesses: Vec<Business>,
}

pub struct MemorySession {
    shared: Arc<Shared>,
    staged: Option<Staged>,
}

impl MemorySession {
    async fn delay(&self) {
        pause(&self.shared.insert_delay_ms).await;
    }
}

async fn pause(ms: &AtomicU64) {
    let ms = ms.load(Ordering::SeqCst);
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn start_transaction(&mut self, _options: &TransactionOptions) -> Result<(), StoreError> {
        if self.staged.is_some() {
            return Err(StoreError::TransactionInProgress);
        }
        self.staged = Some(Staged::default());
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.staged.is_some()
    }

    async fn insert_user(&mut self, user: &User) -> Result<Uuid, StoreError> {
        self.delay().await;
        let mut user = user.clone();
        user.email = normalize(&user.email);
        let taken = self.shared.data.lock().await.email_taken(&user.email);
        let staged = self.staged.as_mut().ok_or(StoreError::NoTransaction)?;
        if taken || staged.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email".into()));
        }
        let id = user.id;
        staged.users.push(user);
        Ok(id)
    }

    async fn insert_business(&mut self, business: &Business) -> Result<Uuid, StoreError> {
        self.delay().await;
        if self.shared.fail_next_business_insert.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("business insert failed".into()));
        }
        let owner_committed = self.shared.data.lock().await.users.contains_key(&business.owner_id);
        let staged = self.staged.as_mut().ok_or(StoreError::NoTransaction)?;
        if !owner_committed && !staged.users.iter().any(|u| u.id == business.owner_id) {
            return Err(StoreError::Backend(format!("owner {} does not exist", business.owner_id)));
        }
        staged.businesses.push(business.clone());
        Ok(business.id)
    }

    async fn commit_transaction(&mut self) -> Result<(), StoreError> {
        let staged = self.staged.take().ok_or(StoreError::NoTransaction)?;
        pause(&self.shared.commit_delay_ms).await;
        if self.shared.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("commit failed".into()));
        }
        let mut data = self.shared.data.lock().await;
        if staged.users.iter().any(|u| data.email_taken(&u.email)) {
            return Err(StoreError::Duplicate("email".into()));
        }
        for u in staged.users {
            data.users.insert(u.id, u);
        }
        for b in staged.businesses {
            data.businesses.insert(b.id, b);
        }
        self.shared.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn abort_transaction(&mut self) -> Result<(), StoreError> {
        self.staged = None;
        Ok(())
    }

    async fn end_session(self: Box<Self>) {
        self.shared.sessions_ended.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.shared.sessions_dropped.fetch_add(1, Ordering::SeqCst);
    }
}
