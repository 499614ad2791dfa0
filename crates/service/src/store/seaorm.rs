use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, IsolationLevel, TransactionTrait,
};
use tracing::warn;
use uuid::Uuid;

use models::errors::ModelError;

use super::{DirectoryStore, ReadConcern, StoreError, StoreSession, TransactionOptions, WriteConcern};
use crate::domain::{Business, User};

impl From<ModelError> for StoreError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Duplicate(detail) => StoreError::Duplicate(detail),
            ModelError::Db(msg) => StoreError::Backend(msg),
        }
    }
}

fn backend(e: sea_orm::DbErr) -> StoreError {
    StoreError::from(ModelError::from(e))
}

/// PostgreSQL-backed store.
pub struct SeaOrmStore {
    pub db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DirectoryStore for SeaOrmStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(models::user::find_by_id(&self.db, id).await?.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(models::user::find_by_email(&self.db, email).await?.map(User::from))
    }

    async fn find_business(&self, id: Uuid) -> Result<Option<Business>, StoreError> {
        Ok(models::business::find_by_id(&self.db, id).await?.map(Business::from))
    }

    async fn find_business_by_email(&self, email: &str) -> Result<Option<Business>, StoreError> {
        Ok(models::business::find_by_email(&self.db, email).await?.map(Business::from))
    }

    async fn start_session(&self) -> Result<Box<dyn StoreSession>, StoreError> {
        Ok(Box::new(SeaOrmSession { db: self.db.clone(), txn: None }))
    }
}

/// Session over a pooled connection; the transaction, once begun, pins one
/// connection until commit or rollback.
pub struct SeaOrmSession {
    db: DatabaseConnection,
    txn: Option<DatabaseTransaction>,
}

fn isolation_for(read: ReadConcern) -> IsolationLevel {
    match read {
        ReadConcern::Local | ReadConcern::Majority => IsolationLevel::ReadCommitted,
        ReadConcern::Snapshot => IsolationLevel::RepeatableRead,
    }
}

fn synchronous_commit_for(write: WriteConcern) -> &'static str {
    match write {
        // waits for synchronous standbys to apply, or local flush when none are configured
        WriteConcern::Majority => "remote_apply",
        WriteConcern::Acknowledged => "local",
    }
}

impl SeaOrmSession {
    fn txn(&self) -> Result<&DatabaseTransaction, StoreError> {
        self.txn.as_ref().ok_or(StoreError::NoTransaction)
    }
}

#[async_trait]
impl StoreSession for SeaOrmSession {
    async fn start_transaction(&mut self, options: &TransactionOptions) -> Result<(), StoreError> {
        if self.txn.is_some() {
            return Err(StoreError::TransactionInProgress);
        }
        let txn = self
            .db
            .begin_with_config(Some(isolation_for(options.read_concern)), None)
            .await
            .map_err(backend)?;
        txn.execute_unprepared(&format!(
            "SET LOCAL synchronous_commit TO '{}'",
            synchronous_commit_for(options.write_concern)
        ))
        .await
        .map_err(backend)?;
        if let Some(max) = options.max_duration {
            txn.execute_unprepared(&format!("SET LOCAL statement_timeout = {}", max.as_millis()))
                .await
                .map_err(backend)?;
        }
        self.txn = Some(txn);
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }

    async fn insert_user(&mut self, user: &User) -> Result<Uuid, StoreError> {
        let created = models::user::insert(self.txn()?, user.clone().into()).await?;
        Ok(created.id)
    }

    async fn insert_business(&mut self, business: &Business) -> Result<Uuid, StoreError> {
        let created = models::business::insert(self.txn()?, business.clone().into()).await?;
        Ok(created.id)
    }

    async fn commit_transaction(&mut self) -> Result<(), StoreError> {
        let txn = self.txn.take().ok_or(StoreError::NoTransaction)?;
        txn.commit().await.map_err(backend)
    }

    async fn abort_transaction(&mut self) -> Result<(), StoreError> {
        match self.txn.take() {
            Some(txn) => txn.rollback().await.map_err(backend),
            None => Ok(()),
        }
    }

    async fn end_session(self: Box<Self>) {
        if let Some(txn) = self.txn {
            if let Err(e) = txn.rollback().await {
                warn!(error = %e, "rollback on session end failed");
            }
        }
    }
}
