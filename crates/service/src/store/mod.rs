//! Persistence seam for the directory.
//!
//! Reads go straight to the store; writes that must land together go through
//! a [`StoreSession`] with an explicit transaction.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Business, User};

pub mod memory;
pub mod seaorm;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("duplicate value for {0}")]
    Duplicate(String),
    #[error("no active transaction")]
    NoTransaction,
    #[error("transaction already in progress")]
    TransactionInProgress,
    #[error("{0}")]
    Backend(String),
}

/// Visibility guarantee for reads inside a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadConcern {
    Local,
    /// Only data acknowledged by a majority of replicas.
    Majority,
    Snapshot,
}

/// Durability guarantee required before a commit is acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteConcern {
    Acknowledged,
    /// Survives the loss of a single node in a replicated deployment.
    Majority,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOptions {
    pub read_concern: ReadConcern,
    pub write_concern: WriteConcern,
    pub max_duration: Option<Duration>,
}

impl TransactionOptions {
    pub fn majority(max_duration: Duration) -> Self {
        Self {
            read_concern: ReadConcern::Majority,
            write_concern: WriteConcern::Majority,
            max_duration: Some(max_duration),
        }
    }
}

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    /// Case-insensitive match on the stored (lowercased) address.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_business(&self, id: Uuid) -> Result<Option<Business>, StoreError>;
    async fn find_business_by_email(&self, email: &str) -> Result<Option<Business>, StoreError>;
    async fn start_session(&self) -> Result<Box<dyn StoreSession>, StoreError>;
}

/// A unit of isolation for multi-document writes.
///
/// Dropping a session while a transaction is active discards its writes.
#[async_trait]
pub trait StoreSession: Send {
    async fn start_transaction(&mut self, options: &TransactionOptions) -> Result<(), StoreError>;
    fn in_transaction(&self) -> bool;
    /// Returns the id the user was stored under.
    async fn insert_user(&mut self, user: &User) -> Result<Uuid, StoreError>;
    async fn insert_business(&mut self, business: &Business) -> Result<Uuid, StoreError>;
    /// On failure the transaction is over and nothing it wrote is visible.
    async fn commit_transaction(&mut self) -> Result<(), StoreError>;
    /// No-op when no transaction is active.
    async fn abort_transaction(&mut self) -> Result<(), StoreError>;
    async fn end_session(self: Box<Self>);
}
