//! Read-side lookups over businesses and their owners.

use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::domain::{Business, UserView};
use crate::errors::DirectoryError;
use crate::store::DirectoryStore;

pub struct DirectoryService {
    store: Arc<dyn DirectoryStore>,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn get_business(&self, id: Uuid) -> Result<Business, DirectoryError> {
        self.store
            .find_business(id)
            .await?
            .ok_or_else(|| DirectoryError::not_found("business"))
    }

    #[instrument(skip(self))]
    pub async fn find_business_by_email(&self, email: &str) -> Result<Business, DirectoryError> {
        self.store
            .find_business_by_email(email)
            .await?
            .ok_or_else(|| DirectoryError::not_found("business"))
    }

    /// Never exposes the password hash.
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> Result<UserView, DirectoryError> {
        self.store
            .find_user(id)
            .await?
            .map(UserView::from)
            .ok_or_else(|| DirectoryError::not_found("user"))
    }
}
