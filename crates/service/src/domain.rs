use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role granted to the owner created by a business registration.
pub const BUSINESS_OWNER_ROLE: &str = "business";
pub const ADMIN_ROLE: &str = "admin";

/// Stored user. `password_hash` never leaves the service crate in responses.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self { id: u.id, email: u.email, name: u.name, roles: u.roles, created_at: u.created_at }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub description: String,
    pub website: String,
    pub phone: String,
    pub email: String,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub owner_job_title: String,
    pub created_at: DateTime<Utc>,
}

/// Authenticated identity reconstructed from a verified token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub roles: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

impl Principal {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl From<models::user::Model> for User {
    fn from(m: models::user::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            name: m.name,
            password_hash: m.password_hash,
            roles: m.roles,
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<User> for models::user::Model {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            password_hash: u.password_hash,
            roles: u.roles,
            created_at: u.created_at.into(),
            updated_at: u.updated_at.into(),
        }
    }
}

impl From<models::business::Model> for Business {
    fn from(m: models::business::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            category_id: m.category_id,
            description: m.description,
            website: m.website,
            phone: m.phone,
            email: m.email,
            owner_id: m.owner_id,
            owner_name: m.owner_name,
            owner_job_title: m.owner_job_title,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

impl From<Business> for models::business::Model {
    fn from(b: Business) -> Self {
        Self {
            id: b.id,
            name: b.name,
            category_id: b.category_id,
            description: b.description,
            website: b.website,
            phone: b.phone,
            email: b.email,
            owner_id: b.owner_id,
            owner_name: b.owner_name,
            owner_job_title: b.owner_job_title,
            created_at: b.created_at.into(),
        }
    }
}
