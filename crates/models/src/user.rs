use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

use crate::business;
use crate::errors::ModelError;

/// Owner account. `email` is always stored lowercased.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub roles: Vec<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "business::Entity")]
    Business,
}

impl Related<business::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Business.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Lowercase and trim an address the way it is stored.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(id).one(db).await?)
}

/// Case-insensitive lookup; relies on the stored value being lowercased.
pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::Email.eq(normalize_email(email)))
        .one(db)
        .await?)
}

/// Insert a user row; a clash on the email constraint maps to `ModelError::Duplicate`.
pub async fn insert<C: ConnectionTrait>(db: &C, user: Model) -> Result<Model, ModelError> {
    let am = ActiveModel {
        id: Set(user.id),
        email: Set(normalize_email(&user.email)),
        name: Set(user.name),
        password_hash: Set(user.password_hash),
        roles: Set(user.roles),
        created_at: Set(user.created_at),
        updated_at: Set(user.updated_at),
    };
    Ok(am.insert(db).await?)
}
