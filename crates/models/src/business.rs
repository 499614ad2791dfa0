use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::user;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "business")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
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
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "user::Entity",
        from = "Column::OwnerId",
        to = "user::Column::Id"
    )]
    Owner,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(id).one(db).await?)
}

pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::Email.eq(user::normalize_email(email)))
        .one(db)
        .await?)
}

pub async fn insert<C: ConnectionTrait>(db: &C, business: Model) -> Result<Model, ModelError> {
    let am = ActiveModel {
        id: Set(business.id),
        name: Set(business.name),
        category_id: Set(business.category_id),
        description: Set(business.description),
        website: Set(business.website),
        phone: Set(business.phone),
        email: Set(user::normalize_email(&business.email)),
        owner_id: Set(business.owner_id),
        owner_name: Set(business.owner_name),
        owner_job_title: Set(business.owner_job_title),
        created_at: Set(business.created_at),
    };
    Ok(am.insert(db).await?)
}
