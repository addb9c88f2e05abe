use chrono::Utc;
use sea_orm::entity::prelude::*;
use sweetshop_core::{PublicUser, Role};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    pub created_at: chrono::DateTime<Utc>,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PublicUser {
    fn from(user: Model) -> Self {
        PublicUser {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            created_at: user.created_at,
        }
    }
}
