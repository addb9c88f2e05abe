use chrono::Utc;
use sea_orm::entity::prelude::*;
use sweetshop_core::SweetItem;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sweets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub quantity: i32,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for SweetItem {
    fn from(sweet: Model) -> Self {
        SweetItem {
            id: sweet.id,
            name: sweet.name,
            category: sweet.category,
            price: sweet.price,
            quantity: sweet.quantity,
            description: sweet.description,
            image_url: sweet.image_url,
            created_at: sweet.created_at,
            updated_at: sweet.updated_at,
        }
    }
}
