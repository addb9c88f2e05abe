use crate::db::sweets::{self, Entity as Sweets, Model as SweetModel};
use crate::error::AppError;
use chrono::Utc;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};

/// 已校验的新商品
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NewSweet {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub quantity: i32,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// 已校验的部分更新，`None` 表示不修改
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SweetChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i32>,
    pub description: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
}

/// 已解析的搜索条件
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SweetSearch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

pub(crate) async fn list_all(db: &DatabaseConnection) -> Result<Vec<SweetModel>, AppError> {
    Ok(Sweets::find()
        .order_by_asc(sweets::Column::Id)
        .all(db)
        .await?)
}

pub(crate) async fn search(
    db: &DatabaseConnection,
    filters: &SweetSearch,
) -> Result<Vec<SweetModel>, AppError> {
    let mut query = Sweets::find();
    if let Some(name) = &filters.name {
        query = query.filter(sweets::Column::Name.contains(name));
    }
    if let Some(category) = &filters.category {
        query = query.filter(sweets::Column::Category.contains(category));
    }
    if let Some(min_price) = filters.min_price {
        query = query.filter(sweets::Column::Price.gte(min_price));
    }
    if let Some(max_price) = filters.max_price {
        query = query.filter(sweets::Column::Price.lte(max_price));
    }

    Ok(query.order_by_asc(sweets::Column::Id).all(db).await?)
}

pub(crate) async fn find_by_id(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<SweetModel>, AppError> {
    Ok(Sweets::find_by_id(id).one(db).await?)
}

pub(crate) async fn insert(db: &DatabaseConnection, sweet: NewSweet) -> Result<SweetModel, AppError> {
    let now = Utc::now();
    let model = sweets::ActiveModel {
        id: ActiveValue::NotSet,
        name: Set(sweet.name),
        category: Set(sweet.category),
        price: Set(sweet.price),
        quantity: Set(sweet.quantity),
        description: Set(sweet.description),
        image_url: Set(sweet.image_url),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(model.insert(db).await?)
}

/// 只修改提供的字段，`updated_at` 每次都会刷新
pub(crate) async fn update(
    db: &DatabaseConnection,
    id: i32,
    changes: SweetChanges,
) -> Result<Option<SweetModel>, AppError> {
    let Some(existing) = find_by_id(db, id).await? else {
        return Ok(None);
    };

    let mut active = existing.into_active_model();
    if let Some(name) = changes.name {
        active.name = Set(name);
    }
    if let Some(category) = changes.category {
        active.category = Set(category);
    }
    if let Some(price) = changes.price {
        active.price = Set(price);
    }
    if let Some(quantity) = changes.quantity {
        active.quantity = Set(quantity);
    }
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if let Some(image_url) = changes.image_url {
        active.image_url = Set(image_url);
    }
    active.updated_at = Set(Utc::now());

    Ok(Some(active.update(db).await?))
}

pub(crate) async fn delete_by_id(db: &DatabaseConnection, id: i32) -> Result<bool, AppError> {
    let result = Sweets::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

/// 条件扣减库存：仅当库存充足时才生效，返回写入后的记录
///
/// 单条 UPDATE ... RETURNING 完成判断与写入，并发购买不会把库存扣成负数。
pub(crate) async fn decrement_quantity(
    db: &DatabaseConnection,
    id: i32,
    amount: i32,
) -> Result<Option<SweetModel>, AppError> {
    let updated = Sweets::update_many()
        .col_expr(
            sweets::Column::Quantity,
            Expr::col(sweets::Column::Quantity).sub(amount),
        )
        .col_expr(sweets::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(sweets::Column::Id.eq(id))
        .filter(sweets::Column::Quantity.gte(amount))
        .exec_with_returning(db)
        .await?;
    Ok(updated.into_iter().next())
}

/// 原子增加库存，结果不能超过 `i32::MAX`
pub(crate) async fn increment_quantity(
    db: &DatabaseConnection,
    id: i32,
    amount: i32,
) -> Result<Option<SweetModel>, AppError> {
    let updated = Sweets::update_many()
        .col_expr(
            sweets::Column::Quantity,
            Expr::col(sweets::Column::Quantity).add(amount),
        )
        .col_expr(sweets::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(sweets::Column::Id.eq(id))
        .filter(sweets::Column::Quantity.lte(i32::MAX - amount))
        .exec_with_returning(db)
        .await?;
    Ok(updated.into_iter().next())
}

#[cfg(test)]
pub(crate) fn ladoo() -> NewSweet {
    NewSweet {
        name: "Ladoo".to_string(),
        category: "Indian Sweet".to_string(),
        price: 10.0,
        quantity: 5,
        description: None,
        image_url: None,
    }
}
