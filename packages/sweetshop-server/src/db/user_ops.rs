use crate::db::users::{self, Entity as Users, Model as UserModel};
use crate::error::AppError;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use sweetshop_core::Role;

pub(crate) const DEFAULT_PAGE_LIMIT: u64 = 10;
pub(crate) const MAX_PAGE_LIMIT: u64 = 100;

#[derive(Debug, Clone)]
pub(crate) struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct UserFilter {
    pub search: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Page {
    /// `limit` 最大为 100
    pub(crate) fn new(limit: u64, offset: u64) -> Self {
        Self {
            limit: limit.min(MAX_PAGE_LIMIT),
            offset,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT, 0)
    }
}

pub(crate) async fn insert(db: &DatabaseConnection, user: NewUser) -> Result<UserModel, AppError> {
    let model = users::ActiveModel {
        id: ActiveValue::NotSet,
        email: Set(user.email),
        password: Set(user.password),
        name: Set(user.name),
        role: Set(user.role),
        created_at: Set(Utc::now()),
    };

    model.insert(db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::EmailTaken,
        _ => AppError::Db(e),
    })
}

pub(crate) async fn find_by_id(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<UserModel>, AppError> {
    Ok(Users::find_by_id(id).one(db).await?)
}

pub(crate) async fn find_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<UserModel>, AppError> {
    Ok(Users::find()
        .filter(users::Column::Email.eq(email))
        .one(db)
        .await?)
}

pub(crate) async fn list(
    db: &DatabaseConnection,
    filter: &UserFilter,
    page: Page,
) -> Result<Vec<UserModel>, AppError> {
    let mut query = Users::find();
    if let Some(search) = &filter.search {
        query = query.filter(
            Condition::any()
                .add(users::Column::Name.contains(search))
                .add(users::Column::Email.contains(search)),
        );
    }
    if let Some(role) = filter.role {
        query = query.filter(users::Column::Role.eq(role));
    }

    Ok(query
        .order_by_asc(users::Column::Id)
        .limit(page.limit)
        .offset(page.offset)
        .all(db)
        .await?)
}

pub(crate) async fn update_role(
    db: &DatabaseConnection,
    id: i32,
    role: Role,
) -> Result<Option<UserModel>, AppError> {
    let Some(existing) = find_by_id(db, id).await? else {
        return Ok(None);
    };

    let mut active = existing.into_active_model();
    active.role = Set(role);
    Ok(Some(active.update(db).await?))
}

/// 删除用户并返回被删除的记录
pub(crate) async fn delete_by_id(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<UserModel>, AppError> {
    let Some(existing) = find_by_id(db, id).await? else {
        return Ok(None);
    };

    let result = Users::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Ok(None);
    }
    Ok(Some(existing))
}

#[cfg(test)]
pub(crate) async fn insert_test_user(db: &DatabaseConnection, email: &str, role: Role) -> UserModel {
    insert(
        db,
        NewUser {
            email: email.to_string(),
            password: "not-a-real-hash".to_string(),
            name: email.split('@').next().unwrap_or(email).to_string(),
            role,
        },
    )
    .await
    .unwrap()
}
