use sea_orm::DatabaseConnection;
use sweetshop_core::Role;
use tracing::info;

use crate::db::user_ops::{self, NewUser};
use crate::error::AppError;
use crate::services::auth::user::hash_password;

const ADMIN_PASSWORD: &str = "admin123";
const USER_PASSWORD: &str = "user123";

const SAMPLE_USERS: &[(&str, &str, Role)] = &[
    ("superadmin@sweetshop.com", "Super Admin", Role::SuperAdmin),
    ("admin1@sweetshop.com", "Admin One", Role::Admin),
    ("admin2@sweetshop.com", "Admin Two", Role::Admin),
    ("admin3@sweetshop.com", "Admin Three", Role::Admin),
    ("user1@sweetshop.com", "Regular User One", Role::User),
    ("user2@sweetshop.com", "Regular User Two", Role::User),
];

/// 写入示例账号，已存在的邮箱会被跳过。返回新建数量。
pub(crate) async fn seed_users(db: &DatabaseConnection, bcrypt_cost: u32) -> Result<usize, AppError> {
    let admin_hash = hash_password(ADMIN_PASSWORD.to_string(), bcrypt_cost).await?;
    let user_hash = hash_password(USER_PASSWORD.to_string(), bcrypt_cost).await?;

    let mut created = 0;
    for (email, name, role) in SAMPLE_USERS {
        if user_ops::find_by_email(db, email).await?.is_some() {
            info!(email = %email, "seed user already exists, skipping");
            continue;
        }

        let password = match role {
            Role::User => user_hash.clone(),
            Role::Admin | Role::SuperAdmin => admin_hash.clone(),
        };
        user_ops::insert(
            db,
            NewUser {
                email: email.to_string(),
                password,
                name: name.to_string(),
                role: *role,
            },
        )
        .await?;
        created += 1;
    }

    info!(created, "users seeder completed");
    Ok(created)
}
