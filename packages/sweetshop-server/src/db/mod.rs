pub(crate) mod initialize;
mod migration;
pub(crate) mod seed;
pub(crate) mod sweet_ops;
pub(crate) mod sweets;
pub(crate) mod user_ops;
pub(crate) mod users;

pub use sweets::Entity as Sweets;
pub use users::Entity as Users;
