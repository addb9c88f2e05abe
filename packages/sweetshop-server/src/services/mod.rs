pub mod auth;
pub(crate) mod catalog;
pub(crate) mod inventory;
