pub(crate) mod api;
pub(crate) mod auth;
pub(crate) mod index;
