pub mod auth;
pub mod catalog;
pub mod inventory;
pub mod movies;
pub mod rbac;
pub mod users;
