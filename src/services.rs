pub mod auth;
pub mod catalog_service;
pub mod inventory_service;
pub mod movie_service;
pub mod rbac_service;
pub mod user_service;
