pub mod user_repo;
pub use user_repo::UserRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod movie_repo;
pub use movie_repo::MovieRepository;
