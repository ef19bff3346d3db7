pub mod app_config;
pub mod booking_repo;
pub mod catalog_repo;
pub mod database;
pub mod redis_cache;

pub use booking_repo::PgBookingStore;
pub use catalog_repo::CatalogRepository;
pub use database::DbClient;
pub use redis_cache::RedisCache;
