pub mod json_store;
pub mod repository;
pub mod schema;
