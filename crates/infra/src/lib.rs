pub mod models;
pub mod repos;
pub mod store;
