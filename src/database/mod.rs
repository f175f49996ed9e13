pub mod manager;
pub mod models;
pub mod seed;

pub use manager::{DatabaseError, DatabaseManager};
