pub mod auth;

pub use auth::{jwt_auth_middleware, AuthAccount};
