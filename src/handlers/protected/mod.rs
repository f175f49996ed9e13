pub mod auth;
pub mod donations;
pub mod events;
pub mod grace;
pub mod institutions;
pub mod notifications;
pub mod reports;
