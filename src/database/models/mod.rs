pub mod account;
pub mod donation;
pub mod event;
pub mod grace;
pub mod institution;
pub mod notification;
