pub mod credentials;
pub mod events;
pub mod grace;
pub mod otp;
pub mod payments;
pub mod reports;
