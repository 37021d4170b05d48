pub mod articles;
pub mod background;
pub mod interactions;
pub mod sms;
