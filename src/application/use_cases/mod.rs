pub mod articles;
pub mod interactions;
