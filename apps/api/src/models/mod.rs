pub mod insight;
pub mod profile;
pub mod upload;
pub mod user;
