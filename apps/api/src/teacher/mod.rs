//! Teacher roster management and survey uploads.

pub mod handlers;
