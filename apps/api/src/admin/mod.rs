//! Administrator dashboards, profile maintenance and psychometric batch uploads.

pub mod handlers;
pub mod psychometric;
