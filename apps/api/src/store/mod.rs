//! Database queries, grouped by table. Handlers never embed SQL directly.
//!
//! Functions that run inside an upload transaction are generic over
//! `PgExecutor`; everything else takes the pool.

pub mod files;
pub mod insights;
pub mod links;
pub mod profiles;
pub mod users;
