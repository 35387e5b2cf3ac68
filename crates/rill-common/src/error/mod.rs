//! Unified error handling for RillDB.

mod database;

pub use database::{ErrorCode, RillError, RillResult};
