//! Persistence gateway. Every call is bounded by [`crate::db::QUERY_TIMEOUT`]
//! and each write commits on its own.

pub mod customers;
pub mod orders;
pub mod tokens;
pub mod transactions;
pub mod users;
pub mod widgets;
