//! Domain operations of the Little Lemon ordering backend.
//!
//! Every operation is generic over a SeaORM connection, so the same code runs
//! against the server's pool, a transaction, or an in-memory SQLite database
//! in tests. Authorization decisions are taken here, from a [`Caller`]
//! resolved by the HTTP layer.

mod error;

pub mod account;
pub mod cart;
pub mod catalog;
pub mod group;
pub mod order;
pub mod role;

pub use error::{Result, ServiceError};
pub use role::{Caller, Role};
pub use sea_orm;
