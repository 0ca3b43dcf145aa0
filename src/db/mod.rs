//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: pool setup and user queries
//! - `transactions.rs`, `loans.rs`, `todos.rs`, `items.rs`, `ledger.rs`:
//!   per-table queries on the same `BridgeStorage` handle

pub mod items;
pub mod ledger;
pub mod loans;
pub mod models;
pub mod schema;
pub mod sqlite;
pub mod todos;
pub mod transactions;

pub use models::{
    DbLoanAgreement, DbTodo, DbTransaction, DbUser, LinkedItem, LoanStatus, NewTransaction, Role,
    TransactionKind, UserId,
};
pub use schema::SQLITE_INIT;
pub use sqlite::{BridgeStorage, SqlitePool};
