pub mod auth;
pub mod loans;
pub mod plaid;
pub mod statements;
pub mod system;
pub mod todos;
pub mod transactions;
