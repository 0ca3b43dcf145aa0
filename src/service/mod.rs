pub mod auth;
pub mod ledger_actor;
pub mod screening;
pub mod statement_pdf;
pub mod statements;
