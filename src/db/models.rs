use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

pub type UserId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Lender,
    Borrower,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbUser {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

impl TransactionKind {
    pub fn from_amount(amount: f64) -> Self {
        if amount < 0.0 {
            TransactionKind::Withdrawal
        } else {
            TransactionKind::Deposit
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbTransaction {
    pub id: i64,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub transaction_type: TransactionKind,
    pub ai_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; `transaction_type` is derived from the amount sign.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub ai_verified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    UnderContract,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbLoanAgreement {
    pub id: i64,
    pub lender_id: UserId,
    pub borrower_id: UserId,
    pub terms: String,
    pub status: LoanStatus,
    pub ai_flagged: bool,
    pub locked: bool,
    pub violation_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbTodo {
    pub id: i64,
    pub content: String,
    pub completed: bool,
    pub user_id: UserId,
}

/// Plaid item linked to one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkedItem {
    pub user_id: UserId,
    #[serde(skip_serializing)]
    pub access_token: String,
    pub item_id: String,
    pub ach_details: Vec<Value>,
    pub updated_at: DateTime<Utc>,
}
