use super::models::{DbTransaction, NewTransaction, TransactionKind, UserId};
use super::sqlite::BridgeStorage;
use crate::error::BridgeError;
use chrono::Utc;
use sqlx::SqliteConnection;

const INSERT_TRANSACTION: &str = r#"
    INSERT INTO transactions (
        user_id, date, description, amount, transaction_type, ai_verified, created_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?)
    RETURNING id, user_id, date, description, amount, transaction_type, ai_verified, created_at
"#;

/// Insert rows on an open connection or transaction. Returns rows in input order.
pub(super) async fn insert_rows(
    conn: &mut SqliteConnection,
    user_id: UserId,
    items: Vec<NewTransaction>,
) -> Result<Vec<DbTransaction>, sqlx::Error> {
    let mut rows = Vec::with_capacity(items.len());
    let now = Utc::now();
    for txn in items {
        let row = sqlx::query_as::<_, DbTransaction>(INSERT_TRANSACTION)
            .bind(user_id)
            .bind(txn.date)
            .bind(txn.description)
            .bind(txn.amount)
            .bind(TransactionKind::from_amount(txn.amount))
            .bind(txn.ai_verified)
            .bind(now)
            .fetch_one(&mut *conn)
            .await?;
        rows.push(row);
    }
    Ok(rows)
}

impl BridgeStorage {
    pub async fn insert_transaction(
        &self,
        user_id: UserId,
        txn: NewTransaction,
    ) -> Result<DbTransaction, BridgeError> {
        let row = sqlx::query_as::<_, DbTransaction>(INSERT_TRANSACTION)
            .bind(user_id)
            .bind(txn.date)
            .bind(txn.description)
            .bind(txn.amount)
            .bind(TransactionKind::from_amount(txn.amount))
            .bind(txn.ai_verified)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list_transactions(
        &self,
        user_id: UserId,
    ) -> Result<Vec<DbTransaction>, BridgeError> {
        let rows = sqlx::query_as::<_, DbTransaction>(
            r#"SELECT id, user_id, date, description, amount, transaction_type, ai_verified, created_at
               FROM transactions WHERE user_id = ? ORDER BY date, id"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Sum of every transaction amount recorded for the user.
    pub async fn user_balance(&self, user_id: UserId) -> Result<f64, BridgeError> {
        let total: Option<f64> =
            sqlx::query_scalar("SELECT SUM(amount) FROM transactions WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(total.unwrap_or(0.0))
    }
}
