use super::models::{DbTransaction, NewTransaction, UserId};
use super::sqlite::BridgeStorage;
use super::transactions::insert_rows;
use crate::error::BridgeError;

impl BridgeStorage {
    /// Read the reserve balance, seeding the single ledger row on first run.
    pub async fn load_or_seed_reserve(&self, initial: f64) -> Result<f64, BridgeError> {
        sqlx::query("INSERT OR IGNORE INTO ledger (id, balance) VALUES (1, ?)")
            .bind(initial)
            .execute(&self.pool)
            .await?;
        let balance: f64 = sqlx::query_scalar("SELECT balance FROM ledger WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(balance)
    }

    /// Store imported statement rows and the resulting reserve balance in one
    /// SQL transaction; either both land or neither does.
    pub async fn import_statement(
        &self,
        user_id: UserId,
        items: Vec<NewTransaction>,
        reserve: f64,
    ) -> Result<Vec<DbTransaction>, BridgeError> {
        let mut tx = self.pool.begin().await?;
        let rows = insert_rows(&mut tx, user_id, items).await?;
        sqlx::query("UPDATE ledger SET balance = ? WHERE id = 1")
            .bind(reserve)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(rows)
    }
}
