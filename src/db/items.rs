use super::models::{LinkedItem, UserId};
use super::sqlite::BridgeStorage;
use crate::error::BridgeError;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

impl BridgeStorage {
    /// Upsert by user; a user keeps at most one linked Plaid item.
    pub async fn upsert_linked_item(
        &self,
        user_id: UserId,
        access_token: &str,
        item_id: &str,
        ach_details: &[Value],
    ) -> Result<(), BridgeError> {
        let ach_json = serde_json::to_string(ach_details)?;
        sqlx::query(
            r#"
            INSERT INTO linked_items (user_id, access_token, item_id, ach_details, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                access_token=excluded.access_token,
                item_id=excluded.item_id,
                ach_details=excluded.ach_details,
                updated_at=excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(access_token)
        .bind(item_id)
        .bind(ach_json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_linked_item(&self, user_id: UserId) -> Result<Option<LinkedItem>, BridgeError> {
        let row = sqlx::query(
            r#"SELECT user_id, access_token, item_id, ach_details, updated_at
               FROM linked_items WHERE user_id = ?"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_linked_item).transpose()
    }

    fn row_to_linked_item(row: SqliteRow) -> Result<LinkedItem, BridgeError> {
        let user_id: UserId = row.try_get("user_id")?;
        let access_token: String = row.try_get("access_token")?;
        let item_id: String = row.try_get("item_id")?;
        let ach_json: String = row.try_get("ach_details")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

        let ach_details: Vec<Value> =
            serde_json::from_str(&ach_json).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(LinkedItem {
            user_id,
            access_token,
            item_id,
            ach_details,
            updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Role;
    use serde_json::json;

    #[tokio::test]
    async fn relinking_replaces_the_item() {
        let storage = BridgeStorage::connect("sqlite::memory:").await.unwrap();
        let user = storage.create_user("u", "h", Role::User).await.unwrap();
        assert!(storage.get_linked_item(user.id).await.unwrap().is_none());

        storage
            .upsert_linked_item(user.id, "access-1", "item-1", &[])
            .await
            .unwrap();
        let ach = vec![json!({"account": "1111", "routing": "011401533"})];
        storage
            .upsert_linked_item(user.id, "access-2", "item-2", &ach)
            .await
            .unwrap();

        let item = storage.get_linked_item(user.id).await.unwrap().unwrap();
        assert_eq!(item.access_token, "access-2");
        assert_eq!(item.item_id, "item-2");
        assert_eq!(item.ach_details, ach);
    }
}
