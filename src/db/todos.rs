use super::models::{DbTodo, UserId};
use super::sqlite::BridgeStorage;
use crate::error::BridgeError;

impl BridgeStorage {
    pub async fn list_todos(&self, user_id: UserId) -> Result<Vec<DbTodo>, BridgeError> {
        let rows = sqlx::query_as::<_, DbTodo>(
            "SELECT id, content, completed, user_id FROM todos WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create_todo(&self, user_id: UserId, content: &str) -> Result<DbTodo, BridgeError> {
        let row = sqlx::query_as::<_, DbTodo>(
            r#"INSERT INTO todos (content, completed, user_id) VALUES (?, 0, ?)
               RETURNING id, content, completed, user_id"#,
        )
        .bind(content)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Patch an owned todo; `None` fields keep their stored value.
    pub async fn update_todo(
        &self,
        user_id: UserId,
        id: i64,
        content: Option<&str>,
        completed: Option<bool>,
    ) -> Result<Option<DbTodo>, BridgeError> {
        let row = sqlx::query_as::<_, DbTodo>(
            r#"UPDATE todos SET
                content = COALESCE(?, content),
                completed = COALESCE(?, completed)
              WHERE id = ? AND user_id = ?
              RETURNING id, content, completed, user_id"#,
        )
        .bind(content)
        .bind(completed)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Returns false when nothing owned by `user_id` matched.
    pub async fn delete_todo(&self, user_id: UserId, id: i64) -> Result<bool, BridgeError> {
        let res = sqlx::query("DELETE FROM todos WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
