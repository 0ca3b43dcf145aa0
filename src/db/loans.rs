use super::models::{DbLoanAgreement, LoanStatus, UserId};
use super::sqlite::BridgeStorage;
use crate::error::BridgeError;

const LOAN_COLUMNS: &str =
    "id, lender_id, borrower_id, terms, status, ai_flagged, locked, violation_count";

impl BridgeStorage {
    pub async fn create_loan(
        &self,
        lender_id: UserId,
        borrower_id: UserId,
        terms: &str,
        ai_flagged: bool,
    ) -> Result<DbLoanAgreement, BridgeError> {
        let sql = format!(
            "INSERT INTO loan_agreements (lender_id, borrower_id, terms, status, ai_flagged)
             VALUES (?, ?, ?, ?, ?) RETURNING {LOAN_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DbLoanAgreement>(&sql)
            .bind(lender_id)
            .bind(borrower_id)
            .bind(terms)
            .bind(LoanStatus::Active)
            .bind(ai_flagged)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_loan(&self, id: i64) -> Result<Option<DbLoanAgreement>, BridgeError> {
        let sql = format!("SELECT {LOAN_COLUMNS} FROM loan_agreements WHERE id = ?");
        let row = sqlx::query_as::<_, DbLoanAgreement>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Agreements where the user is either party.
    pub async fn list_loans_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<DbLoanAgreement>, BridgeError> {
        let sql = format!(
            "SELECT {LOAN_COLUMNS} FROM loan_agreements
             WHERE lender_id = ? OR borrower_id = ? ORDER BY id"
        );
        let rows = sqlx::query_as::<_, DbLoanAgreement>(&sql)
            .bind(user_id)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Count one compliance violation against every agreement of the borrower.
    /// Agreements reaching `lock_threshold` violations are locked.
    pub async fn record_violation(
        &self,
        borrower_id: UserId,
        lock_threshold: i64,
    ) -> Result<Vec<DbLoanAgreement>, BridgeError> {
        let sql = format!(
            "UPDATE loan_agreements SET
                violation_count = violation_count + 1,
                ai_flagged = 1,
                locked = CASE WHEN violation_count + 1 >= ? THEN 1 ELSE locked END
             WHERE borrower_id = ?
             RETURNING {LOAN_COLUMNS}"
        );
        let rows = sqlx::query_as::<_, DbLoanAgreement>(&sql)
            .bind(lock_threshold)
            .bind(borrower_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Lock every agreement of the borrower. Returns the number of rows touched.
    pub async fn lock_borrower(&self, borrower_id: UserId) -> Result<u64, BridgeError> {
        let res = sqlx::query("UPDATE loan_agreements SET locked = 1 WHERE borrower_id = ?")
            .bind(borrower_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    pub async fn flagged_loan_ids(&self) -> Result<Vec<i64>, BridgeError> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM loan_agreements WHERE ai_flagged = 1 ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(ids)
    }

    /// Move an active, unlocked agreement under contract.
    /// `None` when the agreement is missing or not eligible.
    pub async fn execute_contract(&self, id: i64) -> Result<Option<DbLoanAgreement>, BridgeError> {
        let sql = format!(
            "UPDATE loan_agreements SET status = ?
             WHERE id = ? AND status = ? AND locked = 0
             RETURNING {LOAN_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DbLoanAgreement>(&sql)
            .bind(LoanStatus::UnderContract)
            .bind(id)
            .bind(LoanStatus::Active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Role;

    #[tokio::test]
    async fn third_violation_locks_agreement() {
        let storage = BridgeStorage::connect("sqlite::memory:").await.unwrap();
        let lender = storage.create_user("l", "h", Role::Lender).await.unwrap();
        let borrower = storage.create_user("b", "h", Role::Borrower).await.unwrap();
        let loan = storage
            .create_loan(lender.id, borrower.id, "plain terms", false)
            .await
            .unwrap();

        for expected in 1..=2 {
            let rows = storage.record_violation(borrower.id, 3).await.unwrap();
            assert_eq!(rows[0].violation_count, expected);
            assert!(!rows[0].locked);
        }
        let rows = storage.record_violation(borrower.id, 3).await.unwrap();
        assert!(rows[0].locked);
        assert_eq!(storage.flagged_loan_ids().await.unwrap(), vec![loan.id]);

        // locked agreements cannot go under contract
        assert!(storage.execute_contract(loan.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn contract_executes_once() {
        let storage = BridgeStorage::connect("sqlite::memory:").await.unwrap();
        let lender = storage.create_user("l", "h", Role::Lender).await.unwrap();
        let borrower = storage.create_user("b", "h", Role::Borrower).await.unwrap();
        let loan = storage
            .create_loan(lender.id, borrower.id, "terms", false)
            .await
            .unwrap();

        let executed = storage.execute_contract(loan.id).await.unwrap().unwrap();
        assert_eq!(executed.status, LoanStatus::UnderContract);
        assert!(storage.execute_contract(loan.id).await.unwrap().is_none());
        assert!(storage.execute_contract(999).await.unwrap().is_none());
    }
}
