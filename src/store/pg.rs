//! PostgreSQL-backed store
//!
//! All code-consuming transitions use atomic CAS (Compare-And-Swap) updates:
//! `UPDATE ... WHERE id = $n AND status = 'pending'`, checking the affected
//! row count. Losing a race is a normal outcome, not an error.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::status::{PaymentStatus, ReviewStatus, TransactionKind, TransactionStatus};
use super::types::{
    ApprovalRecord, NewPayment, NewTransaction, NewUser, NominationRecord, PaymentRecord,
    TransactionRecord, UserRecord,
};
use super::{Store, StoreError};

const USER_COLUMNS: &str = "id, phone_number, username, wallet_address, wallet_id, \
     registered_name, created_at, updated_at";

/// Workflow store on PostgreSQL
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new PgStore with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create all workflow tables if they do not exist yet.
    ///
    /// Safe to run on every startup.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                phone_number VARCHAR(32) NOT NULL UNIQUE,
                username VARCHAR(255) NOT NULL,
                wallet_address VARCHAR(255) NOT NULL,
                wallet_id VARCHAR(255) NOT NULL,
                registered_name VARCHAR(255),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users(id),
                kind VARCHAR(16) NOT NULL,
                destination VARCHAR(255) NOT NULL,
                token VARCHAR(32) NOT NULL,
                amount NUMERIC(30, 10) NOT NULL,
                tx_hash VARCHAR(255) NOT NULL DEFAULT '',
                status VARCHAR(16) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS nominations (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users(id),
                nominee_id UUID NOT NULL REFERENCES users(id),
                status VARCHAR(16) NOT NULL DEFAULT 'pending',
                code VARCHAR(16) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS approvals (
                id UUID PRIMARY KEY,
                transaction_id UUID NOT NULL REFERENCES transactions(id),
                approver_id UUID NOT NULL REFERENCES users(id),
                code VARCHAR(16) NOT NULL,
                status VARCHAR(16) NOT NULL DEFAULT 'pending',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS payments (
                id UUID PRIMARY KEY,
                requester_id UUID NOT NULL REFERENCES users(id),
                recipient_id UUID NOT NULL REFERENCES users(id),
                code VARCHAR(16) NOT NULL,
                token VARCHAR(32) NOT NULL,
                amount NUMERIC(30, 10) NOT NULL,
                status VARCHAR(16) NOT NULL DEFAULT 'pending',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_nominations_nominee \
             ON nominations (nominee_id, status)",
            "CREATE INDEX IF NOT EXISTS idx_nominations_user \
             ON nominations (user_id, status)",
            "CREATE INDEX IF NOT EXISTS idx_approvals_tx \
             ON approvals (transaction_id)",
            // Pending codes must be unambiguous; consumed ones may recur
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_payments_code_pending \
             ON payments (code) WHERE status = 'pending'",
            "CREATE INDEX IF NOT EXISTS idx_payments_recipient \
             ON payments (recipient_id, status)",
        ];

        for sql in statements {
            sqlx::query(sql).execute(&self.pool).await?;
        }

        tracing::info!("Workflow schema initialized");
        Ok(())
    }

    fn row_to_user(&self, row: &PgRow) -> Result<UserRecord, StoreError> {
        Ok(UserRecord {
            id: row.try_get("id")?,
            phone_number: row.try_get("phone_number")?,
            username: row.try_get("username")?,
            wallet_address: row.try_get("wallet_address")?,
            wallet_id: row.try_get("wallet_id")?,
            registered_name: row.try_get("registered_name")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_nomination(&self, row: &PgRow) -> Result<NominationRecord, StoreError> {
        let status_str: String = row.try_get("status")?;
        let status = ReviewStatus::from_str(&status_str)
            .ok_or_else(|| StoreError::Corrupt(format!("Invalid nomination status: {}", status_str)))?;

        Ok(NominationRecord {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            nominee_id: row.try_get("nominee_id")?,
            status,
            code: row.try_get("code")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_approval(&self, row: &PgRow) -> Result<ApprovalRecord, StoreError> {
        let status_str: String = row.try_get("status")?;
        let status = ReviewStatus::from_str(&status_str)
            .ok_or_else(|| StoreError::Corrupt(format!("Invalid approval status: {}", status_str)))?;

        Ok(ApprovalRecord {
            id: row.try_get("id")?,
            transaction_id: row.try_get("transaction_id")?,
            approver_id: row.try_get("approver_id")?,
            code: row.try_get("code")?,
            status,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_transaction(&self, row: &PgRow) -> Result<TransactionRecord, StoreError> {
        let kind_str: String = row.try_get("kind")?;
        let kind = TransactionKind::from_str(&kind_str)
            .ok_or_else(|| StoreError::Corrupt(format!("Invalid transaction kind: {}", kind_str)))?;

        let status_str: String = row.try_get("status")?;
        let status = TransactionStatus::from_str(&status_str).ok_or_else(|| {
            StoreError::Corrupt(format!("Invalid transaction status: {}", status_str))
        })?;

        Ok(TransactionRecord {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            kind,
            destination: row.try_get("destination")?,
            token: row.try_get("token")?,
            amount: row.try_get("amount")?,
            tx_hash: row.try_get("tx_hash")?,
            status,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_payment(&self, row: &PgRow) -> Result<PaymentRecord, StoreError> {
        let status_str: String = row.try_get("status")?;
        let status = PaymentStatus::from_str(&status_str)
            .ok_or_else(|| StoreError::Corrupt(format!("Invalid payment status: {}", status_str)))?;

        Ok(PaymentRecord {
            id: row.try_get("id")?,
            requester_id: row.try_get("requester_id")?,
            recipient_id: row.try_get("recipient_id")?,
            code: row.try_get("code")?,
            token: row.try_get("token")?,
            amount: row.try_get("amount")?,
            status,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE phone_number = $1",
            USER_COLUMNS
        ))
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users
                (id, phone_number, username, wallet_address, wallet_id, registered_name)
            VALUES
                ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.phone_number)
        .bind(&user.username)
        .bind(&user.wallet_address)
        .bind(&user.wallet_id)
        .bind(&user.registered_name)
        .fetch_one(&self.pool)
        .await?;

        self.row_to_user(&row)
    }

    async fn create_nomination(
        &self,
        user_id: Uuid,
        nominee_id: Uuid,
        code: &str,
    ) -> Result<NominationRecord, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO nominations (id, user_id, nominee_id, status, code)
            VALUES ($1, $2, $3, 'pending', $4)
            RETURNING id, user_id, nominee_id, status, code, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(nominee_id)
        .bind(code)
        .fetch_one(&self.pool)
        .await?;

        self.row_to_nomination(&row)
    }

    async fn find_pending_nomination_by_code(
        &self,
        code: &str,
        nominee_id: Uuid,
    ) -> Result<Option<NominationRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, nominee_id, status, code, created_at, updated_at
            FROM nominations
            WHERE code = $1 AND nominee_id = $2 AND status = 'pending'
            "#,
        )
        .bind(code)
        .bind(nominee_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_nomination(&row)?)),
            None => Ok(None),
        }
    }

    async fn set_nomination_status_if_pending(
        &self,
        id: Uuid,
        status: ReviewStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE nominations
            SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status = 'pending'
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_accepted_nominees(&self, user_id: Uuid) -> Result<Vec<UserRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT u.id, u.phone_number, u.username, u.wallet_address, u.wallet_id,
                   u.registered_name, u.created_at, u.updated_at
            FROM users u
            JOIN nominations n ON n.nominee_id = u.id
            WHERE n.user_id = $1 AND n.status = 'accepted'
            ORDER BY n.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            users.push(self.row_to_user(&row)?);
        }
        Ok(users)
    }

    async fn nomination_code_pending(&self, code: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM nominations WHERE code = $1 AND status = 'pending')",
        )
        .bind(code)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_transaction(
        &self,
        tx: NewTransaction,
    ) -> Result<TransactionRecord, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO transactions
                (id, user_id, kind, destination, token, amount, tx_hash, status)
            VALUES
                ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, kind, destination, token, amount, tx_hash, status,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tx.user_id)
        .bind(tx.kind.as_str())
        .bind(&tx.destination)
        .bind(&tx.token)
        .bind(tx.amount)
        .bind(&tx.tx_hash)
        .bind(tx.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        self.row_to_transaction(&row)
    }

    async fn find_transaction(&self, id: Uuid) -> Result<Option<TransactionRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, kind, destination, token, amount, tx_hash, status,
                   created_at, updated_at
            FROM transactions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_transaction(&row)?)),
            None => Ok(None),
        }
    }

    async fn set_transaction_status_if_pending(
        &self,
        id: Uuid,
        status: TransactionStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status = 'pending'
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_transaction_result(
        &self,
        id: Uuid,
        status: TransactionStatus,
        tx_hash: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE transactions
            SET status = $1, tx_hash = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(status.as_str())
        .bind(tx_hash)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_approval(
        &self,
        transaction_id: Uuid,
        approver_id: Uuid,
        code: &str,
    ) -> Result<ApprovalRecord, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO approvals (id, transaction_id, approver_id, code, status)
            VALUES ($1, $2, $3, $4, 'pending')
            RETURNING id, transaction_id, approver_id, code, status, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(transaction_id)
        .bind(approver_id)
        .bind(code)
        .fetch_one(&self.pool)
        .await?;

        self.row_to_approval(&row)
    }

    async fn find_pending_approval_by_code(
        &self,
        code: &str,
        approver_id: Uuid,
    ) -> Result<Option<ApprovalRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, transaction_id, approver_id, code, status, created_at, updated_at
            FROM approvals
            WHERE code = $1 AND approver_id = $2 AND status = 'pending'
            "#,
        )
        .bind(code)
        .bind(approver_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_approval(&row)?)),
            None => Ok(None),
        }
    }

    async fn set_approval_status_if_pending(
        &self,
        id: Uuid,
        status: ReviewStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE approvals
            SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status = 'pending'
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_approvals_for_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<ApprovalRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, transaction_id, approver_id, code, status, created_at, updated_at
            FROM approvals
            WHERE transaction_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        let mut approvals = Vec::with_capacity(rows.len());
        for row in rows {
            approvals.push(self.row_to_approval(&row)?);
        }
        Ok(approvals)
    }

    async fn approval_code_pending(&self, code: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM approvals WHERE code = $1 AND status = 'pending')",
        )
        .bind(code)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_payment(&self, payment: NewPayment) -> Result<PaymentRecord, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO payments
                (id, requester_id, recipient_id, code, token, amount, status)
            VALUES
                ($1, $2, $3, $4, $5, $6, 'pending')
            RETURNING id, requester_id, recipient_id, code, token, amount, status,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(payment.requester_id)
        .bind(payment.recipient_id)
        .bind(&payment.code)
        .bind(&payment.token)
        .bind(payment.amount)
        .fetch_one(&self.pool)
        .await?;

        self.row_to_payment(&row)
    }

    async fn find_pending_payment_by_code(
        &self,
        code: &str,
        recipient_id: Uuid,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, requester_id, recipient_id, code, token, amount, status,
                   created_at, updated_at
            FROM payments
            WHERE code = $1 AND recipient_id = $2 AND status = 'pending'
            "#,
        )
        .bind(code)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_payment(&row)?)),
            None => Ok(None),
        }
    }

    async fn set_payment_paid_if_pending(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'paid', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn payment_code_pending(&self, code: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM payments WHERE code = $1 AND status = 'pending')",
        )
        .bind(code)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
