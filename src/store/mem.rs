//! In-memory store
//!
//! Backs the mock gateway and the integration tests. A single mutex guards
//! all tables so the `*_if_pending` transitions are atomic, matching the
//! row-level CAS the PostgreSQL store gets from conditional UPDATEs.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::status::{PaymentStatus, ReviewStatus, TransactionStatus};
use super::types::{
    ApprovalRecord, NewPayment, NewTransaction, NewUser, NominationRecord, PaymentRecord,
    TransactionRecord, UserRecord,
};
use super::{Store, StoreError};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, UserRecord>,
    nominations: HashMap<Uuid, NominationRecord>,
    transactions: HashMap<Uuid, TransactionRecord>,
    approvals: HashMap<Uuid, ApprovalRecord>,
    payments: HashMap<Uuid, PaymentRecord>,
}

/// Workflow store in process memory
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemStore {
    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .values()
            .find(|u| u.phone_number == phone)
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.get(&id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        // Same constraint as the UNIQUE index on users.phone_number
        if inner
            .users
            .values()
            .any(|u| u.phone_number == user.phone_number)
        {
            return Err(StoreError::Conflict(format!(
                "duplicate phone number: {}",
                user.phone_number
            )));
        }

        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            phone_number: user.phone_number,
            username: user.username,
            wallet_address: user.wallet_address,
            wallet_id: user.wallet_id,
            registered_name: user.registered_name,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn create_nomination(
        &self,
        user_id: Uuid,
        nominee_id: Uuid,
        code: &str,
    ) -> Result<NominationRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let record = NominationRecord {
            id: Uuid::new_v4(),
            user_id,
            nominee_id,
            status: ReviewStatus::Pending,
            code: code.to_string(),
            created_at: now,
            updated_at: now,
        };
        inner.nominations.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_pending_nomination_by_code(
        &self,
        code: &str,
        nominee_id: Uuid,
    ) -> Result<Option<NominationRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .nominations
            .values()
            .find(|n| {
                n.code == code && n.nominee_id == nominee_id && n.status == ReviewStatus::Pending
            })
            .cloned())
    }

    async fn set_nomination_status_if_pending(
        &self,
        id: Uuid,
        status: ReviewStatus,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.nominations.get_mut(&id) {
            Some(n) if n.status == ReviewStatus::Pending => {
                n.status = status;
                n.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_accepted_nominees(&self, user_id: Uuid) -> Result<Vec<UserRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut accepted: Vec<&NominationRecord> = inner
            .nominations
            .values()
            .filter(|n| n.user_id == user_id && n.status == ReviewStatus::Accepted)
            .collect();
        accepted.sort_by_key(|n| n.created_at);

        Ok(accepted
            .iter()
            .filter_map(|n| inner.users.get(&n.nominee_id).cloned())
            .collect())
    }

    async fn nomination_code_pending(&self, code: &str) -> Result<bool, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .nominations
            .values()
            .any(|n| n.code == code && n.status == ReviewStatus::Pending))
    }

    async fn create_transaction(
        &self,
        tx: NewTransaction,
    ) -> Result<TransactionRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let record = TransactionRecord {
            id: Uuid::new_v4(),
            user_id: tx.user_id,
            kind: tx.kind,
            destination: tx.destination,
            token: tx.token,
            amount: tx.amount,
            tx_hash: tx.tx_hash,
            status: tx.status,
            created_at: now,
            updated_at: now,
        };
        inner.transactions.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_transaction(&self, id: Uuid) -> Result<Option<TransactionRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.transactions.get(&id).cloned())
    }

    async fn set_transaction_status_if_pending(
        &self,
        id: Uuid,
        status: TransactionStatus,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.transactions.get_mut(&id) {
            Some(t) if t.status == TransactionStatus::Pending => {
                t.status = status;
                t.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_transaction_result(
        &self,
        id: Uuid,
        status: TransactionStatus,
        tx_hash: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(t) = inner.transactions.get_mut(&id) {
            t.status = status;
            t.tx_hash = tx_hash.to_string();
            t.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn create_approval(
        &self,
        transaction_id: Uuid,
        approver_id: Uuid,
        code: &str,
    ) -> Result<ApprovalRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let record = ApprovalRecord {
            id: Uuid::new_v4(),
            transaction_id,
            approver_id,
            code: code.to_string(),
            status: ReviewStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        inner.approvals.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_pending_approval_by_code(
        &self,
        code: &str,
        approver_id: Uuid,
    ) -> Result<Option<ApprovalRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .approvals
            .values()
            .find(|a| {
                a.code == code && a.approver_id == approver_id && a.status == ReviewStatus::Pending
            })
            .cloned())
    }

    async fn set_approval_status_if_pending(
        &self,
        id: Uuid,
        status: ReviewStatus,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.approvals.get_mut(&id) {
            Some(a) if a.status == ReviewStatus::Pending => {
                a.status = status;
                a.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_approvals_for_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<ApprovalRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut approvals: Vec<ApprovalRecord> = inner
            .approvals
            .values()
            .filter(|a| a.transaction_id == transaction_id)
            .cloned()
            .collect();
        approvals.sort_by_key(|a| a.created_at);
        Ok(approvals)
    }

    async fn approval_code_pending(&self, code: &str) -> Result<bool, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .approvals
            .values()
            .any(|a| a.code == code && a.status == ReviewStatus::Pending))
    }

    async fn create_payment(&self, payment: NewPayment) -> Result<PaymentRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        // Same constraint as the partial unique index on pending payment codes
        if inner
            .payments
            .values()
            .any(|p| p.code == payment.code && p.status == PaymentStatus::Pending)
        {
            return Err(StoreError::Conflict(format!(
                "duplicate pending payment code: {}",
                payment.code
            )));
        }

        let now = Utc::now();
        let record = PaymentRecord {
            id: Uuid::new_v4(),
            requester_id: payment.requester_id,
            recipient_id: payment.recipient_id,
            code: payment.code,
            token: payment.token,
            amount: payment.amount,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        inner.payments.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_pending_payment_by_code(
        &self,
        code: &str,
        recipient_id: Uuid,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .payments
            .values()
            .find(|p| {
                p.code == code
                    && p.recipient_id == recipient_id
                    && p.status == PaymentStatus::Pending
            })
            .cloned())
    }

    async fn set_payment_paid_if_pending(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.payments.get_mut(&id) {
            Some(p) if p.status == PaymentStatus::Pending => {
                p.status = PaymentStatus::Paid;
                p.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn payment_code_pending(&self, code: &str) -> Result<bool, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .payments
            .values()
            .any(|p| p.code == code && p.status == PaymentStatus::Pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::status::TransactionKind;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use std::sync::Arc;

    fn new_user(phone: &str, username: &str) -> NewUser {
        NewUser {
            phone_number: phone.to_string(),
            username: username.to_string(),
            wallet_address: format!("0x{}", username),
            wallet_id: format!("w-{}", username),
            registered_name: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_phone_rejected() {
        let store = MemStore::new();
        store
            .create_user(new_user("+15550001111", "alice"))
            .await
            .unwrap();

        let result = store.create_user(new_user("+15550001111", "bob")).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_nomination_cas_consumes_once() {
        let store = MemStore::new();
        let nominator = store
            .create_user(new_user("+15550001111", "alice"))
            .await
            .unwrap();
        let nominee = store
            .create_user(new_user("+15550002222", "bob"))
            .await
            .unwrap();

        let nomination = store
            .create_nomination(nominator.id, nominee.id, "ABC234")
            .await
            .unwrap();

        let found = store
            .find_pending_nomination_by_code("ABC234", nominee.id)
            .await
            .unwrap();
        assert!(found.is_some());

        // Scoped to the nominee, so another user cannot answer it
        let other = store
            .find_pending_nomination_by_code("ABC234", nominator.id)
            .await
            .unwrap();
        assert!(other.is_none());

        assert!(
            store
                .set_nomination_status_if_pending(nomination.id, ReviewStatus::Accepted)
                .await
                .unwrap()
        );
        assert!(
            !store
                .set_nomination_status_if_pending(nomination.id, ReviewStatus::Rejected)
                .await
                .unwrap()
        );

        // Consumed code no longer resolves
        let gone = store
            .find_pending_nomination_by_code("ABC234", nominee.id)
            .await
            .unwrap();
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn test_list_accepted_nominees_filters_status() {
        let store = MemStore::new();
        let owner = store
            .create_user(new_user("+15550001111", "alice"))
            .await
            .unwrap();
        let accepted = store
            .create_user(new_user("+15550002222", "bob"))
            .await
            .unwrap();
        let pending = store
            .create_user(new_user("+15550003333", "carol"))
            .await
            .unwrap();

        let n1 = store
            .create_nomination(owner.id, accepted.id, "AAA222")
            .await
            .unwrap();
        store
            .create_nomination(owner.id, pending.id, "BBB333")
            .await
            .unwrap();
        store
            .set_nomination_status_if_pending(n1.id, ReviewStatus::Accepted)
            .await
            .unwrap();

        let nominees = store.list_accepted_nominees(owner.id).await.unwrap();
        assert_eq!(nominees.len(), 1);
        assert_eq!(nominees[0].id, accepted.id);
    }

    #[tokio::test]
    async fn test_pending_payment_code_unique_until_paid() {
        let store = MemStore::new();
        let requester = store
            .create_user(new_user("+15550001111", "alice"))
            .await
            .unwrap();
        let recipient = store
            .create_user(new_user("+15550002222", "bob"))
            .await
            .unwrap();

        let payment = store
            .create_payment(NewPayment {
                requester_id: requester.id,
                recipient_id: recipient.id,
                code: "PAY234".to_string(),
                token: "USDC".to_string(),
                amount: Decimal::from_str("5").unwrap(),
            })
            .await
            .unwrap();

        let duplicate = store
            .create_payment(NewPayment {
                requester_id: requester.id,
                recipient_id: recipient.id,
                code: "PAY234".to_string(),
                token: "USDC".to_string(),
                amount: Decimal::from_str("5").unwrap(),
            })
            .await;
        assert!(matches!(duplicate, Err(StoreError::Conflict(_))));

        assert!(store.set_payment_paid_if_pending(payment.id).await.unwrap());

        // Once consumed, the code may be issued again
        let reissued = store
            .create_payment(NewPayment {
                requester_id: requester.id,
                recipient_id: recipient.id,
                code: "PAY234".to_string(),
                token: "USDC".to_string(),
                amount: Decimal::from_str("7").unwrap(),
            })
            .await;
        assert!(reissued.is_ok());
    }

    #[tokio::test]
    async fn test_transaction_result_overwrites_any_status() {
        let store = MemStore::new();
        let user = store
            .create_user(new_user("+15550001111", "alice"))
            .await
            .unwrap();

        let tx = store
            .create_transaction(NewTransaction {
                user_id: user.id,
                kind: TransactionKind::Send,
                destination: "0xdest".to_string(),
                token: "USDC".to_string(),
                amount: Decimal::from_str("10").unwrap(),
                tx_hash: String::new(),
                status: TransactionStatus::Pending,
            })
            .await
            .unwrap();

        assert!(
            store
                .set_transaction_status_if_pending(tx.id, TransactionStatus::Success)
                .await
                .unwrap()
        );

        // Result setter is unconditional, used when execution fails after the CAS
        store
            .set_transaction_result(tx.id, TransactionStatus::Failed, "")
            .await
            .unwrap();

        let found = store.find_transaction(tx.id).await.unwrap().unwrap();
        assert_eq!(found.status, TransactionStatus::Failed);
        assert_eq!(found.tx_hash, "");
    }

    #[tokio::test]
    async fn test_concurrent_cas_has_single_winner() {
        let store = Arc::new(MemStore::new());
        let user = store
            .create_user(new_user("+15550001111", "alice"))
            .await
            .unwrap();

        let tx = store
            .create_transaction(NewTransaction {
                user_id: user.id,
                kind: TransactionKind::Send,
                destination: "0xdest".to_string(),
                token: "USDC".to_string(),
                amount: Decimal::from_str("10").unwrap(),
                tx_hash: String::new(),
                status: TransactionStatus::Pending,
            })
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            let tx_id = tx.id;
            handles.push(tokio::spawn(async move {
                store
                    .set_transaction_status_if_pending(tx_id, TransactionStatus::Success)
                    .await
                    .unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
