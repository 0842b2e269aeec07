//! Command Dispatcher
//!
//! Executes parsed commands against the store and the wallet/name
//! collaborators. Every handler returns an [`Outcome`]; failures are folded
//! into the matching failure reply here, so callers get an infallible
//! `dispatch()`. The dispatcher never sends SMS itself.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::clients::{NameRegistry, WalletProvider};
use crate::config::WorkflowConfig;
use crate::sms::command::FALLBACK_USERNAME;
use crate::sms::{Action, Command, Reply, normalize_phone};
use crate::store::{
    NewPayment, NewTransaction, NewUser, ReviewStatus, Store, StoreError, TransactionKind,
    TransactionStatus, UserRecord,
};

use super::code::{self, MAX_CODE_ATTEMPTS};
use super::error::DispatchError;
use super::types::Outcome;

/// Which table a fresh code must be unused in
enum CodeKind {
    Nomination,
    Approval,
    Payment,
}

/// Command dispatcher - per-verb workflow logic
pub struct Dispatcher {
    store: Arc<dyn Store>,
    wallet: Arc<dyn WalletProvider>,
    names: Arc<dyn NameRegistry>,
    config: WorkflowConfig,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn Store>,
        wallet: Arc<dyn WalletProvider>,
        names: Arc<dyn NameRegistry>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            store,
            wallet,
            names,
            config,
        }
    }

    /// Execute one command. Infallible: every error becomes its failure
    /// reply, and only the sender ever sees one.
    pub async fn dispatch(&self, cmd: &Command) -> Outcome {
        let result = match &cmd.action {
            Action::Help => Ok(Outcome::reply(Reply::Help)),
            Action::Register { username } => self.handle_register(&cmd.phone, username).await,
            Action::Send {
                amount,
                token,
                recipient,
            } => self.handle_send(&cmd.phone, *amount, token, recipient).await,
            Action::Nominate { first, second } => {
                self.handle_nominate(&cmd.phone, first, second).await
            }
            Action::NominationResponse { code, accept } => {
                self.handle_nomination_response(&cmd.phone, code, *accept)
                    .await
            }
            Action::ApprovalResponse { code, approve } => {
                self.handle_approval_response(&cmd.phone, code, *approve)
                    .await
            }
            Action::Request {
                amount,
                token,
                target,
            } => self.handle_request(&cmd.phone, *amount, token, target).await,
            Action::Pay { code } => self.handle_pay(&cmd.phone, code).await,
            Action::Unknown => Ok(self.handle_unknown(cmd)),
        };

        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                if err.is_user_error() {
                    warn!(
                        phone = %cmd.phone,
                        verb = cmd.action.verb(),
                        code = err.code(),
                        "Command failed: {}", err
                    );
                } else {
                    error!(
                        phone = %cmd.phone,
                        verb = cmd.action.verb(),
                        code = err.code(),
                        "Command failed: {}", err
                    );
                }
                Outcome::reply(err.reply())
            }
        }
    }

    /// Sender lookup shared by every verb except HELP/REGISTER
    async fn require_user(&self, phone: &str) -> Result<UserRecord, DispatchError> {
        self.store
            .find_user_by_phone(phone)
            .await?
            .ok_or(DispatchError::NotRegistered)
    }

    /// Draw a code unused among the pending rows of `kind`'s table
    async fn fresh_code(&self, kind: &CodeKind) -> Result<String, DispatchError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let candidate = code::generate_code();
            let taken = match kind {
                CodeKind::Nomination => self.store.nomination_code_pending(&candidate).await?,
                CodeKind::Approval => self.store.approval_code_pending(&candidate).await?,
                CodeKind::Payment => self.store.payment_code_pending(&candidate).await?,
            };
            if !taken {
                return Ok(candidate);
            }
        }
        Err(DispatchError::Internal(
            "could not draw an unused code".to_string(),
        ))
    }

    // === REGISTER ===

    async fn handle_register(
        &self,
        phone: &str,
        username: &str,
    ) -> Result<Outcome, DispatchError> {
        if let Some(existing) = self.store.find_user_by_phone(phone).await? {
            debug!(phone = %phone, "Already registered");
            return Ok(Outcome::reply(Reply::AlreadyRegistered {
                display: existing.wallet_display().to_string(),
            }));
        }

        // 1. Wallet creation is all-or-nothing: no wallet, no user row
        let wallet = self
            .wallet
            .create_wallet(phone)
            .await
            .map_err(|e| DispatchError::Wallet(e.to_string()))?;

        // 2. Name registration is best-effort
        let registered_name = self
            .register_name_best_effort(username, &wallet.address)
            .await;

        // 3. Insert the user row
        let user = match self
            .store
            .create_user(NewUser {
                phone_number: phone.to_string(),
                username: username.to_string(),
                wallet_address: wallet.address,
                wallet_id: wallet.wallet_id,
                registered_name,
            })
            .await
        {
            Ok(user) => user,
            // Concurrent REGISTER from the same phone: the other one won
            Err(StoreError::Conflict(_)) => {
                let existing = self
                    .store
                    .find_user_by_phone(phone)
                    .await?
                    .ok_or_else(|| {
                        DispatchError::Database(format!("user {} missing after conflict", phone))
                    })?;
                return Ok(Outcome::reply(Reply::AlreadyRegistered {
                    display: existing.wallet_display().to_string(),
                }));
            }
            Err(e) => return Err(e.into()),
        };

        info!(phone = %phone, user_id = %user.id, "User registered");
        Ok(Outcome::reply(Reply::WalletCreated {
            display: user.wallet_display().to_string(),
        }))
    }

    async fn register_name_best_effort(&self, username: &str, address: &str) -> Option<String> {
        if username == FALLBACK_USERNAME {
            return None;
        }
        let label = crate::clients::names::sanitize_label(username)?;

        match self.names.register_name(&label, address).await {
            Ok(name) => Some(name),
            Err(e) => {
                warn!(label = %label, "Name registration failed: {}", e);
                None
            }
        }
    }

    // === SEND ===

    async fn handle_send(
        &self,
        phone: &str,
        amount: rust_decimal::Decimal,
        token: &str,
        recipient: &str,
    ) -> Result<Outcome, DispatchError> {
        let sender = self.require_user(phone).await?;
        let approvers = self.store.list_accepted_nominees(sender.id).await?;

        if approvers.is_empty() {
            return self
                .execute_send_now(&sender, amount, token, recipient)
                .await;
        }

        // 1. Park the transaction pending approval
        let tx = self
            .store
            .create_transaction(NewTransaction {
                user_id: sender.id,
                kind: TransactionKind::Send,
                destination: recipient.to_string(),
                token: token.to_string(),
                amount,
                tx_hash: String::new(),
                status: TransactionStatus::Pending,
            })
            .await?;

        // 2. One approval row and one personal code per cosigner
        let mut outcome = Outcome::reply(Reply::SendPendingApproval {
            amount,
            token: token.to_string(),
            recipient: recipient.to_string(),
        });
        for approver in &approvers {
            let code = self.fresh_code(&CodeKind::Approval).await?;
            self.store.create_approval(tx.id, approver.id, &code).await?;
            outcome = outcome.with_notification(
                &approver.phone_number,
                Reply::ApprovalRequest {
                    owner: sender.display_name().to_string(),
                    amount,
                    token: token.to_string(),
                    recipient: recipient.to_string(),
                    code,
                },
            );
        }

        info!(
            user_id = %sender.id,
            transaction_id = %tx.id,
            approvers = approvers.len(),
            "Transfer held for approval"
        );
        Ok(outcome)
    }

    /// No cosigners: transfer immediately and record the result
    async fn execute_send_now(
        &self,
        sender: &UserRecord,
        amount: rust_decimal::Decimal,
        token: &str,
        recipient: &str,
    ) -> Result<Outcome, DispatchError> {
        match self
            .wallet
            .transfer(&sender.wallet_id, recipient, amount, token)
            .await
        {
            Ok(receipt) => {
                self.store
                    .create_transaction(NewTransaction {
                        user_id: sender.id,
                        kind: TransactionKind::Send,
                        destination: recipient.to_string(),
                        token: token.to_string(),
                        amount,
                        tx_hash: receipt.tx_hash.clone(),
                        status: TransactionStatus::Success,
                    })
                    .await?;

                info!(
                    user_id = %sender.id,
                    tx_hash = %receipt.tx_hash,
                    "Transfer executed"
                );
                Ok(Outcome::reply(Reply::SendExecuted {
                    amount,
                    token: token.to_string(),
                    recipient: recipient.to_string(),
                    tx_hash: receipt.tx_hash,
                }))
            }
            Err(e) => {
                warn!(user_id = %sender.id, "Transfer failed: {}", e);
                self.store
                    .create_transaction(NewTransaction {
                        user_id: sender.id,
                        kind: TransactionKind::Send,
                        destination: recipient.to_string(),
                        token: token.to_string(),
                        amount,
                        tx_hash: String::new(),
                        status: TransactionStatus::Failed,
                    })
                    .await?;

                Ok(Outcome::reply(Reply::SendFailed {
                    amount,
                    token: token.to_string(),
                    recipient: recipient.to_string(),
                }))
            }
        }
    }

    // === NOMINATE ===

    async fn handle_nominate(
        &self,
        phone: &str,
        first: &str,
        second: &str,
    ) -> Result<Outcome, DispatchError> {
        let sender = self.require_user(phone).await?;

        let first_phone = normalize_phone(first);
        let second_phone = normalize_phone(second);

        if first_phone == second_phone {
            return Err(DispatchError::Validation(
                "You must nominate two different people.".to_string(),
            ));
        }
        if first_phone == sender.phone_number || second_phone == sender.phone_number {
            return Err(DispatchError::Validation(
                "You cannot nominate yourself.".to_string(),
            ));
        }

        // Both nominees must exist before anything is written
        let mut nominees = Vec::with_capacity(2);
        for nominee_phone in [&first_phone, &second_phone] {
            match self.store.find_user_by_phone(nominee_phone).await? {
                Some(user) => nominees.push(user),
                None => {
                    return Err(DispatchError::Validation(format!(
                        "{} does not have a wallet yet.",
                        nominee_phone
                    )));
                }
            }
        }

        let mut outcome = Outcome::reply(Reply::NominationSent {
            first: first_phone.clone(),
            second: second_phone.clone(),
        });
        for nominee in &nominees {
            let code = self.fresh_code(&CodeKind::Nomination).await?;
            self.store
                .create_nomination(sender.id, nominee.id, &code)
                .await?;
            outcome = outcome.with_notification(
                &nominee.phone_number,
                Reply::NominationRequest {
                    nominator: sender.display_name().to_string(),
                    code,
                },
            );
        }

        info!(user_id = %sender.id, "Cosigners nominated");
        Ok(outcome)
    }

    // === ACCEPT / DENY ===

    async fn handle_nomination_response(
        &self,
        phone: &str,
        code: &str,
        accept: bool,
    ) -> Result<Outcome, DispatchError> {
        let sender = self.require_user(phone).await?;

        let nomination = self
            .store
            .find_pending_nomination_by_code(code, sender.id)
            .await?
            .ok_or(DispatchError::UnknownCode)?;

        let new_status = if accept {
            ReviewStatus::Accepted
        } else {
            ReviewStatus::Rejected
        };
        if !self
            .store
            .set_nomination_status_if_pending(nomination.id, new_status)
            .await?
        {
            // Another request consumed this code first
            return Err(DispatchError::UnknownCode);
        }

        info!(
            nomination_id = %nomination.id,
            nominee_id = %sender.id,
            accepted = accept,
            "Nomination answered"
        );

        let mut outcome = Outcome::reply(Reply::NominationAnswerRecorded);
        if let Some(nominator) = self.store.find_user_by_id(nomination.user_id).await? {
            let notice = if accept {
                Reply::NominationAccepted {
                    nominee: sender.display_name().to_string(),
                }
            } else {
                Reply::NominationDenied {
                    nominee: sender.display_name().to_string(),
                }
            };
            outcome = outcome.with_notification(&nominator.phone_number, notice);
        }
        Ok(outcome)
    }

    // === APPROVE / REJECT ===

    async fn handle_approval_response(
        &self,
        phone: &str,
        code: &str,
        approve: bool,
    ) -> Result<Outcome, DispatchError> {
        let sender = self.require_user(phone).await?;

        let approval = self
            .store
            .find_pending_approval_by_code(code, sender.id)
            .await?
            .ok_or(DispatchError::UnknownCode)?;

        let new_status = if approve {
            ReviewStatus::Accepted
        } else {
            ReviewStatus::Rejected
        };
        if !self
            .store
            .set_approval_status_if_pending(approval.id, new_status)
            .await?
        {
            return Err(DispatchError::UnknownCode);
        }

        if approve {
            self.settle_if_quorum(approval.transaction_id).await
        } else {
            self.settle_rejection(approval.transaction_id).await
        }
    }

    /// After an APPROVE: execute the transfer iff every approval is accepted
    /// and this caller wins the terminal write on the transaction.
    async fn settle_if_quorum(&self, transaction_id: uuid::Uuid) -> Result<Outcome, DispatchError> {
        // 1. Re-read the whole approval set after our own write
        let approvals = self
            .store
            .list_approvals_for_transaction(transaction_id)
            .await?;

        // A rejecter already settled the transaction
        if approvals
            .iter()
            .any(|a| a.status == ReviewStatus::Rejected)
        {
            return Ok(Outcome::reply(Reply::ApprovalRecorded));
        }
        if !approvals.iter().all(|a| a.status == ReviewStatus::Accepted) {
            return Ok(Outcome::reply(Reply::ApprovalRecorded));
        }

        // 2. Quorum reached: claim the execution. Losing here means a
        //    concurrent approver (or rejecter) got there first.
        if !self
            .store
            .set_transaction_status_if_pending(transaction_id, TransactionStatus::Success)
            .await?
        {
            return Ok(Outcome::reply(Reply::ApprovalRecorded));
        }

        // 3. Winner-only: execute and notify the owner
        let tx = self
            .store
            .find_transaction(transaction_id)
            .await?
            .ok_or_else(|| {
                DispatchError::Database(format!("transaction {} missing after claim", transaction_id))
            })?;
        let owner = self
            .store
            .find_user_by_id(tx.user_id)
            .await?
            .ok_or_else(|| {
                DispatchError::Database(format!("owner of transaction {} missing", transaction_id))
            })?;

        match self
            .wallet
            .transfer(&owner.wallet_id, &tx.destination, tx.amount, &tx.token)
            .await
        {
            Ok(receipt) => {
                self.store
                    .set_transaction_result(
                        transaction_id,
                        TransactionStatus::Success,
                        &receipt.tx_hash,
                    )
                    .await?;

                info!(
                    transaction_id = %transaction_id,
                    tx_hash = %receipt.tx_hash,
                    "Approved transfer executed"
                );
                Ok(Outcome::reply(Reply::ApprovalRecorded).with_notification(
                    &owner.phone_number,
                    Reply::TransferApproved {
                        amount: tx.amount,
                        token: tx.token.clone(),
                        recipient: tx.destination.clone(),
                        tx_hash: receipt.tx_hash,
                    },
                ))
            }
            Err(e) => {
                warn!(transaction_id = %transaction_id, "Approved transfer failed: {}", e);
                self.store
                    .set_transaction_result(transaction_id, TransactionStatus::Failed, "")
                    .await?;

                Ok(Outcome::reply(Reply::ApprovalRecorded).with_notification(
                    &owner.phone_number,
                    Reply::SendFailed {
                        amount: tx.amount,
                        token: tx.token.clone(),
                        recipient: tx.destination.clone(),
                    },
                ))
            }
        }
    }

    /// After a REJECT: settle the transaction failed; only the caller that
    /// wins that write notifies the owner.
    async fn settle_rejection(&self, transaction_id: uuid::Uuid) -> Result<Outcome, DispatchError> {
        let won = self
            .store
            .set_transaction_status_if_pending(transaction_id, TransactionStatus::Failed)
            .await?;

        let mut outcome = Outcome::reply(Reply::RejectionRecorded);
        if won {
            let tx = self
                .store
                .find_transaction(transaction_id)
                .await?
                .ok_or_else(|| {
                    DispatchError::Database(format!(
                        "transaction {} missing after rejection",
                        transaction_id
                    ))
                })?;
            if let Some(owner) = self.store.find_user_by_id(tx.user_id).await? {
                outcome = outcome.with_notification(
                    &owner.phone_number,
                    Reply::TransferRejected {
                        amount: tx.amount,
                        token: tx.token.clone(),
                        recipient: tx.destination.clone(),
                    },
                );
            }
            info!(transaction_id = %transaction_id, "Transfer rejected");
        }
        Ok(outcome)
    }

    // === REQUEST ===

    async fn handle_request(
        &self,
        phone: &str,
        amount: rust_decimal::Decimal,
        token: &str,
        target: &str,
    ) -> Result<Outcome, DispatchError> {
        let sender = self.require_user(phone).await?;

        let target_phone = normalize_phone(target);
        if target_phone == sender.phone_number {
            return Err(DispatchError::Validation(
                "You cannot request a payment from yourself.".to_string(),
            ));
        }

        let recipient = self
            .store
            .find_user_by_phone(&target_phone)
            .await?
            .ok_or_else(|| {
                DispatchError::Validation(format!(
                    "{} does not have a wallet yet.",
                    target_phone
                ))
            })?;

        // The partial unique index on pending codes has the last word, so a
        // lost insert race just draws again.
        let mut payment = None;
        for attempt in 0..MAX_CODE_ATTEMPTS {
            let code = self.fresh_code(&CodeKind::Payment).await?;
            match self
                .store
                .create_payment(NewPayment {
                    requester_id: sender.id,
                    recipient_id: recipient.id,
                    code: code.clone(),
                    token: token.to_string(),
                    amount,
                })
                .await
            {
                Ok(p) => {
                    payment = Some(p);
                    break;
                }
                Err(StoreError::Conflict(_)) if attempt + 1 < MAX_CODE_ATTEMPTS => continue,
                Err(e) => return Err(e.into()),
            }
        }
        let payment = payment.ok_or_else(|| {
            DispatchError::Internal("could not draw an unused payment code".to_string())
        })?;

        info!(
            payment_id = %payment.id,
            requester_id = %sender.id,
            recipient_id = %recipient.id,
            "Payment requested"
        );
        Ok(Outcome::reply(Reply::RequestSent {
            amount,
            token: token.to_string(),
            target: recipient.display_name().to_string(),
            code: payment.code.clone(),
        })
        .with_notification(
            &recipient.phone_number,
            Reply::PaymentRequest {
                requester: sender.display_name().to_string(),
                amount,
                token: token.to_string(),
                code: payment.code,
            },
        ))
    }

    // === PAY ===

    async fn handle_pay(&self, phone: &str, code: &str) -> Result<Outcome, DispatchError> {
        let sender = self.require_user(phone).await?;

        let payment = self
            .store
            .find_pending_payment_by_code(code, sender.id)
            .await?
            .ok_or(DispatchError::UnknownCode)?;

        let requester = self
            .store
            .find_user_by_id(payment.requester_id)
            .await?
            .ok_or_else(|| {
                DispatchError::Database(format!("requester of payment {} missing", payment.id))
            })?;

        // 1. Move the funds; a failed transfer leaves the request pending
        let receipt = match self
            .wallet
            .transfer(
                &sender.wallet_id,
                &requester.wallet_address,
                payment.amount,
                &payment.token,
            )
            .await
        {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(payment_id = %payment.id, "Payment transfer failed: {}", e);
                return Ok(Outcome::reply(Reply::PaymentFailed));
            }
        };

        // 2. Consume the code. The transfer already happened, so losing this
        //    write changes nothing for the payer.
        if !self.store.set_payment_paid_if_pending(payment.id).await? {
            warn!(payment_id = %payment.id, "Payment already marked paid after transfer");
        }

        // 3. Record the movement on the payer's history
        self.store
            .create_transaction(NewTransaction {
                user_id: sender.id,
                kind: TransactionKind::PayRequest,
                destination: requester.wallet_address.clone(),
                token: payment.token.clone(),
                amount: payment.amount,
                tx_hash: receipt.tx_hash.clone(),
                status: TransactionStatus::Success,
            })
            .await?;

        info!(
            payment_id = %payment.id,
            payer_id = %sender.id,
            tx_hash = %receipt.tx_hash,
            "Payment request paid"
        );
        Ok(Outcome::reply(Reply::PaymentSent {
            amount: payment.amount,
            token: payment.token.clone(),
            tx_hash: receipt.tx_hash.clone(),
        })
        .with_notification(
            &requester.phone_number,
            Reply::PaymentReceived {
                payer: sender.display_name().to_string(),
                amount: payment.amount,
                token: payment.token,
                tx_hash: receipt.tx_hash,
            },
        ))
    }

    // === Unrecognized input ===

    fn handle_unknown(&self, cmd: &Command) -> Outcome {
        debug!(phone = %cmd.phone, "Unrecognized command");
        if self.config.reply_to_unrecognized {
            Outcome::reply(Reply::Unrecognized)
        } else {
            Outcome::silent()
        }
    }
}
