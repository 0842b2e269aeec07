//! Integration Tests for Command Dispatch
//!
//! These tests run every workflow end to end without a live database or any
//! HTTP: MemStore plus mock wallet/name providers stand in for the real
//! collaborators.

#[cfg(test)]
mod flow_tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use crate::clients::{MockNames, MockWallet};
    use crate::config::WorkflowConfig;
    use crate::dispatch::coordinator::Dispatcher;
    use crate::dispatch::types::{Notification, Outcome};
    use crate::sms::{Reply, parse_message};
    use crate::store::{MemStore, Store, TransactionStatus, UserRecord};

    const ALICE: &str = "+15550000001";
    const BOB: &str = "+15550000002";
    const CAROL: &str = "+15550000003";
    const DAVE: &str = "+15550000004";

    /// Dispatcher wired to in-memory fakes
    struct TestHarness {
        dispatcher: Dispatcher,
        store: Arc<MemStore>,
        wallet: Arc<MockWallet>,
        names: Arc<MockNames>,
    }

    impl TestHarness {
        fn new() -> Self {
            let store = Arc::new(MemStore::new());
            let wallet = Arc::new(MockWallet::new());
            let names = Arc::new(MockNames::new());
            let dispatcher = Dispatcher::new(
                store.clone(),
                wallet.clone(),
                names.clone(),
                WorkflowConfig::default(),
            );
            Self {
                dispatcher,
                store,
                wallet,
                names,
            }
        }

        /// Parse and dispatch one SMS
        async fn text(&self, phone: &str, content: &str) -> Outcome {
            self.dispatcher.dispatch(&parse_message(content, phone)).await
        }

        async fn register(&self, phone: &str, username: &str) -> Outcome {
            self.text(phone, &format!("REGISTER {}", username)).await
        }

        async fn user(&self, phone: &str) -> UserRecord {
            self.store
                .find_user_by_phone(phone)
                .await
                .unwrap()
                .expect("user not registered")
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    /// The one-time code carried by a notification
    fn code_of(n: &Notification) -> String {
        match &n.reply {
            Reply::NominationRequest { code, .. }
            | Reply::ApprovalRequest { code, .. }
            | Reply::PaymentRequest { code, .. } => code.clone(),
            other => panic!("notification carries no code: {:?}", other),
        }
    }

    /// Notification addressed to `phone`, which must be unique in the outcome
    fn notification_for<'a>(outcome: &'a Outcome, phone: &str) -> &'a Notification {
        let mut hits = outcome.notifications.iter().filter(|n| n.to_phone == phone);
        let first = hits.next().expect("no notification for phone");
        assert!(hits.next().is_none(), "multiple notifications for phone");
        first
    }

    /// Nominate and accept so `owner` has the given cosigners
    async fn setup_cosigners(harness: &TestHarness, owner: &str, cosigners: &[&str]) {
        // NOMINATE takes exactly two, so wire them pairwise against a filler
        for pair in cosigners.chunks(2) {
            let (first, second) = match pair {
                [a, b] => (*a, *b),
                [a] => (*a, DAVE),
                _ => unreachable!(),
            };
            let outcome = harness
                .text(owner, &format!("NOMINATE {} {}", first, second))
                .await;
            for cosigner in pair {
                let code = code_of(notification_for(&outcome, cosigner));
                let answer = harness.text(cosigner, &format!("ACCEPT {}", code)).await;
                assert_eq!(answer.reply, Some(Reply::NominationAnswerRecorded));
            }
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// REGISTER creates a wallet, registers the name, and stores the user
    #[tokio::test]
    async fn test_register_creates_wallet_and_name() {
        let harness = TestHarness::new();

        let outcome = harness.register(ALICE, "alice").await;
        assert_eq!(
            outcome.reply,
            Some(Reply::WalletCreated {
                display: "alice.cell.eth".to_string()
            })
        );
        assert!(outcome.notifications.is_empty());

        let user = harness.user(ALICE).await;
        assert_eq!(user.phone_number, ALICE);
        assert_eq!(user.registered_name.as_deref(), Some("alice.cell.eth"));
        assert_eq!(harness.wallet.created(), vec![ALICE.to_string()]);
        assert_eq!(
            harness.names.registered(),
            vec![("alice".to_string(), user.wallet_address.clone())]
        );
    }

    /// A failed name registration falls back to the bare address
    #[tokio::test]
    async fn test_register_name_failure_falls_back_to_address() {
        let harness = TestHarness::new();
        harness.names.set_fail(true);

        let outcome = harness.register(ALICE, "alice").await;
        let user = harness.user(ALICE).await;

        assert_eq!(
            outcome.reply,
            Some(Reply::WalletCreated {
                display: user.wallet_address.clone()
            })
        );
        assert_eq!(user.registered_name, None);
    }

    /// Bare REGISTER still creates a wallet but never calls the name registry
    #[tokio::test]
    async fn test_register_without_username_skips_name() {
        let harness = TestHarness::new();

        let outcome = harness.text(ALICE, "REGISTER").await;
        let user = harness.user(ALICE).await;

        assert_eq!(
            outcome.reply,
            Some(Reply::WalletCreated {
                display: user.wallet_address.clone()
            })
        );
        assert!(harness.names.registered().is_empty());
    }

    /// A second REGISTER reports the existing wallet and creates nothing
    #[tokio::test]
    async fn test_register_twice_reports_existing_wallet() {
        let harness = TestHarness::new();

        harness.register(ALICE, "alice").await;
        let outcome = harness.register(ALICE, "somebody-else").await;

        assert_eq!(
            outcome.reply,
            Some(Reply::AlreadyRegistered {
                display: "alice.cell.eth".to_string()
            })
        );
        assert_eq!(harness.wallet.created().len(), 1);
        assert_eq!(harness.names.registered().len(), 1);
    }

    // ========================================================================
    // Direct transfers
    // ========================================================================

    /// SEND with no cosigners transfers immediately
    #[tokio::test]
    async fn test_send_without_cosigners_executes_immediately() {
        let harness = TestHarness::new();
        harness.register(ALICE, "alice").await;
        let alice = harness.user(ALICE).await;

        let outcome = harness.text(ALICE, "SEND 10USDC 0xdeadbeef").await;

        let transfers = harness.wallet.transfers();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].from_wallet_id, alice.wallet_id);
        assert_eq!(transfers[0].to, "0xdeadbeef");
        assert_eq!(transfers[0].amount, dec("10"));
        assert_eq!(transfers[0].token, "USDC");

        match outcome.reply {
            Some(Reply::SendExecuted {
                amount,
                token,
                recipient,
                tx_hash,
            }) => {
                assert_eq!(amount, dec("10"));
                assert_eq!(token, "USDC");
                assert_eq!(recipient, "0xdeadbeef");
                assert!(tx_hash.starts_with("0x"));
            }
            other => panic!("expected SendExecuted, got {:?}", other),
        }
    }

    /// A failed transfer reports failure to the sender
    #[tokio::test]
    async fn test_send_transfer_failure_reports_failure() {
        let harness = TestHarness::new();
        harness.register(ALICE, "alice").await;
        harness.wallet.set_fail_transfer(true);

        let outcome = harness.text(ALICE, "SEND 10USDC 0xdeadbeef").await;
        assert_eq!(
            outcome.reply,
            Some(Reply::SendFailed {
                amount: dec("10"),
                token: "USDC".to_string(),
                recipient: "0xdeadbeef".to_string(),
            })
        );
    }

    // ========================================================================
    // Cosigner nomination
    // ========================================================================

    /// Nominees must already have wallets
    #[tokio::test]
    async fn test_nominate_requires_registered_nominees() {
        let harness = TestHarness::new();
        harness.register(ALICE, "alice").await;
        harness.register(BOB, "bob").await;

        let outcome = harness
            .text(ALICE, &format!("NOMINATE {} {}", BOB, CAROL))
            .await;

        assert_eq!(
            outcome.reply,
            Some(Reply::Invalid {
                message: format!("{} does not have a wallet yet.", CAROL)
            })
        );
        assert!(outcome.notifications.is_empty());
    }

    /// Self-nomination and duplicate nominees are rejected
    #[tokio::test]
    async fn test_nominate_rejects_self_and_duplicates() {
        let harness = TestHarness::new();
        harness.register(ALICE, "alice").await;
        harness.register(BOB, "bob").await;

        let outcome = harness
            .text(ALICE, &format!("NOMINATE {} {}", BOB, BOB))
            .await;
        assert_eq!(
            outcome.reply,
            Some(Reply::Invalid {
                message: "You must nominate two different people.".to_string()
            })
        );

        let outcome = harness
            .text(ALICE, &format!("NOMINATE {} {}", ALICE, BOB))
            .await;
        assert_eq!(
            outcome.reply,
            Some(Reply::Invalid {
                message: "You cannot nominate yourself.".to_string()
            })
        );
    }

    /// Full nomination round: both nominees get distinct codes, an ACCEPT
    /// notifies the nominator and makes the nominee a cosigner
    #[tokio::test]
    async fn test_nomination_accept_flow() {
        let harness = TestHarness::new();
        harness.register(ALICE, "alice").await;
        harness.register(BOB, "bob").await;
        harness.register(CAROL, "carol").await;

        let outcome = harness
            .text(ALICE, &format!("NOMINATE {} {}", BOB, CAROL))
            .await;
        assert_eq!(
            outcome.reply,
            Some(Reply::NominationSent {
                first: BOB.to_string(),
                second: CAROL.to_string(),
            })
        );

        let bob_code = code_of(notification_for(&outcome, BOB));
        let carol_code = code_of(notification_for(&outcome, CAROL));
        assert_ne!(bob_code, carol_code);

        let answer = harness.text(BOB, &format!("ACCEPT {}", bob_code)).await;
        assert_eq!(answer.reply, Some(Reply::NominationAnswerRecorded));
        assert_eq!(
            notification_for(&answer, ALICE).reply,
            Reply::NominationAccepted {
                nominee: "bob.cell.eth".to_string()
            }
        );

        let alice = harness.user(ALICE).await;
        let cosigners = harness.store.list_accepted_nominees(alice.id).await.unwrap();
        assert_eq!(cosigners.len(), 1);
        assert_eq!(cosigners[0].phone_number, BOB);
    }

    /// DENY notifies the nominator and never makes a cosigner
    #[tokio::test]
    async fn test_nomination_deny_flow() {
        let harness = TestHarness::new();
        harness.register(ALICE, "alice").await;
        harness.register(BOB, "bob").await;
        harness.register(CAROL, "carol").await;

        let outcome = harness
            .text(ALICE, &format!("NOMINATE {} {}", BOB, CAROL))
            .await;
        let code = code_of(notification_for(&outcome, BOB));

        let answer = harness.text(BOB, &format!("DENY {}", code)).await;
        assert_eq!(answer.reply, Some(Reply::NominationAnswerRecorded));
        assert_eq!(
            notification_for(&answer, ALICE).reply,
            Reply::NominationDenied {
                nominee: "bob.cell.eth".to_string()
            }
        );

        let alice = harness.user(ALICE).await;
        assert!(
            harness
                .store
                .list_accepted_nominees(alice.id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    /// A nomination code works once and only for its addressee
    #[tokio::test]
    async fn test_nomination_code_single_use_and_scoped() {
        let harness = TestHarness::new();
        harness.register(ALICE, "alice").await;
        harness.register(BOB, "bob").await;
        harness.register(CAROL, "carol").await;

        let outcome = harness
            .text(ALICE, &format!("NOMINATE {} {}", BOB, CAROL))
            .await;
        let bob_code = code_of(notification_for(&outcome, BOB));

        // Wrong addressee
        let answer = harness.text(CAROL, &format!("ACCEPT {}", bob_code)).await;
        assert_eq!(answer.reply, Some(Reply::UnknownCode));

        // First use consumes it
        harness.text(BOB, &format!("ACCEPT {}", bob_code)).await;
        let again = harness.text(BOB, &format!("ACCEPT {}", bob_code)).await;
        assert_eq!(again.reply, Some(Reply::UnknownCode));
    }

    // ========================================================================
    // Approval quorum
    // ========================================================================

    /// With an accepted cosigner, SEND parks the transfer and asks for approval
    #[tokio::test]
    async fn test_send_with_cosigner_holds_transfer() {
        let harness = TestHarness::new();
        harness.register(ALICE, "alice").await;
        harness.register(BOB, "bob").await;
        harness.register(DAVE, "dave").await;
        setup_cosigners(&harness, ALICE, &[BOB]).await;
        let held_before = harness.wallet.transfers().len();

        let outcome = harness.text(ALICE, "SEND 25USDC 0xdeadbeef").await;
        assert_eq!(
            outcome.reply,
            Some(Reply::SendPendingApproval {
                amount: dec("25"),
                token: "USDC".to_string(),
                recipient: "0xdeadbeef".to_string(),
            })
        );
        assert_eq!(harness.wallet.transfers().len(), held_before);

        match &notification_for(&outcome, BOB).reply {
            Reply::ApprovalRequest {
                owner,
                amount,
                token,
                recipient,
                code,
            } => {
                assert_eq!(owner, "alice.cell.eth");
                assert_eq!(*amount, dec("25"));
                assert_eq!(token, "USDC");
                assert_eq!(recipient, "0xdeadbeef");
                assert!(!code.is_empty());
            }
            other => panic!("expected ApprovalRequest, got {:?}", other),
        }
    }

    /// Sole cosigner's APPROVE executes the transfer and notifies the owner
    #[tokio::test]
    async fn test_single_cosigner_approve_executes() {
        let harness = TestHarness::new();
        harness.register(ALICE, "alice").await;
        harness.register(BOB, "bob").await;
        harness.register(DAVE, "dave").await;
        setup_cosigners(&harness, ALICE, &[BOB]).await;
        let alice = harness.user(ALICE).await;

        let outcome = harness.text(ALICE, "SEND 25USDC 0xdeadbeef").await;
        let code = code_of(notification_for(&outcome, BOB));
        let before = harness.wallet.transfers().len();

        let approved = harness.text(BOB, &format!("APPROVE {}", code)).await;
        assert_eq!(approved.reply, Some(Reply::ApprovalRecorded));

        let transfers = harness.wallet.transfers();
        assert_eq!(transfers.len(), before + 1);
        let executed = transfers.last().unwrap();
        assert_eq!(executed.from_wallet_id, alice.wallet_id);
        assert_eq!(executed.to, "0xdeadbeef");

        match &notification_for(&approved, ALICE).reply {
            Reply::TransferApproved {
                amount,
                token,
                recipient,
                tx_hash,
            } => {
                assert_eq!(*amount, dec("25"));
                assert_eq!(token, "USDC");
                assert_eq!(recipient, "0xdeadbeef");
                assert!(tx_hash.starts_with("0x"));
            }
            other => panic!("expected TransferApproved, got {:?}", other),
        }
    }

    /// With two cosigners nothing moves until the last APPROVE
    #[tokio::test]
    async fn test_quorum_waits_for_every_cosigner() {
        let harness = TestHarness::new();
        harness.register(ALICE, "alice").await;
        harness.register(BOB, "bob").await;
        harness.register(CAROL, "carol").await;
        setup_cosigners(&harness, ALICE, &[BOB, CAROL]).await;

        let outcome = harness.text(ALICE, "SEND 25USDC 0xdeadbeef").await;
        let bob_code = code_of(notification_for(&outcome, BOB));
        let carol_code = code_of(notification_for(&outcome, CAROL));
        let before = harness.wallet.transfers().len();

        let first = harness.text(BOB, &format!("APPROVE {}", bob_code)).await;
        assert_eq!(first.reply, Some(Reply::ApprovalRecorded));
        assert!(first.notifications.is_empty());
        assert_eq!(harness.wallet.transfers().len(), before);

        let second = harness
            .text(CAROL, &format!("APPROVE {}", carol_code))
            .await;
        assert_eq!(second.reply, Some(Reply::ApprovalRecorded));
        assert_eq!(harness.wallet.transfers().len(), before + 1);
        assert!(matches!(
            notification_for(&second, ALICE).reply,
            Reply::TransferApproved { .. }
        ));
    }

    /// One REJECT settles the transfer failed and tells the owner
    #[tokio::test]
    async fn test_reject_fails_transfer_and_notifies_owner() {
        let harness = TestHarness::new();
        harness.register(ALICE, "alice").await;
        harness.register(BOB, "bob").await;
        harness.register(CAROL, "carol").await;
        setup_cosigners(&harness, ALICE, &[BOB, CAROL]).await;

        let outcome = harness.text(ALICE, "SEND 25USDC 0xdeadbeef").await;
        let bob_code = code_of(notification_for(&outcome, BOB));
        let before = harness.wallet.transfers().len();

        let rejected = harness.text(BOB, &format!("REJECT {}", bob_code)).await;
        assert_eq!(rejected.reply, Some(Reply::RejectionRecorded));
        assert_eq!(harness.wallet.transfers().len(), before);
        assert_eq!(
            notification_for(&rejected, ALICE).reply,
            Reply::TransferRejected {
                amount: dec("25"),
                token: "USDC".to_string(),
                recipient: "0xdeadbeef".to_string(),
            }
        );
    }

    /// A later APPROVE cannot resurrect a rejected transfer
    #[tokio::test]
    async fn test_approve_after_reject_does_not_resurrect() {
        let harness = TestHarness::new();
        harness.register(ALICE, "alice").await;
        harness.register(BOB, "bob").await;
        harness.register(CAROL, "carol").await;
        setup_cosigners(&harness, ALICE, &[BOB, CAROL]).await;

        let outcome = harness.text(ALICE, "SEND 25USDC 0xdeadbeef").await;
        let bob_code = code_of(notification_for(&outcome, BOB));
        let carol_code = code_of(notification_for(&outcome, CAROL));
        let before = harness.wallet.transfers().len();

        harness.text(BOB, &format!("REJECT {}", bob_code)).await;
        let late = harness
            .text(CAROL, &format!("APPROVE {}", carol_code))
            .await;

        assert_eq!(late.reply, Some(Reply::ApprovalRecorded));
        assert!(late.notifications.is_empty());
        assert_eq!(harness.wallet.transfers().len(), before);
    }

    /// If the approved transfer itself fails, the owner hears about it and
    /// the transaction settles failed
    #[tokio::test]
    async fn test_approved_transfer_failure_notifies_owner() {
        let harness = TestHarness::new();
        harness.register(ALICE, "alice").await;
        harness.register(BOB, "bob").await;
        harness.register(DAVE, "dave").await;
        setup_cosigners(&harness, ALICE, &[BOB]).await;

        let outcome = harness.text(ALICE, "SEND 25USDC 0xdeadbeef").await;
        let code = code_of(notification_for(&outcome, BOB));

        // Find the parked transaction through Bob's approval row
        let bob = harness.user(BOB).await;
        let approval = harness
            .store
            .find_pending_approval_by_code(&code, bob.id)
            .await
            .unwrap()
            .unwrap();

        harness.wallet.set_fail_transfer(true);
        let approved = harness.text(BOB, &format!("APPROVE {}", code)).await;

        assert_eq!(approved.reply, Some(Reply::ApprovalRecorded));
        assert_eq!(
            notification_for(&approved, ALICE).reply,
            Reply::SendFailed {
                amount: dec("25"),
                token: "USDC".to_string(),
                recipient: "0xdeadbeef".to_string(),
            }
        );

        let tx = harness
            .store
            .find_transaction(approval.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Failed);
        assert!(tx.tx_hash.is_empty());
    }

    /// An approval code works once
    #[tokio::test]
    async fn test_approval_code_single_use() {
        let harness = TestHarness::new();
        harness.register(ALICE, "alice").await;
        harness.register(BOB, "bob").await;
        harness.register(DAVE, "dave").await;
        setup_cosigners(&harness, ALICE, &[BOB]).await;

        let outcome = harness.text(ALICE, "SEND 25USDC 0xdeadbeef").await;
        let code = code_of(notification_for(&outcome, BOB));

        harness.text(BOB, &format!("APPROVE {}", code)).await;
        let again = harness.text(BOB, &format!("APPROVE {}", code)).await;
        assert_eq!(again.reply, Some(Reply::UnknownCode));
    }

    // ========================================================================
    // Payment requests
    // ========================================================================

    /// REQUEST then PAY: the payer's wallet funds the requester's address
    #[tokio::test]
    async fn test_request_and_pay_flow() {
        let harness = TestHarness::new();
        harness.register(ALICE, "alice").await;
        harness.register(BOB, "bob").await;
        let alice = harness.user(ALICE).await;
        let bob = harness.user(BOB).await;

        let requested = harness.text(ALICE, &format!("REQUEST 5USDC {}", BOB)).await;
        let code = code_of(notification_for(&requested, BOB));
        match &requested.reply {
            Some(Reply::RequestSent {
                amount,
                token,
                target,
                code: reply_code,
            }) => {
                assert_eq!(*amount, dec("5"));
                assert_eq!(token, "USDC");
                assert_eq!(target, "bob.cell.eth");
                assert_eq!(reply_code, &code);
            }
            other => panic!("expected RequestSent, got {:?}", other),
        }
        assert_eq!(
            notification_for(&requested, BOB).reply,
            Reply::PaymentRequest {
                requester: "alice.cell.eth".to_string(),
                amount: dec("5"),
                token: "USDC".to_string(),
                code: code.clone(),
            }
        );

        let paid = harness.text(BOB, &format!("PAY {}", code)).await;
        let transfers = harness.wallet.transfers();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].from_wallet_id, bob.wallet_id);
        assert_eq!(transfers[0].to, alice.wallet_address);
        assert_eq!(transfers[0].amount, dec("5"));

        match &paid.reply {
            Some(Reply::PaymentSent {
                amount,
                token,
                tx_hash,
            }) => {
                assert_eq!(*amount, dec("5"));
                assert_eq!(token, "USDC");
                assert!(tx_hash.starts_with("0x"));
            }
            other => panic!("expected PaymentSent, got {:?}", other),
        }
        assert!(matches!(
            &notification_for(&paid, ALICE).reply,
            Reply::PaymentReceived { payer, .. } if payer == "bob.cell.eth"
        ));
    }

    /// You cannot bill yourself
    #[tokio::test]
    async fn test_request_from_self_rejected() {
        let harness = TestHarness::new();
        harness.register(ALICE, "alice").await;

        let outcome = harness
            .text(ALICE, &format!("REQUEST 5USDC {}", ALICE))
            .await;
        assert_eq!(
            outcome.reply,
            Some(Reply::Invalid {
                message: "You cannot request a payment from yourself.".to_string()
            })
        );
    }

    /// A payment code is consumed by the first successful PAY
    #[tokio::test]
    async fn test_payment_code_single_use() {
        let harness = TestHarness::new();
        harness.register(ALICE, "alice").await;
        harness.register(BOB, "bob").await;

        let requested = harness.text(ALICE, &format!("REQUEST 5USDC {}", BOB)).await;
        let code = code_of(notification_for(&requested, BOB));

        harness.text(BOB, &format!("PAY {}", code)).await;
        let again = harness.text(BOB, &format!("PAY {}", code)).await;
        assert_eq!(again.reply, Some(Reply::UnknownCode));
        assert_eq!(harness.wallet.transfers().len(), 1);
    }

    /// Only the billed party can pay a request
    #[tokio::test]
    async fn test_payment_code_scoped_to_recipient() {
        let harness = TestHarness::new();
        harness.register(ALICE, "alice").await;
        harness.register(BOB, "bob").await;
        harness.register(CAROL, "carol").await;

        let requested = harness.text(ALICE, &format!("REQUEST 5USDC {}", BOB)).await;
        let code = code_of(notification_for(&requested, BOB));

        let outcome = harness.text(CAROL, &format!("PAY {}", code)).await;
        assert_eq!(outcome.reply, Some(Reply::UnknownCode));
        assert!(harness.wallet.transfers().is_empty());
    }

    /// A failed payment transfer leaves the request open for a retry
    #[tokio::test]
    async fn test_pay_transfer_failure_keeps_request_open() {
        let harness = TestHarness::new();
        harness.register(ALICE, "alice").await;
        harness.register(BOB, "bob").await;

        let requested = harness.text(ALICE, &format!("REQUEST 5USDC {}", BOB)).await;
        let code = code_of(notification_for(&requested, BOB));

        harness.wallet.set_fail_transfer(true);
        let failed = harness.text(BOB, &format!("PAY {}", code)).await;
        assert_eq!(failed.reply, Some(Reply::PaymentFailed));
        assert!(failed.notifications.is_empty());

        harness.wallet.set_fail_transfer(false);
        let retried = harness.text(BOB, &format!("PAY {}", code)).await;
        assert!(matches!(retried.reply, Some(Reply::PaymentSent { .. })));
    }
}
