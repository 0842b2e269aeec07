//! Reply templates
//!
//! Pure rendering from [`Reply`] to the SMS text users see. Total over the
//! catalog; no I/O, no fallible paths.

use super::reply::Reply;

pub const HELP_TEXT: &str = "Commands: HELP (this message), REGISTER [username] (create wallet), \
SEND [amount][token] [address/name] (send tokens), NOMINATE [phone1] [phone2] (nominate cosigners), \
ACCEPT/DENY [code] (answer a nomination), APPROVE/REJECT [code] (answer a transfer), \
REQUEST [amount][token] [phone] (request a payment), PAY [code] (pay a request)";

pub const UNRECOGNIZED_TEXT: &str =
    "Command not recognized. Text HELP to see available commands.";

/// Render a reply to the message text sent over SMS
pub fn compose(reply: &Reply) -> String {
    match reply {
        Reply::Help => HELP_TEXT.to_string(),
        Reply::WalletCreated { display } => {
            format!("Your new wallet has been created: {}", display)
        }
        Reply::AlreadyRegistered { display } => {
            format!("You already have a wallet: {}", display)
        }
        Reply::NotRegistered => {
            "You don't have a wallet yet. Text REGISTER to create one.".to_string()
        }
        Reply::SendExecuted {
            amount,
            token,
            recipient,
            tx_hash,
        } => format!(
            "Successfully initiated transfer of {} {} to {}. Transaction hash: {}",
            amount, token, recipient, tx_hash
        ),
        Reply::SendFailed {
            amount,
            token,
            recipient,
        } => format!(
            "Failed to initiate transfer of {} {} to {}. Please try again later.",
            amount, token, recipient
        ),
        Reply::SendPendingApproval {
            amount,
            token,
            recipient,
        } => format!(
            "Transfer of {} {} to {} is pending approval. Your cosigners have been notified.",
            amount, token, recipient
        ),
        Reply::ApprovalRequest {
            owner,
            amount,
            token,
            recipient,
            code,
        } => format!(
            "{} wants to send {} {} to {}. Reply APPROVE {} or REJECT {}.",
            owner, amount, token, recipient, code, code
        ),
        Reply::ApprovalRecorded => "Your approval has been recorded.".to_string(),
        Reply::RejectionRecorded => "Your rejection has been recorded.".to_string(),
        Reply::TransferApproved {
            amount,
            token,
            recipient,
            tx_hash,
        } => format!(
            "Your transfer of {} {} to {} was approved and sent. Transaction hash: {}",
            amount, token, recipient, tx_hash
        ),
        Reply::TransferRejected {
            amount,
            token,
            recipient,
        } => format!(
            "Your transfer of {} {} to {} was rejected by a cosigner.",
            amount, token, recipient
        ),
        Reply::NominationSent { first, second } => format!(
            "Nomination sent to {} and {}. They must reply ACCEPT with their code.",
            first, second
        ),
        Reply::NominationRequest { nominator, code } => format!(
            "{} nominated you as a cosigner. Reply ACCEPT {} or DENY {}.",
            nominator, code, code
        ),
        Reply::NominationAccepted { nominee } => {
            format!("{} accepted your nomination.", nominee)
        }
        Reply::NominationDenied { nominee } => {
            format!("{} denied your nomination.", nominee)
        }
        Reply::NominationAnswerRecorded => "Your response has been recorded.".to_string(),
        Reply::RequestSent {
            amount,
            token,
            target,
            code,
        } => format!(
            "Payment request sent: {} {} from {}. Code: {}",
            amount, token, target, code
        ),
        Reply::PaymentRequest {
            requester,
            amount,
            token,
            code,
        } => format!(
            "{} requests {} {}. Reply PAY {} to pay.",
            requester, amount, token, code
        ),
        Reply::PaymentSent {
            amount,
            token,
            tx_hash,
        } => format!(
            "Payment of {} {} sent. Transaction hash: {}",
            amount, token, tx_hash
        ),
        Reply::PaymentReceived {
            payer,
            amount,
            token,
            tx_hash,
        } => format!(
            "{} paid your request of {} {}. Transaction hash: {}",
            payer, amount, token, tx_hash
        ),
        Reply::PaymentFailed => "Payment failed. Please try again later.".to_string(),
        Reply::UnknownCode => {
            "That code was not recognized or has already been used.".to_string()
        }
        Reply::Invalid { message } => message.clone(),
        Reply::Failure => "Something went wrong. Please try again later.".to_string(),
        Reply::Unrecognized => UNRECOGNIZED_TEXT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_wallet_templates() {
        assert_eq!(
            compose(&Reply::WalletCreated {
                display: "alice.cell.eth".to_string()
            }),
            "Your new wallet has been created: alice.cell.eth"
        );
        assert_eq!(
            compose(&Reply::AlreadyRegistered {
                display: "0xabc123".to_string()
            }),
            "You already have a wallet: 0xabc123"
        );
    }

    #[test]
    fn test_send_templates() {
        assert_eq!(
            compose(&Reply::SendExecuted {
                amount: dec("10"),
                token: "USDC".to_string(),
                recipient: "0xabc".to_string(),
                tx_hash: "0xhash".to_string(),
            }),
            "Successfully initiated transfer of 10 USDC to 0xabc. Transaction hash: 0xhash"
        );
        assert_eq!(
            compose(&Reply::SendPendingApproval {
                amount: dec("0.5"),
                token: "USDC".to_string(),
                recipient: "bob.cell.eth".to_string(),
            }),
            "Transfer of 0.5 USDC to bob.cell.eth is pending approval. Your cosigners have been notified."
        );
    }

    #[test]
    fn test_approval_request_repeats_code() {
        let text = compose(&Reply::ApprovalRequest {
            owner: "alice.cell.eth".to_string(),
            amount: dec("10"),
            token: "USDC".to_string(),
            recipient: "0xabc".to_string(),
            code: "AB23CD".to_string(),
        });
        assert_eq!(
            text,
            "alice.cell.eth wants to send 10 USDC to 0xabc. Reply APPROVE AB23CD or REJECT AB23CD."
        );
    }

    #[test]
    fn test_nomination_templates() {
        assert_eq!(
            compose(&Reply::NominationRequest {
                nominator: "+15551230001".to_string(),
                code: "QR67ST".to_string(),
            }),
            "+15551230001 nominated you as a cosigner. Reply ACCEPT QR67ST or DENY QR67ST."
        );
        assert_eq!(
            compose(&Reply::NominationSent {
                first: "+15551230002".to_string(),
                second: "+15551230003".to_string(),
            }),
            "Nomination sent to +15551230002 and +15551230003. They must reply ACCEPT with their code."
        );
    }

    #[test]
    fn test_payment_templates() {
        assert_eq!(
            compose(&Reply::PaymentRequest {
                requester: "carol.cell.eth".to_string(),
                amount: dec("25"),
                token: "USDC".to_string(),
                code: "WX89YZ".to_string(),
            }),
            "carol.cell.eth requests 25 USDC. Reply PAY WX89YZ to pay."
        );
        assert_eq!(
            compose(&Reply::PaymentReceived {
                payer: "+15551230004".to_string(),
                amount: dec("25"),
                token: "USDC".to_string(),
                tx_hash: "0xdeadbeef".to_string(),
            }),
            "+15551230004 paid your request of 25 USDC. Transaction hash: 0xdeadbeef"
        );
    }

    #[test]
    fn test_terse_templates() {
        assert_eq!(compose(&Reply::ApprovalRecorded), "Your approval has been recorded.");
        assert_eq!(
            compose(&Reply::UnknownCode),
            "That code was not recognized or has already been used."
        );
        assert_eq!(
            compose(&Reply::Failure),
            "Something went wrong. Please try again later."
        );
        assert_eq!(compose(&Reply::Unrecognized), UNRECOGNIZED_TEXT);
        assert_eq!(
            compose(&Reply::NotRegistered),
            "You don't have a wallet yet. Text REGISTER to create one."
        );
    }

    #[test]
    fn test_help_lists_every_verb() {
        let help = compose(&Reply::Help);
        for verb in [
            "HELP", "REGISTER", "SEND", "NOMINATE", "ACCEPT", "DENY", "APPROVE", "REJECT",
            "REQUEST", "PAY",
        ] {
            assert!(help.contains(verb), "help text should mention {}", verb);
        }
    }

    #[test]
    fn test_invalid_passes_message_through() {
        assert_eq!(
            compose(&Reply::Invalid {
                message: "You cannot nominate yourself.".to_string()
            }),
            "You cannot nominate yourself."
        );
    }
}
