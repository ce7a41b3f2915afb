//! Reply Formatting
//!
//! Turns the outcome of one command into the sentence shown to the user.
//! Formatting is a pure function of the intent kind and the outcome; internal
//! error values never reach the user except the raw upstream text, which is
//! marked as details.

use crate::intent::IntentKind;
use crate::payment::{AmountError, ExecutionResult, Failure};
use crate::utils::format::format_date;
use crate::wallet::TransactionRecord;
use serde::Serialize;

/// Most recent transactions listed in a history reply
pub const MAX_LISTED_TRANSACTIONS: usize = 5;

pub const HELP_TEXT: &str = "I can help you with:
- Send payments: \"Send 10 USDC to bob\"
- Pay an address: \"Pay 5 to 0x1234...abcd\"
- Check balance: \"What's my balance?\"
- Show your address: \"What is my wallet address?\"
- View history: \"Show my transactions\"";

/// What happened while handling one command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Outcome {
    Balance(String),
    Address(String),
    Transactions(Vec<TransactionRecord>),
    Executed(ExecutionResult),
    Failed(Failure),
    NeedsRecipient { amount: String },
    Help,
}

impl Outcome {
    /// `success` or `failure`, for API clients that only branch on status
    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Failed(_) | Outcome::Executed(ExecutionResult::Failure(_)) => "failure",
            Outcome::NeedsRecipient { .. } => "incomplete",
            _ => "success",
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Failed(f) | Outcome::Executed(ExecutionResult::Failure(f)) => Some(f),
            _ => None,
        }
    }
}

pub fn format(kind: IntentKind, outcome: &Outcome) -> String {
    match outcome {
        Outcome::Balance(amount) => format!("Your balance is {} USDC.", amount),
        Outcome::Address(address) => format!("Your wallet address is {}", address),
        Outcome::Transactions(records) => format_transactions(records),
        Outcome::Executed(ExecutionResult::Success {
            reference,
            display_recipient,
            amount,
        }) => format!(
            "Successfully sent {} USDC to {}. Reference: {}",
            amount, display_recipient, reference
        ),
        Outcome::Executed(ExecutionResult::Failure(failure)) | Outcome::Failed(failure) => {
            format_failure(kind, failure)
        }
        Outcome::NeedsRecipient { amount } => format!(
            "Who should I send {} USDC to? Name a contact like \"bob\" or give a full 0x address.",
            amount
        ),
        Outcome::Help => HELP_TEXT.to_string(),
    }
}

fn format_transactions(records: &[TransactionRecord]) -> String {
    if records.is_empty() {
        return "You have no transactions yet.".to_string();
    }

    let mut lines = vec!["Here are your recent transactions:".to_string()];
    lines.extend(records.iter().take(MAX_LISTED_TRANSACTIONS).map(|tx| {
        let direction = tx.direction.as_deref().unwrap_or(&tx.operation).to_lowercase();
        format!(
            "- {} {} USDC ({}) on {}",
            direction,
            tx.amount,
            tx.state.to_lowercase(),
            format_date(&tx.created_at)
        )
    }));
    lines.join("\n")
}

fn login_action(kind: IntentKind) -> &'static str {
    match kind {
        IntentKind::CheckBalance => "check your balance",
        IntentKind::CheckAddress => "view your wallet address",
        IntentKind::ListTransactions => "view your transactions",
        IntentKind::SendPayment => "send payments",
        IntentKind::Unknown => "use your wallet",
    }
}

fn format_failure(kind: IntentKind, failure: &Failure) -> String {
    match failure {
        Failure::NotAuthenticated => format!("Please login first to {}.", login_action(kind)),
        Failure::InsufficientFunds => {
            "You don't have enough USDC for this transfer. Check your balance and try a smaller amount."
                .to_string()
        }
        Failure::InvalidRecipient { recipient } => format!(
            "I couldn't find a recipient called \"{}\". Use a known contact name or a full 0x address.",
            recipient
        ),
        Failure::InvalidAmount(e) => format_amount_error(e),
        Failure::UpstreamError { message } => format!(
            "Sorry, the wallet service could not complete your request. (details: {})",
            message
        ),
    }
}

fn format_amount_error(error: &AmountError) -> String {
    match error {
        AmountError::Missing => {
            "How much would you like to send? Include an amount, for example \"send 10 USDC to bob\"."
                .to_string()
        }
        AmountError::NotANumber(raw) => format!("\"{}\" is not a valid amount.", raw),
        AmountError::NotPositive(_) => "The amount must be greater than zero.".to_string(),
        AmountError::TooPrecise(_) => "USDC amounts can have at most 6 decimal places.".to_string(),
        AmountError::OverLimit { amount, limit } => format!(
            "{} USDC is over the single transfer limit of {} USDC.",
            amount, limit
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(id: &str, direction: Option<&str>, day: u32) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            operation: "TRANSFER".to_string(),
            direction: direction.map(str::to_string),
            amount: "2.5".to_string(),
            state: "COMPLETE".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 6, day, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_success_names_recipient_and_reference() {
        let outcome = Outcome::Executed(ExecutionResult::Success {
            reference: "tx123".into(),
            display_recipient: "bob".into(),
            amount: "10".into(),
        });
        let message = format(IntentKind::SendPayment, &outcome);
        assert!(message.contains("bob"));
        assert!(message.contains("tx123"));
        assert!(message.starts_with("Successfully sent 10"));
    }

    #[test]
    fn test_login_prompts_per_intent() {
        let outcome = Outcome::Failed(Failure::NotAuthenticated);
        assert_eq!(
            format(IntentKind::CheckBalance, &outcome),
            "Please login first to check your balance."
        );
        assert_eq!(
            format(IntentKind::SendPayment, &outcome),
            "Please login first to send payments."
        );
        assert_eq!(
            format(IntentKind::ListTransactions, &outcome),
            "Please login first to view your transactions."
        );
    }

    #[test]
    fn test_upstream_error_keeps_raw_text_as_details() {
        let outcome = Outcome::Executed(ExecutionResult::Failure(Failure::UpstreamError {
            message: "wallet is frozen".into(),
        }));
        let message = format(IntentKind::SendPayment, &outcome);
        assert!(message.starts_with("Sorry"));
        assert!(message.ends_with("(details: wallet is frozen)"));
    }

    #[test]
    fn test_invalid_recipient_named() {
        let outcome = Outcome::Failed(Failure::InvalidRecipient {
            recipient: "unknownperson123".into(),
        });
        assert!(format(IntentKind::SendPayment, &outcome).contains("unknownperson123"));
    }

    #[test]
    fn test_transactions_capped_at_five() {
        let records: Vec<_> = (1..=7).map(|d| record(&format!("t{}", d), Some("OUTBOUND"), d)).collect();
        let message = format(IntentKind::ListTransactions, &Outcome::Transactions(records));
        let lines: Vec<_> = message.lines().collect();
        assert_eq!(lines.len(), 1 + MAX_LISTED_TRANSACTIONS);
        assert_eq!(lines[1], "- outbound 2.5 USDC (complete) on 2025-06-01 09:30");
    }

    #[test]
    fn test_transaction_without_direction_uses_operation() {
        let message = format(
            IntentKind::ListTransactions,
            &Outcome::Transactions(vec![record("t1", None, 2)]),
        );
        assert!(message.contains("- transfer 2.5 USDC"));
        assert_eq!(
            format(IntentKind::ListTransactions, &Outcome::Transactions(vec![])),
            "You have no transactions yet."
        );
    }

    #[test]
    fn test_amount_errors_are_actionable() {
        let over = Outcome::Failed(Failure::InvalidAmount(AmountError::OverLimit {
            amount: "25000".into(),
            limit: "10000".into(),
        }));
        assert_eq!(
            format(IntentKind::SendPayment, &over),
            "25000 USDC is over the single transfer limit of 10000 USDC."
        );
        let missing = Outcome::Failed(Failure::InvalidAmount(AmountError::Missing));
        assert!(format(IntentKind::SendPayment, &missing).contains("How much"));
    }

    #[test]
    fn test_address_shown_in_full_and_help() {
        let address = "0x0263fd91c595ed132686147abb8fe8b39564b72b";
        assert!(format(IntentKind::CheckAddress, &Outcome::Address(address.into())).contains(address));
        assert_eq!(format(IntentKind::Unknown, &Outcome::Help), HELP_TEXT);
    }

    #[test]
    fn test_status() {
        assert_eq!(Outcome::Help.status(), "success");
        assert_eq!(Outcome::Failed(Failure::NotAuthenticated).status(), "failure");
        assert_eq!(Outcome::NeedsRecipient { amount: "5".into() }.status(), "incomplete");
    }
}
