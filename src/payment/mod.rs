//! Payment Execution
//!
//! Request-scoped value types for one transfer plus the two stages that act on them:
//!
//! - [`RecipientResolver`]: turns a [`RecipientRef`](crate::intent::RecipientRef) into an address
//! - [`PaymentExecutor`]: validates a [`PaymentRequest`] locally and submits it once
//!
//! Every failure is one of the [`Failure`] variants; nothing on this path retries.

pub mod executor;
pub mod recipient;

pub use executor::PaymentExecutor;
pub use recipient::{RecipientResolver, ResolvedRecipient};

use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;
use uuid::Uuid;

/// USDC carries 6 decimals on chain
pub const USDC_DECIMALS: u32 = 6;

static ADDRESS_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("address pattern is valid"));

/// `0x` followed by exactly 40 hex digits, either case
pub fn is_valid_address(value: &str) -> bool {
    ADDRESS_FORMAT.is_match(value)
}

/// Why an amount was rejected before reaching the wallet service
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AmountError {
    #[error("no amount given")]
    Missing,

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("{0} is not a positive amount")]
    NotPositive(String),

    #[error("{0} has more than 6 decimal places")]
    TooPrecise(String),

    #[error("{amount} exceeds the single transfer limit of {limit}")]
    OverLimit { amount: String, limit: String },
}

/// Parse and check a user supplied amount against the transfer rules
pub fn validate_amount(raw: &str, limit: Decimal) -> Result<Decimal, AmountError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Missing);
    }

    let amount = Decimal::from_str(trimmed).map_err(|_| AmountError::NotANumber(trimmed.to_string()))?;
    if amount <= Decimal::ZERO {
        return Err(AmountError::NotPositive(trimmed.to_string()));
    }
    if amount.normalize().scale() > USDC_DECIMALS {
        return Err(AmountError::TooPrecise(trimmed.to_string()));
    }
    if amount > limit {
        return Err(AmountError::OverLimit {
            amount: trimmed.to_string(),
            limit: limit.normalize().to_string(),
        });
    }
    Ok(amount)
}

/// Terminal failure of one command
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Failure {
    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("invalid recipient '{recipient}'")]
    InvalidRecipient { recipient: String },

    #[error("invalid amount: {0}")]
    InvalidAmount(AmountError),

    /// `message` is the raw upstream text, kept for diagnostics only
    #[error("upstream error: {message}")]
    UpstreamError { message: String },

    #[error("not authenticated")]
    NotAuthenticated,
}

impl From<AmountError> for Failure {
    fn from(e: AmountError) -> Self {
        Failure::InvalidAmount(e)
    }
}

/// A single transfer, built right before submission and never stored
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub source_wallet_id: String,
    pub recipient_address: String,
    pub amount: String,
    pub memo: Option<String>,
    /// Name shown to the user instead of the raw address
    pub recipient_label: Option<String>,
    /// Forwarded to the wallet service; resubmitting this value cannot pay twice
    pub idempotency_key: Uuid,
}

impl PaymentRequest {
    pub fn new(
        source_wallet_id: impl Into<String>,
        recipient_address: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            source_wallet_id: source_wallet_id.into(),
            recipient_address: recipient_address.into(),
            amount: amount.into(),
            memo: None,
            recipient_label: None,
            idempotency_key: Uuid::new_v4(),
        }
    }

    pub fn with_memo(mut self, memo: Option<String>) -> Self {
        self.memo = memo.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn with_recipient_label(mut self, label: Option<String>) -> Self {
        self.recipient_label = label;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionResult {
    Success {
        reference: String,
        display_recipient: String,
        amount: String,
    },
    Failure(Failure),
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    pub fn reference(&self) -> Option<&str> {
        match self {
            ExecutionResult::Success { reference, .. } => Some(reference),
            ExecutionResult::Failure(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit() -> Decimal {
        Decimal::from(10_000)
    }

    #[test]
    fn test_address_format() {
        assert!(is_valid_address("0xf37a740f4c3f7afd7269cec210525f85cb03e57a"));
        assert!(is_valid_address("0xF37A740F4C3F7AFD7269CEC210525F85CB03E57A"));
        assert!(!is_valid_address("0xf37a740f4c3f7afd7269cec210525f85cb03e57"));
        assert!(!is_valid_address("0xf37a740f4c3f7afd7269cec210525f85cb03e57a0"));
        assert!(!is_valid_address("f37a740f4c3f7afd7269cec210525f85cb03e57a00"));
        assert!(!is_valid_address("0xg37a740f4c3f7afd7269cec210525f85cb03e57a"));
    }

    #[test]
    fn test_validate_amount_accepts() {
        assert_eq!(validate_amount("10", limit()).unwrap(), Decimal::from(10));
        assert!(validate_amount("0.000001", limit()).is_ok());
        assert!(validate_amount("10000", limit()).is_ok());
        assert!(validate_amount("2.500000", limit()).is_ok());
    }

    #[test]
    fn test_validate_amount_rejects() {
        assert_eq!(validate_amount("", limit()), Err(AmountError::Missing));
        assert_eq!(validate_amount("ten", limit()), Err(AmountError::NotANumber("ten".into())));
        assert_eq!(validate_amount("0", limit()), Err(AmountError::NotPositive("0".into())));
        assert_eq!(validate_amount("-5", limit()), Err(AmountError::NotPositive("-5".into())));
        assert_eq!(
            validate_amount("0.0000001", limit()),
            Err(AmountError::TooPrecise("0.0000001".into()))
        );
        assert!(matches!(
            validate_amount("10000.01", limit()),
            Err(AmountError::OverLimit { .. })
        ));
    }

    #[test]
    fn test_payment_request_keys_are_unique() {
        let a = PaymentRequest::new("w1", "0xabc", "1");
        let b = PaymentRequest::new("w1", "0xabc", "1");
        assert_ne!(a.idempotency_key, b.idempotency_key);
        assert_eq!(a.clone().idempotency_key, a.idempotency_key);
    }

    #[test]
    fn test_blank_memo_dropped() {
        let request = PaymentRequest::new("w1", "0xabc", "1").with_memo(Some("  ".into()));
        assert_eq!(request.memo, None);
    }
}
