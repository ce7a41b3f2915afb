use crate::payment::{is_valid_address, validate_amount, ExecutionResult, Failure, PaymentRequest};
use crate::utils::format::shorten_address;
use crate::wallet::{TransferService, TransferSubmission};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

/// Upstream wording that means the source wallet cannot cover the transfer
const INSUFFICIENT_FUNDS_MARKERS: [&str; 4] = [
    "insufficient",
    "not enough",
    "exceeds balance",
    "exceeds the balance",
];

/// Validates a payment locally, then submits it with exactly one transfer call.
///
/// No retry: one `execute` is at most one transfer call. Callers that resubmit must
/// reuse the same [`PaymentRequest`] so its idempotency key travels with it.
pub struct PaymentExecutor {
    transfers: Arc<dyn TransferService>,
    max_single_transfer: Decimal,
}

impl PaymentExecutor {
    pub fn new(transfers: Arc<dyn TransferService>, max_single_transfer: Decimal) -> Self {
        Self {
            transfers,
            max_single_transfer,
        }
    }

    fn check_preconditions(&self, request: &PaymentRequest) -> Result<(), Failure> {
        if request.source_wallet_id.trim().is_empty() {
            return Err(Failure::NotAuthenticated);
        }
        validate_amount(&request.amount, self.max_single_transfer)?;
        if !is_valid_address(&request.recipient_address) {
            return Err(Failure::InvalidRecipient {
                recipient: request
                    .recipient_label
                    .clone()
                    .unwrap_or_else(|| request.recipient_address.clone()),
            });
        }
        Ok(())
    }

    pub async fn execute(&self, request: &PaymentRequest) -> ExecutionResult {
        if let Err(failure) = self.check_preconditions(request) {
            info!(
                wallet_id = %request.source_wallet_id,
                amount = %request.amount,
                failure = %failure,
                "Payment rejected before submission"
            );
            return ExecutionResult::Failure(failure);
        }

        let submission = TransferSubmission {
            wallet_id: request.source_wallet_id.clone(),
            destination_address: request.recipient_address.clone(),
            amount: request.amount.trim().to_string(),
            idempotency_key: request.idempotency_key,
            memo: request.memo.clone(),
        };

        info!(
            wallet_id = %submission.wallet_id,
            destination = %submission.destination_address,
            amount = %submission.amount,
            idempotency_key = %submission.idempotency_key,
            "Submitting transfer"
        );

        match self.transfers.submit_transfer(&submission).await {
            Ok(receipt) => {
                info!(reference = %receipt.id, state = %receipt.state, "Transfer accepted");
                ExecutionResult::Success {
                    reference: receipt.id,
                    display_recipient: request
                        .recipient_label
                        .clone()
                        .unwrap_or_else(|| shorten_address(&request.recipient_address)),
                    amount: submission.amount,
                }
            }
            Err(e) => {
                let message = e.upstream_message();
                warn!(error = %e, "Transfer failed");
                ExecutionResult::Failure(classify_upstream(message))
            }
        }
    }
}

fn classify_upstream(message: String) -> Failure {
    let lower = message.to_lowercase();
    if INSUFFICIENT_FUNDS_MARKERS.iter().any(|m| lower.contains(m)) {
        Failure::InsufficientFunds
    } else {
        Failure::UpstreamError { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::AmountError;
    use crate::wallet::{TransferReceipt, WalletError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    const BOB: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    /// Records submissions; replies with a receipt or an API error
    struct RecordingTransfers {
        submissions: Mutex<Vec<TransferSubmission>>,
        error: Option<String>,
    }

    impl RecordingTransfers {
        fn ok() -> Arc<Self> {
            Arc::new(Self { submissions: Mutex::new(Vec::new()), error: None })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                submissions: Mutex::new(Vec::new()),
                error: Some(message.to_string()),
            })
        }

        fn calls(&self) -> usize {
            self.submissions.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TransferService for RecordingTransfers {
        async fn submit_transfer(&self, transfer: &TransferSubmission) -> Result<TransferReceipt, WalletError> {
            self.submissions.lock().unwrap().push(transfer.clone());
            match &self.error {
                Some(message) => Err(WalletError::Api {
                    status: 400,
                    code: None,
                    message: message.clone(),
                }),
                None => Ok(TransferReceipt {
                    id: "tx123".to_string(),
                    state: "INITIATED".to_string(),
                }),
            }
        }
    }

    fn executor(transfers: Arc<RecordingTransfers>) -> PaymentExecutor {
        PaymentExecutor::new(transfers, Decimal::from(10_000))
    }

    #[tokio::test]
    async fn test_success_submits_once() {
        let transfers = RecordingTransfers::ok();
        let request = PaymentRequest::new("w1", BOB, "10").with_recipient_label(Some("bob".into()));

        let result = executor(transfers.clone()).execute(&request).await;
        assert_eq!(
            result,
            ExecutionResult::Success {
                reference: "tx123".into(),
                display_recipient: "bob".into(),
                amount: "10".into(),
            }
        );

        let submissions = transfers.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].wallet_id, "w1");
        assert_eq!(submissions[0].destination_address, BOB);
        assert_eq!(submissions[0].amount, "10");
        assert_eq!(submissions[0].idempotency_key, request.idempotency_key);
    }

    #[tokio::test]
    async fn test_unlabelled_recipient_is_shortened() {
        let transfers = RecordingTransfers::ok();
        let result = executor(transfers).execute(&PaymentRequest::new("w1", BOB, "1")).await;
        match result {
            ExecutionResult::Success { display_recipient, .. } => {
                assert_eq!(display_recipient, "0xbbbb...bbbb");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_positive_amount_never_calls_upstream() {
        let transfers = RecordingTransfers::ok();
        let executor = executor(transfers.clone());

        for amount in ["0", "-3", "0.00", "abc", ""] {
            let result = executor.execute(&PaymentRequest::new("w1", BOB, amount)).await;
            assert!(
                matches!(result, ExecutionResult::Failure(Failure::InvalidAmount(_))),
                "amount {:?} gave {:?}",
                amount,
                result
            );
        }
        assert_eq!(transfers.calls(), 0);
    }

    #[tokio::test]
    async fn test_bad_address_never_calls_upstream() {
        let transfers = RecordingTransfers::ok();
        let result = executor(transfers.clone())
            .execute(&PaymentRequest::new("w1", "0x12345", "5"))
            .await;
        assert_eq!(
            result,
            ExecutionResult::Failure(Failure::InvalidRecipient { recipient: "0x12345".into() })
        );
        assert_eq!(transfers.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_wallet_is_not_authenticated() {
        let transfers = RecordingTransfers::ok();
        let result = executor(transfers.clone()).execute(&PaymentRequest::new("", BOB, "5")).await;
        assert_eq!(result, ExecutionResult::Failure(Failure::NotAuthenticated));
        assert_eq!(transfers.calls(), 0);
    }

    #[tokio::test]
    async fn test_over_limit_rejected_locally() {
        let transfers = RecordingTransfers::ok();
        let result = executor(transfers.clone())
            .execute(&PaymentRequest::new("w1", BOB, "25000"))
            .await;
        assert_eq!(
            result,
            ExecutionResult::Failure(Failure::InvalidAmount(AmountError::OverLimit {
                amount: "25000".into(),
                limit: "10000".into(),
            }))
        );
        assert_eq!(transfers.calls(), 0);
    }

    #[tokio::test]
    async fn test_insufficient_funds_classified() {
        let transfers = RecordingTransfers::failing("Insufficient funds for transfer");
        let result = executor(transfers.clone()).execute(&PaymentRequest::new("w1", BOB, "5")).await;
        assert_eq!(result, ExecutionResult::Failure(Failure::InsufficientFunds));
        assert_eq!(transfers.calls(), 1);
    }

    #[tokio::test]
    async fn test_other_upstream_errors_keep_message_and_do_not_retry() {
        let transfers = RecordingTransfers::failing("wallet is frozen");
        let result = executor(transfers.clone()).execute(&PaymentRequest::new("w1", BOB, "5")).await;
        assert_eq!(
            result,
            ExecutionResult::Failure(Failure::UpstreamError { message: "wallet is frozen".into() })
        );
        assert_eq!(transfers.calls(), 1);
    }
}
