//! Command Pipeline
//!
//! One utterance goes through four stages, each awaited before the next:
//!
//! ```text
//! text ──▶ IntentResolver ──▶ RecipientResolver ──▶ PaymentExecutor ──▶ formatter ──▶ reply
//!               │                (SendPayment only)     (one transfer call)
//!               └─▶ balance / address / history queries ───────────────────┘
//! ```
//!
//! The session is passed into every call; the agent itself holds only shared,
//! stateless collaborators.

pub mod formatter;

pub use formatter::{format, Outcome};

use crate::intent::{Intent, IntentKind, IntentResolver, RecipientRef};
use crate::payment::{ExecutionResult, Failure, PaymentExecutor, PaymentRequest, RecipientResolver};
use crate::session::Session;
use crate::wallet::{BalanceService, HistoryService};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Structured result of one utterance
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub kind: IntentKind,
    /// `None` when the text could not be turned into an intent
    pub intent: Option<Intent>,
    pub requires_auth: bool,
    pub outcome: Outcome,
    pub message: String,
}

impl Reply {
    fn new(kind: IntentKind, intent: Option<Intent>, requires_auth: bool, outcome: Outcome) -> Self {
        let message = format(kind, &outcome);
        Self {
            kind,
            intent,
            requires_auth,
            outcome,
            message,
        }
    }

    pub fn reference(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Executed(result) => result.reference(),
            _ => None,
        }
    }
}

pub struct Agent {
    intents: IntentResolver,
    recipients: RecipientResolver,
    executor: PaymentExecutor,
    balances: Arc<dyn BalanceService>,
    history: Arc<dyn HistoryService>,
}

impl Agent {
    pub fn new(
        intents: IntentResolver,
        recipients: RecipientResolver,
        executor: PaymentExecutor,
        balances: Arc<dyn BalanceService>,
        history: Arc<dyn HistoryService>,
    ) -> Self {
        Self {
            intents,
            recipients,
            executor,
            balances,
            history,
        }
    }

    /// Run one utterance through the pipeline and return the display text
    pub async fn handle_user_utterance(&self, text: &str, session: Option<&Session>) -> String {
        self.process(text, session).await.message
    }

    pub async fn process(&self, text: &str, session: Option<&Session>) -> Reply {
        let resolved = match self.intents.resolve(text, session) {
            Ok(resolved) => resolved,
            Err(_) if session.is_none() => {
                return Reply::new(
                    IntentKind::SendPayment,
                    None,
                    false,
                    Outcome::Failed(Failure::NotAuthenticated),
                );
            }
            Err(e) => {
                info!(error = %e, "Payment command without an amount");
                return Reply::new(IntentKind::SendPayment, None, false, Outcome::Failed(e.into()));
            }
        };

        let kind = resolved.intent.kind();
        info!(intent = %kind, authenticated = session.is_some(), "Processing command");

        if resolved.requires_auth {
            return Reply::new(kind, Some(resolved.intent), true, Outcome::Failed(Failure::NotAuthenticated));
        }

        let outcome = match (&resolved.intent, session) {
            (Intent::Unknown, Some(_)) => Outcome::Help,
            (_, None) => Outcome::Failed(Failure::NotAuthenticated),
            (Intent::CheckBalance, Some(session)) => self.balance(session).await,
            (Intent::CheckAddress, Some(session)) => Outcome::Address(session.account.address.clone()),
            (Intent::ListTransactions, Some(session)) => self.transactions(session).await,
            (Intent::SendPayment { amount, recipient: None }, Some(_)) => {
                Outcome::NeedsRecipient { amount: amount.clone() }
            }
            (Intent::SendPayment { amount, recipient: Some(recipient) }, Some(session)) => {
                Outcome::Executed(self.pay(session, recipient, amount, None).await)
            }
        };

        Reply::new(kind, Some(resolved.intent), false, outcome)
    }

    /// Resolve `recipient` and submit one transfer from the session's wallet
    pub async fn pay(
        &self,
        session: &Session,
        recipient: &RecipientRef,
        amount: &str,
        memo: Option<String>,
    ) -> ExecutionResult {
        let resolved = match self.recipients.resolve(recipient).await {
            Ok(resolved) => resolved,
            Err(failure) => {
                info!(recipient = %recipient, failure = %failure, "Recipient not resolved");
                return ExecutionResult::Failure(failure);
            }
        };

        let request = PaymentRequest::new(&session.account.wallet_id, resolved.address, amount)
            .with_memo(memo)
            .with_recipient_label(resolved.label);
        self.executor.execute(&request).await
    }

    async fn balance(&self, session: &Session) -> Outcome {
        match self.balances.balance(&session.account.wallet_id).await {
            Ok(amount) => Outcome::Balance(amount),
            Err(e) => {
                warn!(wallet_id = %session.account.wallet_id, error = %e, "Balance lookup failed");
                Outcome::Failed(Failure::UpstreamError { message: e.upstream_message() })
            }
        }
    }

    async fn transactions(&self, session: &Session) -> Outcome {
        match self.history.transactions(&session.account.wallet_id).await {
            Ok(records) => Outcome::Transactions(records),
            Err(e) => {
                warn!(wallet_id = %session.account.wallet_id, error = %e, "History lookup failed");
                Outcome::Failed(Failure::UpstreamError { message: e.upstream_message() })
            }
        }
    }
}
