//! Wallet Service Collaborators
//!
//! The pipeline never talks to a wallet provider directly. It sees four narrow
//! traits, one per operation the external service offers:
//!
//! - [`WalletProvisioner`]: create a wallet for a newly registered user
//! - [`BalanceService`]: USDC balance of a wallet
//! - [`HistoryService`]: transaction history of a wallet, newest first
//! - [`TransferService`]: submit a USDC transfer (the only state-changing call)
//!
//! [`circle::CircleClient`] implements all four against Circle Web3 Services.

pub mod circle;
pub mod crypto;

pub use circle::CircleClient;
pub use crypto::CryptoError;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors returned by wallet service clients
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Entity secret encryption failed: {0}")]
    Crypto(#[from] CryptoError),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl WalletError {
    /// Raw message reported by the upstream service, used for failure classification
    pub fn upstream_message(&self) -> String {
        match self {
            WalletError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// A wallet owned by one user: opaque provider id plus on-chain address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub wallet_id: String,
    pub address: String,
}

/// One entry of a wallet's transaction history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    /// Provider operation, e.g. "TRANSFER"
    pub operation: String,
    /// "INBOUND" / "OUTBOUND" when the provider reports it
    pub direction: Option<String>,
    pub amount: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
}

/// Transfer as handed to the wallet service
#[derive(Debug, Clone, PartialEq)]
pub struct TransferSubmission {
    pub wallet_id: String,
    pub destination_address: String,
    pub amount: String,
    pub idempotency_key: Uuid,
    pub memo: Option<String>,
}

/// Provider acknowledgement of a submitted transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub id: String,
    pub state: String,
}

#[async_trait]
pub trait WalletProvisioner: Send + Sync {
    async fn create_wallet(&self, owner: &str) -> Result<Account, WalletError>;
}

#[async_trait]
pub trait BalanceService: Send + Sync {
    /// Decimal string; `"0"` when the wallet holds no tracked token
    async fn balance(&self, wallet_id: &str) -> Result<String, WalletError>;
}

#[async_trait]
pub trait HistoryService: Send + Sync {
    async fn transactions(&self, wallet_id: &str) -> Result<Vec<TransactionRecord>, WalletError>;
}

#[async_trait]
pub trait TransferService: Send + Sync {
    async fn submit_transfer(&self, transfer: &TransferSubmission) -> Result<TransferReceipt, WalletError>;
}
