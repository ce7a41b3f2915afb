// Circle Web3 Services client (developer-controlled wallets)
// API Reference: https://developers.circle.com/api-reference/w3s
//
// State-changing calls (wallet creation, transfers) must carry a freshly encrypted
// entitySecretCiphertext. The entity public key used for that is fetched once and kept.

use crate::config::CircleConfig;
use crate::wallet::crypto::{encrypt_entity_secret, parse_public_key};
use crate::wallet::{
    Account, BalanceService, HistoryService, TransactionRecord, TransferReceipt, TransferService,
    TransferSubmission, WalletError, WalletProvisioner,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use rsa::RsaPublicKey;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use uuid::Uuid;

pub const CIRCLE_API_BASE: &str = "https://api.circle.com";
const ACCOUNT_TYPE: &str = "SCA";
const HISTORY_PAGE_SIZE: &str = "50";

pub struct CircleClient {
    client: Client,
    base_url: String,
    api_key: String,
    entity_secret: String,
    wallet_set_id: Option<String>,
    blockchain: String,
    token_id: String,
    token_symbol: String,
    fee_level: String,
    public_key: OnceCell<RsaPublicKey>,
}

// Response envelope: every Circle response wraps its payload in `data`
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicKeyData {
    public_key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalancesData {
    #[serde(default)]
    token_balances: Vec<TokenBalance>,
}

#[derive(Deserialize)]
struct TokenBalance {
    token: Token,
    amount: String,
}

#[derive(Deserialize)]
struct Token {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
}

#[derive(Deserialize)]
struct TransactionsData {
    #[serde(default)]
    transactions: Vec<CircleTransaction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CircleTransaction {
    id: String,
    #[serde(default)]
    operation: Option<String>,
    #[serde(default)]
    transaction_type: Option<String>,
    #[serde(default)]
    amounts: Vec<String>,
    state: String,
    create_date: DateTime<Utc>,
}

#[derive(Deserialize)]
struct WalletsData {
    wallets: Vec<CircleWallet>,
}

#[derive(Deserialize)]
struct CircleWallet {
    id: String,
    address: String,
}

#[derive(Deserialize)]
struct TransferData {
    id: String,
    state: String,
}

#[derive(Deserialize)]
struct CircleErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateWalletsBody<'a> {
    idempotency_key: Uuid,
    entity_secret_ciphertext: String,
    wallet_set_id: &'a str,
    blockchains: Vec<&'a str>,
    count: u32,
    account_type: &'a str,
    metadata: Vec<WalletMetadata<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WalletMetadata<'a> {
    name: &'a str,
    ref_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransferBody<'a> {
    idempotency_key: Uuid,
    entity_secret_ciphertext: String,
    wallet_id: &'a str,
    token_id: &'a str,
    destination_address: &'a str,
    amounts: Vec<&'a str>,
    fee_level: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ref_id: Option<&'a str>,
}

impl CircleClient {
    pub fn new(config: &CircleConfig) -> Result<Self, WalletError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            entity_secret: config.entity_secret.clone(),
            wallet_set_id: config.wallet_set_id.clone(),
            blockchain: config.blockchain.clone(),
            token_id: config.token_id.clone(),
            token_symbol: config.token_symbol.clone(),
            fee_level: config.fee_level.clone(),
            public_key: OnceCell::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, WalletError> {
        let response = request.bearer_auth(&self.api_key).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let parsed: Option<CircleErrorBody> = serde_json::from_str(&body).ok();
            let code = parsed.as_ref().and_then(|e| e.code);
            let message = parsed.and_then(|e| e.message).unwrap_or(body);
            return Err(WalletError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| WalletError::Decode(e.to_string()))?;
        Ok(envelope.data)
    }

    async fn entity_public_key(&self) -> Result<&RsaPublicKey, WalletError> {
        self.public_key
            .get_or_try_init(|| async {
                debug!("Fetching Circle entity public key");
                let data: PublicKeyData = self
                    .send(self.client.get(self.url("/v1/w3s/config/entity/publicKey")))
                    .await?;
                Ok::<_, WalletError>(parse_public_key(&data.public_key)?)
            })
            .await
    }

    async fn entity_secret_ciphertext(&self) -> Result<String, WalletError> {
        let key = self.entity_public_key().await?;
        Ok(encrypt_entity_secret(&self.entity_secret, key)?)
    }

    fn is_tracked_token(&self, token: &Token) -> bool {
        if token.id.as_deref() == Some(self.token_id.as_str()) {
            return true;
        }
        token
            .symbol
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case(&self.token_symbol))
            .unwrap_or(false)
    }
}

#[async_trait]
impl WalletProvisioner for CircleClient {
    async fn create_wallet(&self, owner: &str) -> Result<Account, WalletError> {
        let wallet_set_id = self
            .wallet_set_id
            .as_deref()
            .ok_or(WalletError::NotConfigured("WALLET_SET_ID"))?;

        let body = CreateWalletsBody {
            idempotency_key: Uuid::new_v4(),
            entity_secret_ciphertext: self.entity_secret_ciphertext().await?,
            wallet_set_id,
            blockchains: vec![self.blockchain.as_str()],
            count: 1,
            account_type: ACCOUNT_TYPE,
            metadata: vec![WalletMetadata { name: owner, ref_id: owner }],
        };

        let data: WalletsData = self
            .send(self.client.post(self.url("/v1/w3s/developer/wallets")).json(&body))
            .await?;

        let wallet = data
            .wallets
            .into_iter()
            .next()
            .ok_or_else(|| WalletError::Decode("wallet creation returned no wallets".to_string()))?;

        info!(owner = %owner, wallet_id = %wallet.id, "Created wallet");
        Ok(Account {
            wallet_id: wallet.id,
            address: wallet.address,
        })
    }
}

#[async_trait]
impl BalanceService for CircleClient {
    async fn balance(&self, wallet_id: &str) -> Result<String, WalletError> {
        let path = format!("/v1/w3s/wallets/{}/balances", wallet_id);
        let data: BalancesData = self.send(self.client.get(self.url(&path))).await?;

        let amount = data
            .token_balances
            .into_iter()
            .find(|b| self.is_tracked_token(&b.token))
            .map(|b| b.amount)
            .unwrap_or_else(|| "0".to_string());

        debug!(wallet_id = %wallet_id, amount = %amount, "Fetched balance");
        Ok(amount)
    }
}

#[async_trait]
impl HistoryService for CircleClient {
    async fn transactions(&self, wallet_id: &str) -> Result<Vec<TransactionRecord>, WalletError> {
        let request = self.client.get(self.url("/v1/w3s/transactions")).query(&[
            ("walletIds", wallet_id),
            ("order", "DESC"),
            ("pageSize", HISTORY_PAGE_SIZE),
        ]);
        let data: TransactionsData = self.send(request).await?;

        let mut records: Vec<TransactionRecord> = data
            .transactions
            .into_iter()
            .map(|t| TransactionRecord {
                id: t.id,
                operation: t.operation.unwrap_or_else(|| "TRANSFER".to_string()),
                direction: t.transaction_type,
                amount: t.amounts.into_iter().next().unwrap_or_else(|| "0".to_string()),
                state: t.state,
                created_at: t.create_date,
            })
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        debug!(wallet_id = %wallet_id, count = records.len(), "Fetched transactions");
        Ok(records)
    }
}

#[async_trait]
impl TransferService for CircleClient {
    async fn submit_transfer(&self, transfer: &TransferSubmission) -> Result<TransferReceipt, WalletError> {
        let body = TransferBody {
            idempotency_key: transfer.idempotency_key,
            entity_secret_ciphertext: self.entity_secret_ciphertext().await?,
            wallet_id: &transfer.wallet_id,
            token_id: &self.token_id,
            destination_address: &transfer.destination_address,
            amounts: vec![transfer.amount.as_str()],
            fee_level: &self.fee_level,
            ref_id: transfer.memo.as_deref(),
        };

        let data: TransferData = self
            .send(
                self.client
                    .post(self.url("/v1/w3s/developer/transactions/transfer"))
                    .json(&body),
            )
            .await?;

        Ok(TransferReceipt {
            id: data.id,
            state: data.state,
        })
    }
}
