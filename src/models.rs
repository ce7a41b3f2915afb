use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::agent::{Agent, Outcome, Reply};
use crate::config::Config;
use crate::directory::{AliasDirectory, UserStore};
use crate::intent::{IntentKind, IntentResolver};
use crate::payment::{Failure, PaymentExecutor, RecipientResolver};
use crate::speech::{ElevenLabsClient, SpeechService};
use crate::wallet::{
    BalanceService, CircleClient, HistoryService, TransactionRecord, TransferService, WalletProvisioner,
};

/// External collaborators the application is wired against
#[derive(Clone)]
pub struct Services {
    pub provisioner: Arc<dyn WalletProvisioner>,
    pub balances: Arc<dyn BalanceService>,
    pub history: Arc<dyn HistoryService>,
    pub transfers: Arc<dyn TransferService>,
    pub speech: Option<Arc<dyn SpeechService>>,
}

impl Services {
    /// Circle for wallets, ElevenLabs for speech when a key is configured
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let circle = Arc::new(CircleClient::new(&config.circle)?);
        let speech = ElevenLabsClient::from_config(&config.speech)?
            .map(|client| Arc::new(client) as Arc<dyn SpeechService>);

        Ok(Self {
            provisioner: circle.clone(),
            balances: circle.clone(),
            history: circle.clone(),
            transfers: circle,
            speech,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub agent: Arc<Agent>,
    pub users: Arc<UserStore>,
    pub services: Services,
    pub limiter: Arc<DefaultDirectRateLimiter>,
}

impl AppState {
    pub fn new(config: Config, services: Services) -> Self {
        let users = Arc::new(UserStore::new(
            config.directory.data_dir.clone(),
            config.auth.secret.clone(),
        ));
        let directory = AliasDirectory::new(config.directory.aliases.clone(), users.clone());
        let intents = IntentResolver::new(directory.alias_names());

        let agent = Agent::new(
            intents,
            RecipientResolver::new(Arc::new(directory)),
            PaymentExecutor::new(services.transfers.clone(), config.payment.max_single_transfer),
            services.balances.clone(),
            services.history.clone(),
        );

        let per_minute = NonZeroU32::new(config.rate_limit.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        Self {
            config: Arc::new(config),
            agent: Arc::new(agent),
            users,
            services,
            limiter,
        }
    }
}

// Request and response bodies

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 32))]
    pub username: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 32))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
    pub wallet_id: String,
    pub address: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 1000))]
    pub message: String,
    /// Also return the reply as base64 MP3 audio
    #[serde(default)]
    pub speak: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub intent: IntentKind,
    pub message: String,
    pub status: &'static str,
    pub requires_auth: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

impl ChatResponse {
    pub fn from_reply(reply: Reply) -> Self {
        Self {
            intent: reply.kind,
            status: reply.outcome.status(),
            requires_auth: reply.requires_auth,
            reference: reply.reference().map(str::to_string),
            failure: reply.outcome.failure().cloned(),
            message: reply.message,
            outcome: reply.outcome,
            transcript: None,
            audio: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressResponse {
    pub wallet_id: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TransferRequest {
    #[validate(length(min = 1, max = 64))]
    pub recipient: String,
    #[validate(length(min = 1, max = 32))]
    pub amount: String,
    #[validate(length(max = 256))]
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub speech_enabled: bool,
}
