use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::wallet::circle::CIRCLE_API_BASE;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub circle: CircleConfig,
    pub speech: SpeechConfig,
    pub auth: AuthConfig,
    pub directory: DirectoryConfig,
    pub payment: PaymentConfig,
    pub rate_limit: RateLimitConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Clone, Deserialize)]
pub struct CircleConfig {
    pub base_url: String,
    pub api_key: String,
    pub entity_secret: String,
    pub wallet_set_id: Option<String>,
    pub blockchain: String,
    pub token_id: String,
    pub token_symbol: String,
    pub fee_level: String,
}

// Keeps credentials out of the startup log line
impl std::fmt::Debug for CircleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircleConfig")
            .field("base_url", &self.base_url)
            .field("wallet_set_id", &self.wallet_set_id)
            .field("blockchain", &self.blockchain)
            .field("token_id", &self.token_id)
            .field("token_symbol", &self.token_symbol)
            .field("fee_level", &self.fee_level)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Deserialize)]
pub struct SpeechConfig {
    pub elevenlabs_api_key: Option<String>,
    pub base_url: String,
    pub voice_id: String,
    pub tts_model: String,
    pub stt_model: String,
}

impl std::fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("enabled", &self.elevenlabs_api_key.is_some())
            .field("base_url", &self.base_url)
            .field("voice_id", &self.voice_id)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    pub secret: String,
    pub max_jwt_expiration: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("max_jwt_expiration", &self.max_jwt_expiration)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    pub data_dir: PathBuf,
    /// Demo aliases, lower-cased name -> on-chain address
    pub aliases: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    pub max_single_transfer: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub filter: String,
    pub log_dir: Option<PathBuf>,
}

/// Demo aliases used when PAYFLOW_ALIASES is unset
pub const DEFAULT_ALIASES: &str =
    "merchant=0xf37a740f4c3f7afd7269cec210525f85cb03e57a,\
     alice=0x0263fd91c595ed132686147abb8fe8b39564b72b,\
     bob=0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

pub const DEFAULT_USDC_TOKEN_ID: &str = "15dc2b5d-0994-58b0-bf8c-3a0501148ee8";

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .context("PORT must be a port number")?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            circle: CircleConfig {
                base_url: env::var("CIRCLE_API_BASE").unwrap_or_else(|_| CIRCLE_API_BASE.to_string()),
                api_key: env::var("CIRCLE_API_KEY").context("CIRCLE_API_KEY must be set")?,
                entity_secret: env::var("ENTITY_SECRET").context("ENTITY_SECRET must be set")?,
                wallet_set_id: env::var("WALLET_SET_ID").ok(),
                blockchain: env::var("CIRCLE_BLOCKCHAIN").unwrap_or_else(|_| "ARC-TESTNET".to_string()),
                token_id: env::var("USDC_TOKEN_ID").unwrap_or_else(|_| DEFAULT_USDC_TOKEN_ID.to_string()),
                token_symbol: env::var("USDC_TOKEN_SYMBOL").unwrap_or_else(|_| "USDC".to_string()),
                fee_level: env::var("CIRCLE_FEE_LEVEL").unwrap_or_else(|_| "HIGH".to_string()),
            },
            speech: SpeechConfig {
                elevenlabs_api_key: env::var("ELEVENLABS_API_KEY").ok().filter(|k| !k.is_empty()),
                base_url: env::var("ELEVENLABS_API_BASE")
                    .unwrap_or_else(|_| "https://api.elevenlabs.io".to_string()),
                voice_id: env::var("ELEVENLABS_VOICE_ID")
                    .unwrap_or_else(|_| "21m00Tcm4TlvDq8ikWAM".to_string()),
                tts_model: env::var("ELEVENLABS_TTS_MODEL")
                    .unwrap_or_else(|_| "eleven_multilingual_v2".to_string()),
                stt_model: env::var("ELEVENLABS_STT_MODEL").unwrap_or_else(|_| "scribe_v1".to_string()),
            },
            auth: AuthConfig {
                secret: env::var("PAYFLOW_SECRET").context("PAYFLOW_SECRET must be set")?,
                max_jwt_expiration: env::var("MAX_JWT_EXPIRATION")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()
                    .context("MAX_JWT_EXPIRATION must be a number of seconds")?,
            },
            directory: DirectoryConfig {
                data_dir: env::var("PAYFLOW_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| default_data_dir()),
                aliases: parse_aliases(
                    &env::var("PAYFLOW_ALIASES").unwrap_or_else(|_| DEFAULT_ALIASES.to_string()),
                )?,
            },
            payment: PaymentConfig {
                max_single_transfer: Decimal::from_str(
                    &env::var("MAX_SINGLE_TRANSFER").unwrap_or_else(|_| "10000".to_string()),
                )
                .context("MAX_SINGLE_TRANSFER must be a decimal amount")?,
            },
            rate_limit: RateLimitConfig {
                requests_per_minute: env::var("RATE_LIMIT_PER_MINUTE")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .context("RATE_LIMIT_PER_MINUTE must be a number")?,
            },
            log: LogConfig {
                filter: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "payflow=debug,tower_http=debug,axum=debug".to_string()),
                log_dir: env::var("LOG_DIR").ok().map(PathBuf::from),
            },
        })
    }
}

#[cfg(test)]
impl Config {
    /// Complete configuration pointing at `data_dir`, with no external services reachable
    pub(crate) fn for_tests(data_dir: PathBuf) -> Self {
        Self {
            server: ServerConfig {
                port: 0,
                host: "127.0.0.1".to_string(),
                cors_allowed_origins: vec!["http://localhost:5173".to_string()],
            },
            circle: CircleConfig {
                base_url: "http://127.0.0.1:1".to_string(),
                api_key: "TEST_API_KEY".to_string(),
                entity_secret: "00".repeat(32),
                wallet_set_id: Some("set-1".to_string()),
                blockchain: "ARC-TESTNET".to_string(),
                token_id: DEFAULT_USDC_TOKEN_ID.to_string(),
                token_symbol: "USDC".to_string(),
                fee_level: "HIGH".to_string(),
            },
            speech: SpeechConfig {
                elevenlabs_api_key: None,
                base_url: "http://127.0.0.1:1".to_string(),
                voice_id: "voice".to_string(),
                tts_model: "eleven_multilingual_v2".to_string(),
                stt_model: "scribe_v1".to_string(),
            },
            auth: AuthConfig {
                secret: "test-secret".to_string(),
                max_jwt_expiration: 3600,
            },
            directory: DirectoryConfig {
                data_dir,
                aliases: HashMap::from([(
                    "bob".to_string(),
                    "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".to_string(),
                )]),
            },
            payment: PaymentConfig {
                max_single_transfer: Decimal::from(10_000),
            },
            rate_limit: RateLimitConfig {
                requests_per_minute: 1000,
            },
            log: LogConfig {
                filter: "payflow=debug".to_string(),
                log_dir: None,
            },
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("payflow")
}

/// Parse `name=0xaddr,name2=0xaddr2`; names are lower-cased
pub fn parse_aliases(raw: &str) -> Result<HashMap<String, String>> {
    let mut aliases = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, address) = entry
            .split_once('=')
            .with_context(|| format!("alias entry '{}' must look like name=0xaddress", entry))?;
        aliases.insert(name.trim().to_lowercase(), address.trim().to_string());
    }
    Ok(aliases)
}
