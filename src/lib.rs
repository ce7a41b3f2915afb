// PayFlow - chat-driven USDC payments on developer-controlled wallets

pub mod agent;
pub mod config;
pub mod directory;
pub mod intent;
pub mod middleware;
pub mod models;
pub mod payment;
pub mod routes;
pub mod session;
pub mod speech;
pub mod types;
pub mod utils;
pub mod wallet;

// Re-exports for convenience
pub use config::Config;
pub use models::{AppState, Services};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
