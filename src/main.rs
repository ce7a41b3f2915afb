use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

use payflow::{
    create_router, session::Session, utils::init_logger, AppState, Config, Services,
};

#[derive(Parser)]
#[command(name = "payflow")]
#[command(about = "Chat-driven USDC payment assistant", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Bind address, overrides HOST
        #[arg(long)]
        host: Option<String>,

        /// Port, overrides PORT
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one command through the pipeline as a registered user and print the reply
    Ask {
        #[arg(short, long)]
        username: String,

        #[arg(short = 'P', long)]
        password: String,

        /// The command, e.g. "send 10 USDC to bob"
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    let _log_guard = init_logger(&config.log);

    match cli.command.unwrap_or(Command::Serve { host: None, port: None }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
        Command::Ask { username, password, text } => ask(config, &username, &password, &text.join(" ")).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Configuration loaded: {:?}", config.server);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("HOST and PORT must form a socket address")?;

    let services = Services::from_config(&config)?;
    let state = AppState::new(config, services);
    let app = create_router(state);

    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

async fn ask(config: Config, username: &str, password: &str, text: &str) -> anyhow::Result<()> {
    let services = Services::from_config(&config)?;
    let state = AppState::new(config, services);

    let account = state
        .users
        .login(username, password)
        .await?
        .context("Invalid username or password")?;
    let session = Session::new(username.to_lowercase(), account);

    let reply = state.agent.handle_user_utterance(text, Some(&session)).await;
    println!("{}", reply);
    Ok(())
}
