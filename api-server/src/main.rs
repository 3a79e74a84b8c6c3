//! Bank ledger HTTP server and admin commands

use std::str::FromStr;
use std::sync::Arc;

use account_service::{AccountService, AccountServiceConfig};
use api_server::config::{self, AppConfig};
use api_server::{router, AppState};
use auth_service::{AuthConfig, AuthService, PostgresUserRepository, TokenIssuer};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};

/// Bank ledger API server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[clap(long, global = true, default_value = "info")]
    log_level: String,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Listening address, overrides BIND_ADDR
        #[clap(short, long)]
        addr: Option<String>,
    },
    /// Store a user with a hashed password
    CreateUser {
        #[clap(long)]
        username: String,
        #[clap(long)]
        password: String,
    },
    /// Validate a token with the configured key and print its claims
    VerifyToken {
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    let cli = Cli::parse();
    let log_level = init_tracing(&cli.log_level)?;

    match cli.command.unwrap_or(Command::Serve { addr: None }) {
        Command::Serve { addr } => serve(addr, log_level).await,
        Command::CreateUser { username, password } => create_user(&username, &password).await,
        Command::VerifyToken { token } => verify_token(&token),
    }
}

/// Initialize tracing; `DEBUG=1` raises the level to debug
fn init_tracing(requested: &str) -> Result<Level, Box<dyn std::error::Error>> {
    let env_debug = std::env::var("DEBUG").unwrap_or_else(|_| "0".to_string());
    let log_level = if env_debug == "1" {
        Level::DEBUG
    } else {
        Level::from_str(requested).map_err(|_| format!("invalid log level: {}", requested))?
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    debug!("Debug logging enabled");

    Ok(log_level)
}

async fn serve(addr: Option<String>, log_level: Level) -> Result<(), Box<dyn std::error::Error>> {
    // Fail before binding anything if configuration is incomplete
    let mut app_config = AppConfig::from_env()?;
    if let Some(addr) = addr {
        app_config.bind_addr = config::parse_addr(&addr)?;
    }

    let tokens = TokenIssuer::from_config(&app_config.auth)?;
    let pool = app_config.accounts.connect().await?;

    let account_service = AccountService::with_config(&app_config.accounts, pool.clone());
    let auth_service = AuthService::new(Arc::new(PostgresUserRepository::new(pool)), tokens);

    let state = Arc::new(AppState {
        account_service: Arc::new(account_service),
        auth_service: Arc::new(auth_service),
    });
    let app = router(state, log_level);

    let listener = TcpListener::bind(app_config.bind_addr).await?;
    info!("Listening on {}", app_config.bind_addr);

    // Run until interrupt signal
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn create_user(username: &str, password: &str) -> Result<(), Box<dyn std::error::Error>> {
    let tokens = TokenIssuer::from_config(&AuthConfig::from_env()?)?;
    let pool = AccountServiceConfig::from_env()?.connect().await?;

    let auth_service = AuthService::new(Arc::new(PostgresUserRepository::new(pool)), tokens);

    let user = auth_service.register(username, password).await?;
    println!("created user {} (id {})", user.username, user.id);
    Ok(())
}

fn verify_token(token: &str) -> Result<(), Box<dyn std::error::Error>> {
    let tokens = TokenIssuer::from_config(&AuthConfig::from_env()?)?;
    let claims = tokens.validate(token)?;

    println!("{}", serde_json::to_string_pretty(&claims)?);
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
