use std::io::BufRead;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use teachdesk_backend_lib::{
    auth::hash_password,
    config::{Settings, CONFIG_FILE},
    router::create_router,
    AppState,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

const THROTTLE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(name = "teachdesk", version)]
#[command(about = "Password-gated session service for the TeachDesk dashboard")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print a new `salt:hash` value for APP_PASSWORD_HASH
    HashPassword {
        /// Password to hash. Read from stdin when omitted.
        #[arg(long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cli.config).await,
        Command::HashPassword { password } => print_hash(password),
    }
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.as_str()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn serve(config: PathBuf) -> anyhow::Result<()> {
    let settings = Settings::load_from(&config)?;
    init_tracing(&settings);

    if let Err(err) = settings.validate() {
        if settings.production {
            tracing::error!(error = %err, "refusing to start with invalid configuration");
            return Err(err).context("invalid configuration");
        }
        tracing::warn!(error = %err, "configuration incomplete, logins will be refused");
    }

    let addr = settings.bind_addr;
    let state = AppState::new(settings);

    let throttle = state.throttle.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(THROTTLE_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            throttle.cleanup();
        }
    });

    let app = create_router(state);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("received Ctrl+C, shutting down");
}

fn print_hash(password: Option<String>) -> anyhow::Result<()> {
    let password = match password {
        Some(password) => password,
        None => {
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("failed to read password from stdin")?;
            line.trim_end_matches(['\r', '\n']).to_string()
        },
    };
    anyhow::ensure!(!password.is_empty(), "password must not be empty");

    println!("{}", hash_password(&password)?);
    Ok(())
}
