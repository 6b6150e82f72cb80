use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use sha2::Digest;
use tracing_subscriber::EnvFilter;

use alex_domain::Config;
use alex_memory::{Retriever, Summarizer};
use alex_providers::ProviderRegistry;
use alex_store::{pool, PostgresStore};
use alex_tools::AlexToolCatalog;

mod api;
mod error;
mod scheduler;
mod state;

use state::AppState;

/// Alex gateway — the conversational agent server's HTTP surface.
#[derive(Parser)]
#[command(name = "alex-gateway", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server (default when no subcommand is given).
    Serve,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        None | Some(Command::Serve) => {}
    }

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(1);
        }
    };

    init_tracing(config.is_production());

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start async runtime: {e}");
            return ExitCode::from(2);
        }
    };

    match runtime.block_on(run_server(Arc::new(config))) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "gateway exited with a runtime failure");
            ExitCode::from(2)
        }
    }
}

/// JSON logs in production (per `app_env`), pretty-printed otherwise,
/// grounded on `sa_gateway`'s `init_tracing`.
fn init_tracing(is_production: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,alex_gateway=debug"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if is_production {
        subscriber.json().init();
    } else {
        subscriber.pretty().init();
    }
}

async fn run_server(config: Arc<Config>) -> anyhow::Result<()> {
    tracing::info!("alex gateway starting");

    let pg_pool = pool::connect(&config.database.postgres_uri, config.database.pool_min, config.database.pool_max).await?;
    pool::migrate(&pg_pool).await?;
    let store = Arc::new(PostgresStore::new(pg_pool));

    let registry = Arc::new(ProviderRegistry::from_config(&config));

    let flash_provider = registry.for_role("flash")?;
    let retriever = Arc::new(Retriever::new(store.clone(), flash_provider.clone(), config.model.embedding_model.clone()));
    let summarizer = Arc::new(Summarizer::new(
        store.clone(),
        flash_provider,
        config.model.flash_model.clone(),
        config.model.pro_model.clone(),
        config.model.embedding_model.clone(),
    ));

    let project_root = std::env::current_dir()?;
    let catalog = Arc::new(AlexToolCatalog::new(project_root, "default", store.clone(), &config));

    let api_token_hash = match std::env::var("ALEX_API_TOKEN") {
        Ok(token) if !token.is_empty() => {
            tracing::info!("API bearer-token auth enabled");
            Some(sha2::Sha256::digest(token.as_bytes()).to_vec())
        }
        _ => {
            tracing::warn!("API bearer-token auth DISABLED — set ALEX_API_TOKEN to enable");
            None
        }
    };

    let state = AppState {
        config: config.clone(),
        registry,
        store,
        retriever,
        summarizer,
        catalog,
        api_token_hash,
    };

    scheduler::spawn(state.clone());

    let app = api::router(state.clone()).with_state(state);

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "alex gateway listening");

    axum::serve(listener, app).await?;
    Ok(())
}
