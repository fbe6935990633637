use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use payqueue::application::engine::OrderEngine;
use payqueue::config::{DEFAULT_SWEEP_INTERVAL_SECS, DEFAULT_TTL_SECS, EngineConfig};
use payqueue::domain::ports::{ClockHandle, OrderStoreHandle, SettlementNotifierHandle};
use payqueue::infrastructure::clock::{ManualClock, SystemClock};
use payqueue::infrastructure::in_memory::{InMemoryOrderStore, InMemoryTerminalDirectory};
use payqueue::infrastructure::treasury::{HttpTreasuryNotifier, LogNotifier};
use payqueue::interfaces::csv::command_reader::CommandReader;
use payqueue::interfaces::csv::order_writer::OrderWriter;
use payqueue::interfaces::csv::replay::Replayer;
use payqueue::interfaces::http::routes;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, IsTerminal};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the order API and run the expiration sweeper
    Serve(ServeArgs),
    /// Replay a CSV command script and print the resulting orders
    Replay(ReplayArgs),
}

#[derive(Args)]
struct EngineArgs {
    /// JSON file listing the known terminals
    #[arg(long, env = "PAYQUEUE_TERMINALS")]
    terminals: PathBuf,

    /// Seconds an ACTIVE order stays payable
    #[arg(long, env = "PAYQUEUE_TTL_SECS", default_value_t = DEFAULT_TTL_SECS)]
    ttl_secs: u64,

    /// Seconds between expiration sweeps
    #[arg(long, env = "PAYQUEUE_SWEEP_INTERVAL_SECS", default_value_t = DEFAULT_SWEEP_INTERVAL_SECS)]
    sweep_interval_secs: u64,

    /// Order amount that mints one token
    #[arg(long, env = "PAYQUEUE_TOKEN_UNIT", default_value = "1")]
    token_unit: Decimal,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "PAYQUEUE_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Base URL of the treasury service. Mint requests are only logged when absent.
    #[arg(long, env = "PAYQUEUE_TREASURY_URL")]
    treasury_url: Option<String>,
}

#[derive(Args)]
struct ServeArgs {
    #[command(flatten)]
    engine: EngineArgs,

    /// Address to listen on
    #[arg(long, env = "PAYQUEUE_BIND", default_value = "127.0.0.1:8080")]
    bind: SocketAddr,
}

#[derive(Args)]
struct ReplayArgs {
    /// Input commands CSV file
    input: PathBuf,

    #[command(flatten)]
    engine: EngineArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Replay(args) => replay(args).await,
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

async fn serve(args: ServeArgs) -> Result<()> {
    let engine = Arc::new(build_engine(&args.engine, Arc::new(SystemClock))?);

    let sweeper = engine
        .sweeper()
        .spawn(engine.config().sweep_interval);

    let app = routes::build_router(Arc::clone(&engine)).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .into_diagnostic()?;
    info!("payqueue listening on http://{}", args.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .into_diagnostic()?;

    sweeper.abort();
    Ok(())
}

async fn replay(args: ReplayArgs) -> Result<()> {
    let clock = Arc::new(ManualClock::default());
    let engine = build_engine(&args.engine, clock.clone())?;
    let mut replayer = Replayer::new(&engine, clock);

    let file = File::open(&args.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for command in reader.commands() {
        match command {
            Ok(command) => {
                if let Err(e) = replayer.apply(command).await {
                    warn!("Error processing command: {}", e);
                }
            }
            Err(e) => {
                warn!("Error reading command: {}", e);
            }
        }
    }

    let rows = replayer.rows().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = OrderWriter::new(stdout.lock());
    writer.write_rows(rows).into_diagnostic()?;

    Ok(())
}

fn build_engine(args: &EngineArgs, clock: ClockHandle) -> Result<OrderEngine> {
    let config = EngineConfig::new(
        Duration::from_secs(args.ttl_secs),
        Duration::from_secs(args.sweep_interval_secs),
        args.token_unit,
    )
    .into_diagnostic()?;

    let directory = InMemoryTerminalDirectory::from_path(&args.terminals).into_diagnostic()?;
    info!(terminals = directory.len(), "terminal directory loaded");

    let notifier: SettlementNotifierHandle = match &args.treasury_url {
        Some(url) => Arc::new(
            HttpTreasuryNotifier::new(url.clone(), Duration::from_secs(10)).into_diagnostic()?,
        ),
        None => Arc::new(LogNotifier),
    };

    let store = open_store(args.db_path.as_ref())?;
    Ok(OrderEngine::new(
        store,
        Arc::new(directory),
        notifier,
        clock,
        config,
    ))
}

#[cfg(feature = "storage-rocksdb")]
fn open_store(db_path: Option<&PathBuf>) -> Result<OrderStoreHandle> {
    use payqueue::infrastructure::rocksdb::RocksDBStore;

    let store: OrderStoreHandle = match db_path {
        Some(path) => Arc::new(RocksDBStore::open(path).into_diagnostic()?),
        None => Arc::new(InMemoryOrderStore::new()),
    };
    Ok(store)
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_store(db_path: Option<&PathBuf>) -> Result<OrderStoreHandle> {
    if db_path.is_some() {
        warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Arc::new(InMemoryOrderStore::new()))
}
