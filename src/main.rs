use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use scanpay::application::orchestrator::{ScanPayOrchestrator, ScannerHandle};
use scanpay::application::session::spawn_session;
use scanpay::config::ScanPayConfig;
use scanpay::domain::catalog::ProductCatalog;
use scanpay::domain::ports::TransactionLogRef;
use scanpay::domain::receipt::synthesize;
use scanpay::domain::session::{ScanEvent, SessionMachine};
use scanpay::domain::wallet::Wallet;
use scanpay::infrastructure::jsonl::JsonlTransactionLog;
use scanpay::infrastructure::payload_detector::PayloadDetector;
use scanpay::infrastructure::scripted::{ScriptedFrameSource, write_catalog_script};
use scanpay::interfaces::csv::catalog_reader::CatalogReader;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a scanning session over a frame script
    Scan(ScanArgs),
    /// Print a receipt built from the transaction log
    Receipt(ReceiptArgs),
    /// Write a frame script showing each catalog product once
    Codes(CodesArgs),
}

#[derive(Args)]
struct ScanArgs {
    /// Frame script to replay, one frame per line
    #[arg(long)]
    frames: PathBuf,

    /// Product catalog CSV (id,name,price). Uses the demo catalog if omitted.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Transaction log path
    #[arg(long)]
    log: Option<PathBuf>,

    /// Starting wallet balance
    #[arg(long)]
    balance: Option<Decimal>,

    /// Ticks per second
    #[arg(long)]
    tick_rate: Option<u32>,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ReceiptArgs {
    /// Transaction log path
    #[arg(long)]
    log: Option<PathBuf>,

    /// Write the receipt here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct CodesArgs {
    /// Product catalog CSV (id,name,price). Uses the demo catalog if omitted.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Write the script here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scanpay=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<ScanPayConfig> {
    let config = match path {
        Some(path) => ScanPayConfig::from_file(path).into_diagnostic()?,
        None => ScanPayConfig::default(),
    };
    config.with_env().into_diagnostic()
}

fn load_catalog(path: Option<PathBuf>) -> Result<ProductCatalog> {
    match path {
        Some(path) => {
            let file = File::open(path).into_diagnostic()?;
            CatalogReader::new(file).into_catalog().into_diagnostic()
        }
        None => Ok(ProductCatalog::demo()),
    }
}

fn describe(event: &ScanEvent) -> String {
    match event {
        ScanEvent::ScannerStarted { balance } => format!("scanner started, balance {}", balance),
        ScanEvent::ScannerStopped { reason } => format!("scanner stopped ({:?})", reason),
        ScanEvent::DeviceUnavailable { reason } => format!("device unavailable: {}", reason),
        ScanEvent::PaymentAccepted { record, balance } => format!(
            "paid #{} {} {}, balance {}",
            record.sequence_no, record.item_name, record.amount, balance
        ),
        ScanEvent::PaymentDeclined { product, balance } => format!(
            "declined {} {}, balance {}",
            product.name, product.price, balance
        ),
        ScanEvent::CodeUnresolved { code } => format!("unresolved code {}", code),
        ScanEvent::PaymentUnrecorded {
            product,
            balance,
            reason,
        } => format!(
            "unrecorded {} {}, balance {}: {}",
            product.name, product.price, balance, reason
        ),
    }
}

async fn scan(args: ScanArgs) -> Result<()> {
    let mut config = load_config(args.config.as_ref())?;
    if let Some(log) = args.log {
        config.log_path = log;
    }
    if let Some(balance) = args.balance {
        config.initial_balance = balance;
    }
    if let Some(rate) = args.tick_rate {
        config.tick_rate_hz = rate;
    }
    config.validate().into_diagnostic()?;

    let catalog = load_catalog(args.catalog)?;
    let script = File::open(&args.frames).into_diagnostic()?;
    let source = ScriptedFrameSource::from_script(BufReader::new(script)).into_diagnostic()?;

    let log: TransactionLogRef = Arc::new(
        JsonlTransactionLog::open(&config.log_path)
            .await
            .into_diagnostic()?,
    );
    let wallet = Arc::new(Wallet::new(config.initial_balance()).into_diagnostic()?);

    let mut orchestrator = ScanPayOrchestrator::new(
        Box::new(source),
        Box::new(PayloadDetector::new()),
        Arc::new(catalog),
        Arc::clone(&wallet),
        log,
        &config,
    );

    // Events go to stdout and on to the session task.
    let mut events = orchestrator.subscribe();
    let (session_tx, session_rx) = mpsc::unbounded_channel();
    let session = spawn_session(SessionMachine::new(config.initial_balance()), session_rx);
    let json = args.json;
    let printer = tokio::spawn(async move {
        let stdout = io::stdout();
        while let Some(event) = events.recv().await {
            let line = if json {
                serde_json::to_string(&event)?
            } else {
                describe(&event)
            };
            writeln!(stdout.lock(), "{}", line)?;
            if session_tx.send(event).is_err() {
                break;
            }
        }
        Ok::<_, Box<dyn std::error::Error + Send + Sync>>(())
    });

    let (handle, shutdown) = ScannerHandle::new();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.shutdown().await;
        }
    });

    let outcome = orchestrator.run(shutdown).await;
    interrupt.abort();

    if !orchestrator.unrecorded().is_empty() {
        let written = orchestrator.reconcile().await;
        let pending = orchestrator.unrecorded().len();
        if pending > 0 {
            warn!(
                reconciled = written.len(),
                pending, "Some debits are still missing from the log"
            );
        }
    }
    drop(orchestrator);

    printer
        .await
        .into_diagnostic()?
        .map_err(|e| miette::miette!("cannot print events: {}", e))?;
    drop(session.commands);
    let view = session.task.await.into_diagnostic()?;

    outcome.into_diagnostic()?;
    println!("balance: {}", view.balance);
    Ok(())
}

async fn receipt(args: ReceiptArgs) -> Result<()> {
    let mut config = load_config(args.config.as_ref())?;
    if let Some(log) = args.log {
        config.log_path = log;
    }

    let records = JsonlTransactionLog::read_snapshot(&config.log_path)
        .await
        .into_diagnostic()?;
    let receipt = synthesize(&records, &config.receipt);

    match args.output {
        Some(path) => std::fs::write(path, receipt.render()).into_diagnostic()?,
        None => print!("{}", receipt),
    }
    Ok(())
}

fn codes(args: CodesArgs) -> Result<()> {
    let catalog = load_catalog(args.catalog)?;
    match args.output {
        Some(path) => {
            let file = File::create(path).into_diagnostic()?;
            write_catalog_script(&catalog, io::BufWriter::new(file)).into_diagnostic()
        }
        None => write_catalog_script(&catalog, io::stdout().lock()).into_diagnostic(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Scan(args) => scan(args).await,
        Command::Receipt(args) => receipt(args).await,
        Command::Codes(args) => codes(args),
    }
}
