use clap::Parser;
use miette::{IntoDiagnostic, Result};
use regdesk::application::membership::MembershipService;
use regdesk::domain::payment::{self, DEFAULT_PAYMENT_METHODS, PaymentMethod};
use regdesk::domain::ports::RegistryBox;
use regdesk::infrastructure::in_memory::InMemoryRegistry;
#[cfg(feature = "storage-rocksdb")]
use regdesk::infrastructure::rocksdb::RocksDBRegistry;
use regdesk::interfaces::jsonl::command_reader::CommandReader;
use regdesk::interfaces::jsonl::outcome_writer::OutcomeWriter;
use regdesk::telemetry;
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input commands file, one JSON object per line
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "REGDESK_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Payment methods offered when the catalog is created
    #[arg(
        long = "payment-method",
        value_delimiter = ',',
        default_values = DEFAULT_PAYMENT_METHODS.iter().copied()
    )]
    payment_methods: Vec<String>,
}

fn open_registry(db_path: Option<PathBuf>, catalog: Vec<PaymentMethod>) -> Result<RegistryBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let registry = RocksDBRegistry::open_with_payment_methods(path, catalog)?;
            Ok(Box::new(registry))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Box::new(InMemoryRegistry::with_payment_methods(catalog)))
        }
        None => Ok(Box::new(InMemoryRegistry::with_payment_methods(catalog))),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init();

    let registry = open_registry(cli.db_path, payment::catalog(&cli.payment_methods))?;
    let service = MembershipService::new(registry);

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);

    let stdout = io::stdout();
    let mut writer = OutcomeWriter::new(stdout.lock());
    for command in reader.commands() {
        match command {
            Ok(command) => match command.execute(&service).await {
                Ok(outcome) => writer.write_outcome(&outcome)?,
                Err(e) => eprintln!("Error processing command: {}", e),
            },
            Err(e) => {
                eprintln!("Error reading command: {}", e);
            }
        }
    }
    writer.flush()?;

    Ok(())
}
