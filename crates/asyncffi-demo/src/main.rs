//! asyncffi-demo - Greetings through the completion bridge
//!
//! Runs the same set of greetings twice per protocol variant: all at once,
//! then one after another, and reports how long each batch took. With
//! random workloads the parallel batch finishes in roughly the time of its
//! slowest call and its results arrive out of submission order.

use asyncffi::prelude::*;
use asyncffi::{NativeApi, NativeLibrary};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

mod scenario;

#[derive(Parser)]
#[command(name = "asyncffi-demo")]
#[command(author, version, about = "Await native greetings in parallel and in sequence", long_about = None)]
struct Cli {
    /// Names to greet
    #[arg(default_values_t = ["Stephen".to_string(), "Ben".to_string(), "John".to_string()])]
    names: Vec<String>,

    /// Protocol variant(s) to exercise
    #[arg(short, long, value_enum, default_value_t = VariantArg::Both)]
    variant: VariantArg,

    /// Fixed Monte Carlo sample count per greeting (default: random per name)
    #[arg(short, long)]
    samples: Option<usize>,

    /// Native worker threads (default: one per core)
    #[arg(short, long)]
    worker_threads: Option<usize>,

    /// Load the native library from this path instead of the linked one
    #[arg(short, long)]
    library: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VariantArg {
    ResultOrError,
    ResultOnly,
    Both,
}

impl VariantArg {
    fn variants(self) -> Vec<ProtocolVariant> {
        match self {
            VariantArg::ResultOrError => vec![ProtocolVariant::ResultOrError],
            VariantArg::ResultOnly => vec![ProtocolVariant::ResultOnly],
            VariantArg::Both => vec![ProtocolVariant::ResultOrError, ProtocolVariant::ResultOnly],
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = cli
        .worker_threads
        .map(|threads| RuntimeConfig::default().with_worker_threads(threads));
    let lifecycle = match (&cli.library, config) {
        (Some(path), config) => {
            // SAFETY: the user chose to trust this library
            let lifecycle = RuntimeLifecycle::from_library(unsafe { NativeLibrary::load(path) }?);
            Arc::new(match config {
                Some(config) => lifecycle.with_config(config),
                None => lifecycle,
            })
        }
        // Shares its state with the global lifecycle of the linked library
        (None, Some(config)) => {
            Arc::new(RuntimeLifecycle::new(NativeApi::linked()).with_config(config))
        }
        (None, None) => RuntimeLifecycle::global(),
    };
    lifecycle.initialize()?;

    let workloads = scenario::workloads(&cli.names, cli.samples);

    for (index, variant) in cli.variant.variants().into_iter().enumerate() {
        let bridge = CompletionBridge::new(lifecycle.clone(), variant);
        tracing::info!("######## Test #{}: {} protocol ########", index + 1, variant);

        tracing::info!("#{}.1. Greetings in parallel:", index + 1);
        let elapsed = scenario::run_parallel(&bridge, &workloads).await?;
        tracing::info!("#Parallel calls completed in {} ms", elapsed.as_millis());

        tracing::info!("#{}.2. Greetings sequentially:", index + 1);
        let elapsed = scenario::run_sequential(&bridge, &workloads).await?;
        tracing::info!("#Sequential calls completed in {} ms", elapsed.as_millis());
    }

    tokio::task::spawn_blocking(move || lifecycle.shutdown()).await??;
    Ok(())
}
