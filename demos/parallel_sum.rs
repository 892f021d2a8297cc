//! Demo driver summing an inclusive range on several threads.
//!
//! Run with:
//! ```bash
//! cargo run --example parallel_sum --features demo -- --hi 100 -vv
//! ```

use std::error::Error;
use std::thread;

use clap::{ArgAction, Parser, ValueEnum};
use num_traits::NumCast;
use numeri::cells::{CellFactory, Integer};
use numeri::reducers::RangeReducer;
use tracing_subscriber::EnvFilter;

/// Integer width used for every value in the reduction.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum Width {
    U32,
    #[default]
    U64,
    I64,
}

/// Sums `lo + (lo + 1) + ... + hi` on several threads using copy-on-write
/// atomic numbers.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Lower bound (included)
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    lo: i64,

    /// Upper bound (included)
    #[arg(long, default_value = "100", allow_negative_numbers = true)]
    hi: i64,

    /// Number of worker threads (defaults to the available parallelism)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Integer width
    #[arg(long, value_enum, default_value = "u64")]
    width: Width,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .init();
}

fn convert<T: Integer>(value: i64, width: Width) -> Result<T, String> {
    <T as NumCast>::from(value).ok_or_else(|| format!("{} does not fit in {:?}", value, width))
}

fn run<T: Integer>(args: &Args, workers: usize) -> Result<T, Box<dyn Error>> {
    let factory = CellFactory::<T>::new();
    let sum = factory.value(T::zero());
    let lo = factory.value(convert(args.lo, args.width)?);
    let hi = factory.value(convert(args.hi, args.width)?);

    RangeReducer::new()
        .with_name("parallel-sum")
        .reduce(&sum, &lo, &hi, workers)?;

    Ok(sum.value())
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let workers = args.workers.unwrap_or_else(|| {
        thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });
    tracing::info!(lo = args.lo, hi = args.hi, workers, width = ?args.width, "summing range");

    let result = match args.width {
        Width::U32 => run::<u32>(&args, workers).map(|sum| sum.to_string()),
        Width::U64 => run::<u64>(&args, workers).map(|sum| sum.to_string()),
        Width::I64 => run::<i64>(&args, workers).map(|sum| sum.to_string()),
    };

    match result {
        Ok(sum) => println!("sum = {}", sum),
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    }
}
