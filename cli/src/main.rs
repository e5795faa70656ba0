mod arg;

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use arg::TraceFilter;
use cache_sim::{
    config::{CacheConfiguration, Mapping, Organization},
    sim::{Simulator, TraceEvent},
    trace::TraceReader,
};
use clap::{Args, Parser, Subcommand};

#[cfg(feature = "stat")]
use terminal_size::terminal_size;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// replay a memory trace against a cache
    Sim(SimArgs),
    /// show how a cache splits addresses
    Geometry(CacheArgs),
}

#[derive(Args, Debug)]
struct CacheArgs {
    /// Total cache size: 128 to 4096 bytes, power of two (e.g. 4096, 4k, 4KiB)
    #[arg(value_parser = arg::parse_size)]
    size: u32,
    /// Mapping: dm (direct mapped) or fa (fully associative)
    mapping: Mapping,
    /// Organization: uc (unified) or sc (split)
    organization: Organization,
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct SimArgs {
    #[command(flatten)]
    delegate: CacheArgs,
    /// File path to memory trace
    #[arg(default_value = "mem_trace.txt")]
    trace_file: PathBuf,
    /// Print each access whose outcome matches (hit, miss or hit,miss)
    #[arg(
        long,
        require_equals = true,
        num_args = 0..=1,
        default_missing_value = "hit,miss",
        value_parser = arg::parse_trace_filter
    )]
    trace: Option<TraceFilter>,
    /// File path to write a JSON report to
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    match args.command {
        Command::Sim(SimArgs {
            delegate:
                CacheArgs {
                    size,
                    mapping,
                    organization,
                    verbose,
                },
            trace_file,
            trace,
            json,
        }) => {
            init_logger(verbose);
            let mut sim = Simulator::with_geometry(size, mapping, organization)?;
            let mut source = TraceReader::open(&trace_file)
                .with_context(|| format!("cannot open trace {}", trace_file.display()))?;
            let filter = trace.unwrap_or(TraceFilter::none());
            sim.run(&mut source, |event| print_trace(event, filter))?;
            log::info!("finished simulation.");
            output_stat(&sim);
            println!("\n{}", sim.statistics());
            if let Some(path) = json {
                let file = File::create(&path)
                    .with_context(|| format!("cannot create {}", path.display()))?;
                let mut out = BufWriter::new(file);
                sim.write_report(&mut out)?;
                out.flush()?;
                log::info!("report written to {}", path.display());
            }
            Ok(())
        }
        Command::Geometry(CacheArgs {
            size,
            mapping,
            organization,
            verbose,
        }) => {
            init_logger(verbose);
            let config = CacheConfiguration::new(size, mapping, organization)?;
            println!("{config}");
            println!(
                "{} bank(s) of {} blocks, {} bytes each",
                config.bank_count(),
                config.bank_length(),
                config.block_size_bytes()
            );
            println!("{}", config.address_fields());
            Ok(())
        }
    }
}

fn init_logger(verbose: bool) {
    if verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::init();
    }
}

fn print_trace(event: &TraceEvent, filter: TraceFilter) {
    if let Some(line) = trace_line(event, filter) {
        println!("{line}");
    }
}

/// `0x8cda3fa8 - Cache miss`, or `None` when `filter` skips the outcome.
fn trace_line(event: &TraceEvent, filter: TraceFilter) -> Option<String> {
    filter
        .accepts(event.outcome.is_hit())
        .then(|| format!("{:#x} - {}", event.record.address, event.outcome))
}

#[cfg(not(feature = "stat"))]
fn output_stat(_: &Simulator) {}

#[cfg(feature = "stat")]
fn output_stat(sim: &Simulator) {
    let max_width = get_terminal_width().unwrap_or(120) as usize;
    log::info!("statistics:\n{}", sim.collect_stat().view(max_width));
}

#[cfg(feature = "stat")]
fn get_terminal_width() -> Option<u16> {
    terminal_size().map(|(w, _)| w.0.saturating_sub(20))
}
