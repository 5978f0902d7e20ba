//! jetgroom command-line driver
//!
//! Clusters, grooms and measures every event of an input file (or of a
//! synthetic sample) and books the leading-jet observables in histograms.
//!
//! ```text
//! jetgroom --input events.jsonl --config analysis.json --step 5 --output hists.json
//! jetgroom --generate 2000 --threads 4
//! ```

use clap::Parser;
use jetgroom::{
    AnalysisConfig, AnalysisStep, EventProcessor, EventSource, HistogramBook, JetError,
    JsonLinesSource, SyntheticSource,
};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "jetgroom")]
#[command(about = "Cluster, groom and measure large-radius jets")]
#[command(version)]
struct Args {
    /// Input events, one JSON object per line
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,

    /// Analysis configuration (JSON); defaults reproduce the standard analysis
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Analysis step: 0 = all, 3 = jets, 4 = + grooming, 5 = + substructure
    #[arg(long, short = 's')]
    step: Option<u8>,

    /// Generate this many synthetic events instead of reading input
    #[arg(long, short = 'g')]
    generate: Option<usize>,

    /// Seed for synthetic events
    #[arg(long, default_value = "12345")]
    seed: u64,

    /// Write the histogram book as JSON to this file
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Worker threads (default: all cores)
    #[arg(long, short = 't')]
    threads: Option<usize>,

    /// Events held in memory per parallel batch
    #[arg(long, default_value = "10000")]
    chunk_size: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(step) = args.step {
        config.step = AnalysisStep::from_number(step)?;
    }
    let processor = EventProcessor::new(config)?;

    let mut source: Box<dyn EventSource> = match (&args.input, args.generate) {
        (Some(path), None) => Box::new(JsonLinesSource::open(path)?),
        (None, Some(n)) => {
            log::info!("Generating {} synthetic events (seed {})", n, args.seed);
            Box::new(SyntheticSource::new(n, args.seed))
        }
        (Some(_), Some(_)) => {
            return Err(JetError::InvalidParameter(
                "--input and --generate are mutually exclusive".to_string(),
            )
            .into())
        }
        (None, None) => {
            return Err(JetError::InvalidParameter(
                "either --input or --generate is required".to_string(),
            )
            .into())
        }
    };

    log::info!(
        "{} | step {} | variants {:?}",
        processor.config().jet.description(),
        processor.config().step.number(),
        processor.variants()
    );

    let start = Instant::now();
    let chunk_size = args.chunk_size.max(1);
    let mut book = HistogramBook::new();
    let mut n_events = 0usize;
    let mut n_rejected = 0usize;

    loop {
        let mut chunk = Vec::with_capacity(chunk_size);
        while chunk.len() < chunk_size {
            match source.next_event()? {
                Some(event) => chunk.push(event),
                None => break,
            }
        }
        if chunk.is_empty() {
            break;
        }

        let results = processor.process_batch(&chunk);
        for (event, result) in chunk.iter().zip(&results) {
            processor.record(result, event.weight, &mut book);
            n_rejected += result.rejected;
        }
        n_events += chunk.len();
        log::info!("Processed {} events", n_events);
    }

    let elapsed = start.elapsed();
    println!("═══ jetgroom summary ═══");
    println!("  Events:             {}", n_events);
    println!("  Rejected particles: {}", n_rejected);
    println!("  Time:               {:.2?}", elapsed);
    println!();
    println!(
        "  {:<24} {:>10} {:>14} {:>12} {:>12}",
        "Histogram", "Entries", "Sum weights", "Mean", "Std"
    );
    for name in book.names() {
        if let Some(histogram) = book.get(name) {
            println!(
                "  {:<24} {:>10} {:>14.3} {:>12.4} {:>12.4}",
                name,
                histogram.entries,
                histogram.sum_weights(),
                histogram.mean(),
                histogram.std()
            );
        }
    }

    if let Some(path) = &args.output {
        std::fs::write(path, book.to_json()?)?;
        log::info!("Wrote {} histograms to {:?}", book.len(), path);
    }

    Ok(())
}
