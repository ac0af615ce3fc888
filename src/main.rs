use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use german_words::{
    open_dump, process_channel_pipeline, run_sequential, Config, Lexicon, Linker, ParallelConfig,
    PartOfSpeech, Stats,
};

/// Processing strategy for extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// Single thread
    Sequential,
    /// Reader thread, worker threads and an in-order writer
    ChannelPipeline,
}

#[derive(Parser)]
#[command(name = "german-words")]
#[command(about = "German Wiktionary entries ranked by word frequency")]
struct Args {
    /// YAML settings file (default: ./german-words.yaml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract German entries from a dump into a JSONL record file
    Extract {
        /// Input XML file (.xml or .xml.bz2)
        input: PathBuf,

        /// Output JSONL file
        output: PathBuf,

        #[arg(short, long, value_enum, default_value_t = Strategy::ChannelPipeline)]
        strategy: Strategy,

        /// Number of threads (0 = config value or auto-detect)
        #[arg(short, long, default_value_t = 0)]
        threads: usize,

        /// Channel buffer size for channel-pipeline strategy
        #[arg(long)]
        channel_buffer: Option<usize>,

        /// Stop after this many records (for testing)
        #[arg(long)]
        limit: Option<usize>,

        /// Quiet mode - minimal output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print entries of one part of speech as JSON lines, most frequent first
    List {
        /// adjective, verb, adverb or noun
        pos: PartOfSpeech,

        /// Extracted record file
        #[arg(long)]
        words: Option<PathBuf>,

        /// Frequency list
        #[arg(long)]
        freqs: Option<PathBuf>,

        #[arg(long)]
        limit: Option<usize>,
    },
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_stats(stats: &Stats, strategy_name: &str) {
    println!();
    println!("============================================================");
    println!("Strategy: {}", strategy_name);
    println!("Pages processed: {}", stats.pages_processed);
    println!("Records written: {}", stats.records_written);
    println!("Entries written: {}", stats.entries_written);
    println!("------------------------------------------------------------");
    println!("No German entries: {}", stats.no_entries);
    println!("Redirects: {}", stats.redirects);
    println!("Other namespaces: {}", stats.other_namespace);
    println!("Malformed: {}", stats.malformed);
    println!("Time: {}m {}s", stats.elapsed.as_secs() / 60, stats.elapsed.as_secs() % 60);
    println!(
        "Rate: {:.0} pages/sec",
        stats.pages_processed as f64 / stats.elapsed.as_secs_f64().max(f64::EPSILON)
    );
    println!("============================================================");
}

#[allow(clippy::too_many_arguments)]
fn extract(
    config: &Config,
    input: PathBuf,
    output: PathBuf,
    strategy: Strategy,
    threads: usize,
    channel_buffer: Option<usize>,
    limit: Option<usize>,
    quiet: bool,
) -> Result<()> {
    let threads = if threads > 0 { threads } else { config.threads };
    let mut parallel = ParallelConfig::default().with_threads(threads);
    parallel.channel_buffer = channel_buffer.unwrap_or(config.channel_buffer).max(1);

    if !quiet {
        println!("Parsing: {}", input.display());
        println!("Output: {}", output.display());
        println!("Strategy: {:?}", strategy);
        if strategy != Strategy::Sequential {
            println!("Workers: {}", parallel.num_workers);
        }
        if let Some(limit) = limit {
            println!("Limit: {} records", limit);
        }
        println!();
    }

    let reader = open_dump(&input).with_context(|| format!("failed to open {}", input.display()))?;
    let output_file =
        File::create(&output).with_context(|| format!("failed to create {}", output.display()))?;

    let stats = match strategy {
        Strategy::Sequential => {
            let mut writer = BufWriter::with_capacity(256 * 1024, output_file);
            run_sequential(reader, &mut writer, limit, quiet)?
        }
        Strategy::ChannelPipeline => process_channel_pipeline(reader, output_file, &parallel, limit, quiet)?,
    };

    tracing::info!(
        pages = stats.pages_processed,
        records = stats.records_written,
        "extraction complete"
    );
    if !quiet {
        print_stats(&stats, &format!("{:?}", strategy));
    }
    Ok(())
}

fn list(
    config: &Config,
    pos: PartOfSpeech,
    words: Option<PathBuf>,
    freqs: Option<PathBuf>,
    limit: Option<usize>,
) -> Result<()> {
    let words = words.unwrap_or_else(|| config.words_path.clone());
    let freqs = freqs.unwrap_or_else(|| config.freqs_path.clone());
    if config.link_search_url.is_empty() {
        bail!("link_search_url must not be empty");
    }
    let linker = Linker::new(config.link_search_url.clone());

    let lexicon = Lexicon::load_files(&words, &freqs, &linker)?;
    let entries = lexicon.entries(pos);

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for entry in entries.iter().take(limit.unwrap_or(usize::MAX)) {
        serde_json::to_writer(&mut out, entry)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load_or_default(args.config.as_deref())?;
    init_logging(&config);

    match args.command {
        Command::Extract {
            input,
            output,
            strategy,
            threads,
            channel_buffer,
            limit,
            quiet,
        } => extract(&config, input, output, strategy, threads, channel_buffer, limit, quiet),
        Command::List {
            pos,
            words,
            freqs,
            limit,
        } => list(&config, pos, words, freqs, limit),
    }
}
