use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use setsim_core::persist::{load_index, save_index, IndexPaths};
use setsim_core::{SearchIndex, SimilarityKind, Token};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};

mod sets;

use sets::{read_sets, ReadOptions};

const PROGRESS_EVERY: usize = 1000;

#[derive(Parser)]
#[command(name = "setsim-indexer")]
#[command(about = "Build and query exact set similarity search indexes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Sets file, one `<label>\t<tok>,<tok>,...` per line; `.gz` files are decompressed
    #[arg(long)]
    input: PathBuf,
    /// Skip sets with fewer tokens than this
    #[arg(long, default_value_t = 0)]
    min_size: usize,
    /// The first line of the input is a header carrying the set count
    #[arg(long, default_value_t = false)]
    first_line_info: bool,
}

impl InputArgs {
    fn read(&self) -> Result<Vec<Vec<Token>>> {
        let opts = ReadOptions { first_line_info: self.first_line_info, min_size: self.min_size };
        read_sets(&self.input, opts)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index over a sets file and save it to a directory
    Build {
        #[command(flatten)]
        input: InputArgs,
        /// Output index directory
        #[arg(long)]
        output: PathBuf,
        /// jaccard, cosine or containment
        #[arg(long, default_value = "jaccard")]
        similarity: SimilarityKind,
        #[arg(long)]
        threshold: f64,
    },
    /// Query a saved index with every set of a file
    Query {
        /// Index directory written by `build`
        #[arg(long)]
        index: PathBuf,
        #[command(flatten)]
        input: InputArgs,
        /// CSV output file (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Find every pair of sets within a file that reaches the threshold
    AllPairs {
        #[command(flatten)]
        input: InputArgs,
        /// CSV output file (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, default_value = "jaccard")]
        similarity: SimilarityKind,
        #[arg(long)]
        threshold: f64,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, similarity, threshold } => {
            let sets = input.read()?;
            let index = build(&sets, similarity, threshold)?;
            save_index(&IndexPaths::new(&output), &index)?;
            Ok(())
        }
        Commands::Query { index, input, output } => {
            let index = load_index(&IndexPaths::new(&index))?;
            let queries = input.read()?;
            let mut out = open_output(output.as_deref())?;
            let rows = query_all(&index, &queries, &mut out)?;
            out.flush()?;
            tracing::info!(queries = queries.len(), rows, "queries complete");
            Ok(())
        }
        Commands::AllPairs { input, output, similarity, threshold } => {
            let sets = input.read()?;
            let index = build(&sets, similarity, threshold)?;
            let mut out = open_output(output.as_deref())?;
            let start = Instant::now();
            let pairs = all_pairs(&index, &sets, &mut out)?;
            out.flush()?;
            tracing::info!(pairs, elapsed = ?start.elapsed(), "all-pairs join complete");
            Ok(())
        }
    }
}

fn build(sets: &[Vec<Token>], similarity: SimilarityKind, threshold: f64) -> Result<SearchIndex> {
    let start = Instant::now();
    let index = SearchIndex::build(sets, similarity, threshold)?;
    tracing::info!(records = index.len(), elapsed = ?start.elapsed(), "index built");
    Ok(index)
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(BufWriter::new(File::create(p)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

/// Write `query,record,score` rows for every hit; returns the row count.
fn query_all<W: Write>(index: &SearchIndex, queries: &[Vec<Token>], out: &mut W) -> Result<usize> {
    let mut rows = 0;
    for (i, query) in queries.iter().enumerate() {
        let mut hits = index.query(query)?;
        hits.sort_by_key(|h| h.record_id);
        for hit in hits {
            writeln!(out, "{},{},{:.4}", i, hit.record_id, hit.score)?;
            rows += 1;
        }
        if (i + 1) % PROGRESS_EVERY == 0 {
            tracing::info!(queried = i + 1, "progress");
        }
    }
    Ok(rows)
}

/// Self-join: query each indexed set against the index, skipping the set
/// itself. Returns the number of pairs written.
fn all_pairs<W: Write>(index: &SearchIndex, sets: &[Vec<Token>], out: &mut W) -> Result<usize> {
    let mut pairs = 0;
    for (i, set) in sets.iter().enumerate() {
        let mut hits = index.query(set)?;
        hits.sort_by_key(|h| h.record_id);
        for hit in hits.into_iter().filter(|h| h.record_id as usize != i) {
            writeln!(out, "{},{},{:.4}", i, hit.record_id, hit.score)?;
            pairs += 1;
        }
        if (i + 1) % PROGRESS_EVERY == 0 {
            tracing::info!(queried = i + 1, total = sets.len(), "progress");
        }
    }
    Ok(pairs)
}
