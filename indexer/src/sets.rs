//! Reader for the set similarity benchmark text format.
//!
//! One set per line, `<label>\t<token>,<token>,...`. A line without a tab is
//! taken as a bare token list. Benchmark files may open with a header line
//! whose first field is the number of sets. Files ending in `.gz` are
//! decompressed on the fly.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use setsim_core::Token;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::time::Instant;

const READ_PROGRESS_EVERY: usize = 100;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Treat the first line as a `<count> ...` header.
    pub first_line_info: bool,
    /// Skip sets with fewer tokens than this.
    pub min_size: usize,
}

pub fn read_sets(path: &Path, opts: ReadOptions) -> Result<Vec<Vec<Token>>> {
    let start = Instant::now();
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let raw: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(GzDecoder::new(f))
    } else {
        Box::new(f)
    };
    let sets = parse_sets(BufReader::new(raw), opts).with_context(|| format!("reading {}", path.display()))?;
    tracing::info!(sets = sets.len(), path = %path.display(), elapsed = ?start.elapsed(), "finished reading sets");
    Ok(sets)
}

pub fn parse_sets<R: BufRead>(reader: R, opts: ReadOptions) -> Result<Vec<Vec<Token>>> {
    let mut sets = Vec::new();
    let mut skipped = 0usize;
    let mut lines = reader.lines().enumerate();

    if opts.first_line_info {
        if let Some((_, line)) = lines.next() {
            let line = line?;
            let count: usize = line
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .parse()
                .with_context(|| format!("bad header line {line:?}"))?;
            sets.reserve(count);
        }
    }

    for (lineno, line) in lines {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let set = parse_line(line).with_context(|| format!("line {}", lineno + 1))?;
        if set.len() < opts.min_size {
            skipped += 1;
            continue;
        }
        sets.push(set);
        if sets.len() % READ_PROGRESS_EVERY == 0 {
            tracing::debug!(read = sets.len(), "reading sets");
        }
    }

    tracing::debug!(sets = sets.len(), skipped, "parsed sets");
    Ok(sets)
}

fn parse_line(line: &str) -> Result<Vec<Token>> {
    let raw = match line.split_once('\t') {
        Some((_, tokens)) => tokens,
        None => line,
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Token>().with_context(|| format!("bad token {s:?}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};
    use tempfile::tempdir;

    #[test]
    fn reads_benchmark_lines() {
        let input = "3 12\nrec-a\t1,2,3\nrec-b\t4,5\n\nrec-c\t6\n";
        let opts = ReadOptions { first_line_info: true, min_size: 0 };
        let sets = parse_sets(Cursor::new(input), opts).unwrap();
        assert_eq!(sets, vec![vec![1, 2, 3], vec![4, 5], vec![6]]);
    }

    #[test]
    fn skips_small_sets() {
        let input = "a\t1,2,3\nb\t4\nc\t5,6\n";
        let opts = ReadOptions { first_line_info: false, min_size: 2 };
        let sets = parse_sets(Cursor::new(input), opts).unwrap();
        assert_eq!(sets, vec![vec![1, 2, 3], vec![5, 6]]);
    }

    #[test]
    fn accepts_bare_token_lists() {
        let sets = parse_sets(Cursor::new("7, 8,9\n"), ReadOptions::default()).unwrap();
        assert_eq!(sets, vec![vec![7, 8, 9]]);
    }

    #[test]
    fn reports_bad_tokens() {
        let err = parse_sets(Cursor::new("a\t1,x\n"), ReadOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("line 1"));
    }

    #[test]
    fn reports_bad_header() {
        let opts = ReadOptions { first_line_info: true, min_size: 0 };
        assert!(parse_sets(Cursor::new("many sets\n"), opts).is_err());
    }

    #[test]
    fn reads_gzipped_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sets.inp.gz");
        let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        enc.write_all(b"2 5\nrec-a\t1,2,3\nrec-b\t4,5\n").unwrap();
        enc.finish().unwrap();

        let opts = ReadOptions { first_line_info: true, min_size: 0 };
        let sets = read_sets(&path, opts).unwrap();
        assert_eq!(sets, vec![vec![1, 2, 3], vec![4, 5]]);
    }

    #[test]
    fn reads_plain_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sets.inp");
        std::fs::write(&path, "rec-a\t1,2\n").unwrap();
        assert_eq!(read_sets(&path, ReadOptions::default()).unwrap(), vec![vec![1, 2]]);
    }
}
