//! On-disk snapshots of a built index.
//!
//! A snapshot directory holds `index.bin` (bincode) and `meta.json`.

use crate::config::IndexConfig;
use crate::index::SearchIndex;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_records: usize,
    pub config: IndexConfig,
    pub created_at: String,
    pub version: u32,
}

impl MetaFile {
    pub fn for_index(index: &SearchIndex) -> Self {
        let created_at = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        Self { num_records: index.len(), config: index.config(), created_at, version: FORMAT_VERSION }
    }
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn index(&self) -> PathBuf { self.root.join("index.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Write `index` and its metadata under `paths.root`.
pub fn save_index(paths: &IndexPaths, index: &SearchIndex) -> Result<MetaFile> {
    create_dir_all(&paths.root)?;
    let mut w = BufWriter::new(File::create(paths.index())?);
    bincode::serialize_into(&mut w, index)?;
    w.flush()?;

    let meta = MetaFile::for_index(index);
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), records = meta.num_records, "saved index");
    Ok(meta)
}

/// Read back an index written by [`save_index`], checking it against its metadata.
pub fn load_index(paths: &IndexPaths) -> Result<SearchIndex> {
    let meta = load_meta(paths)?;
    if meta.version != FORMAT_VERSION {
        bail!("unsupported index format version {} (expected {})", meta.version, FORMAT_VERSION);
    }
    meta.config.validate()?;

    let r = BufReader::new(File::open(paths.index())?);
    let index: SearchIndex = bincode::deserialize_from(r)?;
    if index.config() != meta.config || index.len() != meta.num_records {
        bail!("index data does not match {}", paths.meta().display());
    }
    if let Err(e) = index.check() {
        bail!("corrupt index {}: {e:#}", paths.index().display());
    }
    tracing::info!(root = %paths.root.display(), records = index.len(), "loaded index");
    Ok(index)
}
