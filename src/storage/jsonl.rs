//! JSONL stores for catalog records
//!
//! Products, nomenclature versions and stock movements each live in their
//! own `.fabrik/*.jsonl` file with one JSON object per line, preserving
//! insertion order. Uses file locking for concurrent access safety; all
//! rewrites are atomic (temp file + rename).

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::{NomenclatureVersion, Product, StockMovement};

/// A record type storable in a JSONL file
pub trait Record: Serialize + DeserializeOwned + Clone {
    type Id: PartialEq + Clone;

    /// The record's unique id
    fn record_id(&self) -> &Self::Id;

    /// File name under the project data directory
    fn file_name() -> &'static str;
}

impl Record for Product {
    type Id = crate::domain::ProductId;

    fn record_id(&self) -> &Self::Id {
        &self.id
    }

    fn file_name() -> &'static str {
        "products.jsonl"
    }
}

impl Record for NomenclatureVersion {
    type Id = crate::domain::NomenclatureId;

    fn record_id(&self) -> &Self::Id {
        &self.id
    }

    fn file_name() -> &'static str {
        "nomenclatures.jsonl"
    }
}

impl Record for StockMovement {
    type Id = crate::domain::MovementId;

    fn record_id(&self) -> &Self::Id {
        &self.id
    }

    fn file_name() -> &'static str {
        "movements.jsonl"
    }
}

/// Store for one record type in JSONL format
pub struct JsonlStore<T: Record> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Record> JsonlStore<T> {
    /// Creates a store at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(".fabrik").join(T::file_name()))
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all records in file order
    pub fn read_all(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open store: {}", self.path.display()))?;

        // Shared lock for reading
        file.lock_shared()
            .with_context(|| format!("Failed to acquire read lock: {}", self.path.display()))?;

        let records = Self::parse(BufReader::new(&file))?;

        // Lock is released when file is dropped
        Ok(records)
    }

    fn parse(reader: impl BufRead) -> Result<Vec<T>> {
        let mut records = Vec::new();
        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: T = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse record at line {}", line_num + 1))?;
            records.push(record);
        }
        Ok(records)
    }

    /// Writes all records in the given order (full rewrite)
    pub fn write_all(&self, records: &[T]) -> Result<()> {
        self.ensure_parent()?;

        let temp_path = self.path.with_extension("jsonl.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            file.lock_exclusive()
                .with_context(|| format!("Failed to acquire write lock: {}", temp_path.display()))?;

            let mut writer = BufWriter::new(&file);
            for record in records {
                let line = serde_json::to_string(record).context("Failed to serialize record")?;
                writeln!(writer, "{}", line).context("Failed to write record")?;
            }
            writer.flush().context("Failed to flush store")?;
        }

        // Atomic rename
        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }

    /// Appends a single record without rewriting the file
    pub fn append(&self, record: &T) -> Result<()> {
        self.ensure_parent()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open store: {}", self.path.display()))?;

        file.lock_exclusive()
            .with_context(|| format!("Failed to acquire write lock: {}", self.path.display()))?;

        let mut writer = BufWriter::new(&file);
        let line = serde_json::to_string(record).context("Failed to serialize record")?;
        writeln!(writer, "{}", line).context("Failed to write record")?;
        writer.flush().context("Failed to flush store")?;

        Ok(())
    }

    /// Reads, transforms and rewrites the store under one exclusive lock.
    ///
    /// This is the check-then-act window: callers validate against the
    /// current contents and mutate in the same closure, so no concurrent
    /// writer can slip in between.
    ///
    /// The rewrite goes through the locked handle (truncate in place), not
    /// through a rename: a writer blocked on this inode must observe the
    /// new contents once it acquires the lock. A rename would leave it
    /// holding a lock on an unlinked file and rewriting stale records.
    pub fn modify<R>(&self, f: impl FnOnce(&mut Vec<T>) -> Result<R>) -> Result<R> {
        self.ensure_parent()?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open store: {}", self.path.display()))?;

        file.lock_exclusive()
            .with_context(|| format!("Failed to acquire write lock: {}", self.path.display()))?;

        let mut records = Self::parse(BufReader::new(&file))?;
        let result = f(&mut records)?;

        file.seek(SeekFrom::Start(0))
            .with_context(|| format!("Failed to rewind store: {}", self.path.display()))?;
        file.set_len(0)
            .with_context(|| format!("Failed to truncate store: {}", self.path.display()))?;

        let mut writer = BufWriter::new(&file);
        for record in &records {
            let line = serde_json::to_string(record).context("Failed to serialize record")?;
            writeln!(writer, "{}", line).context("Failed to write record")?;
        }
        writer.flush().context("Failed to flush store")?;

        Ok(result)
    }

    /// Rewrites the store keeping only the last occurrence of each id
    pub fn compact(&self) -> Result<usize> {
        self.modify(|records| {
            let mut deduped: Vec<T> = Vec::with_capacity(records.len());
            for record in records.iter() {
                if let Some(existing) = deduped
                    .iter_mut()
                    .find(|r| r.record_id() == record.record_id())
                {
                    *existing = record.clone();
                } else {
                    deduped.push(record.clone());
                }
            }
            *records = deduped;
            Ok(records.len())
        })
    }

    fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        Ok(())
    }
}
