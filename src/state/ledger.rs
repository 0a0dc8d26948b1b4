//! Visited page ledger
//!
//! An in-memory set of processed page URLs backed by an append-only text
//! file, one URL per line.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Persistent set of page URLs already processed
#[derive(Debug)]
pub struct VisitedLedger {
    path: PathBuf,
    visited: HashSet<String>,
}

impl VisitedLedger {
    /// Loads the ledger from `path`
    ///
    /// A missing file is an empty ledger. Blank lines are ignored and
    /// duplicate lines collapse into one entry.
    pub fn load(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();

        let visited = match std::fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(e),
        };

        tracing::debug!(
            "Loaded {} visited pages from {}",
            visited.len(),
            path.display()
        );

        Ok(Self { path, visited })
    }

    /// Returns true if `url` has already been processed
    pub fn contains(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Records `url` as processed
    ///
    /// The line is appended and flushed before the in-memory set is updated,
    /// so a URL is never treated as visited without being durable.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The URL was new and has been appended
    /// * `Ok(false)` - The URL was already present; nothing was written
    pub fn record(&mut self, url: &str) -> io::Result<bool> {
        if self.visited.contains(url) {
            return Ok(false);
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        append_line(file, url)?;

        self.visited.insert(url.to_string());
        Ok(true)
    }

    /// Number of distinct visited pages
    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn append_line(file: File, line: &str) -> io::Result<()> {
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", line)?;
    writer.flush()?;
    writer.get_ref().sync_data()
}
