use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only log of evaluated lines.
///
/// A file-backed history is loaded once when opened and then persisted one
/// line at a time, so a crash never loses more than the current line.
#[derive(Debug, Default)]
pub struct History {
    path: Option<PathBuf>,
    entries: Vec<String>,
}

impl History {
    /// History that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open (creating if missing) the history file at `path` and load its lines.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            fs::File::create(path)
                .with_context(|| format!("can't create history file {}", path.display()))?;
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("can't read history file {}", path.display()))?;
        let entries = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();
        Ok(Self {
            path: Some(path.to_path_buf()),
            entries,
        })
    }

    /// Record `line`; blank lines are ignored.
    pub fn append(&mut self, line: &str) -> Result<()> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Ok(());
        }
        if let Some(path) = &self.path {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("can't open history file {}", path.display()))?;
            writeln!(file, "{}", line)?;
        }
        self.entries.push(line.to_string());
        Ok(())
    }

    pub fn read_last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
