//! Change detection.
//!
//! The hash store maps each analysed path to the SHA-256 of its bytes and the
//! coverage flags it reached. A file whose hash is unchanged and whose stored
//! flag for the requested [`Level`] is set does not need to be analysed again.

use anyhow::{Context, Result};
use clap::ValueEnum;
use lintworm_syntax::Coverage;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Documentation levels, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Level {
    BasicComments,
    MultilineComments,
    FormattedMultiline,
    Documented,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashEntry {
    pub hash: String,
    pub basic_comments: bool,
    pub multiline_comments: bool,
    pub formatted_multiline: bool,
    pub documented: bool,
}

impl HashEntry {
    pub fn new(hash: String, coverage: &Coverage) -> Self {
        Self {
            hash,
            basic_comments: coverage.has_basic_comment,
            multiline_comments: coverage.has_multiline_comment,
            formatted_multiline: coverage.docstring_matches_grammar,
            documented: coverage.is_complete,
        }
    }

    fn reached(&self, level: Level) -> bool {
        match level {
            Level::BasicComments => self.basic_comments,
            Level::MultilineComments => self.multiline_comments,
            Level::FormattedMultiline => self.formatted_multiline,
            Level::Documented => self.documented,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashStore {
    entries: BTreeMap<String, HashEntry>,
}

impl HashStore {
    /// Load a store; a missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read hash file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid hash file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to encode hash store")?;
        fs::write(path, json + "\n")
            .with_context(|| format!("failed to write hash file {}", path.display()))
    }

    /// Unchanged since the last run and documented to at least `level`.
    pub fn is_current(&self, path: &str, hash: &str, level: Level) -> bool {
        self.entries
            .get(path)
            .is_some_and(|entry| entry.hash == hash && entry.reached(level))
    }

    pub fn update(&mut self, path: String, entry: HashEntry) {
        self.entries.insert(path, entry);
    }

    #[cfg(test)]
    pub fn get(&self, path: &str) -> Option<&HashEntry> {
        self.entries.get(path)
    }
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
