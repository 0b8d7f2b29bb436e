use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use corrector_common::BotProfile;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::Correction;

/// One line of the correction journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub run_id: String,
    pub target_id: String,
    pub reply_id: String,
    pub author: String,
    pub incorrect: String,
    pub correct: String,
    pub corrected_at: DateTime<Utc>,
}

/// Append-only JSONL record of posted corrections, one file per UTC day:
/// `{data_dir}/corrections/{profile}/{YYYY-MM-DD}.jsonl`.
///
/// Audit only. Nothing reads it back, so write failures are logged and
/// never affect the cycle.
pub struct CorrectionJournal {
    dir: Option<PathBuf>,
}

impl CorrectionJournal {
    pub fn new(data_dir: &Path, profile: BotProfile) -> Self {
        Self {
            dir: Some(data_dir.join("corrections").join(profile.slug())),
        }
    }

    /// A journal that records nothing.
    pub fn disabled() -> Self {
        Self { dir: None }
    }

    pub fn path_for(&self, at: DateTime<Utc>) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.jsonl", at.format("%Y-%m-%d"))))
    }

    /// Append `correction`. Returns whether a line was written.
    pub fn record(&self, run_id: &str, correction: &Correction, at: DateTime<Utc>) -> bool {
        let Some(path) = self.path_for(at) else {
            return false;
        };
        let entry = JournalEntry {
            run_id: run_id.to_string(),
            target_id: correction.target_id.clone(),
            reply_id: correction.reply_id.clone(),
            author: correction.author.clone(),
            incorrect: correction.error_match.incorrect.clone(),
            correct: correction.error_match.correct.clone(),
            corrected_at: at,
        };
        match append(&path, &entry) {
            Ok(()) => {
                debug!(path = %path.display(), "Journaled correction");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to journal correction");
                false
            }
        }
    }
}

fn append(path: &Path, entry: &JournalEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}
