//! Session log and report export

use crate::button::{ButtonEvent, ButtonEventKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

/// A committed key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommitRecord {
    /// Button that committed the text
    pub button: u32,
    pub text: String,
    /// Whether the text reached a focused input
    pub inserted: bool,
    /// RFC 3339 timestamp
    pub at: String,
}

/// Running tally of button activity
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    commits: Vec<CommitRecord>,
    options_shown: u64,
    options_hidden: u64,
    cancellations: u64,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&mut self, event: &ButtonEvent) {
        match &event.kind {
            ButtonEventKind::KeyPressed { text, inserted } => {
                let now: DateTime<Utc> = Utc::now();
                self.commits.push(CommitRecord {
                    button: event.button.0,
                    text: text.clone(),
                    inserted: *inserted,
                    at: now.to_rfc3339(),
                });
            }
            ButtonEventKind::OptionsShown => self.options_shown += 1,
            ButtonEventKind::OptionsHidden => self.options_hidden += 1,
        }
    }

    pub fn record_cancel(&mut self) {
        self.cancellations += 1;
    }

    pub fn commits(&self) -> &[CommitRecord] {
        &self.commits
    }

    pub fn cancellations(&self) -> u64 {
        self.cancellations
    }
}

/// Complete session report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Report metadata
    pub metadata: ReportMetadata,
    /// Summary statistics
    pub summary: SessionSummary,
    /// Every commit in order
    pub commits: Vec<CommitRecord>,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Report generation timestamp
    pub generated_at: String,
    /// Application version
    pub version: String,
    /// Session duration in seconds
    pub duration_secs: f64,
}

/// Session summary statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSummary {
    pub total_commits: u64,
    pub inserted: u64,
    pub dropped: u64,
    pub options_shown: u64,
    pub options_hidden: u64,
    pub cancellations: u64,
}

impl SessionReport {
    /// Create a new session report
    pub fn new(start_time: Instant, log: &SessionLog) -> Self {
        let inserted = log.commits.iter().filter(|c| c.inserted).count() as u64;
        let total = log.commits.len() as u64;
        let now: DateTime<Utc> = Utc::now();

        Self {
            metadata: ReportMetadata {
                generated_at: now.to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                duration_secs: start_time.elapsed().as_secs_f64(),
            },
            summary: SessionSummary {
                total_commits: total,
                inserted,
                dropped: total - inserted,
                options_shown: log.options_shown,
                options_hidden: log.options_hidden,
                cancellations: log.cancellations,
            },
            commits: log.commits.clone(),
        }
    }

    /// Export report to JSON file
    pub fn export_json(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Export report to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
