//! Log file settings and housekeeping.
//!
//! The subscriber itself is installed by the binary; this module only knows
//! where files go and how many are kept.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

const LOG_PREFIX: &str = "stripviz_";
const LOG_EXTENSION: &str = "log";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// trace, debug, info, warn, error or off
    pub level: String,
    pub console_output: bool,
    pub file_output: bool,
    pub log_directory: PathBuf,
    /// Old session files beyond this count are deleted at startup
    pub max_files: usize,
    #[serde(skip)]
    session: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_directory: default_log_directory(),
            max_files: 10,
            session: session_stamp(),
        }
    }
}

fn default_log_directory() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("stripviz").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

fn session_stamp() -> String {
    Local::now().format("%Y-%m-%d_%H-%M-%S").to_string()
}

impl LogConfig {
    /// Parsed level; unknown names fall back to INFO.
    pub fn parse_level(&self) -> LevelFilter {
        self.level.trim().parse().unwrap_or(LevelFilter::INFO)
    }

    pub fn ensure_log_directory(&self) -> io::Result<()> {
        fs::create_dir_all(&self.log_directory)
    }

    /// File written by this process
    pub fn current_log_path(&self) -> PathBuf {
        let session = if self.session.is_empty() {
            session_stamp()
        } else {
            self.session.clone()
        };
        self.log_directory
            .join(format!("{}{}.{}", LOG_PREFIX, session, LOG_EXTENSION))
    }

    /// Delete the oldest session files so that at most `max_files - 1`
    /// remain, leaving room for the one about to be created.
    pub fn cleanup_old_logs(&self) -> io::Result<usize> {
        if !self.log_directory.exists() {
            return Ok(0);
        }

        let mut logs: Vec<PathBuf> = fs::read_dir(&self.log_directory)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                name.starts_with(LOG_PREFIX)
                    && path.extension().and_then(|e| e.to_str()) == Some(LOG_EXTENSION)
            })
            .collect();

        let keep = self.max_files.saturating_sub(1);
        if logs.len() <= keep {
            return Ok(0);
        }

        // Session stamps sort chronologically
        logs.sort();
        let excess = logs.len() - keep;
        let mut removed = 0;
        for path in logs.into_iter().take(excess) {
            fs::remove_file(&path)?;
            removed += 1;
        }
        Ok(removed)
    }
}
