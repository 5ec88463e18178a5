use chrono::prelude::*;
use directories::ProjectDirs;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Append-only log of generated payloads, one CSV record per scan.
///
/// Kept out of the critical path: callers ignore failures so payload
/// generation always succeeds even on a read-only disk.
#[derive(Debug, Clone)]
pub struct PayloadLog {
    path: PathBuf,
}

impl PayloadLog {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: default_log_path().unwrap_or_else(|| PathBuf::from("qscout_scans.csv")),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one `(date, payload)` record, emitting the header when the
    /// file is first created.
    pub fn append(&self, payload: &str) -> csv::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let needs_header = !self.path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(["date", "payload"])?;
        }
        writer.write_record([Local::now().format("%c").to_string(), payload.to_string()])?;
        writer.flush()?;

        Ok(())
    }
}

impl Default for PayloadLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan log under $HOME/.local/state/qscout, falling back to the platform
/// data dir.
fn default_log_path() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        let state_dir = PathBuf::from(home)
            .join(".local")
            .join("state")
            .join("qscout");
        Some(state_dir.join("scans.csv"))
    } else {
        ProjectDirs::from("", "", "qscout").map(|pd| pd.data_local_dir().join("scans.csv"))
    }
}
