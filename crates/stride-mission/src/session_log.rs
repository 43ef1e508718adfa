//! Append-only plain-text audit log for one mission session.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// A session log file under `<progress_dir>/<YYYY-MM-DD>/session_<HH-MM-SS>.txt`.
///
/// The file handle is opened for each write and closed immediately after;
/// nothing is held open between polls.
#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    /// Creates the log file for a session started at `started`, writing `header`.
    ///
    /// An existing file with the same name is truncated.
    pub async fn create(
        progress_dir: &Path,
        started: DateTime<Local>,
        header: &str,
    ) -> std::io::Result<Self> {
        let day_dir = progress_dir.join(started.format("%Y-%m-%d").to_string());
        fs::create_dir_all(&day_dir).await?;

        let path = day_dir.join(format!("session_{}.txt", started.format("%H-%M-%S")));
        fs::write(&path, header).await?;

        Ok(Self { path })
    }

    /// Appends `text` verbatim.
    pub async fn append(&self, text: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path).await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
