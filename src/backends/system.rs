use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::{Storage, Viewer};
use crate::Result;

/// Opens locators with the desktop's default handler
pub struct SystemViewer;

impl SystemViewer {
    pub fn new() -> Self {
        Self
    }

    fn command(locator: &str) -> Command {
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(locator);
            cmd
        } else if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", ""]).arg(locator);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(locator);
            cmd
        }
    }
}

impl Default for SystemViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewer for SystemViewer {
    fn open(&self, locator: &str) {
        let spawned = Self::command(locator)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(_) => tracing::debug!(locator, "handed locator to viewer"),
            Err(e) => tracing::warn!(locator, error = %e, "failed to launch viewer"),
        }
    }
}

/// Saves payloads as files in one directory
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl Storage for FileStorage {
    fn write(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        fs::write(&path, bytes)?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "payload saved");
        Ok(path)
    }
}
