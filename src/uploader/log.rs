//! Append-only upload log.
//!
//! One record per successful delivery, three UTF-8 text lines each:
//! bulletin local id, configured server label, bulletin title. The file is
//! created lazily on the first logged delivery; a disabled log never touches
//! the filesystem.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::model::LocalId;

#[derive(Debug, Clone)]
pub struct UploadLog {
    enabled: bool,
    path: PathBuf,
}

impl UploadLog {
    pub fn new(path: &Path, enabled: bool) -> Self {
        Self {
            enabled,
            path: path.to_path_buf(),
        }
    }

    /// A log that records nothing and creates no file.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            path: PathBuf::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Append one delivery record. No-op when disabled.
    pub fn append(&self, local_id: &LocalId, server_label: &str, title: &str) -> io::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{local_id}")?;
        writeln!(file, "{server_label}")?;
        writeln!(file, "{title}")?;
        Ok(())
    }
}
