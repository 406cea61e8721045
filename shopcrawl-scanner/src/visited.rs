use crate::error::Result;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Append-only, newline-delimited URL log.
///
/// Every append is flushed before returning so a killed process loses at
/// most the entry being written.
pub struct UrlLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl UrlLog {
    /// Open (creating if needed) the log at `path` and return it together
    /// with the URLs it already holds, in file order.
    pub fn open(path: &Path) -> Result<(Self, Vec<String>)> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let existing = if path.exists() {
            fs::read_to_string(path)?
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        } else {
            Vec::new()
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        debug!("Opened {} with {} entries", path.display(), existing.len());

        Ok((
            Self {
                path: path.to_path_buf(),
                writer: BufWriter::new(file),
            },
            existing,
        ))
    }

    pub fn append(&mut self, url: &str) -> Result<()> {
        writeln!(self.writer, "{}", url)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_log_creates_it() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("visited.log");
        let (_log, existing) = UrlLog::open(&path).unwrap();
        assert!(existing.is_empty());
        assert!(path.exists());
    }

    #[test]
    fn test_appends_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("visited.log");
        {
            let (mut log, _) = UrlLog::open(&path).unwrap();
            log.append("https://shop.example/a").unwrap();
            log.append("https://shop.example/b").unwrap();
        }
        let (_log, existing) = UrlLog::open(&path).unwrap();
        assert_eq!(existing, vec!["https://shop.example/a", "https://shop.example/b"]);
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("visited.log");
        fs::write(&path, "https://shop.example/a\n\n   \nhttps://shop.example/b\n").unwrap();
        let (_log, existing) = UrlLog::open(&path).unwrap();
        assert_eq!(existing.len(), 2);
    }
}
