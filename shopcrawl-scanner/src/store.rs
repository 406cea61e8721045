use crate::error::Result;
use crate::result::ProductRecord;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const MAX_FILE_STEM_CHARS: usize = 50;

/// Destination for finished records.
pub trait RecordSink {
    /// Persist one record, returning where it was written.
    fn persist(&mut self, record: &ProductRecord) -> Result<PathBuf>;
}

/// Replace characters that are not allowed in file names with `-`.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Writes `root/<category>/<subcategory>/<title>.txt` and optionally appends
/// each record to a JSON-lines dataset.
///
/// Record files are write-once: an existing name gets a numeric suffix.
pub struct FileStore {
    root: PathBuf,
    jsonl: Option<File>,
    written: usize,
}

impl FileStore {
    pub fn new(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            jsonl: None,
            written: 0,
        })
    }

    pub fn with_jsonl(mut self, path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        self.jsonl = Some(file);
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_stem(&self, record: &ProductRecord) -> String {
        match record.title.as_deref() {
            Some(title) => {
                let truncated: String = title.chars().take(MAX_FILE_STEM_CHARS).collect();
                sanitize_name(&truncated)
            }
            None => format!("page_{:04}", self.written),
        }
    }

    fn create_unique(dir: &Path, stem: &str) -> io::Result<(PathBuf, File)> {
        let mut attempt = 1;
        loop {
            let name = if attempt == 1 {
                format!("{}.txt", stem)
            } else {
                format!("{}_{}.txt", stem, attempt)
            };
            let path = dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e),
            }
        }
    }
}

impl RecordSink for FileStore {
    fn persist(&mut self, record: &ProductRecord) -> Result<PathBuf> {
        let dir = self
            .root
            .join(sanitize_name(&record.category))
            .join(sanitize_name(&record.subcategory));
        fs::create_dir_all(&dir)?;

        let text = record.to_text();
        let json_line = match self.jsonl {
            Some(_) => Some(format!("{}\n", record.to_json_line()?)),
            None => None,
        };

        let (path, mut file) = Self::create_unique(&dir, &self.file_stem(record))?;
        let written = file.write_all(text.as_bytes()).and_then(|_| file.flush());
        drop(file);
        let written = written.and_then(|_| match (self.jsonl.as_mut(), json_line) {
            (Some(jsonl), Some(line)) => jsonl.write_all(line.as_bytes()).and_then(|_| jsonl.flush()),
            _ => Ok(()),
        });
        if let Err(e) = written {
            if let Err(remove_err) = fs::remove_file(&path) {
                warn!("Could not remove incomplete record {}: {}", path.display(), remove_err);
            }
            return Err(e.into());
        }

        self.written += 1;
        debug!("Wrote {}", path.display());
        Ok(path)
    }
}
