// Corpus merging: many small record files -> one file per subcategory

use crate::clean::{MIN_CONTENT_CHARS, extract_clean_content, source_url_line};
use crate::naming::NameMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const SEPARATOR_WIDTH: usize = 120;

/// Joiner placed between merged entries: a rule of `=` with blank lines
/// around it.
pub fn separator() -> String {
    format!("\n{}\n\n", "=".repeat(SEPARATOR_WIDTH))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeLayout {
    /// `input/<category>/<subcategory>/*.txt` ->
    /// `output/<category>/<subcategory>_merged.txt`
    #[default]
    Nested,
    /// `input/<folder>/*.txt` -> `output/merged_<folder>.txt`
    Flat,
}

#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub layout: MergeLayout,
    pub max_files: Option<usize>,
    pub min_chars: usize,
    pub keep_source_url: bool,
    pub name_map: NameMap,
}

impl MergeOptions {
    pub fn new(input_root: &Path, output_root: &Path) -> Self {
        Self {
            input_root: input_root.to_path_buf(),
            output_root: output_root.to_path_buf(),
            layout: MergeLayout::Nested,
            max_files: None,
            min_chars: MIN_CONTENT_CHARS,
            keep_source_url: false,
            name_map: NameMap::new(),
        }
    }
}

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("input directory {0} does not exist")]
    MissingInput(PathBuf),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeSummary {
    pub categories: usize,
    pub corpora_written: usize,
    pub entries_merged: usize,
    pub files_discarded: usize,
    pub write_failures: usize,
    pub outputs: Vec<PathBuf>,
}

/// Rebuild every corpus file under `output_root` from `input_root`.
///
/// Directories and files are processed in sorted name order, so unchanged
/// input always yields byte-identical output.
pub fn merge_corpus(options: &MergeOptions) -> Result<MergeSummary, MergeError> {
    if !options.input_root.is_dir() {
        return Err(MergeError::MissingInput(options.input_root.clone()));
    }

    let top_level = sorted_entries(&options.input_root, EntryKind::Dir).map_err(|source| MergeError::Io {
        path: options.input_root.clone(),
        source,
    })?;
    fs::create_dir_all(&options.output_root).map_err(|source| MergeError::Io {
        path: options.output_root.clone(),
        source,
    })?;

    info!(
        "Merging {} folder(s) from {} into {}",
        top_level.len(),
        options.input_root.display(),
        options.output_root.display()
    );

    let mut summary = MergeSummary::default();
    let mut written = HashSet::new();
    for folder in top_level {
        summary.categories += 1;
        match options.layout {
            MergeLayout::Nested => {
                let category = dir_name(&folder);
                let subfolders = match sorted_entries(&folder, EntryKind::Dir) {
                    Ok(subfolders) => subfolders,
                    Err(e) => {
                        warn!("Cannot list {}: {}", folder.display(), e);
                        continue;
                    }
                };
                for subfolder in subfolders {
                    let name = options.name_map.resolve(&dir_name(&subfolder));
                    let target = options
                        .output_root
                        .join(&category)
                        .join(format!("{}_merged.txt", name));
                    merge_folder(&subfolder, &target, options, &mut summary, &mut written);
                }
            }
            MergeLayout::Flat => {
                let name = options.name_map.resolve(&dir_name(&folder));
                let target = options.output_root.join(format!("merged_{}.txt", name));
                merge_folder(&folder, &target, options, &mut summary, &mut written);
            }
        }
    }

    info!(
        "Merge complete: {} corpora, {} entries, {} discarded",
        summary.corpora_written, summary.entries_merged, summary.files_discarded
    );
    Ok(summary)
}

/// Folders whose names resolve to a target already written in this run are
/// appended to that corpus instead of replacing it.
fn merge_folder(
    folder: &Path,
    target: &Path,
    options: &MergeOptions,
    summary: &mut MergeSummary,
    written: &mut HashSet<PathBuf>,
) {
    let files = match sorted_entries(folder, EntryKind::TextFile) {
        Ok(files) => files,
        Err(e) => {
            warn!("Cannot list {}: {}", folder.display(), e);
            return;
        }
    };
    if files.is_empty() {
        return;
    }

    let limit = options.max_files.unwrap_or(usize::MAX);
    let (entries, discarded) = collect_entries(&files[..files.len().min(limit)], options);
    summary.files_discarded += discarded;

    if entries.is_empty() {
        debug!("Nothing to merge in {}", folder.display());
        return;
    }

    let body = entries.join(&separator());
    if written.contains(target) {
        warn!(
            "{} resolves to {}, which is already written; appending",
            folder.display(),
            target.display()
        );
        let append = OpenOptions::new()
            .append(true)
            .open(target)
            .and_then(|mut file| write!(file, "{}{}", separator(), body));
        match append {
            Ok(()) => summary.entries_merged += entries.len(),
            Err(e) => {
                error!("Error appending to {}: {}", target.display(), e);
                summary.write_failures += 1;
            }
        }
        return;
    }

    let write = target
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|_| fs::write(target, body));

    match write {
        Ok(()) => {
            info!("{} -> {} ({} items)", folder.display(), target.display(), entries.len());
            summary.corpora_written += 1;
            summary.entries_merged += entries.len();
            summary.outputs.push(target.to_path_buf());
            written.insert(target.to_path_buf());
        }
        Err(e) => {
            error!("Error writing {}: {}", target.display(), e);
            summary.write_failures += 1;
        }
    }
}

/// Clean every file, dropping unreadable and too-short ones. Returns the
/// entries in input order and the number discarded.
pub fn collect_entries(files: &[PathBuf], options: &MergeOptions) -> (Vec<String>, usize) {
    let mut entries = Vec::new();
    let mut discarded = 0;

    for path in files {
        let raw = match fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                error!("Error reading {}: {}", path.display(), e);
                discarded += 1;
                continue;
            }
        };

        match extract_clean_content(&raw, options.min_chars) {
            Some(content) => {
                let entry = match source_url_line(&raw) {
                    Some(url_line) if options.keep_source_url => format!("{}\n{}", url_line, content),
                    _ => content,
                };
                entries.push(entry);
            }
            None => {
                debug!("Discarding {} (too short)", path.display());
                discarded += 1;
            }
        }
    }

    (entries, discarded)
}

#[derive(Clone, Copy, PartialEq)]
enum EntryKind {
    Dir,
    TextFile,
}

/// Directory listing filtered by kind and sorted by file name. Hidden
/// entries such as the crawler's `.state` directory are skipped.
fn sorted_entries(dir: &Path, kind: EntryKind) -> io::Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        let keep = match kind {
            EntryKind::Dir => path.is_dir(),
            EntryKind::TextFile => path.is_file() && path.extension().is_some_and(|ext| ext == "txt"),
        };
        if keep {
            entries.push(path);
        }
    }
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(entries)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Operator summary for a finished merge.
pub fn generate_merge_report(summary: &MergeSummary) -> String {
    let mut report = String::new();
    report.push_str(&format!("{}\n", "=".repeat(60)));
    report.push_str("PROCESSING COMPLETE!\n");
    report.push_str(&format!("{}\n", "=".repeat(60)));
    report.push_str(&format!("Main categories: {}\n", summary.categories));
    report.push_str(&format!("Corpus files written: {}\n", summary.corpora_written));
    report.push_str(&format!("Entries merged: {}\n", summary.entries_merged));
    report.push_str(&format!("Files discarded: {}\n", summary.files_discarded));
    if summary.write_failures > 0 {
        report.push_str(&format!("Write failures: {}\n", summary.write_failures));
    }
    report.push_str(&format!("{}\n", "=".repeat(60)));
    for output in &summary.outputs {
        report.push_str(&format!("  {}\n", output.display()));
    }
    report
}
