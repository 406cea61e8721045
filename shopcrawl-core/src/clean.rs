// Text normalization for record files and merged corpora

/// Cleaned content shorter than this (in characters) is discarded.
pub const MIN_CONTENT_CHARS: usize = 20;

/// Prefix of the metadata line at the top of every record file.
pub const URL_PREFIX: &str = "URL:";

/// Normalize free text.
///
/// Trailing whitespace is stripped from every line, runs of three or more
/// newlines become exactly two, the whole text is trimmed and a single
/// trailing blank line is appended. Idempotent.
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    let mut newlines = 0;

    for (idx, line) in text.lines().enumerate() {
        if idx > 0 {
            newlines += 1;
            if newlines <= 2 {
                out.push('\n');
            }
        }
        let line = line.trim_end();
        if !line.is_empty() {
            newlines = 0;
            out.push_str(line);
        }
    }

    let mut cleaned = out.trim().to_string();
    cleaned.push_str("\n\n");
    cleaned
}

/// Clean the content of one record file for merging.
///
/// Drops the leading `URL:` line, a leading `=` rule and a duplicated first
/// line before applying [`clean_text`]. Returns `None` when fewer than
/// `min_chars` characters of content remain.
pub fn extract_clean_content(raw: &str, min_chars: usize) -> Option<String> {
    let mut lines: Vec<&str> = raw.lines().collect();

    if lines.first().is_some_and(|l| l.starts_with(URL_PREFIX)) {
        lines.remove(0);
    }
    if lines.first().is_some_and(|l| l.trim().starts_with('=')) {
        lines.remove(0);
    }
    if lines.len() >= 2 && lines[0] == lines[1] {
        lines.remove(0);
    }

    let cleaned = clean_text(&lines.join("\n"));
    if cleaned.trim().chars().count() < min_chars {
        return None;
    }
    Some(cleaned)
}

/// The `URL:` line of a record file, if it has one.
pub fn source_url_line(raw: &str) -> Option<&str> {
    raw.lines()
        .next()
        .filter(|line| line.starts_with(URL_PREFIX))
        .map(str::trim_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_whitespace_is_stripped() {
        assert_eq!(clean_text("a  \t\nb "), "a\nb\n\n");
    }

    #[test]
    fn test_whitespace_only_lines_count_as_blank() {
        assert_eq!(clean_text("a\n  \n \t \n\t\nb"), "a\n\nb\n\n");
    }

    #[test]
    fn test_single_blank_line_is_kept() {
        assert_eq!(clean_text("a\n\nb"), "a\n\nb\n\n");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(clean_text(""), "\n\n");
        assert_eq!(clean_text("\n\n\n"), "\n\n");
    }

    #[test]
    fn test_crlf_input() {
        assert_eq!(clean_text("a\r\n\r\n\r\n\r\nb\r\n"), "a\n\nb\n\n");
    }

    #[test]
    fn test_source_url_line() {
        assert_eq!(
            source_url_line("URL: https://shop.example/p  \nTitle"),
            Some("URL: https://shop.example/p")
        );
        assert_eq!(source_url_line("Title"), None);
    }
}
