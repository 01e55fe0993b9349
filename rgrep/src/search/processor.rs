use memmap2::Mmap;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{trace, warn};

use super::matcher::PatternMatcher;
use crate::config::EncodingMode;
use crate::errors::{SearchError, SearchResult};
use crate::metrics::SearchMetrics;
use crate::results::{FileResult, Match};

// File processing tiers. Small files are read whole, large files are
// memory-mapped, everything in between goes through a buffered reader.
const BUFFER_CAPACITY: usize = 65536;
pub(crate) const SMALL_FILE_THRESHOLD: u64 = 32 * 1024; // 32KB
pub(crate) const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB

/// Decodes raw file bytes into a String according to the encoding mode.
fn decode_bytes(bytes: &[u8], path: &Path, encoding_mode: EncodingMode) -> SearchResult<String> {
    match encoding_mode {
        EncodingMode::FailFast => match std::str::from_utf8(bytes) {
            Ok(valid) => Ok(valid.to_owned()),
            // Invalid: re-run the check on an owned copy, which yields the
            // FromUtf8Error our error type carries. Only the failure path
            // pays for the extra copy.
            Err(_) => match String::from_utf8(bytes.to_vec()) {
                Ok(_) => unreachable!("bytes were already found invalid"),
                Err(e) => Err(SearchError::encoding_error(path, e)),
            },
        },
        EncodingMode::Lossy => {
            let decoded = String::from_utf8_lossy(bytes);
            if let Cow::Owned(_) = decoded {
                warn!("Invalid UTF-8 replaced in file: {}", path.display());
            }
            Ok(decoded.into_owned())
        }
    }
}

fn map_io_error(path: &Path, e: std::io::Error) -> SearchError {
    match e.kind() {
        std::io::ErrorKind::NotFound => SearchError::file_not_found(path),
        std::io::ErrorKind::PermissionDenied => SearchError::permission_denied(path),
        _ => SearchError::IoError(e),
    }
}

fn open_file(path: &Path) -> SearchResult<File> {
    File::open(path).map_err(|e| map_io_error(path, e))
}

/// Runs the matcher over single files, choosing a read strategy by size.
#[derive(Debug)]
pub struct FileProcessor {
    matcher: PatternMatcher,
    metrics: SearchMetrics,
    context_before: usize,
    context_after: usize,
    encoding_mode: EncodingMode,
}

impl FileProcessor {
    /// Creates a new FileProcessor wrapping the given matcher. The matcher's
    /// metrics instance is shared, so cache and file counters land in one
    /// place.
    pub fn new(
        matcher: PatternMatcher,
        context_before: usize,
        context_after: usize,
        encoding_mode: EncodingMode,
    ) -> Self {
        let metrics = matcher.metrics().clone();
        Self {
            matcher,
            metrics,
            context_before,
            context_after,
            encoding_mode,
        }
    }

    /// Gets the metrics shared with the matcher.
    pub fn metrics(&self) -> &SearchMetrics {
        &self.metrics
    }

    /// Matches every line of the decoded contents and attaches context.
    ///
    /// Matching is strictly per line: a pattern never sees the newline
    /// bytes, so no match can span lines. Offsets in each [`Match`] are
    /// relative to its own line.
    fn collect_matches(&self, path: &Path, contents: &str) -> FileResult {
        let lines: Vec<&str> = contents.lines().collect();
        let mut matches = Vec::new();

        for (line_index, line) in lines.iter().enumerate() {
            for (start, end) in self.matcher.find_matches(line) {
                let line_number = line_index + 1;

                let context_before: Vec<(usize, String)> = (0..self.context_before)
                    .filter_map(|i| {
                        if line_index > i {
                            Some((line_number - i - 1, lines[line_index - i - 1].to_string()))
                        } else {
                            None
                        }
                    })
                    .rev()
                    .collect();

                let context_after: Vec<(usize, String)> = (1..=self.context_after)
                    .filter_map(|i| {
                        lines
                            .get(line_index + i)
                            .map(|context| (line_number + i, context.to_string()))
                    })
                    .collect();

                matches.push(Match {
                    line_number,
                    line_content: line.to_string(),
                    start,
                    end,
                    context_before,
                    context_after,
                });
            }
        }

        self.metrics.record_lines_scanned(lines.len() as u64);
        self.metrics.record_matches(matches.len() as u64);

        FileResult {
            path: path.to_path_buf(),
            matches,
        }
    }

    /// Process a small file by reading it whole.
    fn process_small_file(&self, path: &Path) -> SearchResult<FileResult> {
        trace!("Using whole-file read for: {}", path.display());

        let bytes = std::fs::read(path).map_err(|e| map_io_error(path, e))?;
        let contents = decode_bytes(&bytes, path, self.encoding_mode)?;
        Ok(self.collect_matches(path, &contents))
    }

    /// Process a file through a buffered reader.
    fn process_file_buffered(&self, path: &Path) -> SearchResult<FileResult> {
        trace!("Using buffered read for: {}", path.display());

        let file = open_file(path)?;
        let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(SearchError::IoError)?;

        let contents = decode_bytes(&bytes, path, self.encoding_mode)?;
        Ok(self.collect_matches(path, &contents))
    }

    /// Process a file through a memory mapping.
    fn process_mmap_file(&self, path: &Path) -> SearchResult<FileResult> {
        trace!("Using memory map for: {}", path.display());

        let file = open_file(path)?;
        let mmap = unsafe { Mmap::map(&file) }.map_err(SearchError::IoError)?;
        self.metrics.record_mmap(mmap.len() as u64);

        // Keep the map accounting balanced even when decoding fails.
        let decoded = decode_bytes(&mmap, path, self.encoding_mode);
        self.metrics.record_munmap(mmap.len() as u64);
        let contents = decoded?;

        Ok(self.collect_matches(path, &contents))
    }

    /// Processes a file and returns any matches found.
    pub fn process_file(&self, path: &Path) -> SearchResult<FileResult> {
        trace!("Processing file: {}", path.display());

        match path.metadata() {
            Ok(metadata) => {
                let size = metadata.len();
                self.metrics.record_file_processing(size);

                if size < SMALL_FILE_THRESHOLD {
                    self.process_small_file(path)
                } else if size >= LARGE_FILE_THRESHOLD {
                    self.process_mmap_file(path)
                } else {
                    self.process_file_buffered(path)
                }
            }
            Err(e) => {
                warn!("Failed to get metadata for {}: {}", path.display(), e);
                self.process_file_buffered(path)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn processor_for(patterns: &[&str]) -> FileProcessor {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        let matcher = PatternMatcher::new(&patterns).unwrap();
        FileProcessor::new(matcher, 0, 0, EncodingMode::FailFast)
    }

    #[test]
    fn test_small_file_with_dialect_pattern() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("small.txt");
        std::fs::write(&file_path, "a value_123 here\nno hits\nvalue_456 trailing\n").unwrap();

        let processor = processor_for(&["value_..."]);
        let result = processor.process_file(&file_path).unwrap();

        assert_eq!(result.matches.len(), 2);
        assert_eq!(result.matches[0].line_number, 1);
        assert_eq!(result.matches[1].line_number, 3);
        for m in &result.matches {
            let text = &m.line_content[m.start..m.end];
            assert!(text.starts_with("value_"));
            assert!(text[6..].parse::<i32>().is_ok());
        }

        let stats = processor.metrics().get_stats();
        assert_eq!(stats.small_files, 1);
        assert_eq!(stats.lines_scanned, 3);
        assert_eq!(stats.matches_found, 2);
    }

    #[test]
    fn test_buffered_file_processing() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("buffered.txt");
        let mut file = File::create(&file_path).unwrap();

        // Enough to clear the small-file threshold, with varying line
        // lengths so offsets differ from line to line.
        let mut content = String::new();
        for i in 0..2000 {
            content.push_str(&format!("Line {i} with pattern_split"));
            if i % 3 == 0 {
                content.push_str(" extra text to vary line length");
            }
            content.push('\n');
        }
        file.write_all(content.as_bytes()).unwrap();

        let processor = processor_for(&["pattern_split"]);
        let result = processor.process_file(&file_path).unwrap();

        assert_eq!(result.matches.len(), 2000);
        let mut prev_line = 0;
        for m in &result.matches {
            assert!(
                m.line_number > prev_line,
                "line numbers should be strictly increasing"
            );
            assert_eq!(&m.line_content[m.start..m.end], "pattern_split");
            prev_line = m.line_number;
        }

        assert_eq!(processor.metrics().get_stats().buffered_files, 1);
    }

    #[test]
    fn test_matches_never_cross_lines() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("lines.txt");
        // "a.b" would match "a\nb" if the newline were visible to the
        // wildcard; per-line matching must prevent that.
        std::fs::write(&file_path, "xa\nby\n").unwrap();

        let processor = processor_for(&["a.b"]);
        let result = processor.process_file(&file_path).unwrap();
        assert!(result.matches.is_empty());
    }

    #[test]
    fn test_context_lines_captured() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("context.txt");
        std::fs::write(&file_path, "one\ntwo\nneedle three\nfour\nfive\n").unwrap();

        let matcher = PatternMatcher::new(&["needle".to_string()]).unwrap();
        let processor = FileProcessor::new(matcher, 2, 1, EncodingMode::FailFast);
        let result = processor.process_file(&file_path).unwrap();

        assert_eq!(result.matches.len(), 1);
        let m = &result.matches[0];
        assert_eq!(m.line_number, 3);
        assert_eq!(
            m.context_before,
            vec![(1, "one".to_string()), (2, "two".to_string())]
        );
        assert_eq!(m.context_after, vec![(4, "four".to_string())]);
    }

    #[test]
    fn test_context_clipped_at_file_edges() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("edges.txt");
        std::fs::write(&file_path, "needle\nmiddle\nneedle\n").unwrap();

        let matcher = PatternMatcher::new(&["needle".to_string()]).unwrap();
        let processor = FileProcessor::new(matcher, 2, 2, EncodingMode::FailFast);
        let result = processor.process_file(&file_path).unwrap();

        assert_eq!(result.matches.len(), 2);
        assert!(result.matches[0].context_before.is_empty());
        assert_eq!(result.matches[0].context_after.len(), 2);
        assert_eq!(result.matches[1].context_before.len(), 2);
        assert!(result.matches[1].context_after.is_empty());
    }

    #[test]
    fn test_invalid_utf8_fail_fast() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("latin1.txt");
        std::fs::write(&file_path, b"caf\xE9 needle\n").unwrap();

        let processor = processor_for(&["needle"]);
        let result = processor.process_file(&file_path);
        assert!(matches!(result, Err(SearchError::EncodingError { .. })));
    }

    #[test]
    fn test_invalid_utf8_lossy() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("latin1.txt");
        std::fs::write(&file_path, b"caf\xE9 needle\n").unwrap();

        let matcher = PatternMatcher::new(&["needle".to_string()]).unwrap();
        let processor = FileProcessor::new(matcher, 0, 0, EncodingMode::Lossy);
        let result = processor.process_file(&file_path).unwrap();

        assert_eq!(result.matches.len(), 1);
        assert!(result.matches[0].line_content.contains('\u{FFFD}'));
    }

    #[test]
    fn test_missing_file_reports_not_found() {
        let dir = tempdir().unwrap();
        let processor = processor_for(&["anything"]);
        let result = processor.process_file(&dir.path().join("absent.txt"));
        assert!(matches!(result, Err(SearchError::FileNotFound(_))));
    }
}
