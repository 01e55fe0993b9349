//! Owned result types produced by a search.
//!
//! Worker threads build one [`FileResult`] per file and the engine folds
//! them into a single [`SearchResult`]. Aggregation is append-only, so the
//! per-file reduction can run in any order and still produce the same
//! totals.

use std::path::PathBuf;

/// A single match within a file.
#[derive(Debug, Clone)]
pub struct Match {
    /// The 1-based line number where the match was found.
    pub line_number: usize,
    /// The content of the line containing the match.
    pub line_content: String,
    /// The start byte offset of the match within the line.
    pub start: usize,
    /// The end byte offset (exclusive) of the match within the line.
    pub end: usize,
    /// Lines before the match for context.
    pub context_before: Vec<(usize, String)>,
    /// Lines after the match for context.
    pub context_after: Vec<(usize, String)>,
}

/// All matches found in a single file.
#[derive(Debug, Clone)]
pub struct FileResult {
    /// The path to the file.
    pub path: PathBuf,
    /// All matches found in the file, in line order.
    pub matches: Vec<Match>,
}

/// The complete, aggregated result of a search.
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    /// Results per file.
    pub file_results: Vec<FileResult>,
    /// Total number of matches found.
    pub total_matches: usize,
    /// Total number of files searched.
    pub files_searched: usize,
    /// Total number of files with at least one match.
    pub files_with_matches: usize,
}

impl SearchResult {
    /// Creates a new empty search result.
    pub fn new() -> Self {
        Default::default()
    }

    /// Folds one file's result into the totals.
    pub fn add_file_result(&mut self, file_result: FileResult) {
        self.files_searched += 1;
        if !file_result.matches.is_empty() {
            self.total_matches += file_result.matches.len();
            self.files_with_matches += 1;
        }
        self.file_results.push(file_result);
    }

    /// Merges another search result into this one.
    pub fn merge(&mut self, other: SearchResult) {
        self.total_matches += other.total_matches;
        self.files_searched += other.files_searched;
        self.files_with_matches += other.files_with_matches;
        self.file_results.extend(other.file_results);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn match_at(line_number: usize, content: &str, start: usize, end: usize) -> Match {
        Match {
            line_number,
            line_content: content.to_string(),
            start,
            end,
            context_before: vec![],
            context_after: vec![],
        }
    }

    fn file_result(path: &str, matches: Vec<Match>) -> FileResult {
        FileResult {
            path: PathBuf::from(path),
            matches,
        }
    }

    #[test]
    fn test_match_span_indexes_line_content() {
        let m = match_at(42, "Hello, world!", 7, 12);
        assert_eq!(&m.line_content[m.start..m.end], "world");
    }

    #[test]
    fn test_add_file_result_counts() {
        let mut result = SearchResult::new();

        result.add_file_result(file_result(
            "test1.txt",
            vec![match_at(1, "Hello", 0, 5), match_at(2, "Hello again", 0, 5)],
        ));
        assert_eq!(result.total_matches, 2);
        assert_eq!(result.files_searched, 1);
        assert_eq!(result.files_with_matches, 1);

        // A match-free file bumps only files_searched.
        result.add_file_result(file_result("test2.txt", vec![]));
        assert_eq!(result.total_matches, 2);
        assert_eq!(result.files_searched, 2);
        assert_eq!(result.files_with_matches, 1);
    }

    #[test]
    fn test_merge_accumulates_totals() {
        let mut left = SearchResult::new();
        left.add_file_result(file_result("a.txt", vec![match_at(1, "Hello", 0, 5)]));

        let mut right = SearchResult::new();
        right.add_file_result(file_result(
            "b.txt",
            vec![match_at(1, "World", 0, 5), match_at(2, "Hello", 0, 5)],
        ));
        right.add_file_result(file_result("c.txt", vec![]));

        left.merge(right);

        assert_eq!(left.total_matches, 3);
        assert_eq!(left.files_searched, 3);
        assert_eq!(left.files_with_matches, 2);
        assert_eq!(left.file_results.len(), 3);
        for path in ["a.txt", "b.txt", "c.txt"] {
            assert!(left.file_results.iter().any(|fr| fr.path == PathBuf::from(path)));
        }
    }

    #[test]
    fn test_merge_with_empty_is_identity() {
        let mut result = SearchResult::new();
        result.add_file_result(file_result("test.txt", vec![match_at(1, "Hello", 0, 5)]));

        result.merge(SearchResult::new());

        assert_eq!(result.total_matches, 1);
        assert_eq!(result.files_searched, 1);
        assert_eq!(result.files_with_matches, 1);
    }
}
