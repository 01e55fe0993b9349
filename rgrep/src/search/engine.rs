use ignore::WalkBuilder;
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

use super::matcher::PatternMatcher;
use super::processor::FileProcessor;
use crate::config::SearchConfig;
use crate::errors::SearchResult;
use crate::filters::{should_ignore, should_include_file};
use crate::results::{FileResult, SearchResult as SearchOutput};

/// Performs a concurrent search across files under the configured root.
pub fn search(config: &SearchConfig) -> SearchResult<SearchOutput> {
    info!("Starting search with patterns: {:?}", config.patterns);

    // Empty pattern text matches at every byte offset of every line, which
    // is never what a search run means; drop such patterns here. The
    // pattern API itself still honors them.
    let patterns: Vec<String> = config
        .patterns
        .iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect();

    if patterns.is_empty() {
        debug!("No usable search patterns provided, returning empty result");
        return Ok(SearchOutput::new());
    }

    let matcher = PatternMatcher::new(&patterns)?;
    let processor = FileProcessor::new(
        matcher,
        config.context_before,
        config.context_after,
        config.encoding_mode,
    );
    let metrics = processor.metrics().clone();

    // Walk the tree honoring gitignore-style files; custom ignore patterns
    // are applied below through the filter functions.
    let mut walker = WalkBuilder::new(&config.root_path);
    walker
        .hidden(true)
        .ignore(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true);

    let files: Vec<PathBuf> = walker
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter(|entry| {
            let path = entry.path();
            !should_ignore(path, &config.ignore_patterns)
                && should_include_file(path, &config.file_extensions, &config.ignore_patterns)
        })
        .map(|entry| entry.into_path())
        .collect();

    debug!("Found {} files to process", files.len());

    // Chunk the file list so each rayon task amortizes its overhead across
    // several files.
    let thread_count = config.thread_count.get();
    let chunk_size = (files.len() / thread_count).clamp(16, 256);

    let file_results: Vec<FileResult> = files
        .par_chunks(chunk_size)
        .flat_map(|chunk| {
            chunk
                .iter()
                .filter_map(|path| match processor.process_file(path) {
                    Ok(result) => Some(result),
                    Err(e) => {
                        debug!("Skipping {}: {}", path.display(), e);
                        None
                    }
                })
                .filter(|result| !result.matches.is_empty())
                .collect::<Vec<_>>()
        })
        .collect();

    let mut result = SearchOutput::new();
    for file_result in file_results {
        result.add_file_result(file_result);
    }
    // Match-free files never reach add_file_result; report the real total.
    result.files_searched = files.len();

    metrics.log_stats();

    info!(
        "Search complete. Found {} matches in {} files",
        result.total_matches, result.files_with_matches
    );

    Ok(result)
}
