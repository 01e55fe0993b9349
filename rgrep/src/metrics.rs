use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::search::processor::{LARGE_FILE_THRESHOLD, SMALL_FILE_THRESHOLD};

/// Tracks search throughput and resource metrics.
///
/// Cloning is cheap and shares the underlying counters, so one instance can
/// be handed to every worker thread. All updates use relaxed atomics; the
/// counters are statistics, not synchronization.
#[derive(Debug, Clone)]
pub struct SearchMetrics {
    // Pattern compilation cache
    pattern_cache_hits: Arc<AtomicU64>,
    pattern_cache_misses: Arc<AtomicU64>,

    // Scan volume
    lines_scanned: Arc<AtomicU64>,
    matches_found: Arc<AtomicU64>,
    mmap_bytes: Arc<AtomicU64>,

    // File processing strategy counts
    small_files_processed: Arc<AtomicU64>,
    buffered_files_processed: Arc<AtomicU64>,
    mmap_files_processed: Arc<AtomicU64>,
}

impl SearchMetrics {
    /// Creates a new SearchMetrics instance with all counters at zero.
    pub fn new() -> Self {
        Self {
            pattern_cache_hits: Arc::new(AtomicU64::new(0)),
            pattern_cache_misses: Arc::new(AtomicU64::new(0)),
            lines_scanned: Arc::new(AtomicU64::new(0)),
            matches_found: Arc::new(AtomicU64::new(0)),
            mmap_bytes: Arc::new(AtomicU64::new(0)),
            small_files_processed: Arc::new(AtomicU64::new(0)),
            buffered_files_processed: Arc::new(AtomicU64::new(0)),
            mmap_files_processed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records one compiled-pattern cache lookup.
    pub fn record_pattern_cache(&self, hit: bool) {
        if hit {
            self.pattern_cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.pattern_cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records lines scanned in one file.
    pub fn record_lines_scanned(&self, lines: u64) {
        self.lines_scanned.fetch_add(lines, Ordering::Relaxed);
    }

    /// Records matches found in one file.
    pub fn record_matches(&self, matches: u64) {
        self.matches_found.fetch_add(matches, Ordering::Relaxed);
    }

    /// Records a memory-mapped file.
    pub fn record_mmap(&self, bytes: u64) {
        let total = self.mmap_bytes.fetch_add(bytes, Ordering::Relaxed) + bytes;
        debug!(
            "Memory mapped: {} bytes, total mapped: {} bytes",
            bytes, total
        );
    }

    /// Records unmapping of a file.
    pub fn record_munmap(&self, bytes: u64) {
        let total = self.mmap_bytes.fetch_sub(bytes, Ordering::Relaxed) - bytes;
        debug!(
            "Memory unmapped: {} bytes, total mapped: {} bytes",
            bytes, total
        );
    }

    /// Records which processing strategy a file of `size` bytes went through.
    pub fn record_file_processing(&self, size: u64) {
        if size < SMALL_FILE_THRESHOLD {
            self.small_files_processed.fetch_add(1, Ordering::Relaxed);
        } else if size >= LARGE_FILE_THRESHOLD {
            self.mmap_files_processed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.buffered_files_processed
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Gets a snapshot of the current counters.
    pub fn get_stats(&self) -> SearchStats {
        SearchStats {
            pattern_cache_hits: self.pattern_cache_hits.load(Ordering::Relaxed),
            pattern_cache_misses: self.pattern_cache_misses.load(Ordering::Relaxed),
            lines_scanned: self.lines_scanned.load(Ordering::Relaxed),
            matches_found: self.matches_found.load(Ordering::Relaxed),
            mmap_bytes: self.mmap_bytes.load(Ordering::Relaxed),
            small_files: self.small_files_processed.load(Ordering::Relaxed),
            buffered_files: self.buffered_files_processed.load(Ordering::Relaxed),
            mmap_files: self.mmap_files_processed.load(Ordering::Relaxed),
        }
    }

    /// Logs the current counters at info level.
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Search stats:\n\
             Lines scanned: {}\n\
             Matches found: {}\n\
             Pattern cache hits/misses: {}/{}\n\
             Memory mapped: {} bytes\n\
             Files processed (small/buffered/mmap): {}/{}/{}",
            stats.lines_scanned,
            stats.matches_found,
            stats.pattern_cache_hits,
            stats.pattern_cache_misses,
            stats.mmap_bytes,
            stats.small_files,
            stats.buffered_files,
            stats.mmap_files
        );
    }
}

impl Default for SearchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of [`SearchMetrics`].
#[derive(Debug, Clone, Copy)]
pub struct SearchStats {
    pub pattern_cache_hits: u64,
    pub pattern_cache_misses: u64,
    pub lines_scanned: u64,
    pub matches_found: u64,
    pub mmap_bytes: u64,
    pub small_files: u64,
    pub buffered_files: u64,
    pub mmap_files: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_cache_counts() {
        let metrics = SearchMetrics::new();

        metrics.record_pattern_cache(false);
        metrics.record_pattern_cache(true);
        metrics.record_pattern_cache(true);

        let stats = metrics.get_stats();
        assert_eq!(stats.pattern_cache_hits, 2);
        assert_eq!(stats.pattern_cache_misses, 1);
    }

    #[test]
    fn test_scan_volume_counts() {
        let metrics = SearchMetrics::new();

        metrics.record_lines_scanned(100);
        metrics.record_lines_scanned(50);
        metrics.record_matches(3);

        let stats = metrics.get_stats();
        assert_eq!(stats.lines_scanned, 150);
        assert_eq!(stats.matches_found, 3);
    }

    #[test]
    fn test_mmap_tracking() {
        let metrics = SearchMetrics::new();

        metrics.record_mmap(5000);
        metrics.record_mmap(3000);
        let stats = metrics.get_stats();
        assert_eq!(stats.mmap_bytes, 8000);

        metrics.record_munmap(3000);
        let stats = metrics.get_stats();
        assert_eq!(stats.mmap_bytes, 5000);
    }

    #[test]
    fn test_file_processing_tracking() {
        let metrics = SearchMetrics::new();

        metrics.record_file_processing(1000); // Small file
        metrics.record_file_processing(100000); // Buffered file
        metrics.record_file_processing(20_000_000); // Memory mapped file

        let stats = metrics.get_stats();
        assert_eq!(stats.small_files, 1);
        assert_eq!(stats.buffered_files, 1);
        assert_eq!(stats.mmap_files, 1);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = SearchMetrics::new();
        let worker = metrics.clone();

        worker.record_lines_scanned(10);
        worker.record_matches(1);

        let stats = metrics.get_stats();
        assert_eq!(stats.lines_scanned, 10);
        assert_eq!(stats.matches_found, 1);
    }
}
