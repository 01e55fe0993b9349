use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::errors::{SearchError, SearchResult};
use crate::metrics::SearchMetrics;
use crate::pattern::Pattern;

const SIMPLE_PATTERN_THRESHOLD: usize = 32;

static PATTERN_CACHE: Lazy<DashMap<String, MatchStrategy>> = Lazy::new(DashMap::new);

/// Strategy for matching one pattern.
#[derive(Debug, Clone)]
pub enum MatchStrategy {
    /// Metacharacter-free pattern text, matched by plain substring search.
    Simple(String),
    /// Anything else runs through the compiled dialect pattern.
    Dialect(Arc<Pattern>),
}

/// Matches a set of patterns against lines of text.
///
/// Compiled strategies are shared process-wide through a concurrent cache,
/// so building a matcher for patterns seen before is nearly free.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    strategies: Vec<MatchStrategy>,
    metrics: SearchMetrics,
}

impl PatternMatcher {
    /// Creates a new PatternMatcher for the given patterns.
    pub fn new(patterns: &[String]) -> SearchResult<Self> {
        Self::with_metrics(patterns, SearchMetrics::new())
    }

    /// Creates a new PatternMatcher, recording cache lookups into `metrics`.
    ///
    /// Fails with [`SearchError::InvalidPattern`] if any pattern does not
    /// compile; nothing is cached for the failing pattern.
    pub fn with_metrics(patterns: &[String], metrics: SearchMetrics) -> SearchResult<Self> {
        let mut strategies = Vec::with_capacity(patterns.len());

        for pattern in patterns {
            let strategy = if let Some(entry) = PATTERN_CACHE.get(pattern) {
                metrics.record_pattern_cache(true);
                entry.clone()
            } else {
                let strategy = if Self::is_simple_pattern(pattern) {
                    MatchStrategy::Simple(pattern.clone())
                } else {
                    let compiled = Pattern::parse(pattern)
                        .map_err(|e| SearchError::invalid_pattern(pattern.clone(), e))?;
                    MatchStrategy::Dialect(Arc::new(compiled))
                };

                metrics.record_pattern_cache(false);
                PATTERN_CACHE.insert(pattern.clone(), strategy.clone());
                strategy
            };
            strategies.push(strategy);
        }

        Ok(Self {
            strategies,
            metrics,
        })
    }

    /// Gets the metrics this matcher records into.
    pub fn metrics(&self) -> &SearchMetrics {
        &self.metrics
    }

    /// Determines if a pattern can skip compilation and use plain substring
    /// search. Sound because pattern text without `\`, `.`, `?` or `+`
    /// compiles to literal tokens only, and matching a literal sequence is
    /// exactly substring search.
    fn is_simple_pattern(pattern: &str) -> bool {
        pattern.len() < SIMPLE_PATTERN_THRESHOLD
            && !pattern
                .bytes()
                .any(|b| matches!(b, b'\\' | b'.' | b'?' | b'+'))
    }

    /// Finds all matches in the given line, sorted by start offset.
    pub fn find_matches(&self, line: &str) -> Vec<(usize, usize)> {
        let mut matches = Vec::new();
        for strategy in &self.strategies {
            match strategy {
                MatchStrategy::Simple(pattern) => {
                    matches.extend(
                        line.match_indices(pattern.as_str())
                            .map(|(start, matched)| (start, start + matched.len())),
                    );
                }
                MatchStrategy::Dialect(pattern) => {
                    matches.extend(pattern.find_all(line));
                }
            }
        }
        matches.sort_unstable_by_key(|&(start, _)| start);
        matches
    }
}
