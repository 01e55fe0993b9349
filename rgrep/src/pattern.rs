//! The pattern dialect at the heart of rgrep.
//!
//! Patterns are compiled once into a flat token sequence, then matched
//! against lines with two integer cursors; there is no automaton and no
//! backtracking. The grammar is deliberately tiny:
//!
//! | Pattern text | Meaning |
//! |---|---|
//! | any byte `c` | matches exactly `c` |
//! | `\c` | matches `c` literally, even if `c` is a metacharacter |
//! | `.` | matches any single byte |
//! | `c?` | matches zero or one occurrence of `c` |
//! | `c+` | after `c` has matched once, consumes the longest run of further `c`s |
//!
//! Operator resolution follows strict precedence while compiling: an escape
//! always wins (`\a?` is an escaped `a` followed by a literal `?`), a `.` is
//! always a wildcard (`.?` is a wildcard followed by a literal `?`), and a
//! `+` repeats whatever pattern byte sits immediately before it in the raw
//! text (`.+` consumes a run of literal `.` bytes, not arbitrary bytes).
//! Repetition is greedy with no backtracking: once a run is consumed it is
//! never given back, so `a+ab` cannot match `aaab`.
//!
//! Matching is byte-oriented. Lines are searched as raw bytes and match
//! spans are byte offsets; multi-byte UTF-8 sequences match per component
//! byte, and `.` consumes exactly one byte.

use std::fmt;
use thiserror::Error;

/// Errors produced while compiling pattern text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The pattern ends with a `\` that has nothing to escape. Such a
    /// pattern can never match; `rgrep_matches` fails closed instead of
    /// guessing at intent.
    #[error("pattern ends with a bare '\\' at byte {position}")]
    TrailingEscape { position: usize },
}

/// A single element of a compiled pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Matches exactly this byte.
    Literal(u8),
    /// Matches exactly this byte; written with a `\` escape in the source.
    Escaped(u8),
    /// Matches any single byte.
    Wildcard,
    /// Matches zero or one occurrence of this byte.
    Optional(u8),
    /// Consumes the longest run of this byte, possibly none at all. The
    /// first occurrence is matched by the preceding token; this one only
    /// covers the surplus.
    Repeated(u8),
}

/// A compiled search pattern.
///
/// Compilation happens once in [`Pattern::parse`]; matching walks the token
/// sequence with plain offsets into the borrowed line and allocates nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    tokens: Vec<Token>,
    text: String,
}

impl Pattern {
    /// Compiles pattern text into a token sequence.
    ///
    /// A leading `+` has no byte to repeat and compiles to a literal `+`.
    /// A trailing bare `\` is rejected with [`PatternError::TrailingEscape`].
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        let bytes = text.as_bytes();
        let mut tokens = Vec::with_capacity(bytes.len());
        let mut i = 0;

        // Arm order mirrors match-time precedence: escape, wildcard, the
        // one-byte '?' lookahead, then '+' against the raw preceding byte.
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => {
                    let Some(&escaped) = bytes.get(i + 1) else {
                        return Err(PatternError::TrailingEscape { position: i });
                    };
                    tokens.push(Token::Escaped(escaped));
                    i += 2;
                }
                b'.' => {
                    tokens.push(Token::Wildcard);
                    i += 1;
                }
                b if bytes.get(i + 1) == Some(&b'?') => {
                    tokens.push(Token::Optional(b));
                    i += 2;
                }
                b'+' if i > 0 => {
                    tokens.push(Token::Repeated(bytes[i - 1]));
                    i += 1;
                }
                b => {
                    tokens.push(Token::Literal(b));
                    i += 1;
                }
            }
        }

        Ok(Pattern {
            tokens,
            text: text.to_string(),
        })
    }

    /// The original pattern text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The compiled token sequence.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Reports whether the pattern matches anywhere in `line`.
    pub fn is_match(&self, line: &str) -> bool {
        self.find(line).is_some()
    }

    /// Finds the first match in `line`, returned as a half-open byte range.
    pub fn find(&self, line: &str) -> Option<(usize, usize)> {
        self.find_at(line, 0)
    }

    /// Finds the first match anchored at or after byte offset `start`.
    ///
    /// Anchors are tried one byte at a time up to and including the empty
    /// suffix, so the empty pattern matches at every position.
    pub fn find_at(&self, line: &str, start: usize) -> Option<(usize, usize)> {
        let bytes = line.as_bytes();
        (start..=bytes.len())
            .find_map(|anchor| matches_leading(&self.tokens, bytes, anchor).map(|end| (anchor, end)))
    }

    /// Collects every non-overlapping match, earliest first.
    pub fn find_all(&self, line: &str) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        let mut next = 0;
        while let Some((start, end)) = self.find_at(line, next) {
            spans.push((start, end));
            // Resume past the match; a zero-width match still advances.
            next = end.max(start + 1);
        }
        spans
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Reports whether `pattern` matches anywhere in `line`.
///
/// This is the one-shot entry point: the pattern is compiled and matched
/// unanchored in a single call. Malformed patterns never match.
pub fn rgrep_matches(line: &str, pattern: &str) -> bool {
    Pattern::parse(pattern).map_or(false, |p| p.is_match(line))
}

/// Anchored match: walks `tokens` against `line` starting at `pos` and
/// returns the offset one past the matched prefix.
///
/// The pattern must be consumed in full; the line need not be. Every token
/// except `Optional` requires at least one unread line byte, which is what
/// keeps a trailing `+` unsatisfiable at end of line while letting a run of
/// trailing optionals match the empty suffix.
fn matches_leading(tokens: &[Token], line: &[u8], mut pos: usize) -> Option<usize> {
    for token in tokens {
        match *token {
            Token::Optional(target) => {
                pos = optional_step(line, pos, target);
            }
            Token::Literal(target) | Token::Escaped(target) => {
                if line.get(pos) != Some(&target) {
                    return None;
                }
                pos += 1;
            }
            Token::Wildcard => {
                if pos >= line.len() {
                    return None;
                }
                pos += 1;
            }
            Token::Repeated(target) => {
                if pos >= line.len() {
                    return None;
                }
                pos = repeat_run_end(line, pos, target);
            }
        }
    }
    Some(pos)
}

/// Offset one past the longest run of `target` starting at `pos`. The run
/// may be empty, in which case `pos` comes back unchanged. Greedy: callers
/// never re-shorten the run.
fn repeat_run_end(line: &[u8], mut pos: usize, target: u8) -> usize {
    while line.get(pos) == Some(&target) {
        pos += 1;
    }
    pos
}

/// Advances past a single optional byte: `pos + 1` when the line byte at
/// `pos` equals `target`, otherwise `pos` unchanged. Never fails.
fn optional_step(line: &[u8], pos: usize, target: u8) -> usize {
    if line.get(pos) == Some(&target) {
        pos + 1
    } else {
        pos
    }
}
