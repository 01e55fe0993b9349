pub mod config;
pub mod errors;
pub mod filters;
pub mod metrics;
pub mod pattern;
pub mod results;
pub mod search;

pub use config::{EncodingMode, SearchConfig};
pub use errors::{SearchError, SearchResult};
pub use pattern::{rgrep_matches, Pattern, PatternError, Token};
pub use results::{FileResult, Match, SearchResult as SearchOutput};
