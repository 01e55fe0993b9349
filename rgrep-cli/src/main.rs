use clap::Parser;
use colored::Colorize;
use rgrep::{
    config::{EncodingMode, SearchConfig},
    results::SearchResult,
    search::search,
    Match, SearchError,
};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, SearchError>;

/// Concurrent line search with a small literal-friendly pattern dialect.
///
/// Patterns support `.` (any byte), `x?` (optional byte), `x+` (greedy
/// repetition) and `\` escapes; everything else matches literally.
#[derive(Parser)]
#[command(name = "rgrep", author, version, about, long_about = None)]
struct Cli {
    /// Pattern to search for (can be specified multiple times)
    #[arg(short = 'p', long = "pattern")]
    patterns: Vec<String>,

    /// Root directory to search in
    #[arg(short = 'd', long, default_value = ".")]
    root: PathBuf,

    /// File extensions to include (e.g. rs,go,js)
    #[arg(short = 'e', long)]
    extensions: Option<String>,

    /// Patterns to ignore (glob format)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Number of context lines before each match
    #[arg(short = 'B', long, default_value = "0")]
    context_before: usize,

    /// Number of context lines after each match
    #[arg(short = 'A', long, default_value = "0")]
    context_after: usize,

    /// Show only statistics, not matches
    #[arg(short, long)]
    stats: bool,

    /// Number of threads to use
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Path to a configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// How to handle invalid UTF-8 sequences (failfast|lossy)
    #[arg(long, default_value = "failfast")]
    encoding: String,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let file_extensions = cli.extensions.as_ref().map(|e| {
        e.split(',')
            .map(|s| s.trim().to_string())
            .collect::<Vec<_>>()
    });

    let encoding_mode = match cli.encoding.to_lowercase().as_str() {
        "lossy" => EncodingMode::Lossy,
        _ => EncodingMode::FailFast,
    };

    let cli_config = SearchConfig {
        patterns: cli.patterns,
        root_path: cli.root,
        file_extensions,
        ignore_patterns: cli.ignore,
        stats_only: cli.stats,
        thread_count: cli
            .threads
            .unwrap_or_else(|| NonZeroUsize::new(num_cpus::get()).unwrap()),
        log_level: cli.log_level,
        context_before: cli.context_before,
        context_after: cli.context_after,
        encoding_mode,
    };

    // Config files are optional unless one was named explicitly.
    if let Some(path) = &cli.config {
        if !path.exists() {
            return Err(SearchError::config_error(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }
    }

    let config = match SearchConfig::load_from(cli.config.as_deref()) {
        Ok(loaded) => loaded.merge_with_cli(cli_config),
        Err(e) => {
            if cli.config.is_some() {
                return Err(SearchError::config_error(format!(
                    "failed to load configuration: {e}"
                )));
            }
            cli_config
        }
    };

    if config.patterns.is_empty() {
        return Err(SearchError::config_error(
            "no search patterns provided; use -p/--pattern or a config file",
        ));
    }

    init_tracing(&config.log_level);
    debug!(
        "searching {} with {} pattern(s)",
        config.root_path.display(),
        config.patterns.len()
    );

    let result = search(&config)?;
    print_search_results(&result, config.stats_only);

    // grep convention: success only when something matched.
    if result.total_matches > 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

/// Logs go to stderr so match output on stdout stays pipeable. RUST_LOG
/// overrides the configured level when set.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_search_results(result: &SearchResult, stats_only: bool) {
    if stats_only {
        println!(
            "Found {} matches in {} files",
            result.total_matches, result.files_with_matches
        );
        return;
    }

    for file_result in &result.file_results {
        println!("\n{}", file_result.path.display().to_string().blue());
        for m in &file_result.matches {
            for (line_num, line) in &m.context_before {
                println!("{}: {}", line_num.to_string().green(), line);
            }
            println!(
                "{}: {}",
                m.line_number.to_string().green(),
                highlight_match(m)
            );
            for (line_num, line) in &m.context_after {
                println!("{}: {}", line_num.to_string().green(), line);
            }
        }
    }

    println!(
        "\nFound {} matches in {} files",
        result.total_matches, result.files_with_matches
    );
}

/// Renders a matched line with the matched span emphasized. Match offsets
/// are byte positions and the matcher can stop inside a multi-byte
/// character, in which case the line is printed unstyled.
fn highlight_match(m: &Match) -> String {
    let line = &m.line_content;
    if line.is_char_boundary(m.start) && line.is_char_boundary(m.end) {
        format!(
            "{}{}{}",
            &line[..m.start],
            line[m.start..m.end].red().bold(),
            &line[m.end..]
        )
    } else {
        line.clone()
    }
}
