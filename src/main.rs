use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use internal_link::{Analyzer, Mode, Settings, SplicePolicy, TermCache};

mod report;

/// internal-link - Suggest and insert links between markdown documents
#[derive(Parser)]
#[command(name = "internal-link")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (TOML or YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Quiet mode - only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Print link suggestions without touching any file
    Suggest {
        #[command(flatten)]
        corpus: CorpusArgs,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Show the context and the phrase to link
        #[arg(short, long)]
        details: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Insert the suggested links into the source documents
    Apply {
        #[command(flatten)]
        corpus: CorpusArgs,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// What to do when a link cannot be inserted
        #[arg(long, value_enum)]
        on_error: Option<SplicePolicy>,

        /// Output the apply summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show corpus statistics
    Stats {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Number of top terms to show
        #[arg(long, default_value = "20")]
        top_terms: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove every cached term table
    ClearCache {
        /// Cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

#[derive(Args)]
struct CorpusArgs {
    /// Corpus root directory
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// File extensions to analyze (comma-separated)
    #[arg(short, long)]
    types: Option<String>,

    /// Patterns to exclude (can be repeated)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Shortest phrase, in words
    #[arg(long)]
    min_ngram: Option<usize>,

    /// Longest phrase, in words
    #[arg(long)]
    max_ngram: Option<usize>,

    /// Cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Tokenize every file, ignoring the cache
    #[arg(long)]
    no_cache: bool,
}

#[derive(Args)]
struct AnalysisArgs {
    /// Analyze every document as a link source (default)
    #[arg(long, conflicts_with = "file")]
    corpus: bool,

    /// Analyze a single source document
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Minimum score for a suggestion
    #[arg(short = 's', long)]
    min_score: Option<f64>,
}

impl AnalysisArgs {
    fn mode(&self) -> Mode {
        match &self.file {
            Some(file) if !self.corpus => Mode::SingleFile(file.clone()),
            _ => Mode::Corpus,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Suggest { corpus, analysis, details, json } => {
            cmd_suggest(config, &corpus, &analysis, details, json)
        }
        Commands::Apply { corpus, analysis, on_error, json } => {
            cmd_apply(config, &corpus, &analysis, on_error, json)
        }
        Commands::Stats { corpus, top_terms, json } => {
            cmd_stats(config, &corpus, top_terms, json)
        }
        Commands::ClearCache { cache_dir } => {
            cmd_clear_cache(config, cache_dir)
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Config file settings overridden by whatever was given on the command line.
fn load_settings(
    config: Option<&Path>,
    corpus: &CorpusArgs,
    analysis: Option<&AnalysisArgs>,
) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = Settings::load(config)?;

    if let Some(types) = &corpus.types {
        settings.extensions = types
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
    }
    settings.exclude.extend(corpus.exclude.iter().cloned());
    if let Some(min) = corpus.min_ngram {
        settings.min_ngram = min;
    }
    if let Some(max) = corpus.max_ngram {
        settings.max_ngram = max;
    }
    if let Some(dir) = &corpus.cache_dir {
        settings.cache_dir = Some(dir.clone());
    }
    if corpus.no_cache {
        settings.cache = false;
    }
    if let Some(score) = analysis.and_then(|a| a.min_score) {
        settings.min_score = score;
    }

    settings.validate()?;
    Ok(settings)
}

fn load_analyzer(settings: Settings, dir: &Path) -> Result<Analyzer, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut analyzer = Analyzer::new(dir, settings)?;
    let count = analyzer.load()?;
    tracing::debug!(documents = count, elapsed = ?start.elapsed(), "corpus indexed");
    Ok(analyzer)
}

fn cmd_suggest(
    config: Option<&Path>,
    corpus: &CorpusArgs,
    analysis: &AnalysisArgs,
    details: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = load_settings(config, corpus, Some(analysis))?;
    let analyzer = load_analyzer(settings, &corpus.dir)?;
    let suggestions = analyzer.analyze(&analysis.mode())?;

    if json {
        report::print_json(&suggestions)?;
    } else {
        report::print_suggestions(&suggestions, details);
    }
    Ok(())
}

fn cmd_apply(
    config: Option<&Path>,
    corpus: &CorpusArgs,
    analysis: &AnalysisArgs,
    on_error: Option<SplicePolicy>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = load_settings(config, corpus, Some(analysis))?;
    if let Some(policy) = on_error {
        settings.on_splice_error = policy;
    }

    let analyzer = load_analyzer(settings, &corpus.dir)?;
    let suggestions = analyzer.analyze(&analysis.mode())?;
    let applied = analyzer.apply(&suggestions)?;

    if json {
        report::print_json(&applied)?;
    } else {
        report::print_apply(&applied);
    }
    Ok(())
}

fn cmd_stats(
    config: Option<&Path>,
    corpus: &CorpusArgs,
    top_terms: usize,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = load_settings(config, corpus, None)?;
    let analyzer = load_analyzer(settings, &corpus.dir)?;
    let stats = analyzer.stats(top_terms);

    if json {
        report::print_json(&stats)?;
    } else {
        report::print_stats(&stats);
    }
    Ok(())
}

fn cmd_clear_cache(
    config: Option<&Path>,
    cache_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = Settings::load(config)?;
    if cache_dir.is_some() {
        settings.cache_dir = cache_dir;
    }
    settings.cache = true;

    let dir = settings
        .resolved_cache_dir()
        .ok_or("no cache directory configured and $HOME is not set")?;
    let cache = TermCache::open(&dir)?;
    cache.clear()?;
    println!("{} {}", "Cleared cache".green(), cache.dir().display().to_string().cyan());
    Ok(())
}
