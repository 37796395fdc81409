use anyhow::Result;
use clap::Parser;
use scry::summarize::AnalyzeOptions;
use scry::{ScryConfig, run, tree_stats, tree_to_string};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Distill a repository's public surface into a structured summary",
    long_about = None
)]
struct Args {
    /// Directory to analyze
    path: Option<PathBuf>,

    /// Output file path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Baseline revision for the changed-files diff (e.g. "main", "HEAD~1")
    #[arg(long)]
    baseline: Option<String>,

    /// Restrict analysis to these files (incremental mode; repeatable)
    #[arg(long)]
    only: Vec<PathBuf>,

    /// Add ignore pattern (glob)
    #[arg(long)]
    ignore: Vec<String>,

    /// Add include pattern (glob) - only include matching files
    #[arg(long)]
    include: Vec<String>,

    /// Skip version-control history collection
    #[arg(long)]
    no_history: bool,

    /// Print the file tree and its stats to stdout
    #[arg(long)]
    tree: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load from file or default
    let mut config = ScryConfig::load_from_file().unwrap_or_default();

    // 2. Override with CLI args
    if let Some(p) = args.path {
        config.path = p;
    }
    if let Some(o) = args.output {
        config.output = o;
    }
    if !args.ignore.is_empty() {
        // CLI ignores ADD to config ignores
        config.ignore_patterns.extend(args.ignore);
    }
    if !args.include.is_empty() {
        config.include_patterns = args.include;
    }
    if args.no_history {
        config.no_history = true;
    }
    if args.verbose {
        config.verbose = true;
    }

    config.validate()?;

    let options = AnalyzeOptions {
        only_files: if args.only.is_empty() {
            None
        } else {
            Some(args.only)
        },
        baseline_revision: args.baseline,
    };

    let summary = run(config.clone(), options)?;

    if args.tree
        && let Some(tree) = &summary.file_tree
    {
        print!("{}", tree_to_string(tree));
        let stats = tree_stats(tree);
        println!(
            "\n{} directories, {} files ({} modules parsed)",
            stats.directories,
            stats.files,
            summary.modules.len()
        );
    }

    if config.verbose {
        println!("Summary written to {:?}", config.output);
    }

    Ok(())
}
