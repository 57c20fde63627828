use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

use clap::Parser;
use serde::Serialize;

use logsift::config::EngineConfig;
use logsift::facade::{LogSift, Mode};
use logsift::pattern::Pattern;
use logsift::tokenize::Tokenizer;

#[derive(Parser, Debug)]
#[command(name = "logsift", version, about = "Unsupervised log pattern extraction")]
struct Cli {
    /// Input files (`-` for stdin). May be repeated.
    #[arg(required = false)]
    input: Vec<String>,

    /// Clustering similarity threshold (0.0-1.0)
    #[arg(long, default_value_t = 0.5)] threshold: f64,
    /// Minimum messages for a cluster to emit a pattern
    #[arg(long = "min-cluster-size", default_value_t = 2)] min_cluster_size: usize,
    /// Upper bound on concurrently tracked clusters
    #[arg(long = "max-clusters")] max_clusters: Option<usize>,
    /// Tokenizer: delimiters | whitespace | regex | json
    #[arg(long, default_value = "delimiters")] tokenizer: String,
    /// Delimiter set for the delimiters tokenizer
    #[arg(long)] delimiters: Option<String>,
    /// Token pattern for the regex tokenizer
    #[arg(long = "token-pattern", default_value = r"\S+")] token_pattern: String,

    /// Replace timestamps with TIMESTAMP before clustering
    #[arg(long = "normalize-timestamps", default_value_t = false)] normalize_timestamps: bool,
    /// Replace IP addresses with IP_ADDR
    #[arg(long = "normalize-ips", default_value_t = false)] normalize_ips: bool,
    /// Replace large numbers and decimals with NUM
    #[arg(long = "normalize-numbers", default_value_t = false)] normalize_numbers: bool,
    /// Replace multi-segment paths with PATH
    #[arg(long = "normalize-paths", default_value_t = false)] normalize_paths: bool,
    /// Replace URLs with URL
    #[arg(long = "normalize-urls", default_value_t = false)] normalize_urls: bool,
    /// Lowercase input before clustering
    #[arg(long = "ignore-case", default_value_t = false)] ignore_case: bool,

    /// Drop patterns with support below this value
    #[arg(long = "min-support")] min_support: Option<usize>,
    /// Output format: json | text
    #[arg(long, default_value = "json")] format: String,
    /// Print processing statistics to stderr
    #[arg(long, default_value_t = false)] stats: bool,
}

#[derive(Serialize)]
struct PatternOut {
    id: String,
    short_id: String,
    signature: String,
    tokens: Vec<String>,
    support: usize,
    specificity: f64,
}

impl PatternOut {
    fn from_pattern(p: &Pattern) -> Self {
        PatternOut {
            id: p.id(),
            short_id: p.short_id(),
            signature: p.signature(),
            tokens: p.tokens().to_vec(),
            support: p.support_count(),
            specificity: p.specificity(),
        }
    }
}

fn read_all_lines(paths: &[String]) -> io::Result<Vec<String>> {
    let mut out = Vec::new();
    for p in paths {
        if p == "-" {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                out.push(line?);
            }
        } else {
            let f = File::open(p)?;
            for line in BufReader::new(f).lines() {
                out.push(line?);
            }
        }
    }
    Ok(out)
}

fn build_tokenizer(cli: &Cli) -> Result<Tokenizer, Box<dyn Error>> {
    match cli.tokenizer.as_str() {
        "whitespace" => Ok(Tokenizer::whitespace()),
        "delimiters" => Ok(match &cli.delimiters {
            Some(d) => Tokenizer::delimiter_preserving(d),
            None => Tokenizer::default(),
        }),
        "regex" => Ok(Tokenizer::pattern(&cli.token_pattern)?),
        "json" => Ok(Tokenizer::json()),
        other => Err(format!("unknown tokenizer: {other}").into()),
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let mut builder = EngineConfig::builder()
        .similarity_threshold(cli.threshold)
        .min_cluster_size(cli.min_cluster_size)
        .tokenizer(build_tokenizer(cli)?)
        .normalize_timestamps(cli.normalize_timestamps)
        .normalize_ips(cli.normalize_ips)
        .normalize_numbers(cli.normalize_numbers)
        .normalize_paths(cli.normalize_paths)
        .normalize_urls(cli.normalize_urls)
        .case_sensitive(!cli.ignore_case);
    if let Some(max) = cli.max_clusters {
        builder = builder.max_clusters(max);
    }
    let config = builder.build()?;

    let paths = if cli.input.is_empty() {
        vec!["-".to_string()]
    } else {
        cli.input.clone()
    };
    let lines = read_all_lines(&paths)?;

    let sift = LogSift::with_config(Mode::Batch, config);
    sift.add_logs(&lines);
    let mut patterns = sift.extract_patterns();
    if let Some(min) = cli.min_support {
        patterns.retain(|p| p.support_count() >= min);
    }

    match cli.format.as_str() {
        "text" => {
            for p in &patterns {
                println!(
                    "{:>8}  {:.2}  {:<16}  {}",
                    p.support_count(),
                    p.specificity(),
                    p.short_id(),
                    p.signature()
                );
            }
        }
        "json" => {
            let out: Vec<PatternOut> = patterns.iter().map(PatternOut::from_pattern).collect();
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        other => return Err(format!("unknown output format: {other}").into()),
    }

    if cli.stats {
        eprintln!("{}", sift.stats());
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("logsift: {e}");
        std::process::exit(1);
    }
}
