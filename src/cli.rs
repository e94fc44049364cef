//! Command-line interface definition for wordlist-transform
//!
//! Provides argument parsing and validation for the transformation pipeline.

use crate::mask::MaskClasses;
use crate::transform::{IndexRange, TransformContext, MODES};
use clap::Parser;
use std::path::PathBuf;

/// Password-analysis wordlist transformer
///
/// Reads candidate lines into a frequency map, runs them through masks,
/// rules, codecs and filters, and prints the result by descending frequency.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "wordlist-transform",
    version,
    about = "Wordlist transformation pipeline for password analysis",
    long_about = r#"
Read wordlists into a frequency map and transform them into masks, rules,
encoded variants and recombined candidates. Output is one key per line,
highest frequency first.

EXAMPLES:
    # Masks for every password in a list
    wordlist-transform -i leaked.txt -t mask

    # Append rules, keeping the 100 most common
    wordlist-transform -i leaked.txt -t append -n 100

    # Insert rules for positions 0 through 3
    wordlist-transform -i leaked.txt -t insert --index 0-3

    # Only digits and specials become tokens
    wordlist-transform -i leaked.txt -t mask -m ds -v

    # Fill masks from a donor wordlist
    wordlist-transform -i masks.txt -t fuzzy-swap -d words.txt

    # Run a JSON template of steps
    wordlist-transform -i leaked.txt --template steps.json

    # Read from stdin
    cat leaked.txt | wordlist-transform -t encode

MASK CLASSES:
    l  lowercase  ?l (26)
    u  uppercase  ?u (26)
    d  digits     ?d (10)
    s  specials   ?s (33)
    b  multibyte  ?b (256, one token per byte)
"#
)]
pub struct Args {
    /// Input files or directories (stdin when omitted)
    #[arg(short, long, value_name = "PATH", num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Process directories recursively
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// File extensions to read from directories (default: txt)
    #[arg(long, value_name = "EXT", default_value = "txt")]
    pub extensions: String,

    /// Transformation mode to apply, in order (repeatable)
    #[arg(short = 't', long = "transformation", value_name = "MODE")]
    pub transformations: Vec<String>,

    /// JSON template of transformation steps, run after --transformation
    #[arg(long, value_name = "FILE")]
    pub template: Option<PathBuf>,

    /// Character classes to mask: any of l, u, d, s, b
    #[arg(short, long, value_name = "CLASSES", default_value = "luds")]
    pub mask: String,

    /// Position range for insert, overwrite, toggle and substring (N or START-END)
    #[arg(long, value_name = "RANGE", default_value = "0-0")]
    pub index: String,

    /// Word-count range for ngram and passphrase (N or START-END)
    #[arg(long, value_name = "RANGE", default_value = "1-3")]
    pub words: String,

    /// Separator for split mode
    #[arg(long, value_name = "SEP", default_value = " ")]
    pub separator: String,

    /// Donor wordlist for retain-mask, match-mask, fuzzy-swap and replace modes
    #[arg(short, long, value_name = "FILE")]
    pub donor: Vec<PathBuf>,

    /// Keep only keys listed in these files
    #[arg(long, value_name = "FILE")]
    pub retain: Vec<PathBuf>,

    /// Drop keys listed in these files
    #[arg(long, value_name = "FILE")]
    pub remove: Vec<PathBuf>,

    /// Drop keys seen fewer than this many times
    #[arg(short = 'f', long, value_name = "COUNT", default_value_t = 0)]
    pub min_frequency: u64,

    /// Keep keys whose length is in range (N or START-END)
    #[arg(short, long, value_name = "RANGE")]
    pub length: Option<String>,

    /// Keep keys matching a regex pattern
    #[arg(short, long, value_name = "PATTERN")]
    pub pattern: Option<String>,

    /// Keep masks whose keyspace is at most this value
    #[arg(long, value_name = "N")]
    pub max_keyspace: Option<u64>,

    /// Keep masks using at least this many distinct classes
    #[arg(long, value_name = "N")]
    pub min_complexity: Option<u8>,

    /// Keep only the N most frequent keys
    #[arg(short = 'n', long = "top", value_name = "N")]
    pub top: Option<usize>,

    /// Drop rule programs this long or longer
    #[arg(long, value_name = "LEN", default_value_t = 93)]
    pub max_rule_length: usize,

    /// Prefix each output line with its count
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Wrap keys containing control characters as $HEX[...]
    #[arg(long, default_value_t = false)]
    pub hex_output: bool,

    /// Log per-stage details and sample keys
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Quiet mode - no status output
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Show a summary after processing
    #[arg(long, default_value_t = false)]
    pub stats: bool,

    /// Output buffer size (default: 8MB)
    #[arg(long, value_name = "SIZE", default_value = "8MB")]
    pub buffer_size: String,
}

impl Args {
    /// Build the run context from the mask, index and word arguments
    pub fn transform_context(&self) -> anyhow::Result<TransformContext> {
        Ok(TransformContext {
            debug: self.debug,
            classes: MaskClasses::from_letters(&self.mask)?,
            index_range: IndexRange::parse(&self.index)?,
            word_range: IndexRange::parse(&self.words)?,
            separator: self.separator.clone(),
            max_rule_length: self.max_rule_length,
        })
    }

    /// Parse the length filter range
    pub fn parse_length(&self) -> anyhow::Result<Option<IndexRange>> {
        self.length
            .as_deref()
            .map(IndexRange::parse)
            .transpose()
            .map_err(Into::into)
    }

    /// Parse buffer size string to bytes
    pub fn parse_buffer_size(&self) -> anyhow::Result<usize> {
        parse_size(&self.buffer_size)
    }

    /// Parse file extensions to process
    pub fn get_extensions(&self) -> Vec<String> {
        self.extensions
            .split(',')
            .map(|s| s.trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Transformation modes not in the known list
    pub fn unknown_modes(&self) -> Vec<&str> {
        self.transformations
            .iter()
            .map(String::as_str)
            .filter(|mode| !MODES.contains(mode))
            .collect()
    }
}

/// Parse human-readable size string to bytes
fn parse_size(size_str: &str) -> anyhow::Result<usize> {
    let size_str = size_str.trim().to_uppercase();

    let (num_str, multiplier) = if let Some(num) = size_str.strip_suffix("GB") {
        (num, 1024 * 1024 * 1024)
    } else if let Some(num) = size_str.strip_suffix("MB") {
        (num, 1024 * 1024)
    } else if let Some(num) = size_str.strip_suffix("KB") {
        (num, 1024)
    } else if let Some(num) = size_str.strip_suffix('B') {
        (num, 1)
    } else {
        (size_str.as_str(), 1)
    };

    let num: usize = num_str
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid size format: '{}'", size_str))?;

    Ok(num * multiplier)
}
