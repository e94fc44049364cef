//! Core processing engine
//!
//! Reads every input into one frequency map, runs the configured
//! transformations and template steps over it, applies the filters and
//! writes the result.

use crate::cli::Args;
use crate::encoding::{read_file_into, read_stdin_into};
use crate::filter::{FilterConfig, PatternFilter};
use crate::multiset::Multiset;
use crate::output::{OutputFormat, OutputWriter};
use crate::progress::{create_spinner, print_header, print_info, print_success, print_warning, ProcessingStats};
use crate::template::{load_template, TemplateStep};
use crate::transform::{transform, IndexRange, TransformContext};

use bytesize::ByteSize;
use colored::*;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Processor configuration
pub struct ProcessorConfig {
    /// Input files or directories; stdin when empty
    pub inputs: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub recursive: bool,
    pub extensions: Vec<String>,
    pub transformations: Vec<String>,
    pub template: Vec<TemplateStep>,
    pub context: TransformContext,
    pub donor: Vec<PathBuf>,
    pub retain: Vec<PathBuf>,
    pub remove: Vec<PathBuf>,
    pub min_frequency: u64,
    pub length: Option<IndexRange>,
    pub pattern: Option<String>,
    pub max_keyspace: Option<u64>,
    pub min_complexity: Option<u8>,
    pub top: Option<usize>,
    pub format: OutputFormat,
    pub buffer_size: usize,
    pub quiet: bool,
    pub show_stats: bool,
}

impl ProcessorConfig {
    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        let template = match args.template {
            Some(ref path) => load_template(path)?,
            None => Vec::new(),
        };

        Ok(Self {
            inputs: args.input.clone(),
            output: args.output.clone(),
            recursive: args.recursive,
            extensions: args.get_extensions(),
            transformations: args.transformations.clone(),
            template,
            context: args.transform_context()?,
            donor: args.donor.clone(),
            retain: args.retain.clone(),
            remove: args.remove.clone(),
            min_frequency: args.min_frequency,
            length: args.parse_length()?,
            pattern: args.pattern.clone(),
            max_keyspace: args.max_keyspace,
            min_complexity: args.min_complexity,
            top: args.top,
            format: OutputFormat {
                verbose: args.verbose,
                hex_output: args.hex_output,
            },
            buffer_size: args.parse_buffer_size()?,
            quiet: args.quiet,
            show_stats: args.stats,
        })
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output: None,
            recursive: false,
            extensions: vec!["txt".to_string()],
            transformations: Vec::new(),
            template: Vec::new(),
            context: TransformContext::default(),
            donor: Vec::new(),
            retain: Vec::new(),
            remove: Vec::new(),
            min_frequency: 0,
            length: None,
            pattern: None,
            max_keyspace: None,
            min_complexity: None,
            top: None,
            format: OutputFormat::default(),
            buffer_size: crate::output::DEFAULT_BUFFER_SIZE,
            quiet: true,
            show_stats: false,
        }
    }
}

/// Main processor
pub struct Processor {
    config: ProcessorConfig,
    stats: ProcessingStats,
}

impl Processor {
    pub fn new(config: ProcessorConfig) -> Self {
        Self {
            config,
            stats: ProcessingStats::new(),
        }
    }

    /// Read the inputs, transform and filter them, and write the result
    pub fn process(&mut self) -> anyhow::Result<()> {
        let input = self.read_inputs()?;
        if input.is_empty() {
            print_warning("No input lines found");
        }

        let output = self.run(input)?;

        let mut writer = OutputWriter::new(self.config.output.clone(), self.config.buffer_size)?;
        writer.write_multiset(&output, self.config.format)?;

        if !self.config.quiet {
            if let Some(path) = writer.path() {
                print_success(&format!("Output written to: {:?}", path));
            }
            print_info(&format!("Unique keys: {}", writer.lines_written()));
        }
        if self.config.show_stats {
            self.stats.print_summary();
        }

        Ok(())
    }

    /// Run the transformations and filters over an already-read multiset
    pub fn run(&mut self, input: Multiset) -> anyhow::Result<Multiset> {
        self.stats.keys_in = input.len();

        let donor = self.load_sets(&self.config.donor)?;
        let donor = (!self.config.donor.is_empty()).then_some(donor);

        let mut set = input;

        for mode in &self.config.transformations {
            set = transform(&set, mode, &self.config.context, donor.as_ref())?;
            self.stats.add_stage(mode, set.len());
        }

        for (i, step) in self.config.template.iter().enumerate() {
            if step.bypass {
                debug!("Template step {} ({}) bypassed", i, step.transformation_mode);
                continue;
            }

            let ctx = step.context(&self.config.context)?;
            set = transform(&set, &step.transformation_mode, &ctx, donor.as_ref())?;

            if step.verbose {
                info!(
                    "Template step {} ({}): {} keys, {} total",
                    i,
                    step.transformation_mode,
                    set.len(),
                    set.total()
                );
            }
            self.stats.add_stage(&step.transformation_mode, set.len());
        }

        let filters = self.filter_config()?;
        if filters.has_filters() {
            set = filters.apply(set)?;
        }

        self.stats.keys_out = set.len();
        Ok(set)
    }

    fn filter_config(&self) -> anyhow::Result<FilterConfig> {
        let pattern = match self.config.pattern {
            Some(ref pattern) => Some(PatternFilter::new(pattern)?),
            None => None,
        };

        Ok(FilterConfig {
            retain: self.load_sets(&self.config.retain)?,
            remove: self.load_sets(&self.config.remove)?,
            min_frequency: self.config.min_frequency,
            length: self.config.length,
            pattern,
            max_keyspace: self.config.max_keyspace,
            min_complexity: self.config.min_complexity,
            top_n: self.config.top,
        })
    }

    /// Read every input into one multiset
    fn read_inputs(&mut self) -> anyhow::Result<Multiset> {
        let mut set = Multiset::new();

        if self.config.inputs.is_empty() {
            let spinner = create_spinner("Reading stdin...", self.config.quiet);
            let lines = read_stdin_into(&mut set);
            self.stats.add_file(0, lines);
            spinner.finish_and_clear();
            self.stats.keys_in = set.len();
            return Ok(set);
        }

        if !self.config.quiet {
            print_header("Scanning input...");
        }

        let files = self.collect_files()?;
        if files.is_empty() {
            print_warning("No files found to process!");
            return Ok(set);
        }

        if !self.config.quiet {
            let total: u64 = files.iter().map(|(_, size)| *size).sum();
            print_info(&format!("Found {} files ({} total)", files.len(), ByteSize(total)));
        }

        let spinner = create_spinner("Reading...", self.config.quiet);
        for (path, size) in &files {
            spinner.set_message(format!("Reading {:?}...", path.file_name().unwrap_or_default()));
            let lines = read_file_into(path, &mut set)?;
            self.stats.add_file(*size, lines);
        }
        spinner.finish_with_message("Read complete".green().to_string());

        self.stats.keys_in = set.len();
        Ok(set)
    }

    /// Collect all files to read
    fn collect_files(&self) -> anyhow::Result<Vec<(PathBuf, u64)>> {
        let mut files = Vec::new();
        for input in &self.config.inputs {
            collect_path(input, self.config.recursive, &self.config.extensions, &mut files)?;
        }
        Ok(files)
    }

    /// Read files into one multiset used for its keys
    fn load_sets(&self, paths: &[PathBuf]) -> anyhow::Result<Multiset> {
        let mut set = Multiset::new();
        for path in paths {
            read_file_into(path, &mut set)?;
        }
        Ok(set)
    }

    /// Get processing statistics
    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }
}

fn collect_path(input: &Path, recursive: bool, extensions: &[String], files: &mut Vec<(PathBuf, u64)>) -> anyhow::Result<()> {
    if input.is_file() {
        let size = fs::metadata(input)?.len();
        files.push((input.to_path_buf(), size));
    } else if input.is_dir() {
        let walker = if recursive {
            WalkDir::new(input)
        } else {
            WalkDir::new(input).max_depth(1)
        };

        for entry in walker.sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                    if extensions.contains(&ext.to_lowercase()) {
                        let size = fs::metadata(path)?.len();
                        files.push((path.to_path_buf(), size));
                    }
                }
            }
        }
    } else {
        anyhow::bail!("Input path does not exist: {:?}", input);
    }

    Ok(())
}
