//! Wordlist Transform - password-analysis transformation pipeline
//!
//! Main entry point for the command-line application.

use clap::Parser;
use std::process;

use wordlist_transform::cli::Args;
use wordlist_transform::processor::{Processor, ProcessorConfig};
use wordlist_transform::progress::{print_banner, print_error, print_header, print_info, print_warning};

fn main() {
    // Parse command-line arguments
    let args = Args::parse();

    // Set up logging
    if args.debug {
        std::env::set_var("RUST_LOG", "debug");
    } else if !args.quiet && std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    // Run the application
    if let Err(e) = run(args) {
        print_error(&format!("{}", e));

        // Print chain of errors
        for cause in e.chain().skip(1) {
            print_error(&format!("  Caused by: {}", cause));
        }

        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    // Print banner unless quiet mode
    if !args.quiet {
        print_banner();
    }

    // Validate arguments
    validate_args(&args)?;

    // Create processor configuration
    let config = ProcessorConfig::from_args(&args)?;

    // Show configuration
    if !args.quiet && args.debug {
        print_config(&args, &config);
    }

    // Create and run processor
    let mut processor = Processor::new(config);
    processor.process()?;

    Ok(())
}

/// Validate command-line arguments
fn validate_args(args: &Args) -> anyhow::Result<()> {
    for input in &args.input {
        if !input.exists() {
            anyhow::bail!("Input path does not exist: {:?}", input);
        }
    }

    for path in args.donor.iter().chain(&args.retain).chain(&args.remove) {
        if !path.is_file() {
            anyhow::bail!("List file does not exist: {:?}", path);
        }
    }

    if args.transformations.is_empty() && args.template.is_none() && !args.quiet {
        print_warning("No --transformation or --template given; input is only filtered");
    }

    for mode in args.unknown_modes() {
        print_warning(&format!("Unknown transformation mode '{}' will produce no output", mode));
    }

    // Validate regex pattern if provided
    if let Some(ref pattern) = args.pattern {
        wordlist_transform::filter::validate_pattern(pattern)?;
    }

    Ok(())
}

/// Print configuration summary
fn print_config(args: &Args, config: &ProcessorConfig) {
    print_header("Configuration");

    if config.inputs.is_empty() {
        print_info("Input:          stdin");
    } else {
        print_info(&format!("Input:          {:?}", config.inputs));
    }
    match config.output {
        Some(ref path) => print_info(&format!("Output:         {:?}", path)),
        None => print_info("Output:         stdout"),
    }

    print_info(&format!("Transformations: {:?}", config.transformations));
    if let Some(ref template) = args.template {
        print_info(&format!("Template:       {:?} ({} steps)", template, config.template.len()));
    }

    print_info(&format!("Mask classes:   {}", config.context.classes.letters()));
    print_info(&format!("Index range:    {}", config.context.index_range));
    print_info(&format!("Word range:     {}", config.context.word_range));

    if let Some(range) = config.length {
        print_info(&format!("Length:         {}", range));
    }
    if let Some(ref pattern) = config.pattern {
        print_info(&format!("Pattern:        {}", pattern));
    }
    if let Some(n) = config.top {
        print_info(&format!("Top:            {}", n));
    }

    print_info(&format!("Recursive:      {}", config.recursive));
    print_info(&format!("Extensions:     {:?}", config.extensions));
    print_info(&format!("Buffer size:    {} MB", config.buffer_size / (1024 * 1024)));
}
