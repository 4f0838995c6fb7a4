use anyhow::Result;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use photoid_processor::cli::Args;
use photoid_processor::utils::{display_name, format_duration};
use photoid_processor::{
    BatchConfig, BatchEvent, BatchReport, BatchRunner, FileStatus, JsonMessage, ProcessingEngine,
    ProcessingOptions, ProcessorError,
};

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_env("PHOTOID_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let mut args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version print to stdout and are not failures
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let config_path = match args.load_and_merge_config() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(args.verbose);
    if let Some(path) = config_path {
        tracing::debug!(config = %path.display(), "Loaded configuration file");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let human = !args.json_progress;

    if human {
        println!("{}", style("Photo ID Processor").bold().blue());
        println!("{}", style("Face-centred crop, resize and DPI tagging").dim());
        println!();
    }

    let options = ProcessingOptions::new(
        args.target_width(),
        args.target_height(),
        args.target_dpi(),
        args.model_path(),
    )?;

    let batch_config = BatchConfig {
        extensions: args.extensions(),
        jobs: args.parallel_jobs(),
        dry_run: args.dry_run,
    };
    if batch_config.extensions.is_empty() {
        return Err(ProcessorError::Configuration("no input extensions configured".to_string()).into());
    }

    if human && args.verbose {
        println!("{}", style("Configuration:").bold());
        println!(
            "  Target size: {}x{}",
            options.target_width(),
            options.target_height()
        );
        println!("  DPI: {}", options.dpi());
        println!("  Model: {}", options.model_path().display());
        println!("  Extensions: {:?}", batch_config.extensions);
        println!("  Parallel jobs: {}", batch_config.jobs);
        if batch_config.dry_run {
            println!("  Dry run mode: enabled (simulation only - no files will be created)");
        }
        println!();
    }

    // Model problems are fatal before any file is looked at
    let engine = ProcessingEngine::new(options)?;
    let runner = BatchRunner::new(engine, batch_config);

    let report = runner.run_with_observer(&args.input_dir, &args.output_dir, |event| {
        match (event, human) {
            (BatchEvent::Started { total_files }, true) => {
                println!("{}", style(format!("✓ Found {} images", total_files)).green());
            }
            (BatchEvent::Started { total_files }, false) => {
                JsonMessage::Started { total_files }.emit();
            }
            (BatchEvent::FileDone(report), false) => JsonMessage::from_report(report).emit(),
            (BatchEvent::FileDone(_), true) => {}
        }
    })?;

    if human {
        print_summary(&report, args);
    } else {
        JsonMessage::summary(&report).emit();
    }

    Ok(())
}

fn print_summary(report: &BatchReport, args: &Args) {
    let successful = report.successful();
    let failed = report.failed();

    println!();
    let header = if args.dry_run {
        style("Dry Run Results Summary:").bold().cyan()
    } else {
        style("Results Summary:").bold().green()
    };
    println!("{}", header);

    let processed_label = if args.dry_run {
        "Would be processed"
    } else {
        "Successfully processed"
    };
    println!("  {}: {}", processed_label, style(successful).bold().green());
    if failed > 0 {
        println!("  Failed: {}", style(failed).bold().red());
    }
    if successful > 0 {
        println!(
            "  Face found: {} / no face (whole image): {}",
            style(report.faces_detected()).bold().cyan(),
            style(successful - report.faces_detected()).dim()
        );
    }

    println!();
    println!("{}", style("Performance:").bold().blue());
    println!(
        "  Total processing time: {}",
        style(format_duration(report.elapsed)).bold()
    );
    if report.discovered > 0 {
        println!(
            "  Average time per image: {}",
            style(format_duration(report.elapsed / report.discovered as u32)).dim()
        );
    }

    println!();
    let location_label = if args.dry_run {
        "Would be saved to"
    } else {
        "Output directory"
    };
    println!("  {}: {}", location_label, args.output_dir.display());

    if failed > 0 {
        println!();
        println!("{}", style("Errors encountered:").bold().red());
        let failures = report.files.iter().filter_map(|file| match &file.status {
            FileStatus::Failed { error } => Some((file, error)),
            FileStatus::Saved { .. } => None,
        });
        for (i, (file, error)) in failures.enumerate() {
            println!(
                "  {}: {} - {}",
                style(format!("#{}", i + 1)).dim(),
                style(display_name(&file.input_path)).bold().red(),
                error
            );
        }
    }
}
