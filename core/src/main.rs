use clap::{CommandFactory, Parser};
use geomqa_core::cli::{Cli, OutputFormat};
use geomqa_core::{DistortionQa, ProcessRunner, RunSummary, TextReport, ToolVersions};
use log::error;
use std::process;

fn main() {
    // no arguments at all: show the help rather than a usage error
    if std::env::args_os().len() == 1 {
        if let Err(e) = Cli::command().print_help() {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
        return;
    }

    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    // fail before running any registration
    if matches!(cli.format, OutputFormat::Json) && !cfg!(feature = "json") {
        eprintln!("Error: JSON output requires the 'json' feature");
        eprintln!("Rebuild with: cargo build --features json");
        process::exit(1);
    }

    let qa = DistortionQa::new(cli.tool_config())
        .any_version(cli.any_version)
        .show_viewer(cli.view);

    let versions = match qa.check_versions() {
        Ok(versions) => versions,
        Err(e) => {
            error!("Version check failed: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let summaries = match qa.process_all(&cli.inputs, &cli.output, &mut ProcessRunner) {
        Ok(summaries) => summaries,
        Err(e) => {
            error!("Distortion measurement failed: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    output_summaries(&summaries, &versions, cli.format);
}

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}

fn output_summaries(summaries: &[RunSummary], versions: &ToolVersions, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            for summary in summaries {
                println!("{}", TextReport::new(summary).with_versions(versions));
            }
        }
        OutputFormat::Json => {
            #[cfg(feature = "json")]
            {
                match output_json(summaries, versions) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        error!("Failed to serialize to JSON: {}", e);
                        eprintln!("Error: Failed to serialize to JSON: {}", e);
                        process::exit(1);
                    }
                }
            }
            #[cfg(not(feature = "json"))]
            {
                let _ = (summaries, versions);
                eprintln!("Error: JSON output requires the 'json' feature");
                eprintln!("Rebuild with: cargo build --features json");
                process::exit(1);
            }
        }
    }
}

#[cfg(feature = "json")]
fn output_json(summaries: &[RunSummary], versions: &ToolVersions) -> Result<String, serde_json::Error> {
    use serde::Serialize;

    #[derive(Serialize)]
    struct Output<'a> {
        versions: &'a ToolVersions,
        results: &'a [RunSummary],
    }

    serde_json::to_string_pretty(&Output {
        versions,
        results: summaries,
    })
}
