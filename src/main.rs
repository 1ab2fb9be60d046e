//! Kikitori - Japanese subtitle transcription
//!
//! Entry point: parses arguments, sets up logging and runs the pipeline once.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kikitori::cli::Args;
use kikitori::config::Config;
use kikitori::error::KikitoriError;
use kikitori::workflow::{RunRequest, Workflow};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let guard = match setup_logging(args.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    };

    let result = run(args).await;
    // flush the file log before a possible exit()
    drop(guard);

    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        let code = e.downcast_ref::<KikitoriError>().map_or(1, KikitoriError::exit_code);
        std::process::exit(code);
    }
}

async fn run(args: Args) -> Result<()> {
    info!("Starting Kikitori - Japanese subtitle transcription");

    let config = Config::load(args.config.as_deref())?;

    let output_dir = match args.output_dir {
        Some(dir) => {
            tokio::fs::create_dir_all(&dir).await?;
            dir
        }
        None => PathBuf::from("."),
    };

    let request = RunRequest {
        input: args.input,
        mode: args.mode.into(),
        write_txt: args.txt,
        output_dir,
    };

    let workflow = Workflow::new(config);
    let summary = workflow.run(&request).await?;

    info!(
        "Transcribed {} segments over {:.2} seconds",
        summary.entries, summary.audio_duration
    );
    println!("Saved subtitles to '{}'", display_absolute(&summary.srt_path));
    if let Some(txt_path) = &summary.txt_path {
        println!("Saved transcript to '{}'", display_absolute(txt_path));
    }

    Ok(())
}

fn display_absolute(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".kikitori").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotation
    let file_appender = rolling::daily(&log_dir, "kikitori.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("kikitori.log").display());

    Ok(guard)
}
