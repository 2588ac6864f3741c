use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use optic_relay::console;
use optic_relay::render::EnvelopePrinter;
use optic_relay::scheduler::ThreadScheduler;
use optic_relay::splitter::FileIdSource;
use optic_relay::{split_file, PlaybackController, SenderConfig};

/// Broadcast a file as a cycling sequence of envelopes.
///
/// Envelopes go to stdout, one per line, for an external symbol encoder.
/// Commands are read from stdin; reports go to stderr.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File to transmit
    file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let Some(path) = cli.file else {
        println!("{}", Cli::command().render_usage());
        println!("example: optic-send report.pdf");
        return Ok(());
    };

    if !path.exists() {
        eprintln!("file not found: {}", path.display());
        return Ok(());
    }

    let config = SenderConfig::default();
    config.validate()?;

    eprintln!("reading file: {}", path.display());
    let outcome = split_file(&path, &config)
        .with_context(|| format!("failed to split {}", path.display()))?;

    let first = &outcome.chunks[0];
    eprintln!("file name:   {}", first.file_name());
    eprintln!(
        "file size:   {} bytes ({})",
        outcome.file_size,
        console::format_size(outcome.file_size)
    );
    eprintln!("file id:     {}", first.file_id());
    eprintln!("chunks:      {}", outcome.chunks.len());
    if outcome.id_source == FileIdSource::Random {
        eprintln!("warning: file id is random; a re-send will not match earlier captures");
    }
    eprintln!();

    let controller = PlaybackController::start(
        outcome.chunks,
        &config,
        EnvelopePrinter::new(io::stdout()),
        Arc::new(ThreadScheduler),
    )?;

    let mut stderr = io::stderr();
    console::print_help(&mut stderr)?;
    console::run(&controller, io::stdin().lock(), &mut stderr)?;

    controller.shutdown();
    Ok(())
}
