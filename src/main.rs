use anyhow::Result;
use clap::Parser;

use changepoi::app::{Cli, detect_format, init_sink, parse_input, resolve_options, write_buckets};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = resolve_options(&cli)?;
    tracing::info!(
        "Filters: {} amenities, {} extra sections, dates at offset {}",
        options.accepted_amenities.len(),
        options.extra_sections.len(),
        options.date_offset
    );

    let format = detect_format(&cli)?;

    let start = std::time::Instant::now();
    let buckets = parse_input(&cli.input, options)?;

    let mut sink = init_sink(&format, &cli.output)?;
    let written = write_buckets(&buckets, sink.as_mut())?;

    if !buckets.faults().is_empty() {
        tracing::warn!("{} nodes dropped as malformed", buckets.faults().len());
    }

    let elapsed = start.elapsed();
    tracing::info!(
        "Done! Written {} features in {:.2}s ({} created, {} updated, {} deleted, {} malformed)",
        written,
        elapsed.as_secs_f64(),
        buckets.created().len(),
        buckets.updated().len(),
        buckets.deleted().len(),
        buckets.malformed().len()
    );

    Ok(())
}
