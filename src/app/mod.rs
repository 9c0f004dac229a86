use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use time::UtcOffset;

use crate::classify::{Bucket, Buckets};
use crate::config::{FilterConfig, ParserOptions};
use crate::metadata::parse_utc_offset;
use crate::parser::ChangesetParser;
use crate::sinks::{DataSink, FeatureRow, GeoJsonSink, GeoJsonlSink};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input changeset XML file ("-" for stdin)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file (.geojson, .geojsonl, or "-" for stdout)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Filter configuration file (YAML)
    #[arg(short, long)]
    pub filters: Option<PathBuf>,

    /// Accepted amenity value, merged with the filter file (repeatable)
    #[arg(short = 'a', long = "amenity")]
    pub amenities: Vec<String>,

    /// Offset for derived dates, e.g. "+01:00" (default: config, then local)
    #[arg(long, env = "CHANGEPOI_UTC_OFFSET")]
    pub utc_offset: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format (auto-detected if omitted)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum OutputFormat {
    #[value(name = "geojson")]
    GeoJson,
    #[value(name = "geojsonl", alias = "jsonl")]
    GeoJsonl,
}

pub fn output_format_label(format: &OutputFormat) -> &'static str {
    match format {
        OutputFormat::GeoJson => "geojson",
        OutputFormat::GeoJsonl => "geojsonl",
    }
}

pub fn detect_format(cli: &Cli) -> Result<OutputFormat> {
    if let Some(format) = cli.format {
        return Ok(format);
    }
    if cli.output == Path::new("-") {
        return Ok(OutputFormat::GeoJsonl);
    }
    cli.output
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| match ext.to_lowercase().as_str() {
            "geojson" => Some(OutputFormat::GeoJson),
            "geojsonl" | "jsonl" | "json" => Some(OutputFormat::GeoJsonl),
            _ => None,
        })
        .context("CLI: Could not detect output format from extension; use --format")
}

/// Offset precedence: flag, filter file, process local offset, UTC.
pub fn resolve_options(cli: &Cli) -> Result<ParserOptions> {
    let config = match &cli.filters {
        Some(path) => FilterConfig::load(path)?,
        None => FilterConfig::default(),
    };

    let fallback = match &cli.utc_offset {
        Some(raw) => parse_utc_offset(raw)
            .with_context(|| format!("CLI: invalid --utc-offset {raw:?}"))?,
        None => config.utc_offset()?.unwrap_or_else(|| {
            UtcOffset::current_local_offset().unwrap_or_else(|_| {
                tracing::warn!("Local UTC offset is indeterminate, rendering dates in UTC");
                UtcOffset::UTC
            })
        }),
    };

    let mut options = config.to_options(fallback)?;
    if cli.utc_offset.is_some() {
        options.date_offset = fallback;
    }
    options.accepted_amenities.extend(cli.amenities.iter().cloned());

    if options.accepted_amenities.is_empty() {
        tracing::warn!("No amenities accepted; only shop nodes will be extracted");
    }
    Ok(options)
}

pub fn init_sink(format: &OutputFormat, output: &Path) -> Result<Box<dyn DataSink + Send>> {
    match format {
        OutputFormat::GeoJson => {
            if output == Path::new("-") {
                anyhow::bail!(
                    "CLI: GeoJSON output to stdout is not supported; use geojsonl instead"
                );
            }
            tracing::info!("Sink: {} -> {:?}", output_format_label(format), output);
            Ok(Box::new(GeoJsonSink::new(output)?))
        }
        OutputFormat::GeoJsonl => {
            if output == Path::new("-") {
                tracing::info!("Sink: {} -> stdout", output_format_label(format));
                Ok(Box::new(GeoJsonlSink::stdout()?))
            } else {
                tracing::info!("Sink: {} -> {:?}", output_format_label(format), output);
                Ok(Box::new(GeoJsonlSink::new(output)?))
            }
        }
    }
}

pub fn parse_input(input: &Path, options: ParserOptions) -> Result<Buckets> {
    if input == Path::new("-") {
        tracing::info!("Parser: reading changeset from stdin");
        let stdin = std::io::stdin();
        return parse_source(ChangesetParser::new(stdin.lock(), options));
    }

    tracing::info!("Parser: reading changeset from {:?}", input);
    let parser = ChangesetParser::open(input, options)
        .with_context(|| format!("Parser: Failed to open {input:?}"))?;
    parse_source(parser)
}

fn parse_source<R: BufRead>(mut parser: ChangesetParser<R>) -> Result<Buckets> {
    parser.run().context("Parser: Failed to read changeset")?;
    Ok(parser.into_buckets())
}

/// Writes every bucket in created, updated, deleted, malformed order.
pub fn write_buckets(buckets: &Buckets, sink: &mut dyn DataSink) -> Result<u64> {
    let mut written = 0u64;
    for bucket in Bucket::ALL {
        for poi in buckets.get(bucket) {
            sink.add_feature(FeatureRow::from_poi(poi, bucket))
                .with_context(|| format!("Sink: Failed writing node {}", poi.node_id))?;
            written += 1;
        }
    }
    sink.finish().context("Sink: Failed to finalize output")?;
    Ok(written)
}
