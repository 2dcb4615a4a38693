//! RFtap CLI
//!
//! Wraps payloads with RFtap headers, one file at a time or as a stream of
//! newline-delimited JSON PDUs.

mod config;
mod io;

use clap::{Parser, Subcommand, ValueEnum};
use rftap_core::{EncodeError, Encoder, FieldPolicy, LinkTypeSource, Metadata};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::Config;

/// RFtap - encapsulate payloads with radio metadata headers
#[derive(Parser)]
#[command(name = "rftap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where the link type or dissector name comes from
    #[arg(long, value_enum)]
    source: Option<SourceArg>,

    /// Link type for `--source fixed-link-type`
    #[arg(long, allow_negative_numbers = true)]
    link_type: Option<i32>,

    /// Dissector name for `--source fixed-dissector`
    #[arg(long)]
    dissector: Option<String>,

    /// Abort on the first field that cannot be encoded
    #[arg(long)]
    fail_fast: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    /// `dlt` key of the metadata
    PayloadMetadata,
    /// `dissector` key of the metadata
    DissectorMetadata,
    /// Constant `--link-type`
    FixedLinkType,
    /// Constant `--dissector`
    FixedDissector,
    /// Emit neither
    None,
}

#[derive(Subcommand)]
enum Commands {
    /// Encapsulate a single payload
    Encap {
        /// Payload file, `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Output file, `-` for stdout
        #[arg(short, long, default_value = "-")]
        output: String,

        /// JSON file holding the metadata mapping
        #[arg(long, conflicts_with = "meta_json")]
        meta: Option<PathBuf>,

        /// Inline JSON metadata mapping
        #[arg(long)]
        meta_json: Option<String>,

        /// Write hex text instead of raw bytes
        #[arg(long)]
        hex: bool,
    },

    /// Encapsulate newline-delimited JSON PDUs
    Stream {
        /// PDU source, `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// PDU sink, `-` for stdout
        #[arg(short, long, default_value = "-")]
        output: String,
    },

    /// Print the effective configuration
    ShowConfig,

    /// Write a default configuration file
    InitConfig {
        /// Destination (defaults to the user config directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::resolve(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli)?;

    // Initialize logging; stdout may carry encoded data
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Encap {
            input,
            output,
            meta,
            meta_json,
            hex,
        } => {
            let metadata = load_metadata(meta, meta_json)?;
            encap_file(&input, &output, &metadata, hex, &config)?;
        }
        Commands::Stream { input, output } => {
            run_stream(&input, &output, &config)?;
        }
        Commands::ShowConfig => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::InitConfig { path } => {
            let path = path.unwrap_or_else(Config::default_path);
            if path.exists() {
                anyhow::bail!("Config file already exists: {}", path.display());
            }
            Config::default().save(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}

/// Fold command-line encapsulation options into the configuration
fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    let source = match cli.source {
        Some(SourceArg::PayloadMetadata) => Some(LinkTypeSource::PayloadMetadata),
        Some(SourceArg::DissectorMetadata) => Some(LinkTypeSource::DissectorMetadata),
        Some(SourceArg::FixedLinkType) => match cli.link_type {
            Some(link_type) => Some(LinkTypeSource::FixedLinkType { link_type }),
            None => anyhow::bail!("--source fixed-link-type requires --link-type"),
        },
        Some(SourceArg::FixedDissector) => match &cli.dissector {
            Some(dissector) => Some(LinkTypeSource::FixedDissector {
                dissector: dissector.clone(),
            }),
            None => anyhow::bail!("--source fixed-dissector requires --dissector"),
        },
        Some(SourceArg::None) => Some(LinkTypeSource::None),
        // A bare constant implies its source
        None => match (cli.link_type, &cli.dissector) {
            (Some(_), Some(_)) => {
                anyhow::bail!("--link-type and --dissector are mutually exclusive")
            }
            (Some(link_type), None) => Some(LinkTypeSource::FixedLinkType { link_type }),
            (None, Some(dissector)) => Some(LinkTypeSource::FixedDissector {
                dissector: dissector.clone(),
            }),
            (None, None) => None,
        },
    };

    if let Some(source) = source {
        config.set_source(source);
    }
    if cli.fail_fast {
        config.set_field_policy(FieldPolicy::FailFast);
    }

    Ok(())
}

/// Read the metadata mapping from a file or an inline argument
fn load_metadata(path: Option<PathBuf>, inline: Option<String>) -> anyhow::Result<Metadata> {
    let text = match (path, inline) {
        (Some(path), _) => std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Failed to read metadata {:?}: {}", path, e))?,
        (None, Some(inline)) => inline,
        (None, None) => return Ok(Metadata::new()),
    };

    let value: serde_json::Value = serde_json::from_str(&text)?;
    Ok(Metadata::from_json(&value)?)
}

/// Encapsulate one payload
fn encap_file(
    input: &str,
    output: &str,
    metadata: &Metadata,
    hex: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let payload = io::read_all(input)?;
    tracing::info!("Encapsulating {} bytes from {}", payload.len(), input);

    let encoder = Encoder::new(config.encapsulation.clone());
    let encapsulated = encoder.encode(metadata, &payload)?;

    if !encapsulated.is_clean() {
        tracing::warn!(
            "{} field(s) left out of the header",
            encapsulated.diagnostics().len()
        );
    }

    let mut writer = io::open_output(output)?;
    if hex {
        writeln!(writer, "{}", ::hex::encode(encapsulated.bytes()))?;
    } else {
        writer.write_all(encapsulated.bytes())?;
    }
    writer.flush()?;

    tracing::info!(
        "Wrote {} bytes to {} (header {} bytes, flags 0x{:04x})",
        encapsulated.bytes().len(),
        output,
        encapsulated.header_len(),
        encapsulated.flags().as_u16()
    );

    Ok(())
}

/// Counters for a stream run
#[derive(Debug, Default)]
struct StreamStats {
    encoded: u64,
    dropped: u64,
    field_errors: u64,
}

/// Encapsulate every PDU read from `input`; malformed PDUs are dropped
fn run_stream(input: &str, output: &str, config: &Config) -> anyhow::Result<()> {
    let encoder = Encoder::new(config.encapsulation.clone());
    let reader = io::open_input(input)?;
    let mut writer = io::open_output(output)?;
    let mut stats = StreamStats::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let value: serde_json::Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Dropping PDU on line {}: invalid JSON: {}", index + 1, e);
                stats.dropped += 1;
                continue;
            }
        };

        match encoder.encode_json(&value) {
            Ok(pdu) => {
                stats.encoded += 1;
                stats.field_errors += pdu.encapsulated().diagnostics().len() as u64;
                serde_json::to_writer(&mut writer, &pdu.to_json())?;
                writer.write_all(b"\n")?;
            }
            Err(e @ EncodeError::Misaligned { .. }) => return Err(e.into()),
            Err(e) => {
                tracing::error!("Dropping PDU on line {}: {}", index + 1, e);
                stats.dropped += 1;
            }
        }
    }

    writer.flush()?;
    tracing::info!(
        "Stream finished: {} encoded, {} dropped, {} field errors",
        stats.encoded,
        stats.dropped,
        stats.field_errors
    );

    Ok(())
}
