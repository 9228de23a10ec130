use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use directories::BaseDirs;
use postal_codec::{decode, encode_blob, split_type_tag, Compression, Point, ScalarType, Series, Value};
use postal_session::{DatasetMetadata, Session, SessionConfig};
use postal_source::DirSource;
use postal_table::WideTable;
use tokio::runtime::Runtime;
use tracing::{debug, info};

/// Postal command-line client.
#[derive(Parser)]
#[command(name = "postalctl", author, version, about = "Postal CLI Tool", long_about = None)]
struct Cli {
    #[command(flatten)]
    opts: Options,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Options {
    /// Path to configuration file (default: $HOME/.postal.yaml).
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error.
    #[arg(long = "log-level", default_value = "warn", global = true)]
    log_level: String,

    /// Write JSON logs to hourly files in this directory instead of stderr.
    #[arg(long = "log-dir", global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the type and points of a series blob.
    Decode {
        blob: PathBuf,
        #[arg(long, value_enum, default_value = "none")]
        compression: CompressionArg,
    },

    /// Build an uncompressed blob from `timestamp,value` lines.
    Encode {
        input: PathBuf,
        output: PathBuf,
        #[arg(long = "type", value_parser = parse_type)]
        ty: ScalarType,
    },

    /// Load series from a directory of `<label>.bin` blobs and print the aligned table.
    Plot {
        #[arg(long)]
        source: PathBuf,
        /// Dataset metadata JSON holding the validity map.
        #[arg(long)]
        metadata: Option<PathBuf>,
        /// Print the unfiltered table.
        #[arg(long)]
        raw: bool,
        #[arg(required = true)]
        labels: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CompressionArg {
    None,
    Lzma,
    Gzip,
}

impl From<CompressionArg> for Compression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => Compression::None,
            CompressionArg::Lzma => Compression::Lzma,
            CompressionArg::Gzip => Compression::Gzip,
        }
    }
}

fn parse_type(s: &str) -> Result<ScalarType, String> {
    ScalarType::parse(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = postal_log::parse_level(&cli.opts.log_level)?;
    let _log = match &cli.opts.log_dir {
        Some(dir) => postal_log::init(dir, level)?,
        None => postal_log::init_console(level)?,
    };

    match cli.command {
        Commands::Decode { blob, compression } => {
            let bytes = fs::read(&blob).with_context(|| format!("reading {}", blob.display()))?;
            let bytes = match Compression::from(compression).decompressor() {
                Some(d) => d.decompress(&bytes)?,
                None => bytes,
            };
            print!("{}", describe_blob(&bytes)?);
        }

        Commands::Encode { input, output, ty } => {
            let text = fs::read_to_string(&input).with_context(|| format!("reading {}", input.display()))?;
            let series = parse_points(&text)?;
            let blob = encode_blob(&series, ty)?;
            fs::write(&output, &blob).with_context(|| format!("writing {}", output.display()))?;
            info!(points = series.len(), bytes = blob.len(), "blob written");
        }

        Commands::Plot {
            source,
            metadata,
            raw,
            labels,
        } => {
            let config = load_config(cli.opts.config)?;
            let metadata = match metadata {
                Some(path) => DatasetMetadata::load(&path)
                    .with_context(|| format!("loading metadata {}", path.display()))?,
                None => DatasetMetadata::default(),
            };

            let mut session =
                Session::new(config, Arc::new(DirSource::new(source))).with_validity(metadata.validity);
            // Start async runtime manually since main is sync.
            let rt = Runtime::new()?;
            rt.block_on(async {
                for label in &labels {
                    session
                        .add_series(label)
                        .await
                        .with_context(|| format!("adding {label}"))?;
                }
                anyhow::Ok(())
            })?;

            let table = if raw {
                session.raw_table()
            } else {
                session.filtered_table()
            };
            print!("{}", render_table(session.columns(), table));
        }
    }
    Ok(())
}

fn load_config(explicit: Option<PathBuf>) -> Result<SessionConfig> {
    let path = explicit
        .clone()
        .or_else(|| BaseDirs::new().map(|b| b.home_dir().join(".postal.yaml")));
    match path {
        Some(path) if path.exists() => {
            debug!(path = %path.display(), "loading config");
            SessionConfig::load(&path).with_context(|| format!("loading config {}", path.display()))
        }
        Some(path) if explicit.is_some() => bail!("config file {} not found", path.display()),
        _ => Ok(SessionConfig::default()),
    }
}

/// `timestamp,value` per line; blank lines and `#` comments are skipped.
fn parse_points(text: &str) -> Result<Series> {
    let mut points = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((t, v)) = line.split_once(',') else {
            bail!("line {}: expected `timestamp,value`", lineno + 1);
        };
        let timestamp: f64 = t
            .trim()
            .parse()
            .with_context(|| format!("line {}: bad timestamp", lineno + 1))?;
        points.push(Point::new(timestamp, parse_value(v.trim(), lineno + 1)?));
    }
    Ok(Series::new(points)?)
}

fn parse_value(s: &str, lineno: usize) -> Result<Value> {
    if let Ok(v) = s.parse::<u64>() {
        return Ok(Value::Unsigned(v));
    }
    if let Ok(v) = s.parse::<i64>() {
        return Ok(Value::Signed(v));
    }
    s.parse::<f64>()
        .map(Value::Float)
        .with_context(|| format!("line {lineno}: bad value {s:?}"))
}

/// Type line and points of an uncompressed blob.
fn describe_blob(bytes: &[u8]) -> Result<String> {
    let (ty, payload) = split_type_tag(bytes)?;
    let series = decode(payload, ty)?;
    Ok(render_series(ty, &series))
}

fn render_series(ty: ScalarType, series: &Series) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "type {ty}, {} points", series.len());
    for point in series {
        let _ = writeln!(out, "{}\t{}", point.timestamp, point.value);
    }
    out
}

fn render_table(columns: &[String], table: &WideTable) -> String {
    let mut out = String::from("time");
    for label in columns {
        out.push('\t');
        out.push_str(label);
    }
    out.push('\n');
    for row in table.rows() {
        let _ = write!(out, "{}", row.timestamp);
        for value in &row.values {
            match value {
                Some(v) => {
                    let _ = write!(out, "\t{v}");
                }
                None => out.push_str("\t-"),
            }
        }
        out.push('\n');
    }
    out
}
