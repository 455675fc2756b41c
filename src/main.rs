use clap::{Parser, Subcommand};
use photo_squeeze::batch::{self, BatchOptions, InputFile};
use photo_squeeze::imaging::{Codec, RustBackend, supported_input_extensions};
use photo_squeeze::{config, output};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "photo-squeeze")]
#[command(about = "Re-encode photos to fit a byte budget")]
#[command(long_about = "\
Re-encode photos to fit a byte budget

Each input is decoded, scaled down to the maximum width (never up), and
encoded at the highest quality whose output fits the target. When even the
lowest quality is too large, the width is reduced by 15% per step down to
720px. PNG output is lossless and cannot be sized; it is encoded once.

Outputs are written as <name>-compressed.<ext> in the output directory.

Settings are read from ./photo-squeeze.toml when present; flags override
the file. Run 'photo-squeeze gen-config' for a documented config.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./photo-squeeze.toml if it exists)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log every quality attempt to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct CompressArgs {
    /// Image files or directories of images
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Target size per file in KiB
    #[arg(long)]
    target_kb: Option<u64>,

    /// Maximum output width in pixels (0 keeps the source width)
    #[arg(long)]
    max_width: Option<u32>,

    /// Output codec
    #[arg(long, value_enum)]
    format: Option<Codec>,

    /// Output directory
    #[arg(long, default_value = "compressed")]
    out_dir: PathBuf,

    /// Write a JSON report of every file to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Compress images to the target size
    Compress(CompressArgs),
    /// Print a stock photo-squeeze.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Compress(args) => {
            let mut cfg = match &cli.config {
                Some(path) => config::load_config_file(path)?,
                None => config::load_config(Path::new("."))?,
            };
            if let Some(kb) = args.target_kb {
                cfg.compression.target_kb = kb;
            }
            if let Some(width) = args.max_width {
                cfg.compression.max_width = width;
            }
            if let Some(codec) = args.format {
                cfg.compression.format = codec;
            }
            cfg.validate()?;

            let inputs = collect_inputs(&args.files)?;
            let options = BatchOptions {
                request: cfg.request(),
                params: cfg.search.params(),
                max_input_bytes: cfg.limits.max_input_bytes,
            };
            debug!(?options, inputs = inputs.len(), "starting batch");

            std::fs::create_dir_all(&args.out_dir)?;
            init_thread_pool(&cfg.processing);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let backend = RustBackend::new();
            let report = batch::compress_batch_to_dir(
                &backend,
                &inputs,
                &options,
                &args.out_dir,
                None,
                Some(tx),
            );
            printer.join().map_err(|_| "output thread panicked")?;

            output::print_summary(&report);
            let mut report_failed = false;
            if let Some(report_path) = &args.report {
                let written = serde_json::to_string_pretty(&report.summaries())
                    .map_err(std::io::Error::from)
                    .and_then(|json| std::fs::write(report_path, json));
                if let Err(e) = written {
                    warn!(path = %report_path.display(), error = %e, "could not write report");
                    report_failed = true;
                }
            }

            if report.failure_count() > 0 || report_failed {
                std::process::exit(1);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Compact log lines on stderr. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Expand directories into their image files, sorted by name.
///
/// Directories are not searched recursively. Explicit file arguments are kept
/// as given, whatever their extension; the decoder decides.
fn collect_inputs(args: &[PathBuf]) -> std::io::Result<Vec<InputFile>> {
    let mut inputs = Vec::new();
    for arg in args {
        if !arg.is_dir() {
            inputs.push(InputFile::Path(arg.clone()));
            continue;
        }
        let mut found: Vec<PathBuf> = std::fs::read_dir(arg)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && has_image_extension(p))
            .collect();
        found.sort();
        inputs.extend(found.into_iter().map(InputFile::Path));
    }
    Ok(inputs)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
        .unwrap_or(false)
}
