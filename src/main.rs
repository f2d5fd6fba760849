use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use thumbnailer::imaging::RustBackend;
use thumbnailer::output::{self, BatchTally};
use thumbnailer::pipeline::Pipeline;
use thumbnailer::storage::{FsStore, ObjectLocator};
use thumbnailer::{config, dispatch};
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "thumbnailer")]
#[command(about = "Derive bounded JPEG thumbnails from storage write notifications")]
#[command(long_about = "\
Derive bounded JPEG thumbnails from storage write notifications

Reads a batch of object-created notifications, and for every raw upload
writes a progressive JPEG preview that fits a 300x300 box into the
destination bucket under the key `thumb-<source key>`.

Storage layout (filesystem store):

  <store-root>/
  ├── uploads/                     # Bucket = directory
  │   └── albums/dawn.jpg          # Key = relative path
  ├── photo-share-buck-resized/
  │   └── thumb-albums/dawn.jpg    # Derived artifact
  └── .meta/                       # Content type, cache, metadata sidecars

Skipped records (success, no write):
  thumb-*, resized-*     already derived output
  non-image extension    only jpg, jpeg, png, gif, webp, bmp, tiff
  artifact exists        redelivered notification

Destination bucket: THUMBNAIL_BUCKET, else config file, else default.

Run 'thumbnailer gen-config' to generate a documented thumbnailer.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (thumbnailer.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root directory of the filesystem object store
    #[arg(long, default_value = "store", global = true)]
    store_root: PathBuf,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process one notification batch (path to JSON, or - for stdin)
    Handle { event: String },
    /// Show whether an object would be processed, without processing it
    Classify { bucket: String, key: String },
    /// Print a stock thumbnailer.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Handle { event } => {
            let payload = read_event(&event)?;
            let config = config::load_config(cli.config.as_deref())?;
            let store = FsStore::new(&cli.store_root);
            let backend = RustBackend::new();
            let pipeline = Pipeline::new(&store, &backend, &config);
            let workers = config::effective_threads(&config.processing);

            let (tx, rx) = std::sync::mpsc::channel::<dispatch::RecordEvent>();
            let printer = std::thread::spawn(move || {
                let mut tally = BatchTally::default();
                for event in rx {
                    tally.record(&event.status);
                    output::print_record_event(&event);
                }
                tally
            });
            let result = dispatch::handle_payload(&payload, &pipeline, workers, Some(tx));
            let tally = printer
                .join()
                .map_err(|_| "progress printer panicked")?;

            println!();
            println!("{}", output::format_tally(&tally));
            output::print_invocation_result(&result);

            if !result.is_success() {
                std::process::exit(1);
            }
        }
        Command::Classify { bucket, key } => {
            let config = config::load_config(cli.config.as_deref())?;
            let store = FsStore::new(&cli.store_root);
            let backend = RustBackend::new();
            let pipeline = Pipeline::new(&store, &backend, &config);
            let source = ObjectLocator::new(bucket, key);
            let decision = pipeline.classify(&source)?;
            output::print_decision(&source, &decision);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "thumbnailer=debug"
    } else {
        "thumbnailer=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Read a notification from a file, or from stdin when `source` is `-`.
fn read_event(source: &str) -> std::io::Result<String> {
    if source == "-" {
        let mut payload = String::new();
        std::io::stdin().read_to_string(&mut payload)?;
        Ok(payload)
    } else {
        std::fs::read_to_string(source)
    }
}
