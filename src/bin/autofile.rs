use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use autofile::Settings;
use autofile::cli::run_interactive;
use autofile::control::FileProcessor;

/// Watch a directory and process CSV, JSON, XML and spreadsheet files as they arrive.
#[derive(Debug, Parser)]
#[command(name = "autofile", version, about)]
struct Args {
    /// JSON settings file; flags below override its values
    #[arg(short, long, env = "AUTOFILE_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long)]
    input: Option<PathBuf>,

    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long)]
    archive: Option<PathBuf>,

    /// Delay between a file appearing and it being read
    #[arg(long)]
    settle_ms: Option<u64>,

    /// Convert CSV input to JSON and spreadsheet input to CSV
    #[arg(long)]
    convert_json: bool,

    #[arg(long)]
    no_backup: bool,

    #[arg(long)]
    no_archive: bool,

    /// Start watching immediately instead of waiting for `start`
    #[arg(long)]
    start: bool,

    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn settings(&self) -> Result<Settings, Box<dyn std::error::Error>> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_json_file(path)?,
            None => Settings::default(),
        };

        if let Some(dir) = &self.input {
            settings.input_dir = dir.clone();
        }
        if let Some(dir) = &self.output {
            settings.output_dir = dir.clone();
        }
        if let Some(dir) = &self.archive {
            settings.archive_dir = dir.clone();
        }
        if let Some(ms) = self.settle_ms {
            settings.settle_delay_ms = ms;
        }
        if self.convert_json {
            settings.convert_to_json = true;
        }
        if self.no_backup {
            settings.backup_before_processing = false;
        }
        if self.no_archive {
            settings.archive_on_success = false;
        }
        Ok(settings)
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "autofile=debug" } else { "autofile=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let settings = args.settings()?;
    let mut processor = FileProcessor::from_settings(&settings)?;
    info!(input = %settings.input_dir.display(), "processor ready");

    if args.start {
        processor.start()?;
    }
    run_interactive(&mut processor).await?;
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run_blocking(args) {
        eprintln!("autofile error: {e}");
        std::process::exit(1);
    }
}

fn run_blocking(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = rt.block_on(run(args));
    // stdin reads park a blocking thread that never returns on its own
    rt.shutdown_timeout(Duration::from_millis(500));
    result
}
