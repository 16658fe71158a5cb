//! Command-line interface for pdfdesk.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::{self, HttpBackend};
use crate::config::{self, Config, DEFAULT_TEMPLATE};
use crate::files;
use crate::logging::{self, LoggingConfig};
use crate::report::{self, OutputFormat};
use crate::session::{messages, Session};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Upload PDF reports to the analysis server and show its answers.
///
/// Files are sent to `POST /upload`; `analyze` asks the server to process
/// whatever was last uploaded and renders the answers together with links
/// to the generated spreadsheets.
#[derive(Parser)]
#[command(name = "pdfdesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Parser)]
pub struct GlobalArgs {
    /// Server origin (overrides the config file)
    #[arg(long, global = true, env = "PDFDESK_SERVER")]
    pub server: Option<String>,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Do not show a spinner while waiting for the server
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload PDF files (directories are searched for *.pdf)
    Upload(UploadArgs),
    /// Run the analysis on the last upload and show the results
    Analyze(RenderArgs),
    /// Upload, then analyze if the upload succeeded
    Run(RunArgs),
    /// Download a generated spreadsheet
    Download(DownloadArgs),
    /// Write a default config file
    Init(InitArgs),
}

/// How to render the page after a command.
#[derive(Parser)]
pub struct RenderArgs {
    /// Output format (default: from config, else pretty)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct UploadArgs {
    /// Files or directories to upload
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub render: RenderArgs,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Files or directories to upload
    pub paths: Vec<PathBuf>,

    /// Also download every generated spreadsheet into this directory
    #[arg(short, long)]
    pub download_dir: Option<PathBuf>,

    #[command(flatten)]
    pub render: RenderArgs,
}

#[derive(Parser)]
pub struct DownloadArgs {
    /// Spreadsheet file name as listed in the analysis results
    pub filename: String,

    /// Directory to save into
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "pdfdesk.yaml")]
    pub output: PathBuf,
}

/// Everything a server command needs once config and flags are merged.
struct Context {
    config: Config,
    base_url: String,
    session: Session<HttpBackend>,
    show_spinner: bool,
}

impl Context {
    fn format(&self, args: &RenderArgs) -> OutputFormat {
        args.format.unwrap_or_else(|| self.config.output_format())
    }
}

/// Load config, apply flags, start logging, and build the HTTP backend.
fn prepare(global: &GlobalArgs) -> anyhow::Result<Result<Context, i32>> {
    let (mut config, config_path) = match Config::load(global.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(Err(EXIT_ERROR));
        }
    };

    if let Some(server) = &global.server {
        config.server.base_url = Some(server.clone());
    }

    if let Err(e) = config::validate(&config) {
        eprintln!("Error: invalid configuration: {}", e);
        return Ok(Err(EXIT_ERROR));
    }

    let mut log_config = LoggingConfig::resolve(config.log_level(), config.log_json());
    if global.verbose {
        log_config = log_config.verbose();
    }
    logging::init(&log_config);

    if let Some(path) = &config_path {
        tracing::debug!(path = %path.display(), "using config file");
    }

    let base_url = config.server.base_url().to_string();
    let backend = HttpBackend::new(&base_url)?.with_timeout(config.server.timeout());
    tracing::debug!(server = %base_url, "server origin");

    Ok(Ok(Context {
        config,
        base_url,
        session: Session::new(backend),
        show_spinner: !global.quiet,
    }))
}

/// Run one parsed command line and return the process exit code.
pub fn run(cli: Cli) -> anyhow::Result<i32> {
    if let Commands::Init(args) = &cli.command {
        return run_init(args);
    }

    let ctx = match prepare(&cli.global)? {
        Ok(ctx) => ctx,
        Err(code) => return Ok(code),
    };

    let runtime = tokio::runtime::Runtime::new()?;
    match cli.command {
        Commands::Upload(args) => runtime.block_on(run_upload(ctx, &args)),
        Commands::Analyze(args) => runtime.block_on(run_analyze(ctx, &args)),
        Commands::Run(args) => runtime.block_on(run_full(ctx, &args)),
        Commands::Download(args) => runtime.block_on(run_download(ctx, &args)),
        Commands::Init(_) => unreachable!("handled above"),
    }
}

/// Await `fut` while a spinner shows `label`.
async fn with_spinner<F: Future>(show: bool, label: &str, fut: F) -> F::Output {
    let spinner = if show {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }
        pb.set_message(label.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    } else {
        ProgressBar::hidden()
    };

    let output = fut.await;
    spinner.finish_and_clear();
    output
}

/// Build the selection from paths; None means the error was already reported.
fn pick_files(paths: &[PathBuf]) -> Option<Vec<files::SelectedFile>> {
    match files::pick(paths) {
        Ok(selected) => {
            if !paths.is_empty() && selected.is_empty() {
                eprintln!("Warning: no PDF files found");
            }
            Some(selected)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            None
        }
    }
}

fn render(ctx: &Context, args: &RenderArgs) -> anyhow::Result<()> {
    let view = ctx.session.view(&ctx.base_url);
    report::write(&view, ctx.format(args), args.output.as_deref())
}

async fn run_upload(ctx: Context, args: &UploadArgs) -> anyhow::Result<i32> {
    let Some(selected) = pick_files(&args.paths) else {
        return Ok(EXIT_ERROR);
    };

    ctx.session.select_files(selected);

    let outcome =
        with_spinner(ctx.show_spinner, messages::UPLOAD_LABEL_BUSY, ctx.session.upload()).await;
    render(&ctx, &args.render)?;

    Ok(if outcome.is_success() { EXIT_SUCCESS } else { EXIT_FAILED })
}

async fn run_analyze(ctx: Context, args: &RenderArgs) -> anyhow::Result<i32> {
    let outcome =
        with_spinner(ctx.show_spinner, messages::ANALYZE_LABEL_BUSY, ctx.session.analyze()).await;
    render(&ctx, args)?;

    Ok(if outcome.is_success() { EXIT_SUCCESS } else { EXIT_FAILED })
}

async fn run_full(ctx: Context, args: &RunArgs) -> anyhow::Result<i32> {
    let Some(selected) = pick_files(&args.paths) else {
        return Ok(EXIT_ERROR);
    };

    let session = &ctx.session;
    session.select_files(selected);

    let uploaded = with_spinner(ctx.show_spinner, messages::UPLOAD_LABEL_BUSY, session.upload())
        .await
        .is_success();

    let mut passed = uploaded;
    if uploaded {
        passed = with_spinner(ctx.show_spinner, messages::ANALYZE_LABEL_BUSY, session.analyze())
            .await
            .is_success();
    }

    if passed {
        if let Some(dir) = &args.download_dir {
            passed = download_all(session, dir).await;
        }
    }

    render(&ctx, &args.render)?;
    Ok(if passed { EXIT_SUCCESS } else { EXIT_FAILED })
}

/// Fetch every spreadsheet listed in the current result. Returns false if any failed.
async fn download_all(session: &Session<HttpBackend>, dir: &Path) -> bool {
    let pairs = session
        .snapshot()
        .result
        .and_then(|r| r.excel_pairs())
        .unwrap_or_default();

    let mut all_ok = true;
    for (pdf_file, excel_file) in pairs {
        match client::download(session.backend(), &excel_file, dir).await {
            Ok(path) => eprintln!("Saved {} ({})", path.display(), pdf_file),
            Err(e) => {
                tracing::warn!(pdf = %pdf_file, error = %e, "spreadsheet download failed");
                eprintln!("Error: could not download spreadsheet for {}: {}", pdf_file, e);
                all_ok = false;
            }
        }
    }
    all_ok
}

async fn run_download(ctx: Context, args: &DownloadArgs) -> anyhow::Result<i32> {
    let label = format!("{}{}", messages::DOWNLOAD_PREFIX, args.filename);
    let result = with_spinner(
        ctx.show_spinner,
        &label,
        client::download(ctx.session.backend(), &args.filename, &args.dir),
    )
    .await;

    match result {
        Ok(path) => {
            println!("{}", path.display());
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(EXIT_FAILED)
        }
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, DEFAULT_TEMPLATE) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Set server.base_url in {} if the server is not local", args.output.display());
    println!("  2. Run: pdfdesk run ./reports");

    Ok(EXIT_SUCCESS)
}
