//! CLI entry point for `emlx2mbox`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use emlx2mbox::config::Config;
use emlx2mbox::convert::account::export_account;
use emlx2mbox::convert::tree::{convert_tree, list_folders, TreeReport};
use emlx2mbox::convert::ConvertOptions;
use emlx2mbox::model::account::AccountRecord;
use emlx2mbox::model::message::DecodedMessage;
use emlx2mbox::parser::emlx;

#[derive(Parser)]
#[command(
    name = "emlx2mbox",
    version,
    about = "Export Apple Mail .emlx folders to portable mbox files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every .mbox folder below SOURCE into one mbox file each
    Convert {
        /// Account or mailbox directory to read
        source: PathBuf,
        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
        /// Export as an account: OUTPUT/<label>/mbox_format plus a summary file
        #[arg(long)]
        label: Option<String>,
        /// Folders converted in parallel (0 = one per CPU)
        #[arg(short, long, env = "EMLX2MBOX_JOBS")]
        jobs: Option<usize>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the folders that would be converted, without writing anything
    Folders {
        source: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print the mbox entry for a single .emlx file
    Show { path: PathBuf },
    /// Write the current configuration (defaults plus any file values) to the config path
    InitConfig,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = emlx2mbox::config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    let mut opts = ConvertOptions::from(&config.convert);
    if cli.verbose > 0 {
        opts.verbose = true;
    }

    match cli.command {
        Commands::Convert {
            source,
            output,
            label,
            jobs,
            json,
        } => {
            if let Some(jobs) = jobs {
                opts.jobs = jobs;
            }
            cmd_convert(&source, &output, label.as_deref(), &opts, json)
        }
        Commands::Folders { source, json } => cmd_folders(&source, &opts, json),
        Commands::Show { path } => cmd_show(&path, &opts),
        Commands::InitConfig => cmd_init_config(&config),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_path = emlx2mbox::config::log_file_path(config);
    let log_dir = emlx2mbox::config::cache_dir(config);
    let log_name = log_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "emlx2mbox.log".into());

    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, log_name);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Save the effective configuration so it can be edited by hand.
fn cmd_init_config(config: &Config) -> anyhow::Result<()> {
    let path = emlx2mbox::config::save_config(config)?;
    println!("Configuration written to {}", path.display());
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "emlx2mbox", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::stdout().write_all(&buf)?;
    Ok(())
}

/// Convert a folder tree, optionally as a labelled account export.
fn cmd_convert(
    source: &Path,
    output: &Path,
    label: Option<&str>,
    opts: &ConvertOptions,
    json: bool,
) -> anyhow::Result<()> {
    if !source.is_dir() {
        anyhow::bail!("Source directory not found: {}", source.display());
    }

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Converting [{bar:40.cyan/blue}] {pos}/{len} folders {msg}")
            .expect("valid template")
            .progress_chars("#>-"),
    );
    let progress = |done: usize, total: usize, name: &str| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
        pb.set_message(name.to_string());
    };

    let start = Instant::now();

    let (report, account) = match label {
        Some(label) => {
            let account = AccountRecord::new(source, label);
            let exported = export_account(&account, output, opts, Some(&progress))?;
            (exported.report.clone(), Some(exported))
        }
        None => (convert_tree(source, output, opts, Some(&progress))?, None),
    };

    pb.finish_and_clear();
    let elapsed = start.elapsed();

    if json {
        let value = match &account {
            Some(exported) => serde_json::to_value(exported)?,
            None => serde_json::to_value(&report)?,
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let mbox_dir = account
        .as_ref()
        .map_or_else(|| output.to_path_buf(), |a| a.mbox_dir.clone());
    print_report_table(&report, &mbox_dir, elapsed);
    if let Some(exported) = &account {
        println!("  {:<20} {}", "Summary", exported.summary_path.display());
        println!();
    }

    Ok(())
}

/// List discovered folders and their container counts.
fn cmd_folders(source: &Path, opts: &ConvertOptions, json: bool) -> anyhow::Result<()> {
    let listings = list_folders(source, opts)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }

    println!();
    println!("  {} folder(s)", listings.len());
    println!();
    if listings.is_empty() {
        return Ok(());
    }

    println!("  {:<40} {:>10}  {}", "Output", "Messages", "Source");
    println!("  {}", "-".repeat(90));
    for listing in &listings {
        println!(
            "  {:<40} {:>10}  {}",
            format!("{}.mbox", listing.name),
            listing.containers,
            listing.source.display()
        );
    }
    println!();
    Ok(())
}

/// Decode one `.emlx` file and write its mbox entry to stdout.
fn cmd_show(path: &Path, opts: &ConvertOptions) -> anyhow::Result<()> {
    let content = emlx::read_message(path)?;
    let entry = opts
        .encoder()
        .encode(&DecodedMessage::new(&content), Local::now().naive_local());
    std::io::stdout().write_all(entry.as_bytes())?;
    Ok(())
}

/// Print a conversion report as a human-readable table.
fn print_report_table(report: &TreeReport, mbox_dir: &Path, elapsed: std::time::Duration) {
    use humansize::{format_size, BINARY};

    println!();
    println!("  {:<30} {:>10} {:>12}", "Mailbox", "Messages", "Size");
    println!("  {}", "-".repeat(54));
    for (name, count) in &report.counts {
        let size = std::fs::metadata(mbox_dir.join(format!("{name}.mbox")))
            .map(|m| m.len())
            .unwrap_or(0);
        println!(
            "  {:<30} {:>10} {:>12}",
            name,
            count,
            format_size(size, BINARY)
        );
    }
    println!();
    println!("  {:<20} {}", "Folders scanned", report.folders_scanned);
    println!("  {:<20} {}", "Empty folders", report.empty_folders);
    println!("  {:<20} {}", "Messages written", report.total_messages());
    if report.messages_skipped > 0 {
        println!("  {:<20} {}", "Messages skipped", report.messages_skipped);
    }
    println!("  {:<20} {:.2?}", "Time", elapsed);
    println!("  {:<20} {}", "Output", mbox_dir.display());

    if !report.failures.is_empty() {
        println!();
        println!("  {} folder(s) failed:", report.failures.len());
        for failure in &report.failures {
            println!("    {}: {}", failure.name, failure.error);
        }
    }
    println!();
}
