use anyhow::Result;
use clap::Parser;
use episodify::{
    executor::Reveal,
    history,
    prompt::TerminalPrompter,
    session::{Session, SessionOptions},
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Folder holding the episodes; prompted for when omitted
    folder: Option<PathBuf>,
    /// Show the renames without touching any file
    #[arg(long)]
    dry_run: bool,
    /// Do not open the folder in the file browser afterwards
    #[arg(long)]
    no_open: bool,
    /// Where previously entered values are remembered
    #[arg(long, env = "EPISODIFY_HISTORY_FILE")]
    history_file: Option<PathBuf>,
    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("episodify=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("episodify=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    init_logging(args.verbose);

    let options = SessionOptions {
        history_path: args.history_file.unwrap_or_else(history::default_path),
        dry_run: args.dry_run,
        reveal: if args.no_open || args.dry_run {
            Reveal::Skip
        } else {
            Reveal::Open
        },
    };

    let mut session = Session::new(TerminalPrompter::new(args.folder), options);
    session.run().await
}
