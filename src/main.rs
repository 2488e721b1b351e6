use clap::{Parser, Subcommand};
use gaggle::gaggle::{FileType, Gaggle, WriteOptions};
use gaggle::DiagnosticLog;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gaggle", about = "Read and rewrite Anki notes-in-plain-text exports")]
struct Cli {
    /// Log more (repeat for trace output). RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the header and every card of an export file
    Show {
        input: PathBuf,
        /// Field names, one per column. Use "" to keep a default name
        #[arg(short, long = "field")]
        fields: Vec<String>,
    },
    /// Print the header settings as JSON
    Header {
        input: PathBuf,
    },
    /// Parse an export file and write it back out under a fresh name
    Rewrite {
        input: PathBuf,
        #[arg(short, long = "field")]
        fields: Vec<String>,
        #[arg(short = 'o', long, default_value = ".")]
        destination: PathBuf,
        /// Output file stem (default: GaggleFile<n>)
        #[arg(short, long)]
        name: Option<String>,
        /// Appended to the output name
        #[arg(short, long, default_value = "")]
        extension: String,
        #[arg(long, default_value = ".txt")]
        file_type: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {

        // ── Show ─────────────────────────────────────────────────────────────
        Commands::Show { input, fields } => {
            let (gaggle, log) = Gaggle::from_path(&input, &fields)?;
            report(&log);
            let deck = gaggle.get_deck(0)?;
            println!("── {} ──", input.display());
            for (key, value) in deck.header().iter() {
                println!("  {:<16} {}", key.internal_name(), value);
            }
            print!("{gaggle}");
        }

        // ── Header ───────────────────────────────────────────────────────────
        Commands::Header { input } => {
            let (gaggle, log) = Gaggle::from_path(&input, &[] as &[&str])?;
            report(&log);
            let header = gaggle.get_deck(0)?.header();
            println!("{}", serde_json::to_string_pretty(header)?);
        }

        // ── Rewrite ──────────────────────────────────────────────────────────
        Commands::Rewrite { input, fields, destination, name, extension, file_type } => {
            let (gaggle, log) = Gaggle::from_path(&input, &fields)?;
            report(&log);
            let opts = WriteOptions {
                filename: name,
                file_type: file_type.parse::<FileType>()?,
                destination,
                extension,
            };
            let path = gaggle.write_deck_to_file(0, &opts)?;
            println!("Written: {}", path.display());
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report(log: &DiagnosticLog) {
    if !log.is_empty() {
        eprintln!("{} naming warning(s):", log.len());
        for diagnostic in log {
            eprintln!("  {diagnostic}");
        }
    }
}
