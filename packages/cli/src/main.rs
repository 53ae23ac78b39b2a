mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{console, export, sanitize, ConsoleArgs, ExportArgs, SanitizeArgs};
use tracing_subscriber::EnvFilter;

/// Pagecraft CLI - edit static sites in place and export clean copies
#[derive(Parser, Debug)]
#[command(name = "pagecraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Edit a site from an interactive or scripted command console
    Console(ConsoleArgs),

    /// Export pages without editor artifacts, optionally with assets
    Export(ExportArgs),

    /// Strip editor artifacts from a single HTML file
    Sanitize(SanitizeArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pagecraft=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match std::env::current_dir() {
        Ok(cwd) => {
            let cwd = cwd.display().to_string();
            match cli.command {
                Command::Console(args) => console(args, &cwd).await,
                Command::Export(args) => export(args, &cwd).await,
                Command::Sanitize(args) => sanitize(args, &cwd).await,
            }
        }
        Err(e) => Err(anyhow::anyhow!("Cannot get current directory: {e}")),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
