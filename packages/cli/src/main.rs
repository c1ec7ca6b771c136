mod commands;
mod tree_json;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{diff, init, render, DiffArgs, InitArgs, RenderArgs};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Arbor CLI - reconcile JSON-described trees and inspect the mutations
#[derive(Parser, Debug)]
#[command(name = "arbor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log reconciliation decisions (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default arbor.config.json
    Init(InitArgs),

    /// Mount a JSON tree and print its markup
    Render(RenderArgs),

    /// Mount two JSON trees in sequence and print the second pass's mutations
    Diff(DiffArgs),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();
    debug!(command = ?cli.command, cwd = %cwd, "dispatching command");

    match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Render(args) => render(args, &cwd),
        Command::Diff(args) => diff(args, &cwd),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
