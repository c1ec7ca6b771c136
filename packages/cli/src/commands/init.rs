use anyhow::Result;
use arbor_engine::{EngineConfig, DEFAULT_CONFIG_NAME};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Maximum functional component nesting before rendering fails
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let mut config = EngineConfig::default();
    if let Some(depth) = args.max_depth {
        config.max_functional_depth = depth;
    }

    fs::write(&config_path, config.to_json_pretty()?)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("Next steps:");
    println!("  1. Describe a tree in tree.json");
    println!("  2. Run: arbor render tree.json");

    Ok(())
}
