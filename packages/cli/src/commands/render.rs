use crate::tree_json::load_tree;
use anyhow::Result;
use arbor_engine::{Engine, EngineConfig, MemoryTree};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// JSON tree to render
    pub input: PathBuf,

    /// Tag of the container the tree is mounted into
    #[arg(short, long, default_value = "body")]
    pub container: String,

    /// Print the container markup instead of the root node
    #[arg(long)]
    pub outer: bool,

    /// Print the adapter operation counts to stderr
    #[arg(short, long)]
    pub stats: bool,
}

pub fn render(args: RenderArgs, cwd: &str) -> Result<()> {
    let config = EngineConfig::load(cwd)?;
    let vnode = load_tree(&args.input)?;

    let mut tree = MemoryTree::new();
    let container = tree.create_container(&args.container);
    let mut engine = Engine::new(tree).with_config(config);

    let root = engine.mount(vnode, container)?;
    engine.run_until_idle()?;

    let tree = engine.adapter();
    let markup = if args.outer {
        tree.to_html(container)
    } else {
        tree.to_html(root)
    };
    println!("{}", markup);

    if args.stats {
        eprintln!();
        eprintln!("{} {} nodes", "✓".green(), tree.node_count());
        for (kind, count) in tree.summary() {
            eprintln!("  {:<16} {}", kind.dimmed(), count);
        }
    }

    Ok(())
}
