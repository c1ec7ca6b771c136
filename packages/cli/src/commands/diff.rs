use crate::tree_json::load_tree;
use anyhow::Result;
use arbor_engine::{Engine, EngineConfig, MemoryTree, TreeOp, VNode};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Tree mounted first
    pub old: PathBuf,

    /// Tree reconciled over the first one
    pub new: PathBuf,

    /// Print the operations as JSON
    #[arg(long)]
    pub json: bool,
}

/// Mutations performed by the second of two renders
#[derive(Debug, Serialize)]
pub struct DiffReport {
    pub ops: Vec<TreeOp>,
    pub summary: BTreeMap<&'static str, usize>,
    #[serde(skip)]
    pub html: String,
}

pub fn diff_trees(old: VNode, new: VNode, config: EngineConfig) -> Result<DiffReport> {
    let mut tree = MemoryTree::new();
    let container = tree.create_container("body");
    let mut engine = Engine::new(tree).with_config(config);

    engine.mount(old, container)?;
    engine.run_until_idle()?;
    engine.adapter_mut().clear_ops();

    let root = engine.mount(new, container)?;
    engine.run_until_idle()?;

    let summary = engine.adapter().summary();
    let html = engine.adapter().to_html(root);
    let ops = engine.adapter_mut().take_ops();

    Ok(DiffReport { ops, summary, html })
}

pub fn diff(args: DiffArgs, cwd: &str) -> Result<()> {
    let config = EngineConfig::load(cwd)?;
    let old = load_tree(&args.old)?;
    let new = load_tree(&args.new)?;

    let report = diff_trees(old, new, config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.ops.is_empty() {
        println!("{} No changes", "✓".green());
        return Ok(());
    }

    println!(
        "{}",
        format!("🔀 {} operations", report.ops.len()).bright_blue().bold()
    );
    for op in &report.ops {
        let detail = serde_json::to_value(op)?;
        let fields: Vec<String> = detail
            .as_object()
            .map(|object| {
                object
                    .iter()
                    .filter(|(name, _)| name.as_str() != "op")
                    .map(|(name, value)| format!("{}={}", name, value))
                    .collect()
            })
            .unwrap_or_default();
        println!("  {:<16} {}", op.kind().yellow(), fields.join(" "));
    }

    println!();
    for (kind, count) in &report.summary {
        println!("  {:<16} {}", kind.dimmed(), count);
    }
    println!();
    println!("{}", report.html);

    Ok(())
}
