mod tree;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use serde::Serialize;

use notefold::intermediate::{fold_tags, Notebook, Tag};
use notefold::{convert_into, converter_for, ConvertConfig};

#[derive(Parser)]
#[command(name = "notefold", about = "Convert note app exports into one notebook tree", version)]
struct Cli {
    /// Files or folders to convert (.json clipto, .csv todoist, .ctd cherrytree, folder obsidian)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Folder for decoded attachments (overrides the config file)
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Print the converted tree as JSON
    #[arg(long)]
    json: bool,

    /// Stop at the first input that fails
    #[arg(long)]
    fail_fast: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Output<'a> {
    root: &'a Notebook,
    tags: &'a [Tag],
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let mut config = match &cli.config {
        Some(path) => ConvertConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ConvertConfig::default(),
    };
    if cli.scratch_dir.is_some() {
        config.scratch_dir = cli.scratch_dir.clone();
    }

    let mut root = Notebook::root();
    let mut tags = Vec::new();
    let mut failed = 0;

    for input in &cli.inputs {
        let result = converter_for(input, &config)
            .and_then(|mut converter| convert_into(converter.as_mut(), input, &mut root));
        match result {
            Ok(input_tags) => tags.extend(input_tags),
            Err(e) if !cli.fail_fast => {
                error!("Failed to convert {}: {}", input.display(), e);
                failed += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to convert {}", input.display()))
            }
        }
    }
    let tags = fold_tags(tags);

    if cli.json {
        let output = Output { root: &root, tags: &tags };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        tree::print(&root);
    }

    info!(
        "{} notes in {} notebooks, {} failed inputs",
        root.note_count(),
        root.notebook_count(),
        failed
    );
    if failed > 0 {
        anyhow::bail!("{} of {} inputs failed", failed, cli.inputs.len());
    }
    Ok(())
}
