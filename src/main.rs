//! treepack - project file-tree indexing and atomic artifact export.
//!
//! Usage:
//!   treepack tree [PATH]     Print the filtered project tree
//!   treepack pack [PATH]     Pack non-ignored files into a ZIP archive
//!   treepack pdf [PATH]      Render the project context as a PDF
//!   treepack --help          Show help

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use treepack_core::{FileNode, TreeConfig};
use treepack_export::{PdfOptions, PdfRenderer, assemble, pack_atomic};
use treepack_scan::{IgnoreCache, TreeBuilder};

#[derive(Parser)]
#[command(
    name = "treepack",
    version,
    about = "Project file-tree indexing and atomic artifact export",
    long_about = "treepack builds a filtered view of a project directory, honoring \
                  .gitignore and custom ignore rules, and exports it as a ZIP \
                  archive or a paginated PDF."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build and print the filtered project tree
    Tree {
        /// Root directory to index
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        ignore: IgnoreArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Pack non-ignored files into a ZIP archive
    Pack {
        /// Root directory to index
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        ignore: IgnoreArgs,

        /// Output archive path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Render the project context (tree + file bodies) as a PDF
    Pdf {
        /// Root directory to index
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        ignore: IgnoreArgs,

        /// Output document path
        #[arg(short, long)]
        output: PathBuf,

        /// Dark background palette
        #[arg(long)]
        dark: bool,

        /// Prefix lines with counters
        #[arg(long)]
        line_numbers: bool,

        /// Add current/total page footers
        #[arg(long)]
        page_numbers: bool,
    },
}

#[derive(Args)]
struct IgnoreArgs {
    /// Do not honor the root's .gitignore
    #[arg(long)]
    no_vcs_ignore: bool,

    /// Do not honor custom ignore rules
    #[arg(long)]
    no_custom_ignore: bool,

    /// File with custom ignore rules (gitignore syntax)
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let layer = fmt::layer().compact().with_writer(std::io::stderr);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry().with(layer).with(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Tree {
            path,
            ignore,
            format,
        } => run_tree(&path, &ignore, format),
        Command::Pack {
            path,
            ignore,
            output,
        } => run_pack(&path, &ignore, &output),
        Command::Pdf {
            path,
            ignore,
            output,
            dark,
            line_numbers,
            page_numbers,
        } => {
            let options = PdfOptions {
                dark,
                line_numbers,
                page_numbers,
            };
            run_pdf(&path, &ignore, &output, &options)
        }
    }
}

/// Build the filtered tree for a root path.
fn build_tree(path: &PathBuf, ignore: &IgnoreArgs) -> Result<FileNode> {
    let path = path.canonicalize().context("Invalid path")?;

    let custom_rules = match &ignore.rules {
        Some(file) => fs::read_to_string(file)
            .with_context(|| format!("Failed to read rules file {}", file.display()))?,
        None => String::new(),
    };

    let config = TreeConfig::builder()
        .root(path)
        .use_vcs_ignore(!ignore.no_vcs_ignore)
        .use_custom_ignore(!ignore.no_custom_ignore)
        .custom_rules(custom_rules)
        .build()
        .map_err(|e| color_eyre::eyre::eyre!(e))?;

    let builder = TreeBuilder::new(Arc::new(IgnoreCache::new()));
    let mut roots = builder.build(&config).context("Tree build failed")?;
    Ok(roots.remove(0))
}

/// Build and print the tree.
fn run_tree(path: &PathBuf, ignore: &IgnoreArgs, format: OutputFormat) -> Result<()> {
    let root = build_tree(path, ignore)?;
    match format {
        OutputFormat::Text => print_node(&root, 0),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&root)?),
    }
    Ok(())
}

/// Pack every non-ignored file into an archive.
fn run_pack(path: &PathBuf, ignore: &IgnoreArgs, output: &PathBuf) -> Result<()> {
    let root = build_tree(path, ignore)?;

    let mut entries = HashMap::new();
    collect_entries(&root, &mut entries)?;
    let count = entries.len();

    pack_atomic(&entries, output).context("Pack failed")?;
    eprintln!("Packed {} file(s) into {}", count, output.display());
    Ok(())
}

/// Render the assembled context as a PDF.
fn run_pdf(
    path: &PathBuf,
    ignore: &IgnoreArgs,
    output: &PathBuf,
    options: &PdfOptions,
) -> Result<()> {
    let root = build_tree(path, ignore)?;
    let text = assemble(&root).context("Context assembly failed")?;

    let renderer = PdfRenderer::new();
    renderer
        .render_atomic(&text, options, output)
        .context("Render failed")?;
    eprintln!("Rendered {}", output.display());
    Ok(())
}

/// Collect relative-path -> content entries for all non-ignored files.
fn collect_entries(node: &FileNode, entries: &mut HashMap<String, Vec<u8>>) -> Result<()> {
    for child in &node.children {
        if child.is_dir() {
            collect_entries(child, entries)?;
        } else if !child.is_ignored() {
            let bytes = fs::read(&child.path)
                .with_context(|| format!("Failed to read {}", child.path.display()))?;
            entries.insert(child.rel_path.display().to_string(), bytes);
        }
    }
    Ok(())
}

/// Print a node and its children as an indented listing.
fn print_node(node: &FileNode, depth: usize) {
    let indent = "  ".repeat(depth);
    let marker = if node.is_dir() { "/" } else { "" };
    let flags = match (node.vcs_ignored, node.custom_ignored) {
        (false, false) => String::new(),
        (vcs, custom) => {
            let mut parts = Vec::new();
            if vcs {
                parts.push("gitignored");
            }
            if custom {
                parts.push("custom-ignored");
            }
            format!("  [{}]", parts.join(", "))
        }
    };

    if node.is_file() {
        println!(
            "{}{}{}  {}{}",
            indent,
            node.name,
            marker,
            humansize::format_size(node.size(), humansize::BINARY),
            flags
        );
    } else {
        println!("{}{}{}{}", indent, node.name, marker, flags);
    }

    for child in &node.children {
        print_node(child, depth + 1);
    }
}
