//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::domain::RelationKind;

/// Generic tree engine: walk JSON trees, inject node metadata, rebuild paths from relation chains
#[derive(Parser, Debug)]
#[command(name = "rstree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory holding a local .rstree.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    /// Field holding child nodes (overrides config)
    #[arg(long, global = true)]
    pub children_key: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every node in depth-first order
    Walk {
        /// JSON tree file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Inject node metadata and print the annotated tree
    Annotate {
        /// JSON tree file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Field whose values form relation chains ("index" for positions)
        #[arg(long)]
        relation_key: Option<String>,
        /// Starting node info as JSON, e.g. '{"level": 2, "indexRelation": [3]}'
        #[arg(long)]
        start: Option<String>,
        /// Write the annotated tree to this file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Rebuild the root-to-node branch addressed by a relation chain
    Path {
        /// JSON tree file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Relation chain: JSON array or comma separated list, e.g. 0,0,1
        chain: String,
        /// Chain to match: relation | indexRelation
        #[arg(long)]
        relation_field: Option<RelationKind>,
        /// Field whose values form relation chains ("index" for positions)
        #[arg(long)]
        relation_key: Option<String>,
        /// Keep node metadata on the returned nodes
        #[arg(long)]
        keep_node_info: bool,
    },

    /// Show tree as text
    Tree {
        /// JSON tree file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Field used as node label (overrides config)
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Show config file locations
    Path,
}
