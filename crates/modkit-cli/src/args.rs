use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "modkit")]
#[command(about = "Plugin package manager for extensible chat assistants")]
#[command(version)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Base directory (default: ~/.modkit)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List installed plugins and their state
    List,

    /// Enable a plugin
    Enable {
        /// Plugin id
        id: String,
    },

    /// Disable a plugin
    Disable {
        /// Plugin id
        id: String,
    },

    /// Install a plugin from the registered sources, or from a local file
    Install {
        /// Install address: <plugin_id> or <source_id>/<plugin_id>
        #[arg(required_unless_present = "file")]
        address: Option<String>,

        /// Install from a local plugin file instead of a source
        #[arg(short, long, conflicts_with = "address")]
        file: Option<PathBuf>,
    },

    /// Export a plugin file for sharing
    Upload {
        /// Plugin id
        id: String,

        /// Output directory (default: current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove an installed plugin
    Remove {
        /// Plugin id
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Re-fetch every registered source
    Update,

    /// Search modules across all sources
    Search {
        /// Keyword matched against module names and ids
        keyword: String,
    },

    /// Manage plugin sources
    Source {
        #[command(subcommand)]
        action: SourceAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate a source manifest from a directory of plugin files
    Publish {
        /// Directory containing plugin files
        dir: PathBuf,

        /// Source display name
        #[arg(long)]
        name: String,

        /// Stable source id
        #[arg(long)]
        id: String,

        /// Base url prefixed to every module path
        #[arg(long)]
        base_url: String,

        /// Output file (default: <dir>/source.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum SourceAction {
    /// List registered sources
    List,

    /// Fetch a manifest and register it as a new source
    Add {
        /// Manifest url
        url: String,
    },

    /// Remove a source by its 1-based list index
    Remove {
        /// Index as shown by `modkit source list`
        index: usize,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show all config values
    List,

    /// Get one value
    Get { key: String },

    /// Set one value
    Set { key: String, value: String },

    /// Write the commented default config file
    Init,
}
