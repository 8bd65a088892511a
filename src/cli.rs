use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "cookbump", version, about = "Bump cookbook versions in place")]
pub struct Cli {
    /// Log decisions to stderr. `RUST_LOG` takes precedence when set.
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Bump the major, minor or patch level of a cookbook's version.
    Bump(BumpArgs),
    /// Print the git repository enclosing a cookbook.
    Repo(RepoArgs),
    /// List the tags of the git repository enclosing a cookbook.
    Tags(TagsArgs),
}

#[derive(Debug, Args, Clone, Default)]
pub struct ConfigArgs {
    /// Path to a config file. Defaults to cookbump.toml, then .cookbump.toml in current directory.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Directory holding cookbooks. Overrides `cookbook_path` from the config file.
    #[arg(short = 'o', long = "cookbook-path")]
    pub cookbook_path: Vec<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct BumpArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
    /// Show the metadata change without writing it.
    #[arg(long)]
    pub dry_run: bool,
    /// COOKBOOK followed by MAJOR, MINOR or PATCH.
    #[arg(value_name = "ARGS", num_args = 0..)]
    pub args: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct RepoArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
    pub cookbook: String,
}

#[derive(Debug, Args, Clone)]
pub struct TagsArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
    /// Skip the confirmation prompt.
    #[arg(long)]
    pub yes: bool,
    pub cookbook: String,
}
