use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "monobuild", version, about = "Build targets of a monorepo")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build targets and everything they depend on.
    Build(BuildArgs),
    /// List the targets defined in a directory.
    List(ListArgs),
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct BuildArgs {
    /// `NAME` or `DIR:NAME`, relative to the current directory.
    /// Every target of the current directory when omitted.
    pub targets: Vec<String>,

    /// Maximum number of targets running at once.
    #[arg(short = 'j', long, value_parser = clap::value_parser!(u64).range(1..))]
    pub parallelism: Option<u64>,

    /// Default subprocess timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Plain prefixed output instead of progress spinners.
    #[arg(long)]
    pub ci: bool,

    /// Write a JSON build report to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ListArgs {
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Also list every definition found below `dir`.
    #[arg(short, long)]
    pub recursive: bool,
}
