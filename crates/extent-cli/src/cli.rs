use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use extent_rs::EngineConfig;
use extent_rs::layout::{DEFAULT_BLOCK_COUNT, DEFAULT_INODE_COUNT, MAX_FILE_SIZE};

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub engine: EngineArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the superblock and region boundaries.
    Layout,

    /// Grow a file into the indirect range and shrink it back.
    Scenario,

    /// Run extent commands from a file, or stdin when no path is given.
    Script {
        path: Option<PathBuf>,
    },

    /// Random create/put/get/remove mix checked against a shadow copy.
    Workload(WorkloadArgs),
}

#[derive(Args, Debug, Clone, Copy)]
pub struct EngineArgs {
    #[arg(long, env = "EXTENT_BLOCK_COUNT", default_value_t = DEFAULT_BLOCK_COUNT)]
    pub block_count: u32,

    #[arg(long, env = "EXTENT_INODE_COUNT", default_value_t = DEFAULT_INODE_COUNT)]
    pub inode_count: u32,

    #[arg(long, env = "EXTENT_LEGACY_ROOT_ALIAS")]
    pub legacy_root_alias: bool,
}

impl From<EngineArgs> for EngineConfig {
    fn from(args: EngineArgs) -> Self {
        Self {
            block_count: args.block_count,
            inode_count: args.inode_count,
            legacy_root_alias: args.legacy_root_alias,
        }
    }
}

#[derive(Args, Debug, Clone, Copy)]
pub struct WorkloadArgs {
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    #[arg(long, default_value_t = 1000)]
    pub ops: u32,

    #[arg(long, default_value_t = MAX_FILE_SIZE)]
    pub max_size: usize,
}
