mod cli;
mod scenario;
mod script;
mod stats;
mod workload;

use std::fs::File;
use std::io::{self, BufReader, Write};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use extent_rs::layout::{BLOCK_SIZE, MAX_FILE_SIZE};
use extent_rs::{EngineConfig, ExtentEngine, metrics};

use crate::cli::{Cli, Command};
use crate::scenario::run_scenario;
use crate::script::run_script;
use crate::stats::OpCounters;
use crate::workload::SyntheticWorkload;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::from(cli.engine);

    let counters = OpCounters::new();
    if !metrics::install_metrics_sink(counters.clone()) {
        warn!("metrics sink already installed");
    }

    let mut engine = ExtentEngine::new(config).context("failed to format engine")?;
    info!(
        block_count = config.block_count,
        inode_count = config.inode_count,
        legacy_root_alias = config.legacy_root_alias,
        "engine ready"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Layout => print_layout(&engine, &mut out)?,
        Command::Scenario => {
            run_scenario(&mut engine, &mut out)?;
            info!("scenario passed");
        }
        Command::Script { path } => {
            let summary = match path {
                Some(path) => {
                    let file = File::open(&path)
                        .with_context(|| format!("failed to open {}", path.display()))?;
                    run_script(&mut engine, BufReader::new(file), &mut out)?
                }
                None => run_script(&mut engine, io::stdin().lock(), &mut out)?,
            };
            info!(
                "script: commands={}, failures={}",
                summary.commands, summary.failures
            );
        }
        Command::Workload(args) => {
            anyhow::ensure!(
                args.max_size <= MAX_FILE_SIZE,
                "--max-size {} exceeds the {MAX_FILE_SIZE} byte file limit",
                args.max_size
            );
            let report =
                SyntheticWorkload::new(args.seed, args.max_size).run(&mut engine, args.ops)?;
            writeln!(
                out,
                "bytes_written={} bytes_read={} free_blocks={}",
                report.bytes_written,
                report.bytes_read,
                engine.allocator().free_count()
            )?;
        }
    }
    out.flush()?;

    counters.log_summary();
    Ok(())
}

fn print_layout<W: Write>(engine: &ExtentEngine, out: &mut W) -> anyhow::Result<()> {
    let layout = engine.layout();
    let sb = &layout.superblock;
    writeln!(
        out,
        "superblock: size={} nblocks={} ninodes={}",
        sb.size, sb.nblocks, sb.ninodes
    )?;
    writeln!(out, "block size: {BLOCK_SIZE}")?;
    writeln!(
        out,
        "bitmap:      blocks {}..{}",
        layout.bitmap_start,
        layout.bitmap_start + layout.bitmap_blocks
    )?;
    writeln!(
        out,
        "inode table: blocks {}..{}",
        layout.inode_table_start,
        layout.inode_table_start + layout.inode_table_blocks
    )?;
    writeln!(out, "data:        blocks {}..{}", layout.data_start, sb.nblocks)?;
    writeln!(out, "free data blocks: {}", engine.allocator().free_count())?;
    writeln!(out, "max file size: {MAX_FILE_SIZE}")?;
    Ok(())
}
