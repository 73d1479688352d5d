use std::io::{BufRead, Write};
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use tracing::debug;

use extent_rs::storage::disk::BlockDevice;
use extent_rs::{Attr, ExtentEngine, ExtentStore, InodeKind, Status};

/// Longest prefix of file contents echoed by `get`.
const ECHO_LIMIT: usize = 64;

/// Free-space probe for the `free` command; not part of the extent interface.
pub trait FreeBlocks {
    fn free_blocks(&self) -> u32;
}

impl<D: BlockDevice> FreeBlocks for ExtentEngine<D> {
    fn free_blocks(&self) -> u32 {
        self.allocator().free_count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create(InodeKind),
    Put { inum: u32, data: Vec<u8> },
    Get(u32),
    Stat(u32),
    Remove(u32),
    Free,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim_start();
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        let mut args = rest.split_whitespace();
        let mut next = |what: &str| args.next().ok_or_else(|| anyhow!("{word}: missing {what}"));

        let cmd = match word {
            "create" => Self::Create(parse_kind(next("kind")?)?),
            "put" => {
                let inum = parse_inum(next("inum")?)?;
                let text = rest.trim_start().split_once(' ').map_or("", |(_, text)| text);
                Self::Put {
                    inum,
                    data: text.as_bytes().to_vec(),
                }
            }
            "fill" => {
                let inum = parse_inum(next("inum")?)?;
                let len: usize = next("len")?.parse().context("fill: bad length")?;
                let byte: u8 = next("byte")?.parse().context("fill: bad byte")?;
                Self::Put {
                    inum,
                    data: vec![byte; len],
                }
            }
            "get" => Self::Get(parse_inum(next("inum")?)?),
            "stat" => Self::Stat(parse_inum(next("inum")?)?),
            "rm" => Self::Remove(parse_inum(next("inum")?)?),
            "free" => Self::Free,
            other => bail!("unknown command {other:?}"),
        };
        Ok(cmd)
    }
}

fn parse_inum(s: &str) -> Result<u32> {
    s.parse().with_context(|| format!("bad inode number {s:?}"))
}

fn parse_kind(s: &str) -> Result<InodeKind> {
    match s {
        "file" => Ok(InodeKind::File),
        "dir" => Ok(InodeKind::Dir),
        "symlink" => Ok(InodeKind::Symlink),
        other => bail!("unknown inode kind {other:?}"),
    }
}

pub const fn kind_name(kind: InodeKind) -> &'static str {
    match kind {
        InodeKind::Free => "free",
        InodeKind::Dir => "dir",
        InodeKind::File => "file",
        InodeKind::Symlink => "symlink",
    }
}

fn describe(attr: &Attr) -> String {
    format!(
        "{} size={} atime={} mtime={} ctime={}",
        kind_name(attr.kind),
        attr.size,
        attr.atime,
        attr.mtime,
        attr.ctime
    )
}

fn echo(data: &[u8]) -> String {
    let shown = &data[..data.len().min(ECHO_LIMIT)];
    let mut out = format!("{} {}", data.len(), shown.escape_ascii());
    if data.len() > ECHO_LIMIT {
        out.push_str("...");
    }
    out
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScriptSummary {
    pub commands: u32,
    pub failures: u32,
}

/// Executes one command and renders its result line.
pub fn execute<S: ExtentStore + FreeBlocks>(store: &mut S, cmd: &Command) -> (Status, String) {
    let (status, detail) = match cmd {
        Command::Create(kind) => {
            let res = store.create(*kind);
            (Status::of(&res), res.map(|inum| inum.to_string()))
        }
        Command::Put { inum, data } => {
            let res = store.put(*inum, data);
            (Status::of(&res), res.map(|()| String::new()))
        }
        Command::Get(inum) => {
            let res = store.get(*inum);
            (Status::of(&res), res.map(|data| echo(&data)))
        }
        Command::Stat(inum) => {
            let res = store.getattr(*inum);
            (Status::of(&res), res.map(|attr| describe(&attr)))
        }
        Command::Remove(inum) => {
            let res = store.remove(*inum);
            (Status::of(&res), res.map(|()| String::new()))
        }
        Command::Free => (Status::Ok, Ok(store.free_blocks().to_string())),
    };
    let detail = detail.unwrap_or_else(|err| err.to_string());
    (status, detail)
}

/// Runs a script line by line, writing one status line per command.
///
/// # Errors
/// Fails on unreadable input, a line that does not parse, or a write error.
pub fn run_script<S, R, W>(store: &mut S, input: R, mut out: W) -> Result<ScriptSummary>
where
    S: ExtentStore + FreeBlocks,
    R: BufRead,
    W: Write,
{
    let mut summary = ScriptSummary::default();
    for (idx, line) in input.lines().enumerate() {
        let line = line.context("failed to read script")?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let cmd: Command = trimmed
            .parse()
            .with_context(|| format!("line {}", idx + 1))?;
        let (status, detail) = execute(store, &cmd);
        debug!(line = idx + 1, %status, "script command");

        summary.commands += 1;
        if status != Status::Ok {
            summary.failures += 1;
        }
        if detail.is_empty() {
            writeln!(out, "{status}")?;
        } else {
            writeln!(out, "{status} {detail}")?;
        }
    }
    Ok(summary)
}
