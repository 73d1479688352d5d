use thiserror::Error;

use crate::layout::MAX_FILE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtentError {
    #[error("inode {0} not found")]
    NotFound(u32),
    #[error("block {0} is outside the disk")]
    BlockOutOfRange(u32),
    #[error("inode {inum} is corrupt: {reason}")]
    Corrupt { inum: u32, reason: &'static str },
    #[error("out of data blocks: need {needed}, {free} free")]
    NoSpace { needed: u32, free: u32 },
    #[error("inode table exhausted")]
    InodeTableFull,
    #[error("file size {0} exceeds the {max} byte limit", max = MAX_FILE_SIZE)]
    FileTooLarge(usize),
    #[error("cannot create an inode with the free type tag")]
    InvalidKind,
}

pub type ExtentResult<T> = Result<T, ExtentError>;

/// Status codes spoken across the extent interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NoEnt,
    IoErr,
    /// Reserved for the naming layer above the engine; never produced here.
    Exist,
}

impl Status {
    #[must_use]
    pub fn of<T>(res: &ExtentResult<T>) -> Self {
        match res {
            Ok(_) => Self::Ok,
            Err(err) => Self::from(err),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NoEnt => "NOENT",
            Self::IoErr => "IOERR",
            Self::Exist => "EXIST",
        }
    }
}

impl From<&ExtentError> for Status {
    fn from(err: &ExtentError) -> Self {
        match err {
            ExtentError::NotFound(_) => Self::NoEnt,
            _ => Self::IoErr,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
