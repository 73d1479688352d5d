//! In-memory inode storage engine: block store, allocator, inode table and extent logic.
#![allow(clippy::cargo_common_metadata)]

pub mod config;
pub mod error;
pub mod extent;
pub mod layout;
pub mod metrics;
pub mod storage;

pub use config::EngineConfig;
pub use error::{ExtentError, ExtentResult, Status};
pub use extent::{Attr, ExtentEngine, ExtentStore};
pub use layout::inode::InodeKind;
