//! Cross-process creation lock.
//!
//! A lock file whose existence means "held". Its payload is
//! `<owner>:<unix millis>`, which lets any process judge the holder's age and
//! reclaim tokens left behind by a crashed peer.

mod creation;

pub use creation::{CreationLock, LockHolder, LockSettings, LockToken};

use thiserror::Error;

/// Lock file name inside the data directory.
pub const LOCK_FILE_NAME: &str = "ticket_creation.lock";

#[derive(Debug, Error)]
pub enum LockError {
    #[error("creation lock still held after {attempts} attempts")]
    Busy { attempts: u32 },

    #[error("lock file IO error: {0}")]
    Io(#[from] std::io::Error),
}
