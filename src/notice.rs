//! Informational notices about the state of the followed files.

use std::fmt;
use std::path::PathBuf;

/// A state change worth telling the operator about.
///
/// Notices are never errors; the driver prints them to stderr unless quiet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The file did not exist when following started.
    Missing { path: PathBuf },
    /// Following started; `offset` is `None` while the file is missing.
    Following { path: PathBuf, offset: Option<u64> },
    /// A requested start offset was past the end of the file.
    SeekPastEnd { requested: u64, size: u64 },
    /// A requested start offset was before the beginning of the file.
    SeekBeforeStart { requested: u64, size: u64 },
    /// The followed file was removed.
    Disappeared { path: PathBuf },
    /// The followed file appeared again.
    Created { path: PathBuf },
    /// The followed file became smaller than what was already read.
    Shrunk { path: PathBuf, size: u64 },
    /// No pattern matched any file.
    NoFilesFound,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Missing { path } => write!(f, "{} does not exist", path.display()),
            Notice::Following {
                path,
                offset: Some(offset),
            } => write!(
                f,
                "Now following {} from position {}",
                path.display(),
                offset
            ),
            Notice::Following { path, offset: None } => {
                write!(f, "Now following {} once it is created", path.display())
            }
            Notice::SeekPastEnd { requested, size } => write!(
                f,
                "Can't seek to {requested} in a {size} byte file, starting from end of file"
            ),
            Notice::SeekBeforeStart { requested, size } => write!(
                f,
                "Can't seek to -{requested} in a {size} byte file, starting from beginning of file"
            ),
            Notice::Disappeared { path } => write!(f, "{} disappeared", path.display()),
            Notice::Created { path } => write!(f, "{} created", path.display()),
            Notice::Shrunk { path, size } => {
                write!(f, "{} shrunk to {} bytes", path.display(), size)
            }
            Notice::NoFilesFound => write!(f, "No files found"),
        }
    }
}

/// The outcome of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Update {
    /// Bytes appended to the active file since the previous cycle.
    pub data: Vec<u8>,
    /// Notices raised during the cycle, in order.
    pub notices: Vec<Notice>,
}

impl Update {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.notices.is_empty()
    }
}
