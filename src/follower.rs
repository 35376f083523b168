//! Following a single file from a byte offset.

use crate::config::StartPosition;
use crate::error::Result;
use crate::fs::{FileSystem, LocalFs, stat_regular};
use crate::notice::{Notice, Update};
use std::path::{Path, PathBuf};

/// Follows one path, reporting bytes appended since the previous call.
///
/// The cursor is `None` while the file does not exist. A file that shows up
/// again is read from the beginning.
#[derive(Debug)]
pub struct FileFollower<F = LocalFs> {
    fs: F,
    path: PathBuf,
    offset: Option<u64>,
    pending: Vec<Notice>,
}

impl FileFollower<LocalFs> {
    /// Follows a path on the local filesystem.
    pub fn open<P: Into<PathBuf>>(path: P, start: StartPosition) -> Result<Self> {
        Self::new(LocalFs, path, start)
    }
}

impl<F: FileSystem> FileFollower<F> {
    /// Creates a follower and resolves `start` against the current file size.
    ///
    /// Notices raised here are delivered with the first [`FileFollower::get`].
    pub fn new<P: Into<PathBuf>>(fs: F, path: P, start: StartPosition) -> Result<Self> {
        let path = path.into();
        let mut pending = Vec::new();

        let offset = match stat_regular(&fs, &path)? {
            Some(stat) => {
                let (offset, notice) = resolve_start(start, stat.len);
                pending.extend(notice);
                Some(offset)
            }
            None => {
                pending.push(Notice::Missing { path: path.clone() });
                None
            }
        };
        pending.push(Notice::Following {
            path: path.clone(),
            offset,
        });

        Ok(Self {
            fs,
            path,
            offset,
            pending,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes already reported, or `None` while the file is missing.
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Returns whatever was appended since the last call.
    pub fn get(&mut self) -> Result<Update> {
        let mut notices = std::mem::take(&mut self.pending);
        match self.read_new(&mut notices) {
            Ok(data) => Ok(Update { data, notices }),
            Err(e) => {
                self.pending = notices;
                Err(e)
            }
        }
    }

    fn read_new(&mut self, notices: &mut Vec<Notice>) -> Result<Vec<u8>> {
        let size = match stat_regular(&self.fs, &self.path)? {
            Some(stat) => stat.len,
            None => {
                if self.offset.take().is_some() {
                    notices.push(Notice::Disappeared {
                        path: self.path.clone(),
                    });
                }
                return Ok(Vec::new());
            }
        };

        let offset = match self.offset {
            Some(offset) => offset,
            None => {
                notices.push(Notice::Created {
                    path: self.path.clone(),
                });
                self.offset = Some(0);
                0
            }
        };

        if detect_shrink(size, offset) {
            self.offset = Some(size);
            notices.push(Notice::Shrunk {
                path: self.path.clone(),
                size,
            });
            return Ok(Vec::new());
        }
        if offset == size {
            return Ok(Vec::new());
        }

        let data = self.fs.read_from(&self.path, offset)?;
        self.offset = Some(offset + data.len() as u64);
        Ok(data)
    }
}

/// Resolves a start position against a file of `size` bytes, clamping
/// requests that fall outside the file.
pub(crate) fn resolve_start(start: StartPosition, size: u64) -> (u64, Option<Notice>) {
    match start {
        StartPosition::End => (size, None),
        StartPosition::Start => (0, None),
        StartPosition::FromStart(requested) if requested > size => {
            (size, Some(Notice::SeekPastEnd { requested, size }))
        }
        StartPosition::FromStart(requested) => (requested, None),
        StartPosition::FromEnd(requested) if requested > size => {
            (0, Some(Notice::SeekBeforeStart { requested, size }))
        }
        StartPosition::FromEnd(requested) => (size - requested, None),
    }
}

/// Detect if the file was truncated by comparing current size with the cursor
fn detect_shrink(current_size: u64, offset: u64) -> bool {
    current_size < offset
}
