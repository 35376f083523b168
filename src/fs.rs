//! Filesystem primitives used by the followers.
//!
//! Everything that touches the disk goes through [`FileSystem`], so the
//! selection logic can be driven by an in-memory filesystem in tests.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// What kind of entry a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Dir,
    Other,
}

/// A metadata snapshot of a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub kind: FileKind,
    pub len: u64,
    pub modified: SystemTime,
}

impl FileStat {
    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Dir
    }
}

/// Glob expansion, stat and positioned reads.
pub trait FileSystem {
    /// Paths matching a glob pattern. Entries that can't be read are skipped.
    fn glob(&self, pattern: &str) -> Vec<PathBuf>;

    /// Metadata for a path, following symlinks.
    fn stat(&self, path: &Path) -> io::Result<FileStat>;

    /// All bytes from `offset` to the current end of the file.
    fn read_from(&self, path: &Path, offset: u64) -> io::Result<Vec<u8>>;
}

/// Stats a path, mapping "not found" and non-regular files to `None`.
pub(crate) fn stat_regular<F: FileSystem + ?Sized>(
    fs: &F,
    path: &Path,
) -> io::Result<Option<FileStat>> {
    match fs.stat(path) {
        Ok(stat) if stat.is_file() => Ok(Some(stat)),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Glob options shared by every filesystem: wildcards never match a
/// leading dot, so hidden files are only followed when named explicitly.
pub(crate) fn match_options() -> glob::MatchOptions {
    glob::MatchOptions {
        require_literal_leading_dot: true,
        ..glob::MatchOptions::new()
    }
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn glob(&self, pattern: &str) -> Vec<PathBuf> {
        match glob::glob_with(pattern, match_options()) {
            Ok(paths) => paths.filter_map(|entry| entry.ok()).collect(),
            Err(e) => {
                tracing::warn!(pattern, error = %e, "ignoring invalid pattern");
                Vec::new()
            }
        }
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let metadata = std::fs::metadata(path)?;
        let kind = if metadata.is_file() {
            FileKind::File
        } else if metadata.is_dir() {
            FileKind::Dir
        } else {
            FileKind::Other
        };
        Ok(FileStat {
            kind,
            len: metadata.len(),
            modified: metadata.modified()?,
        })
    }

    fn read_from(&self, path: &Path, offset: u64) -> io::Result<Vec<u8>> {
        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(offset))?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }
}
