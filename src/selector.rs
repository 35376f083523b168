//! Selecting and following the newest of a set of files.
//!
//! Every cycle the patterns are expanded again and the file with the latest
//! modification time becomes the active one. When the active file changes
//! the old follower is dropped and a new one starts at:
//!
//! - the configured [`StartPosition`] on the very first cycle,
//! - the size recorded in the previous cycle if the file was a candidate then,
//! - the beginning of the file otherwise.

use crate::config::{StartPosition, validate_patterns};
use crate::error::Result;
use crate::follower::FileFollower;
use crate::fs::{FileStat, FileSystem, LocalFs};
use crate::notice::{Notice, Update};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Stat snapshot of every candidate, taken once per cycle.
type CandidateSet = BTreeMap<PathBuf, FileStat>;

/// Follows whichever file matching the patterns was modified last.
#[derive(Debug)]
pub struct NewestFileSelector<F = LocalFs> {
    fs: F,
    patterns: Vec<String>,
    start: StartPosition,
    active: Option<PathBuf>,
    inner: Option<FileFollower<F>>,
    candidates: CandidateSet,
    first_cycle: bool,
}

impl NewestFileSelector<LocalFs> {
    /// Creates a selector over the local filesystem.
    pub fn new(patterns: Vec<String>, start: StartPosition) -> Result<Self> {
        Self::with_fs(LocalFs, patterns, start)
    }
}

impl<F: FileSystem + Clone> NewestFileSelector<F> {
    pub fn with_fs(fs: F, patterns: Vec<String>, start: StartPosition) -> Result<Self> {
        validate_patterns(&patterns)?;
        Ok(Self {
            fs,
            patterns,
            start,
            active: None,
            inner: None,
            candidates: CandidateSet::new(),
            first_cycle: true,
        })
    }

    /// The file currently being followed.
    pub fn active_path(&self) -> Option<&Path> {
        self.active.as_deref()
    }

    /// Candidates seen in the most recent cycle.
    pub fn candidates(&self) -> impl Iterator<Item = &Path> {
        self.candidates.keys().map(PathBuf::as_path)
    }

    /// Runs one cycle: re-select the newest file and return what was appended to it.
    pub fn get(&mut self) -> Result<Update> {
        let snapshot = self.snapshot();
        let previous = std::mem::replace(&mut self.candidates, snapshot);
        let first_cycle = self.first_cycle;

        let Some(newest) = newest(&self.candidates).map(Path::to_path_buf) else {
            self.first_cycle = false;
            let mut update = self.retire()?;
            if first_cycle || !previous.is_empty() {
                update.notices.push(Notice::NoFilesFound);
            }
            return Ok(update);
        };

        if self.active.as_ref() != Some(&newest) {
            let start = if first_cycle {
                self.start
            } else {
                match previous.get(&newest) {
                    Some(stat) => StartPosition::FromStart(stat.len),
                    None => StartPosition::Start,
                }
            };
            tracing::debug!(
                path = %newest.display(),
                previous = ?self.active,
                ?start,
                "switching to newest file"
            );

            if !self.can_resume(&newest) {
                self.inner = Some(FileFollower::new(self.fs.clone(), &newest, start)?);
            }
            self.active = Some(newest);
        }
        // The configured start applies until a follower has been opened
        self.first_cycle = false;

        match self.inner.as_mut() {
            Some(follower) => follower.get(),
            None => Ok(Update::default()),
        }
    }

    /// Expands every pattern and stats the resulting files.
    fn snapshot(&self) -> CandidateSet {
        let mut candidates = CandidateSet::new();
        for pattern in &self.patterns {
            expand_pattern(&self.fs, pattern, &mut candidates);
        }
        candidates
    }

    /// Drops the active path once no candidates are left.
    ///
    /// The follower is polled one last time so a removed file is reported,
    /// and kept around in case the same path shows up again.
    fn retire(&mut self) -> Result<Update> {
        if self.active.take().is_none() {
            return Ok(Update::default());
        }
        match self.inner.as_mut() {
            Some(follower) => follower.get(),
            None => Ok(Update::default()),
        }
    }

    /// Whether the parked follower is for `path` and can pick up where it stopped.
    fn can_resume(&self, path: &Path) -> bool {
        self.active.is_none()
            && self
                .inner
                .as_ref()
                .is_some_and(|follower| follower.path() == path)
    }
}

/// Adds the files matching `pattern` to `candidates`.
///
/// A directory given literally is expanded one level. Paths that can't be
/// stated are skipped for this cycle.
fn expand_pattern<F: FileSystem>(fs: &F, pattern: &str, candidates: &mut CandidateSet) {
    for path in fs.glob(pattern) {
        match fs.stat(&path) {
            Ok(stat) if stat.is_file() => {
                candidates.insert(path, stat);
            }
            Ok(stat) if stat.is_dir() && path == Path::new(pattern) => {
                expand_pattern(fs, &directory_pattern(pattern), candidates);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping candidate");
            }
        }
    }
}

/// Glob matching the immediate children of `dir`.
fn directory_pattern(dir: &str) -> String {
    let escaped = glob::Pattern::escape(dir);
    format!("{}/*", escaped.trim_end_matches('/'))
}

/// The candidate with the latest modification time.
///
/// Ties go to the path that sorts first.
fn newest(candidates: &CandidateSet) -> Option<&Path> {
    let mut newest: Option<(&PathBuf, &FileStat)> = None;
    for (path, stat) in candidates {
        if newest.is_none_or(|(_, best)| stat.modified > best.modified) {
            newest = Some((path, stat));
        }
    }
    newest.map(|(path, _)| path.as_path())
}
