//! Test utilities for creating temporary log files and fake filesystems.

#[cfg(test)]
use crate::fs::{FileKind, FileStat, FileSystem, match_options};
#[cfg(test)]
use std::collections::BTreeMap;
#[cfg(test)]
use std::fs::{File, OpenOptions};
#[cfg(test)]
use std::io::{self, Write};
#[cfg(test)]
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::{Arc, Mutex};
#[cfg(test)]
use std::time::{Duration, SystemTime};

/// A temporary directory of log files.
#[cfg(test)]
pub struct TempLogDir {
    temp_dir: tempfile::TempDir,
}

#[cfg(test)]
impl TempLogDir {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            temp_dir: tempfile::tempdir()?,
        })
    }

    /// Path of a file inside the directory
    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Glob pattern rooted in the directory
    pub fn pattern(&self, glob: &str) -> String {
        format!("{}/{}", self.temp_dir.path().display(), glob)
    }

    /// Create or replace a file
    pub fn write(&self, name: &str, content: &str) -> io::Result<()> {
        std::fs::write(self.path(name), content)
    }

    /// Append content without adding a newline
    pub fn append(&self, name: &str, content: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(self.path(name))?;
        file.write_all(content.as_bytes())?;
        file.flush()
    }

    /// Truncate the file to `len` bytes
    pub fn truncate(&self, name: &str, len: u64) -> io::Result<()> {
        let file = OpenOptions::new().write(true).open(self.path(name))?;
        file.set_len(len)
    }

    pub fn remove(&self, name: &str) -> io::Result<()> {
        std::fs::remove_file(self.path(name))
    }

    pub fn mkdir(&self, name: &str) -> io::Result<()> {
        std::fs::create_dir_all(self.path(name))
    }

    /// Pin the modification time to `secs` after the epoch
    pub fn set_mtime(&self, name: &str, secs: i64) -> io::Result<()> {
        filetime::set_file_mtime(
            self.path(name),
            filetime::FileTime::from_unix_time(secs, 0),
        )
    }

    /// Create a file with content and a fixed modification time
    pub fn write_at(&self, name: &str, content: &str, secs: i64) -> io::Result<()> {
        File::create(self.path(name))?.write_all(content.as_bytes())?;
        self.set_mtime(name, secs)
    }
}

/// An in-memory filesystem with explicit modification times.
///
/// Clones share the same files.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    inner: Arc<Mutex<MemoryFsState>>,
}

#[cfg(test)]
#[derive(Debug, Default)]
struct MemoryFsState {
    files: BTreeMap<PathBuf, (Vec<u8>, SystemTime)>,
    // Paths that glob still returns but that fail to stat
    vanishing: Vec<PathBuf>,
    // Files that exist but that glob doesn't return
    hidden: Vec<PathBuf>,
    // Successful stats left before one fails
    stat_countdown: Option<usize>,
    deny_reads: bool,
    glob_delay: Option<Duration>,
}

#[cfg(test)]
impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&self, path: &str, content: &str, secs: u64) {
        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(secs);
        self.inner
            .lock()
            .unwrap()
            .files
            .insert(PathBuf::from(path), (content.as_bytes().to_vec(), mtime));
    }

    pub fn append(&self, path: &str, content: &str, secs: u64) {
        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(secs);
        let mut state = self.inner.lock().unwrap();
        let entry = state
            .files
            .entry(PathBuf::from(path))
            .or_insert_with(|| (Vec::new(), mtime));
        entry.0.extend_from_slice(content.as_bytes());
        entry.1 = mtime;
    }

    pub fn remove(&self, path: &str) {
        self.inner.lock().unwrap().files.remove(Path::new(path));
    }

    /// Make `path` show up in glob results but fail to stat.
    pub fn vanish_on_stat(&self, path: &str) {
        self.inner
            .lock()
            .unwrap()
            .vanishing
            .push(PathBuf::from(path));
    }

    /// Keep `path` out of glob results, as if it were mid-rename.
    pub fn hide_from_glob(&self, path: &str, hide: bool) {
        let mut state = self.inner.lock().unwrap();
        let path = PathBuf::from(path);
        state.hidden.retain(|hidden| hidden != &path);
        if hide {
            state.hidden.push(path);
        }
    }

    /// Let `successes` stat calls through, then fail the next one.
    pub fn fail_stat_after(&self, successes: usize) {
        self.inner.lock().unwrap().stat_countdown = Some(successes);
    }

    /// Block the calling thread on every glob.
    pub fn slow_glob(&self, delay: Duration) {
        self.inner.lock().unwrap().glob_delay = Some(delay);
    }

    pub fn deny_reads(&self, deny: bool) {
        self.inner.lock().unwrap().deny_reads = deny;
    }

    fn is_dir(state: &MemoryFsState, path: &Path) -> bool {
        state.files.keys().any(|file| file.starts_with(path) && file != path)
    }
}

#[cfg(test)]
impl FileSystem for MemoryFs {
    fn glob(&self, pattern: &str) -> Vec<PathBuf> {
        let Ok(pattern) = glob::Pattern::new(pattern) else {
            return Vec::new();
        };
        let options = glob::MatchOptions {
            require_literal_separator: true,
            ..match_options()
        };
        let delay = self.inner.lock().unwrap().glob_delay;
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        let state = self.inner.lock().unwrap();

        let mut entries: Vec<PathBuf> = state.files.keys().cloned().collect();
        for file in state.files.keys() {
            entries.extend(file.ancestors().skip(1).map(Path::to_path_buf));
        }
        entries.extend(state.vanishing.iter().cloned());
        entries.sort();
        entries.dedup();

        entries
            .into_iter()
            .filter(|path| !state.hidden.contains(path))
            .filter(|path| pattern.matches_path_with(path, options))
            .collect()
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let mut state = self.inner.lock().unwrap();
        match state.stat_countdown {
            Some(0) => {
                state.stat_countdown = None;
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "permission denied",
                ));
            }
            Some(n) => state.stat_countdown = Some(n - 1),
            None => {}
        }
        if let Some((content, modified)) = state.files.get(path) {
            return Ok(FileStat {
                kind: FileKind::File,
                len: content.len() as u64,
                modified: *modified,
            });
        }
        if Self::is_dir(&state, path) {
            return Ok(FileStat {
                kind: FileKind::Dir,
                len: 0,
                modified: SystemTime::UNIX_EPOCH,
            });
        }
        Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }

    fn read_from(&self, path: &Path, offset: u64) -> io::Result<Vec<u8>> {
        let state = self.inner.lock().unwrap();
        if state.deny_reads {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }
        let (content, _) = state
            .files
            .get(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))?;
        let start = (offset as usize).min(content.len());
        Ok(content[start..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_log_dir_write_and_append() {
        let dir = TempLogDir::new().unwrap();
        dir.write("a.log", "line 1\n").unwrap();
        dir.append("a.log", "line 2").unwrap();

        let content = std::fs::read_to_string(dir.path("a.log")).unwrap();
        assert_eq!(content, "line 1\nline 2");
    }

    #[test]
    fn test_temp_log_dir_truncate() {
        let dir = TempLogDir::new().unwrap();
        dir.write("a.log", "initial content").unwrap();
        dir.truncate("a.log", 0).unwrap();

        let content = std::fs::read_to_string(dir.path("a.log")).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn test_temp_log_dir_set_mtime() {
        let dir = TempLogDir::new().unwrap();
        dir.write_at("a.log", "x", 1_000).unwrap();

        let modified = std::fs::metadata(dir.path("a.log"))
            .unwrap()
            .modified()
            .unwrap();
        assert_eq!(
            modified,
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_000)
        );
    }

    #[test]
    fn test_memory_fs_glob_and_stat() {
        let fs = MemoryFs::new();
        fs.write("/logs/a.log", "aaa", 10);
        fs.write("/logs/sub/b.log", "b", 20);

        assert_eq!(
            fs.glob("/logs/*"),
            vec![PathBuf::from("/logs/a.log"), PathBuf::from("/logs/sub")]
        );
        assert!(fs.stat(Path::new("/logs")).unwrap().is_dir());
        assert_eq!(fs.stat(Path::new("/logs/a.log")).unwrap().len, 3);
        assert_eq!(
            fs.stat(Path::new("/logs/c.log")).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn test_memory_fs_glob_skips_hidden_files() {
        let fs = MemoryFs::new();
        fs.write("/logs/app.log", "a", 10);
        fs.write("/logs/.app.log.swp", "s", 20);

        assert_eq!(fs.glob("/logs/*"), vec![PathBuf::from("/logs/app.log")]);
        assert_eq!(
            fs.glob("/logs/.app.log.swp"),
            vec![PathBuf::from("/logs/.app.log.swp")]
        );
    }

    #[test]
    fn test_memory_fs_fail_stat_after() {
        let fs = MemoryFs::new();
        fs.write("/a.log", "a", 1);
        fs.fail_stat_after(1);

        assert!(fs.stat(Path::new("/a.log")).is_ok());
        assert_eq!(
            fs.stat(Path::new("/a.log")).unwrap_err().kind(),
            io::ErrorKind::PermissionDenied
        );
        assert!(fs.stat(Path::new("/a.log")).is_ok());
    }

    #[test]
    fn test_memory_fs_read_from() {
        let fs = MemoryFs::new();
        fs.write("/a.log", "hello", 1);
        fs.append("/a.log", " world", 2);

        assert_eq!(fs.read_from(Path::new("/a.log"), 6).unwrap(), b"world");

        fs.deny_reads(true);
        assert_eq!(
            fs.read_from(Path::new("/a.log"), 0).unwrap_err().kind(),
            io::ErrorKind::PermissionDenied
        );
    }
}
