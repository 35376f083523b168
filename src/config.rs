//! Configuration for following the newest file.

use crate::error::{Error, Result};
use std::time::Duration;

/// Default time between poll cycles.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// Default pattern: everything in the current directory.
pub const DEFAULT_PATTERN: &str = "*";

/// Where to start reading the first file opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartPosition {
    /// Only show bytes appended after startup.
    #[default]
    End,
    /// Show the whole file.
    Start,
    /// Start at an absolute byte offset.
    FromStart(u64),
    /// Start this many bytes before the end of the file.
    FromEnd(u64),
}

impl StartPosition {
    /// Maps a signed byte count, as given on the command line.
    ///
    /// `0` means the start of the file, negative values count back from the end.
    pub fn from_signed(bytes: i64) -> Self {
        match bytes {
            0 => StartPosition::Start,
            n if n < 0 => StartPosition::FromEnd(n.unsigned_abs()),
            n => StartPosition::FromStart(n as u64),
        }
    }
}

/// Settings for a [`crate::NewestFileStream`].
#[derive(Debug, Clone, PartialEq)]
pub struct FollowConfig {
    pub patterns: Vec<String>,
    pub start: StartPosition,
    pub interval: Duration,
    pub quiet: bool,
    pub watch: bool,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            patterns: vec![DEFAULT_PATTERN.to_string()],
            start: StartPosition::default(),
            interval: DEFAULT_INTERVAL,
            quiet: false,
            watch: true,
        }
    }
}

impl FollowConfig {
    /// Creates a config for the given patterns with default settings otherwise.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_start(mut self, start: StartPosition) -> Self {
        self.start = start;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn with_watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    /// Checks the settings that would otherwise fail on every cycle.
    pub fn validate(&self) -> Result<()> {
        validate_patterns(&self.patterns)?;
        if self.interval.is_zero() {
            return Err(Error::InvalidInterval);
        }
        Ok(())
    }
}

/// Rejects an empty pattern list and patterns that aren't valid globs.
pub(crate) fn validate_patterns(patterns: &[String]) -> Result<()> {
    if patterns.is_empty() {
        return Err(Error::NoPatterns);
    }
    for pattern in patterns {
        if pattern.is_empty() {
            return Err(Error::InvalidPattern {
                pattern: pattern.clone(),
                message: "empty pattern".to_string(),
            });
        }
        glob::Pattern::new(pattern).map_err(|e| Error::InvalidPattern {
            pattern: pattern.clone(),
            message: e.msg.to_string(),
        })?;
    }
    Ok(())
}
