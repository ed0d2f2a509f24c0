//! Eligibility rules for discovered entries
//!
//! Rules are applied in order and the first match wins:
//!
//! 1. Anything that is not a regular file (directories, symlinks, sockets,
//!    fifos, devices) is not eligible. Directories are still descended into.
//! 2. With `skip_hidden`, names starting with `.` or `~` are not eligible.
//! 3. With `skip_dirs`, directories are not eligible. Rule 1 already excludes
//!    them; the flag is kept for a directory-enumerating mode.
//! 4. The base name must match the glob pattern.

use crate::config::FilterConfig;
use crate::error::{Result, WalkerError};
use globset::{GlobBuilder, GlobMatcher};
use std::ffi::OsStr;
use std::fs::FileType;
use std::path::Path;
use walkdir::DirEntry;

/// Prefixes that mark a name as hidden
const HIDDEN_PREFIXES: [char; 2] = ['.', '~'];

/// Compiled path filter
#[derive(Debug, Clone)]
pub struct PathFilter {
    skip_hidden: bool,
    skip_dirs: bool,
    matcher: GlobMatcher,
}

impl PathFilter {
    /// Compile a filter from its configuration
    pub fn new(config: &FilterConfig) -> Result<Self> {
        let glob = GlobBuilder::new(&config.pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| WalkerError::Pattern {
                pattern: config.pattern.clone(),
                source,
            })?;

        Ok(Self {
            skip_hidden: config.skip_hidden,
            skip_dirs: config.skip_dirs,
            matcher: glob.compile_matcher(),
        })
    }

    /// Decide whether a walked entry should be handed to the transform
    pub fn eligible(&self, entry: &DirEntry) -> bool {
        self.is_eligible(entry.file_type(), entry.file_name())
    }

    /// Decide eligibility from an entry's own file type (not following
    /// symlinks) and base name
    pub fn is_eligible(&self, file_type: FileType, name: &OsStr) -> bool {
        if !file_type.is_file() {
            return false;
        }

        if self.skip_hidden && is_hidden(name) {
            return false;
        }

        if self.skip_dirs && file_type.is_dir() {
            return false;
        }

        self.matcher.is_match(Path::new(name))
    }
}

/// Check if a base name marks a hidden or temporary file
pub fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with(&HIDDEN_PREFIXES[..])
}
