//! Per-directory file and byte counts

use crate::error::Result;
use crate::walker::FsWalker;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Number of files and bytes under one directory.
///
/// Directories and empty files are not counted.
#[derive(Debug, Default)]
pub struct DirSize {
    path: PathBuf,
    files: AtomicU64,
    bytes: AtomicU64,
}

impl DirSize {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Account for one file. Usable directly as a walk transform.
    pub fn update(&self, path: &Path) -> io::Result<Option<PathBuf>> {
        let metadata = fs::metadata(path)?;
        if metadata.is_dir() || metadata.len() == 0 {
            return Ok(None);
        }

        self.files.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(metadata.len(), Ordering::Relaxed);
        Ok(Some(path.to_path_buf()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn files(&self) -> u64 {
        self.files.load(Ordering::Relaxed)
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Average bytes per counted file (0 when nothing was counted)
    pub fn mean(&self) -> f64 {
        match self.files() {
            0 => 0.0,
            files => self.bytes() as f64 / files as f64,
        }
    }
}

impl fmt::Display for DirSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} files {} bytes ({:.0} bytes/file)",
            self.path.display(),
            self.files(),
            self.bytes(),
            self.mean()
        )
    }
}

impl FsWalker {
    /// Count files and bytes under each of `paths`, in order.
    ///
    /// The walker is reset after each directory; the first failing
    /// directory aborts the whole count.
    pub fn count<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<Vec<DirSize>> {
        self.count_each(paths, |_| {})
    }

    /// Like [`FsWalker::count`], calling `on_counted` as soon as each
    /// directory is done
    pub fn count_each<P, F>(&mut self, paths: &[P], mut on_counted: F) -> Result<Vec<DirSize>>
    where
        P: AsRef<Path>,
        F: FnMut(&DirSize),
    {
        let mut sizes = Vec::with_capacity(paths.len());

        for path in paths {
            let size = DirSize::new(path.as_ref());
            self.walk(path, |p: &Path| size.update(p))?;
            debug!(
                path = %size.path().display(),
                files = size.files(),
                bytes = size.bytes(),
                "Directory counted"
            );

            on_counted(&size);
            sizes.push(size);
            self.reset(None);
        }

        Ok(sizes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WalkConfig;
    use crate::error::WalkerError;
    use crate::walker::{CancelToken, WalkState};
    use tempfile::TempDir;

    fn walker() -> FsWalker {
        FsWalker::with_config(WalkConfig::default().with_workers(4), CancelToken::new()).unwrap()
    }

    #[test]
    fn test_update_skips_empty_files() {
        let temp = TempDir::new().unwrap();
        let full = temp.path().join("full");
        let empty = temp.path().join("empty");
        fs::write(&full, b"12345").unwrap();
        fs::write(&empty, b"").unwrap();

        let size = DirSize::new(temp.path());
        assert_eq!(size.update(&full).unwrap(), Some(full.clone()));
        assert_eq!(size.update(&empty).unwrap(), None);
        assert_eq!(size.update(temp.path()).unwrap(), None);

        assert_eq!(size.files(), 1);
        assert_eq!(size.bytes(), 5);
    }

    #[test]
    fn test_mean_and_display() {
        let size = DirSize::new("/data");
        assert_eq!(size.mean(), 0.0);

        size.files.store(4, Ordering::Relaxed);
        size.bytes.store(13, Ordering::Relaxed);
        assert!((size.mean() - 3.25).abs() < f64::EPSILON);
        assert_eq!(size.to_string(), "/data: 4 files 13 bytes (3 bytes/file)");
    }

    #[test]
    fn test_count_multiple_directories() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        fs::create_dir(a.path().join("sub")).unwrap();
        fs::write(a.path().join("one"), vec![0u8; 100]).unwrap();
        fs::write(a.path().join("sub/two"), vec![0u8; 50]).unwrap();
        fs::write(a.path().join("sub/empty"), b"").unwrap();
        fs::write(b.path().join("three"), vec![0u8; 7]).unwrap();

        let mut walker = walker();
        let mut seen = Vec::new();
        let sizes = walker
            .count_each(&[a.path(), b.path()], |size| seen.push(size.files()))
            .unwrap();

        assert_eq!(sizes.len(), 2);
        assert_eq!((sizes[0].files(), sizes[0].bytes()), (2, 150));
        assert_eq!((sizes[1].files(), sizes[1].bytes()), (1, 7));
        assert_eq!(seen, vec![2, 1]);
        assert_eq!(walker.state(), WalkState::Idle);
    }

    #[test]
    fn test_count_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let mut walker = walker();

        let result = walker.count(&[temp.path().join("nope")]);

        assert!(matches!(result, Err(WalkerError::Traversal { .. })));
    }
}
