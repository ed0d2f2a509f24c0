//! Uniform random sampling of a directory tree
//!
//! Every eligible file under `src` is copied to the same relative location
//! under `dst` with probability `fraction`, independently of every other
//! file.

use crate::error::{BoxError, ConfigError, Result};
use crate::fsutil::{copy_file, mkdir};
use crate::walker::FsWalker;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Permissions of sampled copies
pub const SAMPLE_FILE_MODE: u32 = 0o644;

/// Outcome of a [`FsWalker::sample`] run
#[derive(Debug, Clone, PartialEq)]
pub struct SampleReport {
    /// Files copied into the destination
    pub sampled: u64,

    /// Eligible files seen in the source
    pub total: u64,

    /// Wall-clock time of the walk
    pub duration: Duration,
}

impl SampleReport {
    /// Share of eligible files that were copied, in percent
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.sampled as f64 / self.total as f64 * 100.0
        }
    }
}

impl fmt::Display for SampleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sampled {} of {} files ({:.1}%) in {:.3?}",
            self.sampled,
            self.total,
            self.percent(),
            self.duration
        )
    }
}

impl FsWalker {
    /// Copy a random sample of the files under `src` into `dst`.
    ///
    /// `fraction` must be within `0.0..=1.0`: `0.0` copies nothing and `1.0`
    /// copies every eligible file. Destination directories are created as
    /// needed and copies get [`SAMPLE_FILE_MODE`] permissions.
    pub fn sample(
        &mut self,
        src: impl AsRef<Path>,
        dst: impl AsRef<Path>,
        fraction: f64,
    ) -> Result<SampleReport> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ConfigError::InvalidSampleFraction { fraction }.into());
        }

        self.ensure_idle()?;

        let src = src.as_ref();
        let dst = dst.as_ref();
        mkdir(dst)?;

        self.walk(src, |path: &Path| -> std::result::Result<Option<PathBuf>, BoxError> {
            if rand::random::<f64>() >= fraction {
                return Ok(None);
            }

            let target = dst.join(path.strip_prefix(src)?);
            if let Some(parent) = target.parent() {
                mkdir(parent)?;
            }
            copy_file(path, &target, SAMPLE_FILE_MODE)?;
            Ok(Some(target))
        })?;

        let report = SampleReport {
            sampled: self.results(),
            total: self.paths(),
            duration: self.duration(),
        };
        info!(
            src = %src.display(),
            dst = %dst.display(),
            sampled = report.sampled,
            total = report.total,
            "Sample complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WalkConfig;
    use crate::error::WalkerError;
    use crate::walker::CancelToken;
    use std::fs;
    use tempfile::TempDir;

    fn walker() -> FsWalker {
        FsWalker::with_config(WalkConfig::default().with_workers(4), CancelToken::new()).unwrap()
    }

    fn source_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a/b")).unwrap();
        fs::write(temp.path().join("top.txt"), b"top").unwrap();
        fs::write(temp.path().join("a/mid.txt"), b"mid").unwrap();
        fs::write(temp.path().join("a/b/deep.txt"), b"deep").unwrap();
        fs::write(temp.path().join("a/.secret"), b"hidden").unwrap();
        temp
    }

    #[test]
    fn test_full_sample_mirrors_tree() {
        let src = source_tree();
        let dst = TempDir::new().unwrap();
        let out = dst.path().join("sample");

        let report = walker().sample(src.path(), &out, 1.0).unwrap();

        assert_eq!(report.sampled, 3);
        assert_eq!(report.total, 3);
        assert_eq!(fs::read(out.join("top.txt")).unwrap(), b"top");
        assert_eq!(fs::read(out.join("a/mid.txt")).unwrap(), b"mid");
        assert_eq!(fs::read(out.join("a/b/deep.txt")).unwrap(), b"deep");
        assert!(!out.join("a/.secret").exists());
    }

    #[test]
    fn test_empty_sample_copies_nothing() {
        let src = source_tree();
        let dst = TempDir::new().unwrap();

        let report = walker().sample(src.path(), dst.path(), 0.0).unwrap();

        assert_eq!(report.sampled, 0);
        assert_eq!(report.total, 3);
        assert_eq!(fs::read_dir(dst.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_invalid_fraction() {
        let src = source_tree();
        let dst = TempDir::new().unwrap();
        let mut walker = walker();

        for fraction in [-0.1, 1.5, f64::NAN] {
            let result = walker.sample(src.path(), dst.path(), fraction);
            assert!(matches!(
                result,
                Err(WalkerError::Config(ConfigError::InvalidSampleFraction { .. }))
            ));
        }
    }

    #[test]
    fn test_sample_requires_idle_walker() {
        let src = source_tree();
        let dst = TempDir::new().unwrap();
        let first = dst.path().join("first");
        let second = dst.path().join("second");
        let mut walker = walker();

        walker.sample(src.path(), &first, 1.0).unwrap();
        let result = walker.sample(src.path(), &second, 1.0);

        assert!(matches!(result, Err(WalkerError::InvalidState { .. })));
        assert!(!second.exists());
    }

    #[test]
    fn test_report_display() {
        let report = SampleReport {
            sampled: 9,
            total: 90,
            duration: Duration::from_millis(1500),
        };
        assert_eq!(report.to_string(), "sampled 9 of 90 files (10.0%) in 1.500s");

        let empty = SampleReport {
            sampled: 0,
            total: 0,
            duration: Duration::ZERO,
        };
        assert_eq!(empty.percent(), 0.0);
    }
}
