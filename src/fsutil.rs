//! Small filesystem helpers used by the walk consumers

use std::fs::{self, File};
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;

/// Permissions given to directories created by [`mkdir`]
#[cfg(unix)]
const DIR_MODE: u32 = 0o755;

/// Check whether something exists at `path`.
///
/// Only a definite "not found" counts as missing; any other stat failure
/// (e.g. permission denied on a parent) reports the path as existing.
pub fn path_exists(path: impl AsRef<Path>) -> bool {
    match fs::metadata(path) {
        Ok(_) => true,
        Err(e) => e.kind() != io::ErrorKind::NotFound,
    }
}

/// Create `path` and all missing parents. Succeeds if it already exists.
pub fn mkdir(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if path_exists(path) {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(path)
}

/// Copy the contents of `src` to `dst` atomically.
///
/// The data is written to a temporary file next to `dst`, given the
/// permissions `mode` (ignored on non-unix platforms) and then renamed over
/// `dst`. If any step fails the temporary file is removed and an existing
/// `dst` is left untouched.
pub fn copy_file(src: impl AsRef<Path>, dst: impl AsRef<Path>, mode: u32) -> io::Result<u64> {
    let dst = dst.as_ref();
    let mut input = File::open(src)?;

    let dir = match dst.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;

    let copied = io::copy(&mut input, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    set_mode(tmp.path(), mode)?;

    tmp.persist(dst).map_err(|e| e.error)?;
    Ok(copied)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_path_exists() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("foo");
        assert!(!path_exists(&file));

        fs::write(&file, b"bar").unwrap();
        assert!(path_exists(&file));

        let dir = temp.path().join("baz");
        fs::create_dir(&dir).unwrap();
        assert!(path_exists(&dir));
    }

    #[test]
    fn test_mkdir_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("testing123");

        mkdir(&path).unwrap();
        assert!(path.is_dir());

        mkdir(&path).unwrap();
        assert!(path.is_dir());
    }

    #[test]
    fn test_mkdir_creates_parents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("path").join("to").join("testing123");

        mkdir(&path).unwrap();
        assert!(path.is_dir());
        mkdir(&path).unwrap();
    }

    #[test]
    fn test_copy_file() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.bin");
        let dst = temp.path().join("dst.bin");
        let data: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        fs::write(&src, &data).unwrap();

        let copied = copy_file(&src, &dst, 0o644).unwrap();

        assert_eq!(copied, data.len() as u64);
        assert_eq!(fs::read(&dst).unwrap(), data);
        // Only the source and the destination remain
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_file_sets_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::write(&src, b"data").unwrap();

        copy_file(&src, &dst, 0o600).unwrap();

        let mode = fs::metadata(&dst).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_copy_file_replaces_existing() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::write(&src, b"new").unwrap();
        fs::write(&dst, b"old contents").unwrap();

        copy_file(&src, &dst, 0o644).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), b"new");
    }

    #[test]
    fn test_copy_missing_source_keeps_destination() {
        let temp = TempDir::new().unwrap();
        let dst = temp.path().join("dst");
        fs::write(&dst, b"keep").unwrap();

        let result = copy_file(temp.path().join("missing"), &dst, 0o644);

        assert!(result.is_err());
        assert_eq!(fs::read(&dst).unwrap(), b"keep");
    }
}
