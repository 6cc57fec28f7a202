//! Output sink for generated files
//!
//! Generated files are only rewritten when their bytes change, so build
//! systems that track modification times don't rebuild for nothing.

use log::info;
use std::io;
use std::path::Path;

/// True if `path` is missing or holds bytes other than `content`.
pub fn is_different(path: &Path, content: &[u8]) -> bool {
    match fs_err::read(path) {
        Ok(existing) => existing != content,
        Err(_) => true,
    }
}

/// Write `content` to `path` unless it already holds exactly that.
/// Returns whether the file was written.
pub fn write_if_different(path: &Path, content: &[u8]) -> io::Result<bool> {
    if !is_different(path, content) {
        info!("{} is unchanged", path.display());
        return Ok(false);
    }
    info!("writing {}", path.display());
    fs_err::write(path, content)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.h");
        assert!(write_if_different(&path, b"int x;\n").unwrap());
        assert_eq!(fs_err::read(&path).unwrap(), b"int x;\n");
    }

    #[test]
    fn test_identical_content_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.c");
        fs_err::write(&path, b"same").unwrap();
        let before = fs_err::metadata(&path).unwrap().modified().unwrap();

        std::thread::sleep(Duration::from_millis(20));
        assert!(!write_if_different(&path, b"same").unwrap());
        let after = fs_err::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(before, after);

        assert!(write_if_different(&path, b"changed").unwrap());
        assert_eq!(fs_err::read(&path).unwrap(), b"changed");
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no").join("such").join("out.c");
        assert!(write_if_different(&path, b"x").is_err());
    }
}
