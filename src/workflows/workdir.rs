use std::io;
use std::path::Path;
use tempfile::{Builder, TempDir};
use tracing::{debug, warn};

const SCRATCH_PREFIX: &str = "air-";

/// Ephemeral working directory owned by exactly one branch operation.
///
/// `release` removes it and consumes the handle, so removal cannot happen
/// twice. If the handle is dropped without `release` (early return, panic,
/// cancelled future) the directory is still removed on drop.
#[derive(Debug)]
pub struct ScratchWorkdir {
    dir: TempDir,
}

impl ScratchWorkdir {
    /// Create a fresh directory, under `parent` when given, else under the system temp dir.
    pub fn acquire(parent: Option<&Path>) -> io::Result<Self> {
        let mut builder = Builder::new();
        builder.prefix(SCRATCH_PREFIX);

        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        debug!(path = %dir.path().display(), "acquired scratch working directory");

        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn release(self) -> io::Result<()> {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => {
                debug!(path = %path.display(), "removed scratch working directory");
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove scratch working directory");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_removes_directory() {
        let root = tempfile::tempdir().unwrap();
        let workdir = ScratchWorkdir::acquire(Some(root.path())).unwrap();
        let path = workdir.path().to_path_buf();
        std::fs::write(path.join("file.txt"), "content").unwrap();

        assert!(path.starts_with(root.path()));
        workdir.release().unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_directory() {
        let path = {
            let workdir = ScratchWorkdir::acquire(None).unwrap();
            workdir.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_parent_fails() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("does-not-exist");
        assert!(ScratchWorkdir::acquire(Some(&missing)).is_err());
    }
}
