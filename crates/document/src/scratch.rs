use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

/// Per-request temporary directory. Removed exactly once, either through
/// [`ScratchDir::release`] or on drop; removal failures are logged and
/// otherwise ignored.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    dir: Option<TempDir>,
}

impl ScratchDir {
    pub fn create(prefix: &str) -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        Ok(Self {
            path: dir.path().to_path_buf(),
            dir: Some(dir),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.path.join(name)
    }

    pub fn release(mut self) {
        self.cleanup();
    }

    fn cleanup(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        match dir.close() {
            Ok(()) => debug!(path = %self.path.display(), "scratch directory removed"),
            Err(error) => warn!(
                path = %self.path.display(),
                error = %error,
                "failed to remove scratch directory"
            ),
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_removes_directory() {
        let scratch = ScratchDir::create("pagesplit-test-").expect("scratch dir");
        std::fs::write(scratch.join("upload.pdf"), b"%PDF").expect("write");
        let path = scratch.path().to_path_buf();
        assert!(path.exists());

        scratch.release();
        assert!(!path.exists());
    }

    #[test]
    fn drop_removes_directory_on_early_return() {
        fn failing_step(scratch: &ScratchDir) -> io::Result<()> {
            std::fs::write(scratch.join("part.pdf"), b"%PDF")?;
            Err(io::Error::new(io::ErrorKind::Other, "boom"))
        }

        let path = {
            let scratch = ScratchDir::create("pagesplit-test-").expect("scratch dir");
            let path = scratch.path().to_path_buf();
            assert!(failing_step(&scratch).is_err());
            path
        };
        assert!(!path.exists());
    }

    #[test]
    fn cleanup_tolerates_directory_removed_elsewhere() {
        let scratch = ScratchDir::create("pagesplit-test-").expect("scratch dir");
        std::fs::remove_dir_all(scratch.path()).expect("external removal");
        scratch.release();
    }
}
