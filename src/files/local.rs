use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::FileAccess;
use crate::fs::{list_dir, Fs};

pub struct LocalFiles {
    base: PathBuf,
}

impl LocalFiles {
    pub fn new(base: &Path) -> Self {
        Self {
            base: base.to_path_buf(),
        }
    }
}

impl FileAccess for LocalFiles {
    fn abspath(&self, path: &Path) -> Result<PathBuf> {
        // join() replaces the base when `path` is already absolute:
        Ok(self.base.join(path))
    }

    fn listdir(&self, dir: &Path) -> Result<Vec<String>> {
        list_dir(dir).with_context(|| format!("listing {dir:?}"))
    }

    fn copy(&self, src: &Path, tgt: &Path, fs: &Fs) -> Result<()> {
        fs.copy(src, tgt)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_relative_paths_use_base() -> Result<()> {
        let files = LocalFiles::new(Path::new("/runs/job"));
        assert_eq!(PathBuf::from("/runs/job/sub"), files.abspath(Path::new("sub"))?);
        assert_eq!(PathBuf::from("/elsewhere"), files.abspath(Path::new("/elsewhere"))?);
        Ok(())
    }

    #[test]
    fn test_listdir_missing_dir_fails() -> Result<()> {
        let dir = tempdir()?;
        let files = LocalFiles::new(dir.path());
        assert!(files.listdir(&dir.path().join("missing")).is_err());
        Ok(())
    }
}
