use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use util::PathEncodingError;

/// Utility fns
mod ops;
pub use ops::list_dir;

/// Defines fns for creating common paths in the output directory
mod paths;
pub use paths::{CORRECTIONS_JSON, STDERR_TXT, STDOUT_TXT};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Path is neither file nor dir: {0}")]
    UnknownPathType(String),
    #[error("Specified output directory \"{0}\" is not a directory")]
    NotDirectory(String),
    #[error("Can't perform IO operation: \"{0}\" is not whitelisted")]
    NotWhitelisted(String),
    #[error("Source and target are the same file: {0}")]
    SameFile(String),
}

/// All file operations performed by the runner and its tasks go through this struct.
///
/// Destructive operations check that the path in question is inside one of the
/// whitelisted prefixes (the output dir, plus scratch dirs registered while a
/// job runs), otherwise they will not be performed. Commands run by tasks can
/// break this rule; it is up to the user to make sure they behave.
#[derive(Debug)]
pub struct Fs {
    /// The run directory; always whitelisted
    output_prefix: PathBuf,
    /// Additional directories we are allowed to modify
    extra_prefixes: Vec<PathBuf>,
}

impl Fs {
    /// Create a new `Fs` with the given output directory.
    pub fn new(output_prefix: &Path) -> Self {
        Self {
            output_prefix: output_prefix.to_path_buf(),
            extra_prefixes: Vec::with_capacity(0),
        }
    }

    /// Check whether output dir exists, and create it if not.
    pub fn ensure_output_dir_exists(&mut self, verbose: bool) -> Result<()> {
        if !self.output_prefix.exists() {
            log::info!(
                "Output directory {:?} doesn't exist. Creating.",
                self.output_prefix
            );
            fs::create_dir_all(&self.output_prefix).context("creating output directory")?;
        } else if !self.output_prefix.is_dir() {
            return Err(Error::NotDirectory(
                self.output_prefix
                    .to_str()
                    .ok_or(PathEncodingError)?
                    .to_string(),
            )
            .into());
        } else if verbose {
            eprintln!(
                "Output directory {:?} already exists. Not creating.",
                self.output_prefix
            );
        }

        self.output_prefix = self.output_prefix.canonicalize()?;
        Ok(())
    }

    /// Canonicalized output directory (once `ensure_output_dir_exists` has run).
    pub fn output_dir(&self) -> &Path {
        &self.output_prefix
    }

    /// Allow modifications under `prefix` until `disallow` is called.
    pub fn allow(&mut self, prefix: &Path) {
        log::debug!("whitelisting {prefix:?}");
        self.extra_prefixes.push(prefix.to_path_buf());
    }

    pub fn disallow(&mut self, prefix: &Path) {
        self.extra_prefixes.retain(|p| p != prefix);
    }

    /// Check if path exists on disk.
    pub fn exists<T: AsRef<Path>>(&self, path: T) -> bool {
        let path = path.as_ref();
        path.exists() || path.is_symlink()
    }

    /// Check if path exists and is a directory.
    pub fn is_dir<T: AsRef<Path>>(&self, path: T) -> Result<bool> {
        let path = path.as_ref();
        if path.is_dir() || (path.is_symlink() && path.canonicalize()?.is_dir()) {
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Create a directory (uses `std::fs::create_dir_all`, so an entire tree of dirs can be created).
    pub fn create_dir<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let path = path.as_ref();
        self.ensure_writable(path)?;
        fs::create_dir_all(path).with_context(|| format!("creating dir {path:?}"))?;
        Ok(())
    }

    /// Create a file, and return a writable `File` handle.
    pub fn create_file<T: AsRef<Path>>(&self, path: T) -> Result<fs::File> {
        let path = path.as_ref();
        self.ensure_writable(path)?;
        let f = fs::File::create(path).with_context(|| format!("creating file {path:?}"))?;
        Ok(f)
    }

    /// Write entire str to a file.
    pub fn write_file<T: AsRef<Path>>(&self, path: T, text: &str) -> Result<()> {
        let path = path.as_ref();
        self.ensure_writable(path)?;
        fs::write(path, text).with_context(|| format!("writing file {path:?}"))?;
        Ok(())
    }

    /// Move a file within whitelisted directories.
    pub fn rename<T: AsRef<Path>, U: AsRef<Path>>(&self, src: T, tgt: U) -> Result<()> {
        let (src, tgt) = (src.as_ref(), tgt.as_ref());
        self.ensure_writable(src)?;
        self.ensure_writable(tgt)?;
        fs::rename(src, tgt).with_context(|| format!("moving {src:?} to {tgt:?}"))?;
        Ok(())
    }

    /// Copy `src` to `tgt`, recursively if `src` is a directory.
    pub fn copy<T: AsRef<Path>, U: AsRef<Path>>(&self, src: T, tgt: U) -> Result<()> {
        let (src, tgt) = (src.as_ref(), tgt.as_ref());
        self.ensure_writable(tgt)?;
        if ops::same_file(src, tgt) {
            return Err(Error::SameFile(src.to_string_lossy().into_owned()).into());
        }
        ops::copy(src, tgt).with_context(|| format!("copying {src:?} to {tgt:?}"))?;
        Ok(())
    }

    /// Gzip `path` in place, leaving `path.gz` and removing the original.
    pub fn gzip_file<T: AsRef<Path>>(&self, path: T) -> Result<PathBuf> {
        let path = path.as_ref();
        self.ensure_writable(path)?;
        let gz = ops::gz_sibling(path);
        ops::gzip(path, &gz).with_context(|| format!("compressing {path:?}"))?;
        fs::remove_file(path).context("removing original after compression")?;
        Ok(gz)
    }

    /// `path` if it exists, else its `.gz` sibling if that exists, else `path`.
    pub fn zpath<T: AsRef<Path>>(&self, path: T) -> PathBuf {
        let path = path.as_ref();
        if !self.exists(path) {
            let gz = ops::gz_sibling(path);
            if self.exists(&gz) {
                return gz;
            }
        }
        path.to_path_buf()
    }

    /// Read entire file into a String, decompressing `.gz` files.
    pub fn read_to_string<T: AsRef<Path>>(&self, path: T) -> Result<String> {
        let path = path.as_ref();
        let text = if ops::is_gz(path) {
            ops::gunzip_to_string(path)
        } else {
            fs::read_to_string(path)
        };
        text.with_context(|| format!("reading {path:?}"))
    }
    fn is_whitelisted(&self, path: &Path) -> bool {
        path.starts_with(&self.output_prefix)
            || self.extra_prefixes.iter().any(|p| path.starts_with(p))
    }

    /// Fail unless `path` is inside a whitelisted directory.
    pub fn ensure_writable(&self, path: &Path) -> Result<()> {
        if !self.is_whitelisted(path) {
            Err(Error::NotWhitelisted(path.to_str().ok_or(PathEncodingError)?.to_owned()).into())
        } else {
            Ok(())
        }
    }
}
