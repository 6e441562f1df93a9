use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::fs::Fs;

/// Files on the machine we're running on
mod local;
pub use local::LocalFiles;

/// Files on another host, reached over ssh
mod remote;
pub use remote::RemoteFiles;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Remote command `{0}` failed: {1}")]
    RemoteCommand(String, String),
}

/// Access to a directory tree that may or may not live on this machine.
/// Copies always land on the local side.
pub trait FileAccess {
    /// Absolute form of `path` on the accessed filesystem.
    fn abspath(&self, path: &Path) -> Result<PathBuf>;

    /// Sorted names of the entries in `dir`.
    fn listdir(&self, dir: &Path) -> Result<Vec<String>>;

    /// Copy `src` (on the accessed filesystem) to local path `tgt`.
    fn copy(&self, src: &Path, tgt: &Path, fs: &Fs) -> Result<()>;
}

/// Pick a `FileAccess` for the given filesystem identifier.
/// `None` means local; anything else is treated as an ssh destination (`[user@]host`).
/// Relative local paths resolve against `base`.
pub fn file_client(filesystem: Option<&str>, base: &Path) -> Box<dyn FileAccess> {
    match filesystem {
        None => Box::new(LocalFiles::new(base)),
        Some(host) => Box::new(RemoteFiles::new(host)),
    }
}
