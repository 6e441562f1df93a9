use std::path::{Path, PathBuf};

use super::Fs;

pub const STDOUT_TXT: &str = "stdout.txt";
pub const STDERR_TXT: &str = "stderr.txt";
pub const CORRECTIONS_JSON: &str = "corrections.json";
const NAMESPACE_JSON: &str = "namespace.json";
const STORED_DATA_JSON: &str = "stored_data.json";

/// Utility fns for making common types of paths.
/// Fns taking a `buf` reuse it rather than allocating a new `PathBuf`.
impl Fs {
    /// $OUTPUT/job_dir
    pub fn job_dir<'a>(&self, job: &str, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(&self.output_prefix, job, buf)
    }

    /// $OUTPUT/namespace.json
    pub fn namespace_json<'a>(&self, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(&self.output_prefix, NAMESPACE_JSON, buf)
    }

    /// $OUTPUT/job_dir/stored_data.json
    pub fn stored_data_json<'a>(&self, job_dir: &Path, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(job_dir, STORED_DATA_JSON, buf)
    }

    /// run_dir/stdout.txt
    pub fn stdout(&self, run_dir: &Path) -> PathBuf {
        run_dir.join(STDOUT_TXT)
    }

    /// run_dir/stderr.txt
    pub fn stderr(&self, run_dir: &Path) -> PathBuf {
        run_dir.join(STDERR_TXT)
    }

    /// run_dir/corrections.json
    pub fn corrections_json(&self, run_dir: &Path) -> PathBuf {
        run_dir.join(CORRECTIONS_JSON)
    }

    fn parts2<'a, T, U>(&self, p1: T, p2: U, buf: &'a mut PathBuf) -> &'a Path
    where
        T: AsRef<Path>,
        U: AsRef<Path>,
    {
        buf.clear();
        buf.push(p1);
        buf.push(p2);
        &*buf
    }
}
