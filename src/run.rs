//! Run context: identity and working directory of one program run.
//!
//! A [`RunContext`] is captured once per run. It records a unique run id,
//! the directory the run started in, the short git revision when there is
//! one, and, once [`enter_job_dir`] has been called, the per-run job
//! directory.
//!
//! Entering the job directory changes the process working directory. The
//! returned [`JobDirGuard`] puts it back when dropped, on every exit path.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::RunfigError;
use crate::file;
use crate::value::Config;

/// File name of the resolved-config snapshot written into the job directory.
pub const SNAPSHOT_FILE: &str = "run.yaml";

#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    id: String,
    original_dir: PathBuf,
    job_dir: Option<PathBuf>,
    git_revision: Option<String>,
}

impl RunContext {
    /// Capture a fresh context rooted at the current working directory.
    pub fn capture() -> Result<Self, RunfigError> {
        let original_dir = std::env::current_dir().map_err(|source| RunfigError::IoError {
            path: PathBuf::from("."),
            source,
        })?;
        Ok(Self::capture_in(original_dir))
    }

    /// Capture a context rooted at `dir` without looking at the process cwd.
    pub fn capture_in(dir: PathBuf) -> Self {
        Self {
            id: new_run_id(),
            git_revision: git_revision(&dir),
            original_dir: dir,
            job_dir: None,
        }
    }

    /// `YYYY_MMDD_HHMMSS_xxxxxx`.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn original_dir(&self) -> &Path {
        &self.original_dir
    }

    pub fn job_dir(&self) -> Option<&Path> {
        self.job_dir.as_deref()
    }

    pub fn git_revision(&self) -> Option<&str> {
        self.git_revision.as_deref()
    }

    /// Resolve a path relative to where the run started, whatever the
    /// current directory is now. Absolute paths are returned unchanged.
    pub fn resolve_original_path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.original_dir.join(path)
    }
}

/// A timestamp plus six hex characters of a random UUID.
pub fn new_run_id() -> String {
    let stamp = chrono::Local::now().format("%Y_%m%d_%H%M%S");
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("{stamp}_{}", &hex[hex.len() - 6..])
}

fn git_revision(dir: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .current_dir(dir)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let revision = String::from_utf8(output.stdout).ok()?;
    let revision = revision.trim();
    (!revision.is_empty()).then(|| revision.to_string())
}

/// Restores the previous working directory on drop.
#[derive(Debug)]
pub struct JobDirGuard {
    previous: PathBuf,
}

impl Drop for JobDirGuard {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            tracing::warn!(
                path = %self.previous.display(),
                error = %e,
                "failed to restore working directory"
            );
        }
    }
}

/// Create `<original>/<root>/<id>`, change into it, and record it on `ctx`.
pub fn enter_job_dir(ctx: &mut RunContext, root: &Path) -> Result<JobDirGuard, RunfigError> {
    let dir = ctx.resolve_original_path(root).join(&ctx.id);
    let io_error = |source| RunfigError::IoError {
        path: dir.clone(),
        source,
    };

    std::fs::create_dir_all(&dir).map_err(io_error)?;
    let previous = std::env::current_dir().map_err(io_error)?;
    std::env::set_current_dir(&dir).map_err(io_error)?;

    tracing::debug!(path = %dir.display(), run = %ctx.id, "entered job directory");
    ctx.job_dir = Some(dir);
    Ok(JobDirGuard { previous })
}

/// Write `config` as YAML to `dir/run.yaml`.
pub fn write_snapshot(dir: &Path, config: &Config) -> Result<PathBuf, RunfigError> {
    let path = dir.join(SNAPSHOT_FILE);
    file::save_mapping(&path, &config.to_mapping())?;
    Ok(path)
}
