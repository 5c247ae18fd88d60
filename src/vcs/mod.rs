//! Queries against version-controlled working trees.
//!
//! The monitor never talks to git directly; it goes through [`VcsQuery`],
//! which has a libgit2 implementation and one that shells out to `git`.
//! Both are read-only.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::status::PorcelainEntry;

mod cli;
mod libgit2;

pub use cli::GitCli;
pub use libgit2::Git2Backend;

/// A working tree known to the workspace. Cheap to clone; the monitor only
/// holds these for the duration of one tick.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RepoHandle {
    path: PathBuf,
}

impl RepoHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for RepoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Short branch name, e.g. `main` for a local branch or `origin/main` for a
/// remote-tracking one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchRef {
    pub name: String,
}

impl BranchRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for BranchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

pub trait VcsQuery: Send + Sync {
    /// Index and work-tree codes for every changed or untracked file.
    fn porcelain_status(&self, repo: &RepoHandle) -> anyhow::Result<Vec<PorcelainEntry>>;

    /// `None` when HEAD is detached.
    fn current_branch(&self, repo: &RepoHandle) -> anyhow::Result<Option<BranchRef>>;

    /// `None` when the branch has no upstream configured.
    fn tracking_branch(
        &self,
        repo: &RepoHandle,
        branch: &BranchRef,
    ) -> anyhow::Result<Option<BranchRef>>;

    /// Number of commits reachable from `local` but not from `upstream`.
    fn commits_ahead(
        &self,
        repo: &RepoHandle,
        upstream: &BranchRef,
        local: &BranchRef,
    ) -> anyhow::Result<usize>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Libgit2,
    Cli,
}

impl Backend {
    pub fn build(self) -> Arc<dyn VcsQuery> {
        let vcs: Arc<dyn VcsQuery> = match self {
            Backend::Libgit2 => Arc::new(Git2Backend),
            Backend::Cli => Arc::new(GitCli::default()),
        };
        vcs
    }
}
