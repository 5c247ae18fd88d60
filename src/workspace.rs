use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;
use walkdir::WalkDir;

use crate::config::WatchConfig;
use crate::vcs::RepoHandle;

/// The set of repositories a monitor covers, plus its lifetime.
pub trait Workspace: Send + Sync {
    /// A fresh snapshot of the repositories currently known.
    fn repositories(&self) -> Vec<RepoHandle>;

    fn is_disposed(&self) -> bool;

    /// Marks the workspace finished. Monitors stop querying it and refuse
    /// to start again.
    fn dispose(&self);
}

/// Repositories discovered under configured root directories.
#[derive(Debug, Default)]
pub struct WatchedWorkspace {
    roots: Vec<(PathBuf, WatchConfig)>,
    disposed: AtomicBool,
}

impl WatchedWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, path: impl Into<PathBuf>, cfg: WatchConfig) {
        self.roots.push((path.into(), cfg));
    }

    pub fn with_root(mut self, path: impl Into<PathBuf>, cfg: WatchConfig) -> Self {
        self.add_root(path, cfg);
        self
    }

    pub fn roots(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(|(path, _)| path.as_path())
    }

    fn discover(root: &Path, cfg: &WatchConfig, found: &mut BTreeSet<RepoHandle>) {
        if !root.is_dir() {
            debug!(root = %root.display(), "skipping missing workspace root");
            return;
        }
        if is_repo(root) {
            found.insert(RepoHandle::new(root));
            return;
        }

        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(cfg.max_depth as usize)
            .into_iter()
            .filter_entry(|entry| {
                entry.file_type().is_dir()
                    && entry.file_name() != ".git"
                    && cfg.allows(root, entry.path())
            });

        for entry in walker.filter_map(Result::ok) {
            if is_repo(entry.path()) {
                found.insert(RepoHandle::new(entry.path()));
            }
        }
    }
}

impl Workspace for WatchedWorkspace {
    fn repositories(&self) -> Vec<RepoHandle> {
        let mut found = BTreeSet::new();
        for (root, cfg) in &self.roots {
            Self::discover(root, cfg, &mut found);
        }
        found.into_iter().collect()
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }
}

/// A `.git` directory, or a `.git` file for linked worktrees and submodules.
fn is_repo(dir: &Path) -> bool {
    dir.join(".git").exists()
}
