//! Per-repository status derivation.
//!
//! Every collaborator failure degrades to "no signal" for the fact it was
//! meant to establish. Nothing in here returns an error.

use tracing::debug;

use crate::status::{PorcelainEntry, StatusTuple};
use crate::vcs::{RepoHandle, VcsQuery};

pub fn repository_status(vcs: &dyn VcsQuery, repo: &RepoHandle) -> StatusTuple {
    let (staged, unstaged) = working_tree_flags(vcs, repo);
    StatusTuple::new(staged, unstaged, has_unpushed_commits(vcs, repo))
}

/// OR-combines the status of every repository; an empty set is clean.
pub fn aggregate_status(vcs: &dyn VcsQuery, repos: &[RepoHandle]) -> StatusTuple {
    repos.iter().map(|repo| repository_status(vcs, repo)).collect()
}

fn working_tree_flags(vcs: &dyn VcsQuery, repo: &RepoHandle) -> (bool, bool) {
    match vcs.porcelain_status(repo) {
        Ok(entries) => scan_entries(&entries),
        Err(e) => {
            debug!(repo = %repo, error = %e, "status query failed");
            (false, false)
        }
    }
}

/// Returns `(staged, unstaged)`, stopping once both are known.
pub fn scan_entries(entries: &[PorcelainEntry]) -> (bool, bool) {
    let mut staged = false;
    let mut unstaged = false;
    for entry in entries {
        staged |= entry.is_staged();
        unstaged |= entry.is_unstaged();
        if staged && unstaged {
            break;
        }
    }
    (staged, unstaged)
}

fn has_unpushed_commits(vcs: &dyn VcsQuery, repo: &RepoHandle) -> bool {
    let branch = match vcs.current_branch(repo) {
        Ok(Some(branch)) => branch,
        Ok(None) => return false,
        Err(e) => {
            debug!(repo = %repo, error = %e, "could not resolve current branch");
            return false;
        }
    };
    let upstream = match vcs.tracking_branch(repo, &branch) {
        Ok(Some(upstream)) => upstream,
        Ok(None) => return false,
        Err(e) => {
            debug!(repo = %repo, branch = %branch, error = %e, "could not resolve upstream");
            return false;
        }
    };
    match vcs.commits_ahead(repo, &upstream, &branch) {
        Ok(ahead) => ahead > 0,
        Err(e) => {
            debug!(repo = %repo, branch = %branch, upstream = %upstream, error = %e, "ahead count failed");
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use anyhow::anyhow;

    use crate::status::PorcelainEntry;
    use crate::vcs::{BranchRef, RepoHandle, VcsQuery};

    /// Per-repository canned answers. A missing `porcelain` or `ahead` value
    /// makes the corresponding call fail.
    #[derive(Debug, Clone, Default)]
    pub struct FakeRepo {
        pub porcelain: Option<Vec<&'static str>>,
        pub branch: Option<&'static str>,
        pub upstream: Option<&'static str>,
        pub ahead: Option<usize>,
    }

    impl FakeRepo {
        pub fn clean() -> Self {
            Self {
                porcelain: Some(vec![]),
                branch: Some("main"),
                upstream: Some("origin/main"),
                ahead: Some(0),
            }
        }

        pub fn with_lines(mut self, lines: Vec<&'static str>) -> Self {
            self.porcelain = Some(lines);
            self
        }

        pub fn with_ahead(mut self, ahead: Option<usize>) -> Self {
            self.ahead = ahead;
            self
        }
    }

    #[derive(Default)]
    pub struct FakeVcs {
        repos: Mutex<HashMap<RepoHandle, FakeRepo>>,
        pub status_calls: AtomicUsize,
    }

    impl FakeVcs {
        pub fn set(&self, repo: &RepoHandle, state: FakeRepo) {
            self.repos.lock().unwrap().insert(repo.clone(), state);
        }

        fn get(&self, repo: &RepoHandle) -> anyhow::Result<FakeRepo> {
            self.repos
                .lock()
                .unwrap()
                .get(repo)
                .cloned()
                .ok_or_else(|| anyhow!("unknown repository {repo}"))
        }
    }

    impl VcsQuery for FakeVcs {
        fn porcelain_status(&self, repo: &RepoHandle) -> anyhow::Result<Vec<PorcelainEntry>> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            let lines = self
                .get(repo)?
                .porcelain
                .ok_or_else(|| anyhow!("repository is locked"))?;
            Ok(lines.into_iter().filter_map(PorcelainEntry::parse).collect())
        }

        fn current_branch(&self, repo: &RepoHandle) -> anyhow::Result<Option<BranchRef>> {
            Ok(self.get(repo)?.branch.map(BranchRef::new))
        }

        fn tracking_branch(
            &self,
            repo: &RepoHandle,
            _branch: &BranchRef,
        ) -> anyhow::Result<Option<BranchRef>> {
            Ok(self.get(repo)?.upstream.map(BranchRef::new))
        }

        fn commits_ahead(
            &self,
            repo: &RepoHandle,
            _upstream: &BranchRef,
            _local: &BranchRef,
        ) -> anyhow::Result<usize> {
            self.get(repo)?
                .ahead
                .ok_or_else(|| anyhow!("rev-list exploded"))
        }
    }
}
