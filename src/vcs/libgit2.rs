use git2::{BranchType, ErrorCode, Repository, Status, StatusOptions};

use super::{BranchRef, RepoHandle, VcsQuery};
use crate::status::PorcelainEntry;

/// Reads repository state in-process through libgit2.
///
/// `git2::Repository` is not `Sync`, so every call opens the repository
/// afresh; that keeps the backend shareable across the blocking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Backend;

impl Git2Backend {
    fn open(repo: &RepoHandle) -> anyhow::Result<Repository> {
        Ok(Repository::open(repo.path())?)
    }
}

impl VcsQuery for Git2Backend {
    fn porcelain_status(&self, repo: &RepoHandle) -> anyhow::Result<Vec<PorcelainEntry>> {
        let repo = Self::open(repo)?;
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .include_ignored(false)
            .include_unmodified(false)
            .exclude_submodules(true);

        let statuses = repo.statuses(Some(&mut options))?;
        Ok(statuses
            .iter()
            .filter_map(|entry| porcelain_entry(entry.status()))
            .collect())
    }

    fn current_branch(&self, repo: &RepoHandle) -> anyhow::Result<Option<BranchRef>> {
        let repo = Self::open(repo)?;
        let head = match repo.head() {
            Ok(head) => head,
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                return Ok(None)
            }
            Err(e) => return Err(e.into()),
        };
        if !head.is_branch() {
            return Ok(None);
        }
        Ok(head.shorthand().map(BranchRef::new))
    }

    fn tracking_branch(
        &self,
        repo: &RepoHandle,
        branch: &BranchRef,
    ) -> anyhow::Result<Option<BranchRef>> {
        let repo = Self::open(repo)?;
        let local = match repo.find_branch(&branch.name, BranchType::Local) {
            Ok(local) => local,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let upstream = match local.upstream() {
            Ok(upstream) => upstream,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let name = upstream.name()?.map(BranchRef::new);
        Ok(name)
    }

    fn commits_ahead(
        &self,
        repo: &RepoHandle,
        upstream: &BranchRef,
        local: &BranchRef,
    ) -> anyhow::Result<usize> {
        let repo = Self::open(repo)?;
        let local = repo.revparse_single(&local.name)?.peel_to_commit()?.id();
        let upstream = repo.revparse_single(&upstream.name)?.peel_to_commit()?.id();
        let (ahead, _behind) = repo.graph_ahead_behind(local, upstream)?;
        Ok(ahead)
    }
}

/// Translates libgit2 status flags into the two porcelain codes `git status`
/// would print. Ignored and unmodified files produce nothing.
fn porcelain_entry(status: Status) -> Option<PorcelainEntry> {
    if status.is_ignored() {
        return None;
    }
    if status.is_conflicted() {
        return Some(PorcelainEntry::new('U', 'U'));
    }

    let index = if status.is_index_new() {
        'A'
    } else if status.is_index_modified() {
        'M'
    } else if status.is_index_deleted() {
        'D'
    } else if status.is_index_renamed() {
        'R'
    } else if status.is_index_typechange() {
        'T'
    } else {
        ' '
    };

    if index == ' ' && status.is_wt_new() {
        return Some(PorcelainEntry::new('?', '?'));
    }

    let worktree = if status.is_wt_modified() {
        'M'
    } else if status.is_wt_deleted() {
        'D'
    } else if status.is_wt_renamed() {
        'R'
    } else if status.is_wt_typechange() {
        'T'
    } else {
        ' '
    };

    if index == ' ' && worktree == ' ' {
        None
    } else {
        Some(PorcelainEntry::new(index, worktree))
    }
}
