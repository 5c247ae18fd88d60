use serde::{Deserialize, Serialize};

/// Status code git uses for files it does not track yet.
pub const UNTRACKED: char = '?';

/// The derived status of one repository, or of a whole workspace once
/// several of them have been merged together.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusTuple {
    pub has_staged_changes: bool,
    pub has_unstaged_changes: bool,
    pub has_unpushed_commits: bool,
}

impl StatusTuple {
    pub const CLEAN: StatusTuple = StatusTuple {
        has_staged_changes: false,
        has_unstaged_changes: false,
        has_unpushed_commits: false,
    };

    pub fn new(staged: bool, unstaged: bool, unpushed: bool) -> Self {
        Self {
            has_staged_changes: staged,
            has_unstaged_changes: unstaged,
            has_unpushed_commits: unpushed,
        }
    }

    /// Component-wise OR.
    pub fn merge(self, other: StatusTuple) -> StatusTuple {
        StatusTuple {
            has_staged_changes: self.has_staged_changes || other.has_staged_changes,
            has_unstaged_changes: self.has_unstaged_changes || other.has_unstaged_changes,
            has_unpushed_commits: self.has_unpushed_commits || other.has_unpushed_commits,
        }
    }

    pub fn has_uncommitted_changes(&self) -> bool {
        self.has_staged_changes || self.has_unstaged_changes
    }

    pub fn tooltip(&self) -> String {
        let staged = if self.has_staged_changes {
            "Staged changes"
        } else {
            "No staged changes"
        };
        let unstaged = if self.has_unstaged_changes {
            "Unstaged changes"
        } else {
            "No unstaged changes"
        };
        let unpushed = if self.has_unpushed_commits {
            "Unpushed commits"
        } else {
            "No unpushed commits"
        };
        format!("{staged} | {unstaged} | {unpushed}")
    }
}

impl FromIterator<StatusTuple> for StatusTuple {
    fn from_iter<I: IntoIterator<Item = StatusTuple>>(iter: I) -> Self {
        iter.into_iter().fold(StatusTuple::CLEAN, StatusTuple::merge)
    }
}

/// One entry of a porcelain status listing: the index code and the
/// work-tree code of a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PorcelainEntry {
    pub index: char,
    pub worktree: char,
}

impl PorcelainEntry {
    pub fn new(index: char, worktree: char) -> Self {
        Self { index, worktree }
    }

    /// Parses a `git status --porcelain=v1` line such as `"M  src/lib.rs"`.
    /// Branch headers (`## ...`) and lines too short to carry both codes
    /// yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        if line.starts_with("##") {
            return None;
        }
        let mut chars = line.chars();
        let index = chars.next()?;
        let worktree = chars.next()?;
        Some(Self { index, worktree })
    }

    pub fn is_untracked(&self) -> bool {
        self.index == UNTRACKED
    }

    pub fn is_staged(&self) -> bool {
        !is_blank(self.index) && !self.is_untracked()
    }

    /// Untracked files always count as unstaged, whatever the work-tree code says.
    pub fn is_unstaged(&self) -> bool {
        !is_blank(self.worktree) || self.is_untracked()
    }
}

fn is_blank(code: char) -> bool {
    code == ' ' || code == '\0'
}
