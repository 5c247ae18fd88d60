#![allow(dead_code)]

use std::fs;
use std::path::Path;

use git2::{BranchType, Commit, Oid, Repository, Signature};
use tempfile::TempDir;

use beacon::vcs::RepoHandle;

/// A throwaway repository built through libgit2, so tests don't depend on a
/// `git` executable or the user's git config.
pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    pub fn init() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        Self { dir, repo }
    }

    /// A repository with one commit containing `README.md`.
    pub fn with_commit() -> Self {
        let test_repo = Self::init();
        test_repo.write("README.md", "hello\n");
        test_repo.stage("README.md");
        test_repo.commit("initial");
        test_repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn handle(&self) -> RepoHandle {
        RepoHandle::new(self.path())
    }

    pub fn write(&self, name: &str, content: &str) {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn stage(&self, name: &str) {
        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
    }

    pub fn commit(&self, message: &str) -> Oid {
        let mut index = self.repo.index().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("Beacon Test", "test@example.com").unwrap();
        let parents: Vec<Commit> = match self.repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap()],
            Err(_) => vec![],
        };
        let parent_refs: Vec<&Commit> = parents.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    pub fn branch(&self) -> String {
        self.repo.head().unwrap().shorthand().unwrap().to_string()
    }

    /// Configures `origin/<branch>` as upstream, pointing at the current HEAD,
    /// as if the branch had just been pushed.
    pub fn track_origin(&self) {
        let branch = self.branch();
        self.repo
            .remote("origin", "https://example.invalid/beacon.git")
            .unwrap();
        let head = self.repo.head().unwrap().peel_to_commit().unwrap().id();
        self.repo
            .reference(
                &format!("refs/remotes/origin/{branch}"),
                head,
                true,
                "test upstream",
            )
            .unwrap();
        let mut local = self.repo.find_branch(&branch, BranchType::Local).unwrap();
        local
            .set_upstream(Some(&format!("origin/{branch}")))
            .unwrap();
    }

    pub fn detach_head(&self) {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap().id();
        self.repo.set_head_detached(head).unwrap();
    }
}
