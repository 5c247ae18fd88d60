mod util;

use beacon::query::repository_status;
use beacon::status::{PorcelainEntry, StatusTuple};
use beacon::vcs::{BranchRef, Git2Backend, RepoHandle, VcsQuery};

use util::TestRepo;

#[test]
fn committed_repo_without_upstream_is_clean() {
    let repo = TestRepo::with_commit();
    let git = Git2Backend;

    let branch = git.current_branch(&repo.handle()).unwrap().unwrap();
    assert_eq!(branch.name, repo.branch());
    assert_eq!(git.tracking_branch(&repo.handle(), &branch).unwrap(), None);
    assert_eq!(repository_status(&git, &repo.handle()), StatusTuple::CLEAN);
}

#[test]
fn working_tree_changes_map_to_porcelain_codes() {
    let repo = TestRepo::with_commit();
    repo.write("staged.txt", "new\n");
    repo.stage("staged.txt");
    repo.write("README.md", "changed\n");
    repo.write("untracked.txt", "?\n");

    let mut entries = Git2Backend.porcelain_status(&repo.handle()).unwrap();
    entries.sort_by_key(|e| (e.index, e.worktree));
    assert_eq!(
        entries,
        vec![
            PorcelainEntry::new(' ', 'M'),
            PorcelainEntry::new('?', '?'),
            PorcelainEntry::new('A', ' '),
        ]
    );
    assert_eq!(
        repository_status(&Git2Backend, &repo.handle()),
        StatusTuple::new(true, true, false)
    );
}

#[test]
fn untracked_only_is_unstaged() {
    let repo = TestRepo::with_commit();
    repo.write("notes/todo.txt", "later\n");
    assert_eq!(
        repository_status(&Git2Backend, &repo.handle()),
        StatusTuple::new(false, true, false)
    );
}

#[test]
fn commits_ahead_of_upstream_are_unpushed() {
    let repo = TestRepo::with_commit();
    repo.track_origin();
    let git = Git2Backend;
    let local = BranchRef::new(repo.branch());
    let upstream = git
        .tracking_branch(&repo.handle(), &local)
        .unwrap()
        .unwrap();
    assert_eq!(upstream.name, format!("origin/{}", repo.branch()));

    assert_eq!(git.commits_ahead(&repo.handle(), &upstream, &local).unwrap(), 0);
    assert!(!repository_status(&git, &repo.handle()).has_unpushed_commits);

    repo.write("more.txt", "more\n");
    repo.stage("more.txt");
    repo.commit("second");
    repo.write("even-more.txt", "more\n");
    repo.stage("even-more.txt");
    repo.commit("third");

    assert_eq!(git.commits_ahead(&repo.handle(), &upstream, &local).unwrap(), 2);
    assert_eq!(
        repository_status(&git, &repo.handle()),
        StatusTuple::new(false, false, true)
    );
}

#[test]
fn detached_head_has_no_branch() {
    let repo = TestRepo::with_commit();
    repo.track_origin();
    repo.detach_head();
    assert_eq!(Git2Backend.current_branch(&repo.handle()).unwrap(), None);
}

#[test]
fn unborn_branch_has_no_branch() {
    let repo = TestRepo::init();
    repo.write("first.txt", "1\n");
    assert_eq!(Git2Backend.current_branch(&repo.handle()).unwrap(), None);
    assert_eq!(
        repository_status(&Git2Backend, &repo.handle()),
        StatusTuple::new(false, true, false)
    );
}

#[test]
fn non_repository_degrades_to_clean() {
    let dir = tempfile::tempdir().unwrap();
    let handle = RepoHandle::new(dir.path());
    assert!(Git2Backend.porcelain_status(&handle).is_err());
    assert_eq!(repository_status(&Git2Backend, &handle), StatusTuple::CLEAN);
}
