mod util;

use std::process::Command;

use beacon::query::repository_status;
use beacon::status::StatusTuple;
use beacon::vcs::{BranchRef, GitCli, VcsQuery};

use util::TestRepo;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

#[test]
fn reads_the_same_facts_as_libgit2() {
    if !git_available() {
        eprintln!("git not installed, skipping");
        return;
    }
    let repo = TestRepo::with_commit();
    repo.track_origin();
    let git = GitCli::default();

    let branch = git.current_branch(&repo.handle()).unwrap();
    assert_eq!(branch, Some(BranchRef::new(repo.branch())));
    assert_eq!(repository_status(&git, &repo.handle()), StatusTuple::CLEAN);

    repo.write("staged.txt", "new\n");
    repo.stage("staged.txt");
    repo.write("README.md", "changed\n");
    repo.commit("ahead by one");
    repo.write("scratch.txt", "?\n");

    assert_eq!(
        repository_status(&git, &repo.handle()),
        StatusTuple::new(false, true, true)
    );
}

#[test]
fn branch_without_upstream() {
    if !git_available() {
        eprintln!("git not installed, skipping");
        return;
    }
    let repo = TestRepo::with_commit();
    let git = GitCli::default();
    let branch = BranchRef::new(repo.branch());
    assert_eq!(git.tracking_branch(&repo.handle(), &branch).unwrap(), None);
}

#[test]
fn detached_head() {
    if !git_available() {
        eprintln!("git not installed, skipping");
        return;
    }
    let repo = TestRepo::with_commit();
    repo.detach_head();
    assert_eq!(GitCli::default().current_branch(&repo.handle()).unwrap(), None);
}
