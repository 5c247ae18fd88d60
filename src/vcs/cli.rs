use std::process::{Command, Output};

use anyhow::{bail, Context};

use super::{BranchRef, RepoHandle, VcsQuery};
use crate::status::PorcelainEntry;

/// Reads repository state by running the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl GitCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, repo: &RepoHandle, args: &[&str]) -> anyhow::Result<Output> {
        Command::new(&self.program)
            .args(args)
            .current_dir(repo.path())
            .output()
            .with_context(|| format!("failed to run `{} {}` in {repo}", self.program, args.join(" ")))
    }

    fn run_text(&self, repo: &RepoHandle, args: &[&str]) -> anyhow::Result<String> {
        let output = self.run(repo, args)?;
        if !output.status.success() {
            bail!(
                "`{} {}` failed in {repo}: {}",
                self.program,
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for GitCli {
    fn default() -> Self {
        GitCli::new("git")
    }
}

impl VcsQuery for GitCli {
    fn porcelain_status(&self, repo: &RepoHandle) -> anyhow::Result<Vec<PorcelainEntry>> {
        let text = self.run_text(repo, &["status", "--porcelain=v1", "--untracked-files=normal"])?;
        Ok(text.lines().filter_map(PorcelainEntry::parse).collect())
    }

    fn current_branch(&self, repo: &RepoHandle) -> anyhow::Result<Option<BranchRef>> {
        let output = self.run(repo, &["symbolic-ref", "--quiet", "--short", "HEAD"])?;
        if output.status.success() {
            let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
            return Ok((!name.is_empty()).then(|| BranchRef::new(name)));
        }
        // --quiet exits 1 without output when HEAD is detached
        if output.status.code() == Some(1) && output.stderr.is_empty() {
            return Ok(None);
        }
        bail!(
            "could not resolve HEAD in {repo}: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )
    }

    fn tracking_branch(
        &self,
        repo: &RepoHandle,
        branch: &BranchRef,
    ) -> anyhow::Result<Option<BranchRef>> {
        let spec = format!("{}@{{upstream}}", branch.name);
        let output = self.run(
            repo,
            &["rev-parse", "--abbrev-ref", "--symbolic-full-name", &spec],
        )?;
        if output.status.success() {
            let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
            return Ok((!name.is_empty()).then(|| BranchRef::new(name)));
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_missing_upstream(&stderr) {
            return Ok(None);
        }
        bail!("could not resolve upstream of {branch} in {repo}: {}", stderr.trim())
    }

    fn commits_ahead(
        &self,
        repo: &RepoHandle,
        upstream: &BranchRef,
        local: &BranchRef,
    ) -> anyhow::Result<usize> {
        let range = format!("{upstream}..{local}");
        let text = self.run_text(repo, &["rev-list", "--count", &range])?;
        text.trim()
            .parse()
            .with_context(|| format!("unexpected rev-list output {:?}", text.trim()))
    }
}

fn is_missing_upstream(stderr: &str) -> bool {
    let msg = stderr.to_lowercase();
    msg.contains("no upstream configured") || msg.contains("does not point to a branch")
}
