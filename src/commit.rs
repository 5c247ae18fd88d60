use std::process::{Command, Stdio};

use anyhow::{bail, Context};
use tracing::{info, warn};

use crate::vcs::RepoHandle;

/// What happens when the indicator is clicked. Beacon only asks for the
/// commit workflow to be started; it never commits anything itself.
pub trait CommitAction: Send + Sync {
    fn invoke(&self, repos: &[RepoHandle]) -> anyhow::Result<()>;
}

/// Launches an external commit tool in every repository, without waiting
/// for it to exit.
#[derive(Debug, Clone)]
pub struct CommandCommitAction {
    command: Vec<String>,
}

impl CommandCommitAction {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl CommitAction for CommandCommitAction {
    fn invoke(&self, repos: &[RepoHandle]) -> anyhow::Result<()> {
        let Some((program, args)) = self.command.split_first() else {
            bail!("no commit command configured");
        };

        let mut failures = 0;
        for repo in repos {
            let spawned = Command::new(program)
                .args(args)
                .current_dir(repo.path())
                .stdin(Stdio::null())
                .spawn()
                .with_context(|| format!("failed to launch `{program}` in {repo}"));
            match spawned {
                Ok(child) => info!(repo = %repo, pid = child.id(), "launched commit tool"),
                Err(e) => {
                    warn!("{e:#}");
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            bail!("commit tool failed to launch in {failures} of {} repositories", repos.len());
        }
        Ok(())
    }
}
