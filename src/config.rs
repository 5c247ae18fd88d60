use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use serde::{Deserialize, Serialize};

use crate::vcs::Backend;
use crate::workspace::WatchedWorkspace;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct WatchConfig {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default = "WatchConfig::default_max_depth")]
    pub max_depth: u8,
}

impl WatchConfig {
    pub fn new() -> Self {
        Self {
            include: vec![],
            exclude: vec![],
            max_depth: Self::default_max_depth(),
        }
    }

    fn default_max_depth() -> u8 {
        255
    }

    /// Whether discovery may visit `path`, a directory somewhere below `root`.
    /// Includes win over excludes, and ancestors of an included path stay
    /// reachable so discovery can get to it.
    pub fn allows(&self, root: &Path, path: &Path) -> bool {
        let rel = path.strip_prefix(root).unwrap_or(path);
        let included = self.include.iter().any(|inc| {
            let inc = Path::new(inc);
            rel.starts_with(inc) || inc.starts_with(rel)
        });
        if included {
            return true;
        }
        !self.exclude.iter().any(|exc| rel.starts_with(exc))
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig::new()
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "Config::default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub backend: Backend,
    // Launched once per repository when the indicator is clicked.
    // Defaults to `git gui citool`
    #[serde(default)]
    pub commit_command: Option<Vec<String>>,
    #[serde(default)]
    pub workspaces: BTreeMap<String, WatchConfig>,
}

impl Config {
    const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

    fn default_poll_interval() -> u64 {
        Self::DEFAULT_POLL_INTERVAL_SECS
    }

    pub fn empty() -> Self {
        Self {
            poll_interval_secs: Self::DEFAULT_POLL_INTERVAL_SECS,
            backend: Backend::default(),
            commit_command: None,
            workspaces: BTreeMap::new(),
        }
    }

    pub fn default_path() -> PathBuf {
        Self::get_beacon_config_home().join("config.toml")
    }

    /// Location of all config. By default
    ///
    /// Linux   :   $XDG_CONFIG_HOME/beacon or $HOME/.config/beacon
    /// macOS   :   $HOME/Library/Application Support/beacon
    /// Windows :   %AppData%\Roaming\beacon
    ///
    /// This can be overridden by setting BEACON_CONFIG_HOME environment variable.
    fn get_beacon_config_home() -> PathBuf {
        if let Ok(env_var) = env::var("BEACON_CONFIG_HOME") {
            if !env_var.is_empty() {
                return env_var.into();
            }
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("beacon")
    }

    /// Load Config from default path
    pub fn load() -> Self {
        Self::load_file(Self::default_path().as_path()).unwrap_or_else(|_| Self::empty())
    }

    /// Load Config from default path before changing and saving it. Only a
    /// missing file counts as empty; an unreadable or malformed one is an
    /// error so saving cannot clobber it.
    pub fn load_for_update() -> Result<Self> {
        Self::load_file_or_empty(Self::default_path().as_path())
    }

    pub fn load_file_or_empty(path: &Path) -> Result<Self> {
        match Self::load_file(path) {
            Ok(config) => Ok(config),
            Err(e) => match e.downcast_ref::<io::Error>() {
                Some(io_err) if io_err.kind() == io::ErrorKind::NotFound => Ok(Self::empty()),
                _ => Err(format!("cannot read {}: {e}", path.display()).into()),
            },
        }
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;

        let res = toml::from_slice(buffer.as_slice())?;
        Ok(res)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to_path(Self::default_path().as_path())
    }

    /// Creates parent dirs, serializes `self` as TOML and writes it to disk.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            create_dir_all(dir)?;
        }
        let config_string = toml::to_string(self)?;
        fs::write(path, config_string)?;
        Ok(())
    }

    /// Returns false when the path was already watched.
    pub fn set_watch(&mut self, path: &Path, cfg: WatchConfig) -> Result<bool> {
        let abs_path = canonical_string(path)?;
        if self.workspaces.contains_key(&abs_path) {
            return Ok(false);
        }
        self.workspaces.insert(abs_path, cfg);
        Ok(true)
    }

    /// Returns false when the path was not watched.
    pub fn set_unwatch(&mut self, path: &Path) -> Result<bool> {
        let abs_path = canonical_string(path)?;
        Ok(self.workspaces.remove(&abs_path).is_some())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn commit_command(&self) -> Vec<String> {
        match &self.commit_command {
            Some(cmd) if !cmd.is_empty() => cmd.clone(),
            _ => vec!["git".to_string(), "gui".to_string(), "citool".to_string()],
        }
    }

    pub fn workspace(&self) -> WatchedWorkspace {
        let mut ws = WatchedWorkspace::new();
        for (path, cfg) in &self.workspaces {
            ws.add_root(path, cfg.clone());
        }
        ws
    }
}

fn canonical_string(path: &Path) -> Result<String> {
    let abs_path = fs::canonicalize(path)?;
    let abs_path = abs_path
        .to_str()
        .ok_or_else(|| format!("{} is not valid unicode", abs_path.display()))?;
    Ok(abs_path.to_string())
}
