use anyhow::Context;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "./yeah-build.toml";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub interactive: bool,
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub projects: Vec<ProjectConfig>,
}

/// Run-wide execution policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub stop_on_error: bool,
    #[serde(default)]
    pub log_file: String,
    /// Seconds. Advisory only: overruns are reported, never killed.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default = "default_project_path")]
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default, skip_serializing_if = "EnvOverlay::is_empty")]
    pub env: EnvOverlay,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default)]
    pub pull: bool,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub reset: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub clean: bool,
    #[serde(default)]
    pub test: bool,
}

/// Environment variables layered over the inherited process environment,
/// kept in the order they appear in the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay(Vec<(String, String)>);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("project #{0} has an empty name")]
    EmptyName(usize),
    #[error("duplicate project name: {0}")]
    DuplicateName(String),
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            stop_on_error: false,
            log_file: String::new(),
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_project_path() -> String {
    ".".to_string()
}

impl GlobalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        let trimmed = self.log_file.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Config::expand_path(trimmed))
        }
    }
}

impl ProjectConfig {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: String::new(),
            git: GitConfig::default(),
            build: BuildConfig::default(),
            env: EnvOverlay::default(),
            disabled: false,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.build.commands = commands.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_git(mut self, git: GitConfig) -> Self {
        self.git = git;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key, value);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Configured path with `~` expanded; not yet made absolute.
    pub fn dir(&self) -> PathBuf {
        Config::expand_path(&self.path)
    }
}

impl EnvOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the value in place when the key already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvOverlay {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut overlay = EnvOverlay::new();
        for (k, v) in iter {
            overlay.insert(k, v);
        }
        overlay
    }
}

impl Serialize for EnvOverlay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for EnvOverlay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OverlayVisitor;

        impl<'de> Visitor<'de> for OverlayVisitor {
            type Value = EnvOverlay;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a table of environment variables")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut overlay = EnvOverlay::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    overlay.insert(key, value);
                }
                Ok(overlay)
            }
        }

        deserializer.deserialize_map(OverlayVisitor)
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.apply_defaults();
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    pub fn apply_defaults(&mut self) {
        if self.global.timeout == 0 {
            self.global.timeout = DEFAULT_TIMEOUT_SECS;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for (index, project) in self.projects.iter().enumerate() {
            if project.name.trim().is_empty() {
                return Err(ConfigError::EmptyName(index + 1));
            }
            if !seen.insert(project.name.as_str()) {
                return Err(ConfigError::DuplicateName(project.name.clone()));
            }
        }
        Ok(())
    }

    pub fn enabled_projects(&self) -> Vec<ProjectConfig> {
        self.projects
            .iter()
            .filter(|p| !p.disabled)
            .cloned()
            .collect()
    }

    pub fn expand_path(path: &str) -> PathBuf {
        let expanded = shellexpand::tilde(path);
        PathBuf::from(expanded.as_ref())
    }

    /// Starter configuration written by `init` or when no file exists yet.
    pub fn example() -> Self {
        Self {
            interactive: true,
            global: GlobalConfig {
                parallel: false,
                stop_on_error: true,
                log_file: "build.log".to_string(),
                timeout: DEFAULT_TIMEOUT_SECS,
            },
            projects: vec![
                ProjectConfig::new("backend-api", "./backend")
                    .with_kind("java")
                    .with_git(GitConfig {
                        pull: true,
                        branch: "main".to_string(),
                        reset: false,
                    })
                    .with_commands(["mvn clean package -DskipTests"])
                    .with_env("JAVA_HOME", "/usr/lib/jvm/java-17"),
                ProjectConfig::new("frontend-service", "./frontend")
                    .with_kind("go")
                    .with_git(GitConfig {
                        pull: true,
                        branch: "main".to_string(),
                        reset: false,
                    })
                    .with_commands(["go mod download", "go build -o bin/app ./cmd/main.go"])
                    .with_env("CGO_ENABLED", "0"),
                ProjectConfig::new("admin-dashboard", "./admin")
                    .with_kind("node")
                    .with_git(GitConfig {
                        pull: true,
                        ..GitConfig::default()
                    })
                    .with_commands(["npm install", "npm run build"]),
            ],
        }
    }
}
