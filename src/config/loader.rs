//! Configuration file discovery and parsing.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{ChangelogConfig, ConfigError};

/// Project-level configuration file names, in resolution order.
pub const LOCAL_CONFIG_FILES: [&str; 5] =
    [".grenrc", ".grenrc.json", ".grenrc.yml", ".grenrc.yaml", ".grenrc.js"];

/// File names looked up in the XDG config directory.
pub const GLOBAL_CONFIG_FILES: [&str; 4] = ["grenrc.json", "grenrc.yml", "grenrc.yaml", "grenrc.js"];

/// On-disk configuration format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON.
    Json,
    /// YAML.
    Yaml,
    /// A JavaScript module exporting an object literal.
    JavaScript,
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "JSON"),
            Self::Yaml => write!(f, "YAML"),
            Self::JavaScript => write!(f, "JavaScript"),
        }
    }
}

impl ConfigFormat {
    /// Picks the format from the file extension, sniffing the content when there is none.
    ///
    /// Extensionless files (plain `.grenrc`) are JSON when they start with `{`.
    pub fn detect(path: &Path, content: &str) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::Json,
            Some("yml" | "yaml") => Self::Yaml,
            Some("js" | "cjs") => Self::JavaScript,
            _ => {
                if content.trim_start().starts_with('{') {
                    Self::Json
                } else {
                    Self::Yaml
                }
            }
        }
    }

    /// Parses configuration content in this format.
    pub fn parse(self, content: &str, path: Option<&Path>) -> Result<ChangelogConfig, ConfigError> {
        let result = match self {
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            // An empty YAML document is a config with every default.
            Self::Yaml if content.trim().is_empty() => Ok(ChangelogConfig::default()),
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            Self::JavaScript => exported_object(content)
                .and_then(|object| serde_yaml::from_str(object).map_err(|e| e.to_string())),
        };

        result.map_err(|message| ConfigError::Parse {
            path: path.map(Path::to_path_buf),
            format: self,
            message,
        })
    }
}

/// Extracts the object literal from `module.exports = { ... };`.
///
/// Only plain data is supported. The literal is read as a YAML flow mapping,
/// which accepts both quoted and bare keys. Whole-line `//` comments are dropped.
fn exported_object(content: &str) -> Result<&str, String> {
    const EXPECTED: &str = "expected `module.exports = { ... }`";

    let mut rest = content.trim_start();
    while rest.starts_with("//") {
        rest = rest.split_once('\n').map_or("", |(_, tail)| tail).trim_start();
    }

    let object = ["module.exports", "export default"]
        .iter()
        .find_map(|prefix| rest.strip_prefix(prefix))
        .ok_or(EXPECTED)?
        .trim_start();
    let object = object.strip_prefix('=').unwrap_or(object).trim();
    let object = object.strip_suffix(';').unwrap_or(object).trim_end();

    if !(object.starts_with('{') && object.ends_with('}')) {
        return Err(EXPECTED.to_string());
    }
    if object.lines().any(|line| line.trim_start().starts_with("//")) {
        return Err("comments inside the exported object are not supported".to_string());
    }
    Ok(object)
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Passed with `--config`.
    Explicit(PathBuf),
    /// Found in the project directory.
    Local(PathBuf),
    /// Found in the user's global configuration.
    Global(PathBuf),
    /// No file; built-in defaults.
    Defaults,
}

impl ConfigSource {
    /// Returns the file path, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Local(p) | Self::Global(p) => Some(p),
            Self::Defaults => None,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(p) => write!(f, "{} (--config)", p.display()),
            Self::Local(p) => write!(f, "{} (project)", p.display()),
            Self::Global(p) => write!(f, "{} (global)", p.display()),
            Self::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// A configuration together with its origin.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The parsed configuration.
    pub config: ChangelogConfig,
    /// Where it was read from.
    pub source: ConfigSource,
}

/// Returns the XDG config directory for relnotes.
///
/// `$XDG_CONFIG_HOME/relnotes/` when set, otherwise `$HOME/.config/relnotes/`.
/// `dirs::config_dir()` is not used because it points at
/// `~/Library/Application Support/` on macOS.
fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_home.is_empty() {
            return Some(PathBuf::from(xdg_home).join("relnotes"));
        }
    }

    dirs::home_dir().map(|home| home.join(".config").join("relnotes"))
}

/// Global candidate files: XDG directory first, then `.grenrc*` in the home directory.
fn global_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(xdg_dir) = xdg_config_dir() {
        candidates.extend(GLOBAL_CONFIG_FILES.iter().map(|f| xdg_dir.join(f)));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.extend(LOCAL_CONFIG_FILES.iter().map(|f| home.join(f)));
    }
    candidates
}

/// Resolves the configuration file for a project directory.
///
/// Priority:
/// 1. `{dir}/.grenrc`, `.grenrc.json`, `.grenrc.yml`, `.grenrc.yaml`, `.grenrc.js`
/// 2. `$XDG_CONFIG_HOME/relnotes/grenrc.{json,yml,yaml,js}`
/// 3. `$HOME/.grenrc*`
pub fn discover_config(dir: &Path) -> ConfigSource {
    discover_config_with(dir, &global_candidates())
}

fn discover_config_with(dir: &Path, global: &[PathBuf]) -> ConfigSource {
    for name in LOCAL_CONFIG_FILES {
        let path = dir.join(name);
        if path.is_file() {
            return ConfigSource::Local(path);
        }
    }

    for path in global {
        if path.is_file() {
            return ConfigSource::Global(path.clone());
        }
    }

    ConfigSource::Defaults
}

impl ChangelogConfig {
    /// Loads a configuration file, picking the format from its name and content.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        ConfigFormat::detect(path, &content).parse(&content, Some(path))
    }

    /// Renders the configuration as YAML.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        crate::data::to_yaml(self)
    }

    /// Renders the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Loads the explicit file when given, otherwise the one discovered from `dir`.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<LoadedConfig, ConfigError> {
    let source = match explicit {
        Some(path) => ConfigSource::Explicit(path.to_path_buf()),
        None => discover_config(dir),
    };

    let config = match source.path() {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            ChangelogConfig::load_from_file(path)?
        }
        None => {
            debug!("No configuration file found, using defaults");
            ChangelogConfig::default()
        }
    };

    Ok(LoadedConfig { config, source })
}
