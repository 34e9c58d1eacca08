//! Configuration loaded from `~/.config/anistream/config.toml`.
//!
//! Every table is optional; a missing default file yields built-in defaults
//! with a single `donghuastream` source.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Desktop Chrome UA; several themes serve a stripped page to unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Source families with a built-in implementation.
pub const SOURCE_TYPES: &[&str] = &["wpanime"];

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Player type used for playback (`mpv`, `vlc`, ...).
    pub default_player: String,
    /// Explicit binary paths keyed by player type.
    pub player_paths: HashMap<String, String>,
    pub fetch: FetchConfig,
    pub mirrors: MirrorConfig,
    pub resolve: ResolveConfig,
    pub episodes: EpisodeConfig,
    pub log: LogConfig,
    pub sources: BTreeMap<String, SourceConfig>,
}

/// HTTP adapter options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    /// Allow fetching the same URL twice through one client.
    pub allow_revisit: bool,
    /// Parse matched elements concurrently.
    #[serde(rename = "async")]
    pub parallel: bool,
    /// Maximum redirect hops; 0 keeps the client default.
    pub max_depth: usize,
    /// Per-fetch timeout in seconds.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Drop a leading "Select mirror" option whose value is empty or `#`.
    pub skip_placeholder: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Hand hosts without a resolver to the player as-is instead of failing.
    pub passthrough_unsupported: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    /// Sites list newest first; reverse for display.
    pub chronological: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub dir: PathBuf,
}

/// One configured site.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub base_url: String,
    #[serde(default = "default_search_path")]
    pub search_path: String,
}

fn default_search_path() -> String {
    "/".to_string()
}

impl Default for Config {
    fn default() -> Self {
        let mut sources = BTreeMap::new();
        sources.insert(
            "donghuastream".to_string(),
            SourceConfig {
                name: "Donghua Stream".to_string(),
                kind: "wpanime".to_string(),
                base_url: "https://www.donghuastream.org".to_string(),
                search_path: default_search_path(),
            },
        );
        Self {
            default_player: "mpv".to_string(),
            player_paths: HashMap::new(),
            fetch: FetchConfig::default(),
            mirrors: MirrorConfig::default(),
            resolve: ResolveConfig::default(),
            episodes: EpisodeConfig::default(),
            log: LogConfig::default(),
            sources,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            allow_revisit: true,
            parallel: true,
            max_depth: 0,
            timeout_secs: 30,
        }
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            skip_placeholder: true,
        }
    }
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            chronological: true,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        let dir = dirs::data_local_dir()
            .map_or_else(|| PathBuf::from("logs"), |d| d.join("anistream").join("logs"));
        Self { dir }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// tried and built-in defaults are used if it is absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::read(path)?,
            None => {
                let path = default_path();
                if path.exists() {
                    Self::read(&path)?
                } else {
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config in {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            bail!("no sources configured");
        }
        for (id, source) in &self.sources {
            if !SOURCE_TYPES.contains(&source.kind.as_str()) {
                bail!(
                    "source {id:?} has unknown type {:?} (known: {})",
                    source.kind,
                    SOURCE_TYPES.join(", ")
                );
            }
            url::Url::parse(&source.base_url)
                .with_context(|| format!("source {id:?} has invalid base_url"))?;
        }
        if self.fetch.timeout_secs == 0 {
            bail!("fetch.timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

/// Return the path to the default config file.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("anistream")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.default_player, "mpv");
        assert!(config.fetch.allow_revisit);
        assert!(config.mirrors.skip_placeholder);
        assert!(!config.resolve.passthrough_unsupported);
        assert!(config.sources.contains_key("donghuastream"));
        config.validate().unwrap();
    }

    #[test]
    fn parse_sources_and_fetch_options() {
        let toml_str = r#"
default_player = "vlc"

[player_paths]
vlc = "/usr/bin/vlc"

[fetch]
user_agent = "test-agent"
allow_revisit = false
async = false
max_depth = 3

[sources.anichin]
name = "Anichin"
type = "wpanime"
base_url = "https://anichin.example"
search_path = "/search/"
"#;
        let config = Config::parse(toml_str).unwrap();
        assert_eq!(config.default_player, "vlc");
        assert_eq!(config.player_paths["vlc"], "/usr/bin/vlc");
        assert_eq!(config.fetch.user_agent, "test-agent");
        assert!(!config.fetch.allow_revisit);
        assert!(!config.fetch.parallel);
        assert_eq!(config.fetch.max_depth, 3);
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources["anichin"].search_path, "/search/");
        config.validate().unwrap();
    }

    #[test]
    fn search_path_defaults_to_root() {
        let toml_str = r#"
[sources.x]
name = "X"
type = "wpanime"
base_url = "https://x.example"
"#;
        let config = Config::parse(toml_str).unwrap();
        assert_eq!(config.sources["x"].search_path, "/");
    }

    #[test]
    fn unknown_source_type_fails_validation() {
        let toml_str = r#"
[sources.x]
name = "X"
type = "crunchy"
base_url = "https://x.example"
"#;
        let err = Config::parse(toml_str).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("unknown type"));
    }

    #[test]
    fn invalid_base_url_fails_validation() {
        let toml_str = r#"
[sources.x]
name = "X"
type = "wpanime"
base_url = "not a url"
"#;
        assert!(Config::parse(toml_str).unwrap().validate().is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/anistream.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
