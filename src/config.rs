//! Extraction configuration.
//!
//! Loaded from `vhdl-facts.yaml` in the working directory or from an
//! explicit `--config` path. Every field has a default, so an empty file
//! is a valid configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::extract::builtins;
use crate::facts::ClockEdge;

/// File name looked up when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "vhdl-facts.yaml";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Additional call names that are never signal reads.
    pub extra_builtins: Vec<String>,
    /// Substrings that mark a signal name as a reset (case-insensitive).
    pub reset_patterns: Vec<String>,
    /// Functions recognized as clock-edge detectors.
    pub edge_functions: EdgeFunctions,
    /// Evaluate for-generate bounds after traversal.
    pub elaborate_generates: bool,
    /// Run clock-domain-crossing detection after traversal.
    pub detect_cdc: bool,
    /// Glob patterns for paths skipped during discovery (e.g. "**/sim/**").
    pub excluded_paths: Vec<String>,
}

/// Edge detection function names, by edge.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EdgeFunctions {
    pub rising: Vec<String>,
    pub falling: Vec<String>,
}

impl Default for EdgeFunctions {
    fn default() -> Self {
        Self {
            rising: vec!["rising_edge".to_string()],
            falling: vec!["falling_edge".to_string()],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extra_builtins: Vec::new(),
            reset_patterns: vec!["rst".to_string(), "reset".to_string()],
            edge_functions: EdgeFunctions::default(),
            elaborate_generates: true,
            detect_cdc: true,
            excluded_paths: Vec::new(),
        }
    }
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    /// Parse a configuration from YAML text. Empty text yields the defaults.
    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Find `vhdl-facts.yaml` in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        candidate.is_file().then_some(candidate)
    }

    /// Load the explicit file, else a discovered one, else the defaults.
    /// The result is validated.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => Self::discover(dir),
        };
        let config = match path {
            Some(p) => {
                log::debug!("loading configuration from {}", p.display());
                Self::parse_file(&p)
                    .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", p.display(), e))?
            }
            None => Self::default(),
        };
        validate(&config)?;
        Ok(config)
    }

    /// Serialize to YAML (used by `init`).
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Edge detected by the function `lower`, if it is an edge function.
    pub fn edge_kind(&self, lower: &str) -> Option<ClockEdge> {
        if self
            .edge_functions
            .rising
            .iter()
            .any(|f| f.eq_ignore_ascii_case(lower))
        {
            Some(ClockEdge::Rising)
        } else if self
            .edge_functions
            .falling
            .iter()
            .any(|f| f.eq_ignore_ascii_case(lower))
        {
            Some(ClockEdge::Falling)
        } else {
            None
        }
    }

    /// Whether `name` looks like a reset signal.
    pub fn is_reset_name(&self, name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        self.reset_patterns
            .iter()
            .any(|p| lower.contains(&p.to_ascii_lowercase()))
    }

    /// Built-in names plus `extra_builtins` and the edge functions.
    pub fn is_builtin(&self, lower: &str) -> bool {
        builtins::is_builtin(lower)
            || self.edge_kind(lower).is_some()
            || self
                .extra_builtins
                .iter()
                .any(|b| b.eq_ignore_ascii_case(lower))
    }

    /// Check if a path should be excluded based on `excluded_paths`.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }

        let path_str = path.to_string_lossy();

        for pattern in &self.excluded_paths {
            if let Ok(glob) = globset::Glob::new(pattern) {
                let matcher = glob.compile_matcher();
                if matcher.is_match(&*path_str) {
                    return true;
                }
            }
        }
        false
    }
}

/// Validate a configuration for correctness.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if config.reset_patterns.iter().any(|p| p.trim().is_empty()) {
        anyhow::bail!("reset_patterns must not contain empty strings");
    }
    let edges = config
        .edge_functions
        .rising
        .iter()
        .chain(&config.edge_functions.falling);
    for name in edges {
        if name.trim().is_empty() {
            anyhow::bail!("edge_functions must not contain empty names");
        }
    }
    if config.extra_builtins.iter().any(|b| b.trim().is_empty()) {
        anyhow::bail!("extra_builtins must not contain empty names");
    }

    for pattern in &config.excluded_paths {
        globset::Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
extra_builtins:
  - my_conv
reset_patterns: ["clr"]
edge_functions:
  rising: [rising_edge, pos_edge]
detect_cdc: false
"#;
        let config = Config::parse_str(yaml).unwrap();
        assert_eq!(config.extra_builtins, vec!["my_conv"]);
        assert!(config.is_reset_name("sys_CLR"));
        assert!(!config.is_reset_name("rst"));
        assert_eq!(config.edge_kind("pos_edge"), Some(ClockEdge::Rising));
        assert_eq!(config.edge_kind("falling_edge"), Some(ClockEdge::Falling));
        assert!(!config.detect_cdc);
        assert!(config.elaborate_generates);
        assert!(config.is_builtin("my_conv"));
        assert!(config.is_builtin("pos_edge"));
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::parse_str("").unwrap();
        assert_eq!(config.reset_patterns, vec!["rst", "reset"]);
        assert_eq!(config.edge_kind("rising_edge"), Some(ClockEdge::Rising));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.excluded_paths.push("[".to_string());
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.reset_patterns.push(" ".to_string());
        assert!(validate(&config).is_err());

        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_excluded_paths() {
        let config = Config {
            excluded_paths: vec!["**/sim/**".to_string()],
            ..Config::default()
        };
        assert!(config.is_path_excluded(Path::new("rtl/sim/tb.sexp")));
        assert!(!config.is_path_excluded(Path::new("rtl/core.sexp")));
    }

    #[test]
    fn test_discover_and_load() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::discover(dir.path()).is_none());
        fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "detect_cdc: false\n").unwrap();
        let config = Config::load(None, dir.path()).unwrap();
        assert!(!config.detect_cdc);
    }

    #[test]
    fn test_default_round_trips_through_yaml() {
        let yaml = Config::default().to_yaml().unwrap();
        let back = Config::parse_str(&yaml).unwrap();
        assert_eq!(back.reset_patterns, Config::default().reset_patterns);
    }
}
