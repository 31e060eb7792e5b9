//! Harness configuration
//!
//! Loaded from a TOML file; every field has a default so a partial file (or
//! none at all) is valid. Poll timings live here as named profiles so each
//! case states which budget it runs under.

use erpqa_common::PollConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{E2eError, E2eResult};

/// Name of the poll profile used when a case does not pick one
pub const DEFAULT_PROFILE: &str = "default";

/// Config file looked up at the workspace root when none is given
pub const DEFAULT_CONFIG_FILE: &str = "erpqa.toml";

/// Root of the workspace this crate was built in.
///
/// Test binaries run with the crate directory as their working directory,
/// so relative defaults are anchored here instead.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| manifest_dir.to_path_buf())
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub suite: Option<String>,
    pub cases_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub base_url: Option<String>,
    pub api_token: Option<String>,
    pub skip_health: bool,
}

/// Top-level harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Suite to run when none is given on the command line
    pub suite: String,

    /// Directory holding case catalog YAML files
    pub cases_dir: PathBuf,

    /// Output directory for results
    pub output_dir: PathBuf,

    /// Probe the ERP health endpoint before the first case
    pub wait_for_target: bool,

    /// ERP endpoints
    pub target: TargetConfig,

    /// Named poll profiles
    pub poll: BTreeMap<String, PollConfig>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let mut poll = BTreeMap::new();
        poll.insert(DEFAULT_PROFILE.to_string(), PollConfig::default());

        Self {
            suite: "smoke".to_string(),
            cases_dir: PathBuf::from("tests/e2e/cases"),
            output_dir: PathBuf::from("test-results"),
            wait_for_target: true,
            target: TargetConfig::default(),
            poll,
        }
    }
}

impl HarnessConfig {
    pub fn from_toml(content: &str) -> E2eResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file; relative directories in it are taken from the
    /// file's own directory.
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            E2eError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml(&content)?;
        if let Some(dir) = path.parent() {
            config.anchor_paths(dir);
        }
        Ok(config)
    }

    /// Load the harness config: `path` if given, else `erpqa.toml` at the
    /// workspace root if present, else defaults anchored at the workspace root.
    pub fn load(path: Option<&Path>) -> E2eResult<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let root = workspace_root();
        let default_file = root.join(DEFAULT_CONFIG_FILE);
        if default_file.is_file() {
            return Self::from_file(&default_file);
        }

        let mut config = Self::default();
        config.anchor_paths(&root);
        Ok(config)
    }

    /// Make relative `cases_dir` and `output_dir` relative to `base`
    pub fn anchor_paths(&mut self, base: &Path) {
        if self.cases_dir.is_relative() {
            self.cases_dir = base.join(&self.cases_dir);
        }
        if self.output_dir.is_relative() {
            self.output_dir = base.join(&self.output_dir);
        }
    }

    /// Apply command-line overrides, then re-validate
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> E2eResult<()> {
        if let Some(suite) = &overrides.suite {
            self.suite = suite.clone();
        }
        if let Some(cases_dir) = &overrides.cases_dir {
            self.cases_dir = cases_dir.clone();
        }
        if let Some(output_dir) = &overrides.output_dir {
            self.output_dir = output_dir.clone();
        }
        if let Some(base_url) = &overrides.base_url {
            self.target.base_url = base_url.clone();
        }
        if let Some(token) = &overrides.api_token {
            self.target.api_token = Some(token.clone());
        }
        if overrides.skip_health {
            self.wait_for_target = false;
        }

        self.validate()
    }

    pub fn validate(&self) -> E2eResult<()> {
        reqwest::Url::parse(&self.target.base_url).map_err(|e| {
            E2eError::Config(format!("invalid base_url '{}': {}", self.target.base_url, e))
        })?;

        for (name, profile) in &self.poll {
            profile
                .validate()
                .map_err(|e| E2eError::Config(format!("poll profile '{}': {}", name, e)))?;
        }
        self.target.health.validate()?;
        Ok(())
    }

    /// Resolve a poll profile by name; `None` means the default profile.
    pub fn poll_profile(&self, name: Option<&str>) -> E2eResult<PollConfig> {
        match name {
            Some(name) => self
                .poll
                .get(name)
                .copied()
                .ok_or_else(|| E2eError::Config(format!("unknown poll profile: {}", name))),
            None => Ok(self
                .poll
                .get(DEFAULT_PROFILE)
                .copied()
                .unwrap_or_default()),
        }
    }
}

/// Where the ERP lives and how its stock endpoints are shaped
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub base_url: String,

    pub health_path: String,

    /// GET path template; `{name}` and `{kind}` are substituted
    pub stock_path: String,

    /// JSON pointer to the quantity inside the stock response
    pub quantity_pointer: String,

    /// POST path template for receiving
    pub receiving_path: String,

    pub request_timeout_ms: u64,

    /// Bearer token sent with every stock request
    pub api_token: Option<String>,

    /// Budget for the startup health probe
    pub health: PollConfig,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            health_path: "/health".to_string(),
            stock_path: "/api/stock/{kind}?name={name}".to_string(),
            quantity_pointer: "/quantity".to_string(),
            receiving_path: "/api/stock/{kind}/receipts".to_string(),
            request_timeout_ms: 10_000,
            api_token: None,
            health: PollConfig::new(Duration::from_secs(30), Duration::from_millis(100)),
        }
    }
}

impl TargetConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = HarnessConfig::from_toml("").unwrap();
        assert_eq!(config.suite, "smoke");
        assert_eq!(config.poll_profile(None).unwrap(), PollConfig::default());
    }

    #[test]
    fn test_parse_profiles_and_target() {
        let toml = r#"
suite = "warehouse"
wait_for_target = false

[target]
base_url = "https://erp.example.test/app"
api_token = "secret"

[poll.default]
timeout_ms = 20000
interval_ms = 1000

[poll.receiving]
timeout_ms = 60000
interval_ms = 2000
"#;
        let config = HarnessConfig::from_toml(toml).unwrap();
        assert_eq!(config.suite, "warehouse");
        assert!(!config.wait_for_target);
        assert_eq!(config.target.api_token.as_deref(), Some("secret"));
        assert_eq!(config.target.health_path, "/health");

        let receiving = config.poll_profile(Some("receiving")).unwrap();
        assert_eq!(receiving.timeout, Duration::from_secs(60));
        assert_eq!(receiving.interval, Duration::from_secs(2));
        assert_eq!(
            config.poll_profile(None).unwrap().timeout,
            Duration::from_secs(20)
        );
    }

    #[test]
    fn test_unknown_profile_is_an_error() {
        let config = HarnessConfig::default();
        assert!(matches!(
            config.poll_profile(Some("slow")),
            Err(E2eError::Config(_))
        ));
    }

    #[test]
    fn test_missing_default_profile_falls_back() {
        let toml = r#"
[poll.receiving]
timeout_ms = 1000
interval_ms = 100
"#;
        let config = HarnessConfig::from_toml(toml).unwrap();
        assert_eq!(config.poll_profile(None).unwrap(), PollConfig::default());
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let toml = r#"
[target]
base_url = "not a url"
"#;
        assert!(matches!(
            HarnessConfig::from_toml(toml),
            Err(E2eError::Config(_))
        ));
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let mut config = HarnessConfig::from_toml(
            r#"
suite = "warehouse"

[target]
base_url = "http://erp.internal:8080"
"#,
        )
        .unwrap();

        config
            .apply_overrides(&ConfigOverrides {
                base_url: Some("https://erp.example.test".to_string()),
                api_token: Some("token-123".to_string()),
                skip_health: true,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(config.suite, "warehouse");
        assert_eq!(config.target.base_url, "https://erp.example.test");
        assert_eq!(config.target.api_token.as_deref(), Some("token-123"));
        assert!(!config.wait_for_target);
    }

    #[test]
    fn test_empty_overrides_keep_config() {
        let mut config = HarnessConfig::default();
        config.apply_overrides(&ConfigOverrides::default()).unwrap();

        assert_eq!(config.suite, "smoke");
        assert!(config.wait_for_target);
        assert_eq!(config.target.api_token, None);
    }

    #[test]
    fn test_override_with_bad_base_url_is_rejected() {
        let mut config = HarnessConfig::default();
        let result = config.apply_overrides(&ConfigOverrides {
            base_url: Some("erp.local".to_string()),
            ..Default::default()
        });
        assert!(matches!(result, Err(E2eError::Config(_))));
    }

    #[test]
    fn test_file_paths_are_relative_to_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("erpqa.toml");
        std::fs::write(&path, "cases_dir = \"cases\"\noutput_dir = \"/tmp/results\"\n").unwrap();

        let config = HarnessConfig::from_file(&path).unwrap();
        assert_eq!(config.cases_dir, dir.path().join("cases"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/results"));
    }

    #[test]
    fn test_shipped_config_finds_shipped_catalog() {
        let config = HarnessConfig::load(None).unwrap();

        assert!(config.cases_dir.is_dir(), "{}", config.cases_dir.display());
        assert!(config.cases_dir.starts_with(workspace_root()));
        assert!(config.poll_profile(Some("receiving")).is_ok());
    }

    #[test]
    fn test_rejects_zero_interval_profile() {
        let toml = r#"
[poll.default]
timeout_ms = 1000
interval_ms = 0
"#;
        assert!(HarnessConfig::from_toml(toml).is_err());
    }
}
