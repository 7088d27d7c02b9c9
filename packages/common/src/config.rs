use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Remote collector settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Collector base URL. Default: "http://localhost:8000".
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    /// Whether packages are mirrored to the collector. Default: true.
    #[serde(default = "default_api_enabled")]
    pub enabled: bool,
    /// Request timeout in seconds. Default: 30.
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "http://localhost:8000".into()
}
fn default_api_enabled() -> bool {
    true
}
fn default_api_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            enabled: default_api_enabled(),
            timeout_secs: default_api_timeout_secs(),
        }
    }
}

/// Language-model judge settings, baked into generated test scripts and used
/// by the local `judge` command.
#[derive(Debug, Deserialize, Clone)]
pub struct JudgeConfig {
    /// Default: "gpt-4.1".
    #[serde(default = "default_primary_model")]
    pub primary_model: String,
    /// Default: "gpt-4o-mini".
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,
    /// Rounds over the model list before giving up. Default: 3.
    #[serde(default = "default_max_retries")]
    pub max_retries: u8,
    /// OpenAI-compatible endpoint. Default: "https://api.openai.com/v1".
    #[serde(default = "default_judge_base_url")]
    pub base_url: String,
    /// Environment variable holding the API key. Default: "OPENAI_API_KEY".
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Backoff base between rounds. Default: 1000.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Backoff ceiling. Default: 30000.
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

fn default_primary_model() -> String {
    "gpt-4.1".into()
}
fn default_fallback_model() -> String {
    "gpt-4o-mini".into()
}
fn default_max_retries() -> u8 {
    3
}
fn default_judge_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_backoff_base_ms() -> u64 {
    1000
}
fn default_backoff_max_ms() -> u64 {
    30_000
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            primary_model: default_primary_model(),
            fallback_model: default_fallback_model(),
            max_retries: default_max_retries(),
            base_url: default_judge_base_url(),
            api_key_env: default_api_key_env(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

/// Media probing settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ProbeConfig {
    /// When false every file gets base metadata only. Default: true.
    #[serde(default = "default_probe_enabled")]
    pub enabled: bool,
    /// ffprobe executable used for audio/video. Default: "ffprobe".
    #[serde(default = "default_ffprobe_bin")]
    pub ffprobe_bin: String,
}

fn default_probe_enabled() -> bool {
    true
}
fn default_ffprobe_bin() -> String {
    "ffprobe".into()
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: default_probe_enabled(),
            ffprobe_bin: default_ffprobe_bin(),
        }
    }
}

/// Archive container format for generated packages.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveFormat {
    #[default]
    Zip,
    TarGz,
}

impl ArchiveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PackageConfig {
    #[serde(default)]
    pub format: ArchiveFormat,
}

/// Top-level configuration for the generator and its CLI.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TaskgenConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub judge: JudgeConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub package: PackageConfig,
}

impl TaskgenConfig {
    /// Load from `config/taskgen.toml` (or `$TASKGEN_CONFIG`), overridden by
    /// `TASKGEN__SECTION__KEY` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("TASKGEN_CONFIG").unwrap_or_else(|_| "config/taskgen".to_string());

        let s = Config::builder()
            .set_default("api.base_url", default_api_base_url())?
            .set_default("api.enabled", true)?
            .set_default("api.timeout_secs", 30_i64)?
            .set_default("judge.max_retries", 3_i64)?
            .set_default("probe.enabled", true)?
            .set_default("package.format", "zip")?
            .add_source(File::with_name(&config_path).required(false))
            .add_source(Environment::with_prefix("TASKGEN").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
