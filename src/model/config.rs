use serde::{Deserialize, Serialize};

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub planner: PlannerInfo,
    #[serde(default)]
    pub transform: TransformConfig,
    #[serde(default)]
    pub timer: TimerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerInfo {
    #[serde(default = "default_name")]
    pub name: String,
}

impl Default for PlannerInfo {
    fn default() -> Self {
        PlannerInfo {
            name: default_name(),
        }
    }
}

/// Text-generation service used for breakdown, suggestions and reviews
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Base URL, without the `/models/...` suffix
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Ring the terminal bell when an interval completes
    #[serde(default = "default_true")]
    pub bell: bool,
}

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig { bell: true }
    }
}

fn default_name() -> String {
    "Priority".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}
