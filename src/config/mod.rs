#[cfg(feature = "cli")]
pub mod cli;

use crate::utils::error::{Result, StylistError};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const TAVILY_API_KEY_ENV: &str = "TAVILY_API_KEY";
pub const FASHN_API_KEY_ENV: &str = "FASHN_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub tavily: TavilyConfig,
    pub vto: VtoConfig,
    pub images: ImageConfig,
    pub stylist: StylistConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.7,
            max_output_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TavilyConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub search_depth: String,
    pub max_results: usize,
    pub include_images: bool,
    /// Appended to every query to bias results towards shops.
    pub query_suffix: String,
    pub timeout_secs: u64,
}

impl Default for TavilyConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.tavily.com".to_string(),
            search_depth: "basic".to_string(),
            max_results: 10,
            include_images: true,
            query_suffix: "buy online shop".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VtoConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model_name: String,
    /// `performance`, `balanced` or `quality`.
    pub mode: String,
    pub seed: u64,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub timeout_secs: u64,
}

impl Default for VtoConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.fashn.ai".to_string(),
            model_name: "tryon-v1.6".to_string(),
            mode: "performance".to_string(),
            seed: 42,
            poll_interval_ms: 2000,
            max_poll_attempts: 90,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub timeout_secs: u64,
    pub max_bytes: usize,
    pub user_agent: String,
    /// Images with a side below this are rejected.
    pub min_side: u32,
    /// Larger images are shrunk to fit this box.
    pub max_side: u32,
    /// Images with a side above this are rejected before decoding.
    pub max_source_side: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_bytes: 10 * 1024 * 1024,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            min_side: 100,
            max_side: 1024,
            max_source_side: 4096,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StylistConfig {
    pub results_per_keyword: usize,
    pub max_tops: usize,
    pub max_bottoms: usize,
    pub max_full_sets: usize,
}

impl Default for StylistConfig {
    fn default() -> Self {
        Self {
            results_per_keyword: 3,
            max_tops: 4,
            max_bottoms: 4,
            max_full_sets: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_sessions: usize,
    pub max_body_bytes: usize,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7860,
            max_sessions: 256,
            max_body_bytes: 16 * 1024 * 1024,
            request_timeout_secs: 600,
        }
    }
}

impl AppConfig {
    /// Loads a TOML file and applies environment overrides.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| StylistError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Defaults plus environment overrides, for runs without a config file.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed)?)
    }

    /// Replaces `${VAR}` with the variable's value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    /// API keys set in the environment replace the ones from the file.
    pub fn apply_env_overrides(&mut self) {
        self.apply_key_overrides(|var| std::env::var(var).ok());
    }

    fn apply_key_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for (slot, var) in [
            (&mut self.gemini.api_key, GEMINI_API_KEY_ENV),
            (&mut self.tavily.api_key, TAVILY_API_KEY_ENV),
            (&mut self.vto.api_key, FASHN_API_KEY_ENV),
        ] {
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                *slot = Some(value);
            }
        }
    }

    /// Names of the provider keys that are still missing.
    pub fn missing_api_keys(&self) -> Vec<&'static str> {
        [
            (GEMINI_API_KEY_ENV, &self.gemini.api_key),
            (TAVILY_API_KEY_ENV, &self.tavily.api_key),
            (FASHN_API_KEY_ENV, &self.vto.api_key),
        ]
        .into_iter()
        .filter(|(_, key)| key.as_deref().map_or(true, is_placeholder_key))
        .map(|(name, _)| name)
        .collect()
    }
}

/// Blank keys and unresolved `${VAR}` templates count as unset.
fn is_placeholder_key(key: &str) -> bool {
    key.trim().is_empty() || key.starts_with("${")
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_url("gemini.base_url", &self.gemini.base_url)?;
        validate_non_empty_string("gemini.model", &self.gemini.model)?;
        validate_range("gemini.temperature", self.gemini.temperature, 0.0, 2.0)?;
        validate_positive_number(
            "gemini.max_output_tokens",
            self.gemini.max_output_tokens as usize,
            1,
        )?;

        validate_url("tavily.base_url", &self.tavily.base_url)?;
        validate_range("tavily.max_results", self.tavily.max_results, 1, 20)?;
        if !["basic", "advanced"].contains(&self.tavily.search_depth.as_str()) {
            return Err(StylistError::InvalidConfigValueError {
                field: "tavily.search_depth".to_string(),
                value: self.tavily.search_depth.clone(),
                reason: "Valid values: basic, advanced".to_string(),
            });
        }

        validate_url("vto.base_url", &self.vto.base_url)?;
        validate_non_empty_string("vto.model_name", &self.vto.model_name)?;
        if !["performance", "balanced", "quality"].contains(&self.vto.mode.as_str()) {
            return Err(StylistError::InvalidConfigValueError {
                field: "vto.mode".to_string(),
                value: self.vto.mode.clone(),
                reason: "Valid values: performance, balanced, quality".to_string(),
            });
        }
        validate_positive_number("vto.max_poll_attempts", self.vto.max_poll_attempts as usize, 1)?;

        validate_positive_number("images.max_bytes", self.images.max_bytes, 1)?;
        validate_positive_number("images.min_side", self.images.min_side as usize, 1)?;
        if self.images.min_side > self.images.max_side
            || self.images.max_side > self.images.max_source_side
        {
            return Err(StylistError::InvalidConfigValueError {
                field: "images.max_side".to_string(),
                value: self.images.max_side.to_string(),
                reason: "Need min_side <= max_side <= max_source_side".to_string(),
            });
        }
        validate_positive_number("stylist.results_per_keyword", self.stylist.results_per_keyword, 1)?;
        validate_positive_number("stylist.max_tops", self.stylist.max_tops, 1)?;
        validate_positive_number("stylist.max_bottoms", self.stylist.max_bottoms, 1)?;
        validate_positive_number("server.max_sessions", self.server.max_sessions, 1)?;

        // A full-set try-on polls two jobs back to back.
        let render_secs = self.vto.poll_interval_ms * u64::from(self.vto.max_poll_attempts) / 1000;
        if self.server.request_timeout_secs < 2 * render_secs {
            return Err(StylistError::InvalidConfigValueError {
                field: "server.request_timeout_secs".to_string(),
                value: self.server.request_timeout_secs.to_string(),
                reason: format!(
                    "A full-set try-on may poll for {}s; raise the timeout or lower vto.max_poll_attempts",
                    2 * render_secs
                ),
            });
        }

        Ok(())
    }
}
