use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DISABLE_AI_ENV: &str = "TABLESCOPE_NO_AI";
pub const MODEL_ENV: &str = "TABLESCOPE_AI_MODEL";
pub const TIMEOUT_ENV: &str = "TABLESCOPE_AI_TIMEOUT_SECS";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Settings for the optional AI summary.
///
/// The credential is skipped during serialization so a config can be logged
/// or dumped without leaking it.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AIConfig {
    pub enabled: bool,
    #[serde(skip)]
    pub api_key: Option<SecretString>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    pub base_url: Option<String>,
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            model: "gpt-4o-mini".to_owned(),
            temperature: 0.5,
            max_tokens: 400,
            timeout: Duration::from_secs(30),
            base_url: None,
        }
    }
}

impl AIConfig {
    /// Build the AI settings from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the AI settings from an arbitrary variable lookup.
    ///
    /// Unknown or malformed overrides fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        config.api_key = lookup(API_KEY_ENV)
            .map(|k| k.trim().to_owned())
            .filter(|k| !k.is_empty())
            .map(|k| SecretString::new(k.into()));

        if lookup(DISABLE_AI_ENV).is_some_and(|v| is_truthy(&v)) {
            config.enabled = false;
        }

        if let Some(model) = lookup(MODEL_ENV).filter(|m| !m.trim().is_empty()) {
            config.model = model.trim().to_owned();
        }

        if let Some(secs) = lookup(TIMEOUT_ENV).and_then(|v| v.trim().parse::<u64>().ok())
            && secs > 0
        {
            config.timeout = Duration::from_secs(secs);
        }

        config.base_url = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty());
        config
    }

    pub fn has_credential(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().trim().is_empty())
    }

    /// Whether the summarizer may contact the external service at all.
    pub fn is_active(&self) -> bool {
        self.enabled && self.has_credential()
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Everything one run needs, resolved once at the entry point.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub generate_plots: bool,
    pub allow_ai: bool,
    pub ai: AIConfig,
}

impl PipelineConfig {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            generate_plots: true,
            allow_ai: true,
            ai: AIConfig::default(),
        }
    }

    /// The AI settings with the run-level switch folded in.
    pub fn effective_ai(&self) -> AIConfig {
        let mut ai = self.ai.clone();
        ai.enabled = ai.enabled && self.allow_ai;
        ai
    }
}

mod duration_secs {
    use serde::{Deserialize as _, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = AIConfig::from_lookup(lookup_from(&[]));
        assert!(config.enabled);
        assert!(!config.has_credential());
        assert!(!config.is_active());
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_credential_enables_summary() {
        let config = AIConfig::from_lookup(lookup_from(&[(API_KEY_ENV, "sk-test")]));
        assert!(config.is_active());
    }

    #[test]
    fn test_blank_credential_is_ignored() {
        let config = AIConfig::from_lookup(lookup_from(&[(API_KEY_ENV, "   ")]));
        assert!(!config.has_credential());
    }

    #[test]
    fn test_disable_flag_wins_over_credential() {
        let config = AIConfig::from_lookup(lookup_from(&[
            (API_KEY_ENV, "sk-test"),
            (DISABLE_AI_ENV, "TRUE"),
        ]));
        assert!(config.has_credential());
        assert!(!config.is_active());
    }

    #[test]
    fn test_overrides() {
        let config = AIConfig::from_lookup(lookup_from(&[
            (MODEL_ENV, "gpt-4o"),
            (TIMEOUT_ENV, "5"),
            (BASE_URL_ENV, "http://localhost:8080/v1"),
        ]));
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080/v1"));
    }

    #[test]
    fn test_malformed_timeout_falls_back() {
        let config = AIConfig::from_lookup(lookup_from(&[(TIMEOUT_ENV, "soon")]));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_run_switch_disables_ai() {
        let mut run = PipelineConfig::new("data.csv", "output");
        run.ai = AIConfig::from_lookup(lookup_from(&[(API_KEY_ENV, "sk-test")]));
        assert!(run.effective_ai().is_active());

        run.allow_ai = false;
        assert!(!run.effective_ai().is_active());
    }

    #[test]
    fn test_credential_not_serialized() {
        let config = AIConfig::from_lookup(lookup_from(&[(API_KEY_ENV, "sk-secret")]));
        let json = serde_json::to_string(&config).expect("serializes");
        assert!(!json.contains("sk-secret"));
    }
}
