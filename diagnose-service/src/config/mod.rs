use crate::services::prompt::PromptProfile;
use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Default Gemini model for diagnosis text.
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Public Gemini REST endpoint.
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Euro per Arbeitswert (AW).
const DEFAULT_AW_EURO: u32 = 8;

/// Same ceiling as a stock Express JSON body parser (100 KiB).
const DEFAULT_MAX_BODY_BYTES: usize = 100 * 1024;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone)]
pub struct DiagnoseConfig {
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    pub labor: LaborRateConfig,
    pub prompt_profile: PromptProfile,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Secret<String>,
    /// Model name, e.g. gemini-2.5-flash
    pub model: String,
    pub api_base: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaborRateConfig {
    /// Euro per AW, quoted in the prompt and optionally echoed as `awEuro`.
    pub aw_euro: u32,
    pub include_in_response: bool,
}

impl Default for LaborRateConfig {
    fn default() -> Self {
        Self {
            aw_euro: DEFAULT_AW_EURO,
            include_in_response: true,
        }
    }
}

impl DiagnoseConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_ENV)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!(
                    "{} ist nicht gesetzt. Bitte .env prüfen.",
                    API_KEY_ENV
                ))
            })?;

        let aw_euro = match lookup("DIAGNOSE_AW_EURO") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!(
                    "DIAGNOSE_AW_EURO must be a whole number of euros, got '{}': {}",
                    raw,
                    e
                ))
            })?,
            None => DEFAULT_AW_EURO,
        };

        let include_in_response = match lookup("DIAGNOSE_INCLUDE_AW_EURO") {
            Some(raw) => parse_bool("DIAGNOSE_INCLUDE_AW_EURO", &raw)?,
            None => true,
        };

        let prompt_profile = match lookup("DIAGNOSE_PROMPT_PROFILE") {
            Some(raw) => raw
                .parse::<PromptProfile>()
                .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?,
            None => PromptProfile::default(),
        };

        let max_body_bytes = match lookup("DIAGNOSE_MAX_BODY_BYTES") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!(
                    "DIAGNOSE_MAX_BODY_BYTES must be a byte count, got '{}': {}",
                    raw,
                    e
                ))
            })?,
            None => DEFAULT_MAX_BODY_BYTES,
        };

        Ok(DiagnoseConfig {
            common,
            gemini: GeminiSettings {
                api_key: Secret::new(api_key),
                model: get_env(&lookup, "GEMINI_MODEL", DEFAULT_MODEL),
                api_base: get_env(&lookup, "GEMINI_API_BASE", DEFAULT_API_BASE)
                    .trim_end_matches('/')
                    .to_string(),
            },
            labor: LaborRateConfig {
                aw_euro,
                include_in_response,
            },
            prompt_profile,
            max_body_bytes,
        })
    }
}

fn get_env<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|val| !val.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} must be a boolean, got '{}'",
            key,
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn load_with(vars: &[(&str, &str)]) -> Result<DiagnoseConfig, AppError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DiagnoseConfig::from_lookup(core_config::Config::default(), |key| map.get(key).cloned())
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let err = load_with(&[]).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
        assert!(err.to_string().contains("GEMINI_API_KEY ist nicht gesetzt"));
    }

    #[test]
    fn blank_api_key_is_fatal() {
        let err = load_with(&[(API_KEY_ENV, "   ")]).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn defaults_apply() {
        let config = load_with(&[(API_KEY_ENV, "test-key")]).unwrap();

        assert_eq!(config.gemini.api_key.expose_secret(), "test-key");
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.gemini.api_base, DEFAULT_API_BASE);
        assert_eq!(config.labor, LaborRateConfig::default());
        assert_eq!(config.labor.aw_euro, 8);
        assert!(config.labor.include_in_response);
        assert_eq!(config.prompt_profile, PromptProfile::Werkstatt);
        assert_eq!(config.max_body_bytes, 102_400);
        assert_eq!(config.common.port, 3001);
    }

    #[test]
    fn overrides_apply() {
        let config = load_with(&[
            (API_KEY_ENV, "test-key"),
            ("GEMINI_MODEL", "gemini-2.0-flash"),
            ("GEMINI_API_BASE", "http://127.0.0.1:9999/v1beta/"),
            ("DIAGNOSE_AW_EURO", "80"),
            ("DIAGNOSE_INCLUDE_AW_EURO", "false"),
            ("DIAGNOSE_PROMPT_PROFILE", "kompakt"),
            ("DIAGNOSE_MAX_BODY_BYTES", "2048"),
        ])
        .unwrap();

        assert_eq!(config.gemini.model, "gemini-2.0-flash");
        assert_eq!(config.gemini.api_base, "http://127.0.0.1:9999/v1beta");
        assert_eq!(config.labor.aw_euro, 80);
        assert!(!config.labor.include_in_response);
        assert_eq!(config.prompt_profile, PromptProfile::Kompakt);
        assert_eq!(config.max_body_bytes, 2048);
    }

    #[test]
    fn invalid_labor_rate_is_rejected() {
        let err = load_with(&[(API_KEY_ENV, "k"), ("DIAGNOSE_AW_EURO", "acht")]).unwrap_err();
        assert!(err.to_string().contains("DIAGNOSE_AW_EURO"));
    }

    #[test]
    fn invalid_flag_is_rejected() {
        let err =
            load_with(&[(API_KEY_ENV, "k"), ("DIAGNOSE_INCLUDE_AW_EURO", "maybe")]).unwrap_err();
        assert!(err.to_string().contains("DIAGNOSE_INCLUDE_AW_EURO"));
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let err =
            load_with(&[(API_KEY_ENV, "k"), ("DIAGNOSE_PROMPT_PROFILE", "poetry")]).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn api_key_is_redacted_in_debug_output() {
        let config = load_with(&[(API_KEY_ENV, "super-secret")]).unwrap();
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
