use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::layout::font_metrics::FontFamily;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankerBackend {
    Llm,
    Keyword,
}

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or any value is invalid.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub llm_max_requests: usize,
    pub llm_window_secs: u64,
    pub max_lines: u32,
    pub length_tolerance_band: u32,
    pub length_overflow_band: u32,
    pub max_shorten_iterations: u32,
    pub entry_floor: usize,
    pub entry_target: usize,
    pub entry_ceiling: usize,
    pub ranker_backend: RankerBackend,
    pub page_font: FontFamily,
    pub max_sessions: usize,
    pub session_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config = Config {
            anthropic_api_key: require(&lookup, "ANTHROPIC_API_KEY")?,
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            llm_max_requests: parse_or(&lookup, "LLM_MAX_REQUESTS", 14)?,
            llm_window_secs: parse_or(&lookup, "LLM_WINDOW_SECS", 60)?,
            max_lines: parse_or(&lookup, "MAX_LINES", 24)?,
            length_tolerance_band: parse_or(&lookup, "LENGTH_TOLERANCE_BAND", 5)?,
            length_overflow_band: parse_or(&lookup, "LENGTH_OVERFLOW_BAND", 8)?,
            max_shorten_iterations: parse_or(&lookup, "MAX_SHORTEN_ITERATIONS", 8)?,
            entry_floor: parse_or(&lookup, "ENTRY_FLOOR", 3)?,
            entry_target: parse_or(&lookup, "ENTRY_TARGET", 4)?,
            entry_ceiling: parse_or(&lookup, "ENTRY_CEILING", 5)?,
            ranker_backend: match lookup("RANKER_BACKEND").as_deref().map(str::trim) {
                None | Some("llm") => RankerBackend::Llm,
                Some("keyword") => RankerBackend::Keyword,
                Some(other) => bail!("RANKER_BACKEND must be 'llm' or 'keyword', got '{other}'"),
            },
            page_font: match lookup("PAGE_FONT") {
                None => FontFamily::TimesRoman,
                Some(value) => FontFamily::from_setting(&value).with_context(|| {
                    format!("PAGE_FONT must be 'times' or 'helvetica', got '{value}'")
                })?,
            },
            max_sessions: parse_or(&lookup, "MAX_SESSIONS", 500)?,
            session_ttl_secs: parse_or(&lookup, "SESSION_TTL_SECS", 86_400)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_sessions < 1 {
            bail!("MAX_SESSIONS must be at least 1");
        }
        if self.session_ttl_secs < 1 {
            bail!("SESSION_TTL_SECS must be at least 1");
        }
        if self.entry_floor < 1 {
            bail!("ENTRY_FLOOR must be at least 1");
        }
        if !(self.entry_floor <= self.entry_target && self.entry_target <= self.entry_ceiling) {
            bail!(
                "entry bounds must satisfy ENTRY_FLOOR <= ENTRY_TARGET <= ENTRY_CEILING (got {} / {} / {})",
                self.entry_floor,
                self.entry_target,
                self.entry_ceiling
            );
        }
        if self.llm_max_requests < 1 {
            bail!("LLM_MAX_REQUESTS must be at least 1");
        }
        if self.llm_window_secs < 1 {
            bail!("LLM_WINDOW_SECS must be at least 1");
        }
        Ok(())
    }
}

fn require(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "k")])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.llm_max_requests, 14);
        assert_eq!(config.llm_window_secs, 60);
        assert_eq!(config.max_lines, 24);
        assert_eq!(config.length_tolerance_band, 5);
        assert_eq!(config.length_overflow_band, 8);
        assert_eq!(config.max_shorten_iterations, 8);
        assert_eq!(
            (config.entry_floor, config.entry_target, config.entry_ceiling),
            (3, 4, 5)
        );
        assert_eq!(config.ranker_backend, RankerBackend::Llm);
        assert_eq!(config.page_font, FontFamily::TimesRoman);
        assert_eq!(config.max_sessions, 500);
        assert_eq!(config.session_ttl_secs, 86_400);
    }

    #[test]
    fn test_missing_api_key_fails() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("ANTHROPIC_API_KEY", "k"),
            ("MAX_LINES", "30"),
            ("RANKER_BACKEND", "keyword"),
            ("PAGE_FONT", "helvetica"),
        ]))
        .unwrap();
        assert_eq!(config.max_lines, 30);
        assert_eq!(config.ranker_backend, RankerBackend::Keyword);
        assert_eq!(config.page_font, FontFamily::Helvetica);
    }

    #[test]
    fn test_invalid_values_fail() {
        for (key, value) in [
            ("PORT", "not-a-port"),
            ("RANKER_BACKEND", "magic"),
            ("PAGE_FONT", "comic"),
            ("ENTRY_FLOOR", "0"),
            ("ENTRY_TARGET", "9"),
            ("LLM_MAX_REQUESTS", "0"),
            ("LLM_WINDOW_SECS", "0"),
            ("MAX_SESSIONS", "0"),
            ("SESSION_TTL_SECS", "0"),
        ] {
            let result = Config::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "k"), (key, value)]));
            assert!(result.is_err(), "{key}={value} should be rejected");
        }
    }
}
