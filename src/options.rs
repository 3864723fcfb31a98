use crate::{CompanyCamError, Result};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.companycam.com/v2";

/// Environment variable holding the bearer token.
pub const TOKEN_ENV: &str = "COMPANYCAM_API_TOKEN";
const BASE_URL_ENV: &str = "COMPANYCAM_BASE_URL";
const MAX_RETRIES_ENV: &str = "COMPANYCAM_MAX_RETRIES";
const RETRY_BACKOFF_ENV: &str = "COMPANYCAM_RETRY_BACKOFF_MS";
const TIMEOUT_ENV: &str = "COMPANYCAM_TIMEOUT_MS";

/// Configures endpoint, HTTP timeout and retry behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// API root every request path is joined onto.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Base retry backoff in milliseconds (exponential strategy).
    pub retry_backoff_ms: u64,
    /// Upper bound of the random delay added to rate-limit backoff.
    pub max_jitter_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout_ms: 30_000,
            max_retries: 3,
            retry_backoff_ms: 1_000,
            max_jitter_ms: 500,
        }
    }
}

impl ClientOptions {
    /// Reads overrides from the environment, falling back to defaults.
    ///
    /// Reads:
    /// - `COMPANYCAM_BASE_URL`
    /// - `COMPANYCAM_MAX_RETRIES`
    /// - `COMPANYCAM_RETRY_BACKOFF_MS`
    /// - `COMPANYCAM_TIMEOUT_MS`
    ///
    /// Empty values count as unset. The token is not read here, see
    /// [`crate::CompanyCamClient::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut options = Self::default();

        if let Some(url) = get(BASE_URL_ENV) {
            options.base_url = url.trim().to_owned();
        }
        if let Some(raw) = get(MAX_RETRIES_ENV) {
            options.max_retries = parse_number(MAX_RETRIES_ENV, &raw)?;
        }
        if let Some(raw) = get(RETRY_BACKOFF_ENV) {
            options.retry_backoff_ms = parse_number(RETRY_BACKOFF_ENV, &raw)?;
        }
        if let Some(raw) = get(TIMEOUT_ENV) {
            options.timeout_ms = parse_number(TIMEOUT_ENV, &raw)?;
        }
        Ok(options)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| CompanyCamError::Config(format!("{key} must be a non-negative integer, got '{raw}'")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{ClientOptions, DEFAULT_BASE_URL};
    use crate::CompanyCamError;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_production_api() {
        let options = ClientOptions::default();
        assert_eq!(options.base_url, DEFAULT_BASE_URL);
        assert_eq!(options.max_retries, 3);
        assert_eq!(options.retry_backoff_ms, 1_000);
        assert_eq!(options.max_jitter_ms, 500);
    }

    #[test]
    fn environment_overrides_are_applied() {
        let options = ClientOptions::from_lookup(lookup(&[
            ("COMPANYCAM_BASE_URL", " http://localhost:9000/v2 "),
            ("COMPANYCAM_MAX_RETRIES", "0"),
            ("COMPANYCAM_RETRY_BACKOFF_MS", "25"),
            ("COMPANYCAM_TIMEOUT_MS", ""),
        ]))
        .expect("options must parse");

        assert_eq!(options.base_url, "http://localhost:9000/v2");
        assert_eq!(options.max_retries, 0);
        assert_eq!(options.retry_backoff_ms, 25);
        assert_eq!(options.timeout_ms, 30_000);
    }

    #[test]
    fn malformed_number_is_config_error() {
        let err = ClientOptions::from_lookup(lookup(&[("COMPANYCAM_MAX_RETRIES", "-1")]))
            .expect_err("negative retries must be rejected");
        assert!(matches!(err, CompanyCamError::Config(msg) if msg.contains("COMPANYCAM_MAX_RETRIES")));
    }
}
