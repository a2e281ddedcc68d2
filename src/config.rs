// src/config.rs

use std::env;
use std::time::Duration;

use dotenvy::dotenv;

use crate::models::score::PassRatio;

/// Per-call store deadline when `CALL_TIMEOUT_SECS` is unset or malformed.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub bind_addr: String,
    pub pass_ratio: PassRatio,
    /// Upper bound for each registry, question bank or history call.
    pub call_timeout: Option<Duration>,
    pub session_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let pass_ratio = parse_pass_ratio(env::var("PASS_RATIO").ok().as_deref())
            .unwrap_or_default();

        let call_timeout = parse_call_timeout(env::var("CALL_TIMEOUT_SECS").ok().as_deref())
            .unwrap_or(Some(DEFAULT_CALL_TIMEOUT));

        let session_ttl = env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .map_or(Duration::from_secs(7200), Duration::from_secs);

        Self {
            database_url,
            rust_log,
            bind_addr,
            pass_ratio,
            call_timeout,
            session_ttl,
        }
    }

    /// Describes every set-but-malformed variable that `from_env` replaced with its default.
    /// Meant to be logged once tracing is up.
    pub fn fallback_warnings() -> Vec<String> {
        let mut warnings = Vec::new();
        if let Err(w) = parse_pass_ratio(env::var("PASS_RATIO").ok().as_deref()) {
            warnings.push(w);
        }
        if let Err(w) = parse_call_timeout(env::var("CALL_TIMEOUT_SECS").ok().as_deref()) {
            warnings.push(w);
        }
        warnings
    }
}

/// Unset means the default ratio; anything else must be a fraction in `[0, 1]`.
fn parse_pass_ratio(raw: Option<&str>) -> Result<PassRatio, String> {
    let Some(raw) = raw else {
        return Ok(PassRatio::default());
    };
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(PassRatio::from_fraction)
        .ok_or_else(|| {
            format!(
                "PASS_RATIO={raw:?} is not a fraction between 0 and 1, using {:.2}",
                PassRatio::default().as_fraction()
            )
        })
}

/// `0` disables the deadline.
fn parse_call_timeout(raw: Option<&str>) -> Result<Option<Duration>, String> {
    let Some(raw) = raw else {
        return Ok(Some(DEFAULT_CALL_TIMEOUT));
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Ok(None),
        Ok(secs) => Ok(Some(Duration::from_secs(secs))),
        Err(_) => Err(format!(
            "CALL_TIMEOUT_SECS={raw:?} is not a whole number of seconds, using {}s",
            DEFAULT_CALL_TIMEOUT.as_secs()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_ratio_parsing() {
        assert_eq!(parse_pass_ratio(None), Ok(PassRatio::default()));
        assert_eq!(parse_pass_ratio(Some(" 0.5 ")).unwrap().as_fraction(), 0.5);

        let err = parse_pass_ratio(Some("eighty")).unwrap_err();
        assert!(err.contains("PASS_RATIO"));
        assert!(parse_pass_ratio(Some("1.5")).is_err());
    }

    #[test]
    fn test_call_timeout_parsing() {
        assert_eq!(parse_call_timeout(None), Ok(Some(DEFAULT_CALL_TIMEOUT)));
        assert_eq!(parse_call_timeout(Some("0")), Ok(None));
        assert_eq!(parse_call_timeout(Some("3")), Ok(Some(Duration::from_secs(3))));

        let err = parse_call_timeout(Some("10s")).unwrap_err();
        assert!(err.contains("CALL_TIMEOUT_SECS"));
        assert!(parse_call_timeout(Some("-1")).is_err());
    }
}
