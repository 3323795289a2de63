//! Configuration utilities.

use anyhow::Context;
use clap::builder;
use clap::error::ErrorKind;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Default request timeout, in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Description of the track platform API endpoint to connect to.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    /// Base URL prepended to every request path, including the scheme, host
    /// and any path prefix, e.g. `http://localhost:8080/api`.
    pub base_url: String,
    /// Request timeout in milliseconds. Defaults to 10 seconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl ApiConfig {
    /// Creates a configuration for the given base URL, with the default
    /// timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Reads an API configuration from the given JSON file.
    fn read_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to read API configuration from: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader).with_context(|| {
            format!("Failed to parse API configuration from: {}", path.display())
        })?;

        Ok(config)
    }
}

/// Helper struct to parse an [`ApiConfig`] directly from a Clap argument.
#[derive(Clone)]
pub struct ApiConfigParser;

impl builder::TypedValueParser for ApiConfigParser {
    type Value = ApiConfig;

    fn parse_ref(
        &self,
        cmd: &clap::Command,
        arg: Option<&clap::Arg>,
        value: &std::ffi::OsStr,
    ) -> Result<Self::Value, clap::Error> {
        ApiConfig::read_from_file(value).map_err(|e| {
            let arg_str = arg.map(|a| a.to_string());
            let msg = format!(
                "Failed to parse API configuration{}{}: {}\n",
                arg_str.map(|a| format!(" ({})", a)).unwrap_or_default(),
                value
                    .to_str()
                    .map(|f| format!(" from file `{}`", f))
                    .unwrap_or_default(),
                e
            );
            clap::Error::raw(ErrorKind::Io, msg).with_cmd(cmd)
        })
    }
}

impl builder::ValueParserFactory for ApiConfig {
    type Parser = ApiConfigParser;

    fn value_parser() -> Self::Parser {
        ApiConfigParser
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn timeout_defaults_to_ten_seconds() {
        let config: ApiConfig =
            serde_json::from_str(r#"{"base_url": "http://localhost:8080/api"}"#).unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/api");
        assert_eq!(config.timeout_ms, 10_000);
    }

    #[test]
    fn explicit_timeout() {
        let config: ApiConfig =
            serde_json::from_str(r#"{"base_url": "http://h/api", "timeout_ms": 2500}"#).unwrap();
        assert_eq!(config.timeout_ms, 2500);
    }
}
