//! Configuration for the benchmark tool.
//!
//! Configuration can be loaded from multiple sources with the following precedence (highest to
//! lowest):
//!
//! 1. Command line flags of the `performance` command
//! 2. Environment variables (prefixed with `S3_`)
//! 3. YAML configuration file (specified via `-c` or `--config` flag)
//! 4. Defaults
//!
//! # Environment Variables
//!
//! Environment variables use `S3_` as a prefix and double underscores (`__`) to denote nested
//! configuration structures. For example:
//!
//! - `S3_ENDPOINT=localhost` sets the S3 host
//! - `S3_PORT=9000` sets the S3 port
//! - `S3_PERFORMANCE__VUS=8` sets the number of virtual users
//!
//! # YAML Configuration File
//!
//! The above configuration in YAML format would look like this:
//!
//! ```yaml
//! endpoint: localhost
//! port: 9000
//!
//! performance:
//!   vus: 8
//! ```

use std::fmt;
use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Yaml};
use secrecy::zeroize::Zeroize;
use secrecy::{CloneableSecret, ExposeSecret, SecretBox, SecretString, SerializableSecret};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::controller::RunConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::session::S3SessionConfig;
use crate::size::parse_size;

/// Environment variable prefix for all configuration options.
const ENV_PREFIX: &str = "S3_";

/// Newtype around `String` that protects against accidental logging of credentials. Use with
/// [`secrecy::SecretBox`].
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigSecret(String);

impl ConfigSecret {
    /// Returns the secret value.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ConfigSecret {
    fn from(str: &str) -> Self {
        ConfigSecret(str.to_string())
    }
}

impl fmt::Debug for ConfigSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "[redacted]")
    }
}

impl CloneableSecret for ConfigSecret {}
impl SerializableSecret for ConfigSecret {}
impl Zeroize for ConfigSecret {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// The object store to benchmark.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// An S3-compatible store reached over the network.
    #[default]
    S3,
    /// An in-process store, measuring the overhead of the harness itself.
    Memory,
}

/// Parameters of the `performance` benchmark.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Performance {
    /// Number of virtual users.
    ///
    /// # Default
    ///
    /// `1`
    pub vus: usize,

    /// Run duration in seconds.
    ///
    /// # Default
    ///
    /// `30`
    pub duration: u64,

    /// Size of every uploaded object, e.g. `500KiB` or `1.5MB`.
    ///
    /// # Default
    ///
    /// `500KiB`
    pub filesize: String,
}

impl Default for Performance {
    fn default() -> Self {
        Self {
            vus: RunConfig::DEFAULT_CONCURRENCY,
            duration: RunConfig::DEFAULT_DURATION_SECS,
            filesize: "500KiB".to_owned(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    /// Minimum level of log events, unless overridden by `RUST_LOG` or verbosity flags.
    ///
    /// # Default
    ///
    /// `info`
    #[serde(with = "display_fromstr")]
    pub level: LevelFilter,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
        }
    }
}

mod display_fromstr {
    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
        T: std::fmt::Display,
    {
        serializer.collect_str(&value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
        T: std::str::FromStr,
        <T as std::str::FromStr>::Err: std::fmt::Display,
    {
        use serde::Deserialize;
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Top-level configuration.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Which store to run against.
    ///
    /// # Default
    ///
    /// `s3`
    pub backend: Backend,

    /// Host name of the S3 endpoint, optionally with a scheme.
    pub endpoint: Option<String>,

    /// Port of the S3 endpoint. `0` means unset.
    pub port: u16,

    /// Use plain HTTP instead of HTTPS.
    pub insecure: bool,

    /// Region to sign requests for.
    ///
    /// # Default
    ///
    /// `us-east-1`
    pub region: String,

    /// Bucket to write benchmark objects into. Must exist.
    pub bucket: Option<String>,

    /// Address buckets as path segments (as MinIO expects) instead of subdomains.
    ///
    /// # Default
    ///
    /// `true`
    pub path_style: bool,

    /// Access key of static credentials.
    pub access_key: Option<String>,

    /// Secret key of static credentials.
    pub secret_key: Option<SecretBox<ConfigSecret>>,

    /// Timeout for every single request, e.g. `30s`.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,

    /// Benchmark parameters.
    pub performance: Performance,

    /// Logging configuration.
    pub logging: Logging,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            endpoint: None,
            port: 0,
            insecure: false,
            region: "us-east-1".to_owned(),
            bucket: None,
            path_style: true,
            access_key: None,
            secret_key: None,
            request_timeout: None,
            performance: Performance::default(),
            logging: Logging::default(),
        }
    }
}

impl Config {
    /// Loads configuration from defaults, an optional YAML file and the environment.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut figment = figment::Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// Validates the benchmark parameters.
    pub fn run_config(&self) -> ConfigResult<RunConfig> {
        let performance = &self.performance;
        let payload_size = parse_size(&performance.filesize)?;
        RunConfig::new(performance.vus, performance.duration, payload_size)
    }

    /// Returns the full endpoint URL, including scheme and port.
    pub fn endpoint_url(&self) -> ConfigResult<String> {
        let endpoint = self
            .endpoint
            .as_deref()
            .filter(|endpoint| !endpoint.is_empty())
            .ok_or(ConfigError::MissingSetting("endpoint"))?;
        if self.port == 0 {
            return Err(ConfigError::MissingSetting("port"));
        }

        let endpoint = endpoint.trim_end_matches('/');
        if endpoint.contains("://") {
            return Ok(format!("{endpoint}:{}", self.port));
        }
        let scheme = if self.insecure { "http" } else { "https" };
        Ok(format!("{scheme}://{endpoint}:{}", self.port))
    }

    /// Collects the settings of an S3 session, failing on the first missing one.
    pub fn s3_session(&self) -> ConfigResult<S3SessionConfig> {
        let endpoint = self.endpoint_url()?;
        let access_key = required(self.access_key.as_deref(), "access key")?;
        let secret_key = self
            .secret_key
            .as_ref()
            .map(|secret| secret.expose_secret().as_str())
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::MissingSetting("secret key"))?;
        let bucket = required(self.bucket.as_deref(), "bucket")?;

        Ok(S3SessionConfig {
            endpoint,
            region: self.region.clone(),
            bucket: bucket.to_owned(),
            access_key: access_key.to_owned(),
            secret_key: SecretString::from(secret_key.to_owned()),
            path_style: self.path_style,
            request_timeout: self.request_timeout,
        })
    }
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> ConfigResult<&'a str> {
    value
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingSetting(name))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults() {
        figment::Jail::expect_with(|_jail| {
            let config = Config::load(None).unwrap();

            assert_eq!(config.backend, Backend::S3);
            assert_eq!(config.region, "us-east-1");
            assert!(config.path_style);
            assert_eq!(config.logging.level, LevelFilter::INFO);

            let run = config.run_config().unwrap();
            assert_eq!(run, RunConfig::default());

            Ok(())
        });
    }

    #[test]
    fn configurable_via_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("S3_ENDPOINT", "localhost");
            jail.set_env("S3_PORT", "9000");
            jail.set_env("S3_INSECURE", "true");
            jail.set_env("S3_ACCESS_KEY", "minioadmin");
            jail.set_env("S3_SECRET_KEY", "hunter2");
            jail.set_env("S3_BUCKET", "benchmark");
            jail.set_env("S3_REQUEST_TIMEOUT", "30s");
            jail.set_env("S3_PERFORMANCE__VUS", "8");
            jail.set_env("S3_PERFORMANCE__FILESIZE", "1MiB");

            let config = Config::load(None).unwrap();
            assert!(!format!("{config:?}").contains("hunter2"));

            let session = config.s3_session().unwrap();
            assert_eq!(session.endpoint, "http://localhost:9000");
            assert_eq!(session.bucket, "benchmark");
            assert_eq!(session.access_key, "minioadmin");
            assert_eq!(session.secret_key.expose_secret(), "hunter2");
            assert_eq!(session.request_timeout, Some(Duration::from_secs(30)));

            let run = config.run_config().unwrap();
            assert_eq!(run.concurrency(), 8);
            assert_eq!(run.duration_secs(), 30);
            assert_eq!(run.payload_size().as_u64(), 1024 * 1024);

            Ok(())
        });
    }

    #[test]
    fn configured_with_env_and_yaml() {
        let mut tempfile = tempfile::NamedTempFile::new().unwrap();
        tempfile
            .write_all(
                br#"
            backend: memory
            endpoint: s3.example.com
            port: 443
            performance:
                vus: 4
                duration: 10
            logging:
                level: debug
            "#,
            )
            .unwrap();

        figment::Jail::expect_with(|jail| {
            jail.set_env("S3_PERFORMANCE__DURATION", "5");

            let config = Config::load(Some(tempfile.path())).unwrap();
            assert_eq!(config.backend, Backend::Memory);
            assert_eq!(config.endpoint_url().unwrap(), "https://s3.example.com:443");
            assert_eq!(config.logging.level, LevelFilter::DEBUG);

            let run = config.run_config().unwrap();
            assert_eq!(run.concurrency(), 4);
            assert_eq!(run.duration_secs(), 5);

            Ok(())
        });
    }

    #[test]
    fn secret_key_is_redacted() {
        let config = Config {
            endpoint: Some("http://localhost".to_owned()),
            port: 9000,
            bucket: Some("benchmark".to_owned()),
            access_key: Some("minioadmin".to_owned()),
            secret_key: Some(SecretBox::new(Box::new(ConfigSecret::from("hunter2")))),
            ..Default::default()
        };

        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));

        let session = config.s3_session().unwrap();
        assert_eq!(session.endpoint, "http://localhost:9000");
        assert_eq!(session.secret_key.expose_secret(), "hunter2");
    }

    #[test]
    fn missing_s3_settings() {
        figment::Jail::expect_with(|jail| {
            let config = Config::load(None).unwrap();
            assert!(matches!(
                config.s3_session(),
                Err(ConfigError::MissingSetting("endpoint"))
            ));

            jail.set_env("S3_ENDPOINT", "localhost");
            let config = Config::load(None).unwrap();
            assert!(matches!(
                config.s3_session(),
                Err(ConfigError::MissingSetting("port"))
            ));

            jail.set_env("S3_PORT", "9000");
            jail.set_env("S3_ACCESS_KEY", "minioadmin");
            let config = Config::load(None).unwrap();
            assert!(matches!(
                config.s3_session(),
                Err(ConfigError::MissingSetting("secret key"))
            ));

            Ok(())
        });
    }

    #[test]
    fn invalid_run_parameters() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("S3_PERFORMANCE__VUS", "0");
            let config = Config::load(None).unwrap();
            assert!(matches!(
                config.run_config(),
                Err(ConfigError::InvalidConcurrency(0))
            ));

            jail.set_env("S3_PERFORMANCE__VUS", "1");
            jail.set_env("S3_PERFORMANCE__FILESIZE", "10X");
            let config = Config::load(None).unwrap();
            assert!(matches!(
                config.run_config(),
                Err(ConfigError::InvalidSize { .. })
            ));

            Ok(())
        });
    }
}
