use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in .env or environment")]
    Missing(&'static str),

    #[error("Invalid {var}: '{value}'")]
    Invalid { var: &'static str, value: String },

    #[error("Weather data directory not found: {0}")]
    DataDirMissing(PathBuf),

    #[error("Invalid station file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to list station files: {0}")]
    Glob(#[from] glob::GlobError),
}

/// What the pipeline does once a file has failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FailurePolicy {
    /// Stop starting new files; files already in flight still finish
    #[default]
    Abort,
    /// Keep going with the remaining files
    Continue,
}

impl FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "continue" => Ok(FailurePolicy::Continue),
            _ => Err(ConfigError::Invalid {
                var: "FAILURE_POLICY",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Abort => write!(f, "abort"),
            FailurePolicy::Continue => write!(f, "continue"),
        }
    }
}

/// Settings for one ingestion run
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub data_dir: PathBuf,
    /// Station files start with this prefix, e.g. "USC"
    pub file_prefix: String,
    pub file_extension: String,
    /// Maximum number of files processed at once
    pub concurrency: usize,
    pub failure_policy: FailurePolicy,
}

impl IngestConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            file_prefix: "USC".to_string(),
            file_extension: "txt".to_string(),
            concurrency: 4,
            failure_policy: FailurePolicy::Abort,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config =
            IngestConfig::new(lookup("WX_DATA_DIR").unwrap_or_else(|| "wx_data".to_string()));
        if let Some(prefix) = lookup("WX_FILE_PREFIX") {
            config.file_prefix = prefix;
        }
        if let Some(ext) = lookup("WX_FILE_EXTENSION") {
            config.set_file_extension(&ext);
        }
        config.concurrency = parse_var(&lookup, "INGEST_CONCURRENCY", config.concurrency)?;
        if config.concurrency == 0 {
            return Err(ConfigError::Invalid {
                var: "INGEST_CONCURRENCY",
                value: "0".to_string(),
            });
        }
        if let Some(policy) = lookup("FAILURE_POLICY") {
            config.failure_policy = policy.parse()?;
        }
        Ok(config)
    }

    /// Accepts "txt" or ".txt"
    pub fn set_file_extension(&mut self, ext: &str) {
        self.file_extension = ext.trim().trim_start_matches('.').to_string();
    }

    /// Glob pattern matching every station file, e.g. `wx_data/USC*.txt`
    pub fn file_pattern(&self) -> String {
        let dir = glob::Pattern::escape(&self.data_dir.to_string_lossy());
        format!(
            "{}/{}*.{}",
            dir.trim_end_matches('/'),
            glob::Pattern::escape(&self.file_prefix),
            self.file_extension
        )
    }

    /// Check the settings that would otherwise only fail mid-run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.data_dir.is_dir() {
            return Err(ConfigError::DataDirMissing(self.data_dir.clone()));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid {
                var: "INGEST_CONCURRENCY",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// List the station files to ingest, sorted by path
    pub fn discover_files(&self) -> Result<Vec<PathBuf>, ConfigError> {
        self.validate()?;

        let mut files = Vec::new();
        for entry in glob::glob(&self.file_pattern())? {
            let path = entry?;
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Settings for the read API server
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Config {
            database_url,
            db_max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port: parse_var(&lookup, "SERVER_PORT", 8080)?,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_server_defaults() {
        let config = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")])).unwrap();

        assert_eq!(config.database_url, "postgres://x");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_database_url() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn test_server_ignores_ingest_settings() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("INGEST_CONCURRENCY", "0"),
            ("FAILURE_POLICY", "retry"),
        ]));
        assert!(config.is_ok());
    }

    #[test]
    fn test_ingest_defaults() {
        let config = IngestConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("wx_data"));
        assert_eq!(config.file_prefix, "USC");
        assert_eq!(config.file_extension, "txt");
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
    }

    #[test]
    fn test_ingest_overrides() {
        let config = IngestConfig::from_lookup(lookup_from(&[
            ("WX_DATA_DIR", "/data/wx"),
            ("WX_FILE_PREFIX", "USW"),
            ("WX_FILE_EXTENSION", ".dat"),
            ("INGEST_CONCURRENCY", "8"),
            ("FAILURE_POLICY", "Continue"),
        ]))
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/data/wx"));
        assert_eq!(config.file_prefix, "USW");
        assert_eq!(config.file_extension, "dat");
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        for (var, value) in [
            ("INGEST_CONCURRENCY", "many"),
            ("INGEST_CONCURRENCY", "0"),
            ("FAILURE_POLICY", "retry"),
        ] {
            let result = IngestConfig::from_lookup(lookup_from(&[(var, value)]));
            assert!(
                matches!(result, Err(ConfigError::Invalid { .. })),
                "{var}={value} should be rejected"
            );
        }

        let result = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("SERVER_PORT", "99999"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { var: "SERVER_PORT", .. })));
    }

    #[test]
    fn test_file_pattern() {
        let config = IngestConfig::new("/code/wx_data/");
        assert_eq!(config.file_pattern(), "/code/wx_data/USC*.txt");
    }

    #[test]
    fn test_missing_data_dir_is_rejected_before_listing() {
        let config = IngestConfig::new("/definitely/not/a/real/dir");
        assert!(matches!(
            config.discover_files(),
            Err(ConfigError::DataDirMissing(_))
        ));
    }

    #[test]
    fn test_discover_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["USC002.txt", "USC001.txt", "notes.txt", "USC003.csv"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let files = IngestConfig::new(dir.path()).discover_files().unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["USC001.txt", "USC002.txt"]);
    }

    #[test]
    fn test_failure_policy_parse() {
        assert_eq!("abort".parse::<FailurePolicy>().unwrap(), FailurePolicy::Abort);
        assert_eq!(" CONTINUE ".parse::<FailurePolicy>().unwrap(), FailurePolicy::Continue);
        assert!("skip".parse::<FailurePolicy>().is_err());
    }
}
