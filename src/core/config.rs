//! Declarative logger configuration
//!
//! [`LoggerConfig`] is the resolved option set a host application embeds in
//! its own configuration format. It deserializes with serde, is checked by
//! [`LoggerConfig::validate`] and turned into a [`Logger`] by
//! [`LoggerConfig::build`].

use super::error::{LoggerError, Result};
use super::field::{FieldValue, Fields};
use super::log_level::LogLevel;
use super::logger::{Logger, LoggerBuilder};
use super::timestamp::TimestampFormat;
use crate::writers::RotationPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Destination kinds that can be listed under `outputs`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Console,
    File,
    Network,
}

impl OutputKind {
    fn as_str(&self) -> &'static str {
        match self {
            OutputKind::Console => "console",
            OutputKind::File => "file",
            OutputKind::Network => "network",
        }
    }
}

/// Rotating file parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileOptions {
    pub path: PathBuf,
    /// Size in megabytes at which the file rotates
    pub max_size_mb: u64,
    /// Backups to keep; `0` keeps all
    pub max_backups: usize,
    /// Days a backup is kept; `0` keeps forever
    pub max_age_days: u64,
    pub compress: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            max_size_mb: 100,
            max_backups: 0,
            max_age_days: 0,
            compress: false,
        }
    }
}

impl FileOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn policy(&self) -> RotationPolicy {
        let policy = RotationPolicy::new()
            .with_max_size_mb(self.max_size_mb)
            .with_max_backups(self.max_backups)
            .with_compression(self.compress);
        if self.max_age_days > 0 {
            policy.with_max_age(Duration::from_secs(
                self.max_age_days.saturating_mul(SECONDS_PER_DAY),
            ))
        } else {
            policy
        }
    }

    fn validate(&self, component: &str) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(LoggerError::config(component, "path must not be empty"));
        }
        if self.max_size_mb == 0 {
            return Err(LoggerError::config(
                component,
                "max_size_mb must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Resolved logger options
///
/// # Example
///
/// ```
/// use tee_logger::{LogLevel, LoggerConfig, OutputKind};
///
/// let config: LoggerConfig = serde_json::from_str(r#"{
///     "level": "debug",
///     "outputs": ["console", "file"],
///     "file": { "path": "logs/app.log", "max_size_mb": 10, "max_backups": 3 },
///     "fields": { "service": "api" }
/// }"#).unwrap();
///
/// assert_eq!(config.level, LogLevel::Debug);
/// assert_eq!(config.outputs, vec![OutputKind::Console, OutputKind::File]);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    pub level: LogLevel,
    pub outputs: Vec<OutputKind>,
    pub file: Option<FileOptions>,
    /// Enables the split where records at or above `Error` also go here
    pub error_file: Option<FileOptions>,
    pub remote_addr: Option<String>,
    pub time_format: TimestampFormat,
    /// Static fields on every record, in declaration order
    pub fields: serde_json::Map<String, serde_json::Value>,
    pub name: Option<String>,
    pub console_colors: bool,
    pub development: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            outputs: vec![OutputKind::Console],
            file: None,
            error_file: None,
            remote_addr: None,
            time_format: TimestampFormat::default(),
            fields: serde_json::Map::new(),
            name: None,
            console_colors: true,
            development: false,
        }
    }
}

impl LoggerConfig {
    /// Check that every listed output has its parameters and nothing is
    /// configured that no output would use.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] naming the offending option
    pub fn validate(&self) -> Result<()> {
        if self.outputs.is_empty() {
            return Err(LoggerError::config("outputs", "at least one output is required"));
        }
        for (i, kind) in self.outputs.iter().enumerate() {
            if self.outputs[..i].contains(kind) {
                return Err(LoggerError::config(
                    "outputs",
                    format!("'{}' is listed more than once", kind.as_str()),
                ));
            }
        }

        let wants_file = self.outputs.contains(&OutputKind::File);
        match (wants_file, &self.file) {
            (true, Some(file)) => file.validate("file")?,
            (true, None) => {
                return Err(LoggerError::config(
                    "file",
                    "output 'file' requires file options",
                ))
            }
            (false, _) => {}
        }

        if let Some(ref error_file) = self.error_file {
            if !wants_file {
                return Err(LoggerError::config(
                    "error_file",
                    "a separate error file requires the 'file' output",
                ));
            }
            error_file.validate("error_file")?;
        }

        if self.outputs.contains(&OutputKind::Network) {
            match self.remote_addr.as_deref().map(str::trim) {
                Some(addr) if !addr.is_empty() => {}
                _ => {
                    return Err(LoggerError::config(
                        "remote_addr",
                        "output 'network' requires remote_addr",
                    ))
                }
            }
        }

        if self.name.as_deref().is_some_and(str::is_empty) {
            return Err(LoggerError::config("name", "name must not be empty"));
        }

        self.time_format
            .validate()
            .map_err(|message| LoggerError::config("time_format", message))?;

        Ok(())
    }

    /// Static fields as [`Fields`]
    pub fn static_fields(&self) -> Fields {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), FieldValue::from(value.clone())))
            .collect()
    }

    /// Builder carrying every option; useful to add routes before building
    ///
    /// # Errors
    ///
    /// Returns the first validation error
    pub fn to_builder(&self) -> Result<LoggerBuilder> {
        self.validate()?;

        let mut builder = Logger::builder()
            .level(self.level)
            .time_format(self.time_format.clone())
            .colors(self.console_colors)
            .development(self.development)
            .fields(self.static_fields());

        if let Some(ref name) = self.name {
            builder = builder.name(name.as_str());
        }

        for kind in &self.outputs {
            builder = match kind {
                OutputKind::Console => builder.console(),
                OutputKind::File => match self.file {
                    Some(ref file) => {
                        let builder = builder.file(file.path.clone(), file.policy());
                        match self.error_file {
                            Some(ref errors) => {
                                builder.separate_error_file(errors.path.clone(), errors.policy())
                            }
                            None => builder,
                        }
                    }
                    None => builder,
                },
                OutputKind::Network => match self.remote_addr {
                    Some(ref addr) => builder.network(addr.trim()),
                    None => builder,
                },
            };
        }

        Ok(builder)
    }

    /// Validate the options and open every destination
    ///
    /// # Errors
    ///
    /// Fails without a partial logger on any invalid option or unopenable
    /// destination
    pub fn build(&self) -> Result<Logger> {
        self.to_builder()?.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(json: &str) -> LoggerConfig {
        serde_json::from_str(json).expect("Failed to parse config")
    }

    #[test]
    fn test_defaults() {
        let config = parse("{}");
        assert_eq!(config, LoggerConfig::default());
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.outputs, vec![OutputKind::Console]);
        assert!(config.console_colors);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_option_rejected() {
        assert!(serde_json::from_str::<LoggerConfig>(r#"{"levle": "debug"}"#).is_err());
        assert!(serde_json::from_str::<LoggerConfig>(r#"{"outputs": ["syslog"]}"#).is_err());
        assert!(serde_json::from_str::<LoggerConfig>(r#"{"level": "verbose"}"#).is_err());
        assert!(serde_json::from_str::<LoggerConfig>(r#"{"time_format": "%Y-%Q"}"#).is_err());
    }

    #[test]
    fn test_level_names_any_case() {
        assert_eq!(parse(r#"{"level": "INFO"}"#).level, LogLevel::Info);
        assert_eq!(parse(r#"{"level": "Warning"}"#).level, LogLevel::Warn);
        assert_eq!(parse(r#"{"level": "eRRoR"}"#).level, LogLevel::Error);
        assert_eq!(parse(r#"{"level": "DPANIC"}"#).level, LogLevel::DPanic);
    }

    #[test]
    fn test_unchecked_time_layout_rejected() {
        let config = LoggerConfig {
            time_format: TimestampFormat::Custom("%Y-%Q".to_string()),
            ..LoggerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            LoggerError::InvalidConfiguration { ref component, .. } if component == "time_format"
        ));
        assert!(config.build().is_err());
    }

    #[test]
    fn test_file_output_needs_options() {
        let config = parse(r#"{"outputs": ["file"]}"#);
        let err = config.validate().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("file"));
    }

    #[test]
    fn test_network_output_needs_address() {
        let config = parse(r#"{"outputs": ["network"], "remote_addr": "  "}"#);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_error_file_needs_file_output() {
        let config = parse(r#"{"outputs": ["console"], "error_file": {"path": "e.log"}}"#);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_and_empty_outputs() {
        assert!(parse(r#"{"outputs": []}"#).validate().is_err());
        assert!(parse(r#"{"outputs": ["console", "console"]}"#)
            .validate()
            .is_err());
    }

    #[test]
    fn test_zero_size_rejected() {
        let config = parse(r#"{"outputs": ["file"], "file": {"path": "a.log", "max_size_mb": 0}}"#);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_policy_from_options() {
        let options = FileOptions {
            path: PathBuf::from("app.log"),
            max_size_mb: 2,
            max_backups: 4,
            max_age_days: 1,
            compress: true,
        };
        let policy = options.policy();
        assert_eq!(policy.max_bytes, 2 * 1024 * 1024);
        assert_eq!(policy.max_backups, 4);
        assert_eq!(policy.max_age, Some(Duration::from_secs(86_400)));
        assert!(policy.compress);

        assert_eq!(FileOptions::new("x.log").policy().max_age, None);
    }

    #[test]
    fn test_static_fields_keep_order() {
        let config = parse(r#"{"fields": {"service": "api", "region": "eu", "shard": 3}}"#);
        let fields = config.static_fields();
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["service", "region", "shard"]);
        assert_eq!(fields.get("shard"), Some(&FieldValue::Int(3)));
    }

    #[test]
    fn test_build_file_logger() {
        let dir = tempdir().expect("Failed to create temp dir");
        let mut config = LoggerConfig {
            level: LogLevel::Debug,
            outputs: vec![OutputKind::File],
            file: Some(FileOptions::new(dir.path().join("app.log"))),
            ..LoggerConfig::default()
        };
        config.name = Some("svc".to_string());

        let logger = config.build().unwrap();
        logger.debug("hello", &[]);
        logger.sync().unwrap();

        let content = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(parsed["msg"], "hello");
        assert_eq!(parsed["logger"], "svc");
    }

    #[test]
    fn test_build_fails_on_unreachable_remote() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let config = LoggerConfig {
            outputs: vec![OutputKind::Network],
            remote_addr: Some(format!("127.0.0.1:{}", port)),
            ..LoggerConfig::default()
        };

        assert!(matches!(
            config.build(),
            Err(LoggerError::NetworkError { .. })
        ));
    }
}
